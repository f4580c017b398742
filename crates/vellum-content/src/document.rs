//! Markdown document parsing.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

/// Character budget for excerpts derived from the body.
const EXCERPT_BUDGET: usize = 240;

/// A parsed Markdown document body.
#[derive(Debug, Clone)]
pub struct Document {
    /// Markdown content (without frontmatter)
    pub body: String,

    /// Table of contents entries
    pub toc: Vec<TocEntry>,

    /// Whether the body contains a fenced `mermaid` block
    pub has_mermaid: bool,

    /// Excerpt derived from the first paragraph, for files whose
    /// frontmatter omits one
    pub derived_excerpt: Option<String>,
}

/// A table of contents entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    /// Heading text
    pub title: String,
    /// Anchor ID
    pub id: String,
    /// Heading level (1-6)
    pub level: u8,
}

/// Markdown extensions enabled everywhere a body is parsed or rendered.
pub fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Parse a Markdown body into a [`Document`].
///
/// Walks the event stream once to collect the table of contents, detect
/// Mermaid blocks, and capture the first paragraph for excerpt fallback.
pub fn parse_document(body: &str) -> Document {
    let parser = Parser::new_ext(body, markdown_options());

    let mut toc = Vec::new();
    let mut has_mermaid = false;

    let mut current_heading: Option<(u8, String)> = None;
    let mut first_paragraph: Option<String> = None;
    let mut in_first_paragraph = false;
    let mut in_code_block = false;

    for event in parser {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                in_code_block = true;
                if let CodeBlockKind::Fenced(info) = &kind {
                    let lang = info.split_whitespace().next().unwrap_or("");
                    if lang.eq_ignore_ascii_case("mermaid") {
                        has_mermaid = true;
                    }
                }
            }

            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
            }

            Event::Start(Tag::Heading { level, .. }) => {
                current_heading = Some((level as u8, String::new()));
            }

            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, title)) = current_heading.take() {
                    let id = slugify(&title);
                    toc.push(TocEntry { title, id, level });
                }
            }

            Event::Start(Tag::Paragraph) if first_paragraph.is_none() => {
                in_first_paragraph = true;
                first_paragraph = Some(String::new());
            }

            Event::End(TagEnd::Paragraph) => {
                in_first_paragraph = false;
            }

            Event::Text(text) | Event::Code(text) => {
                if in_code_block {
                    continue;
                }
                if let Some((_, ref mut heading_text)) = current_heading {
                    heading_text.push_str(&text);
                } else if in_first_paragraph {
                    if let Some(ref mut para) = first_paragraph {
                        para.push_str(&text);
                    }
                }
            }

            Event::SoftBreak | Event::HardBreak => {
                if in_first_paragraph {
                    if let Some(ref mut para) = first_paragraph {
                        para.push(' ');
                    }
                }
            }

            _ => {}
        }
    }

    let derived_excerpt = first_paragraph
        .map(|p| truncate_excerpt(&p, EXCERPT_BUDGET))
        .filter(|p| !p.is_empty());

    Document {
        body: body.to_string(),
        toc,
        has_mermaid,
        derived_excerpt,
    }
}

/// Truncate text to a character budget at a word boundary, with an ellipsis.
pub fn truncate_excerpt(text: &str, budget: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= budget {
        return text.to_string();
    }

    let cut: String = text.chars().take(budget).collect();
    let truncated = match cut.rfind(char::is_whitespace) {
        Some(pos) => &cut[..pos],
        None => cut.as_str(),
    };

    format!("{}…", truncated.trim_end_matches(|c: char| !c.is_alphanumeric()))
}

/// Convert text to a URL-safe slug.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn collects_toc() {
        let body = "# Title\n\nIntro.\n\n## Section One\n\nText.\n\n### Nested\n";

        let doc = parse_document(body);

        assert_eq!(doc.toc.len(), 3);
        assert_eq!(doc.toc[0].title, "Title");
        assert_eq!(doc.toc[0].id, "title");
        assert_eq!(doc.toc[0].level, 1);
        assert_eq!(doc.toc[1].title, "Section One");
        assert_eq!(doc.toc[1].id, "section-one");
        assert_eq!(doc.toc[2].level, 3);
    }

    #[test]
    fn derives_excerpt_from_first_paragraph() {
        let body = "# Heading\n\nThe opening paragraph.\n\nThe second one.\n";

        let doc = parse_document(body);

        assert_eq!(doc.derived_excerpt.as_deref(), Some("The opening paragraph."));
    }

    #[test]
    fn excerpt_skips_code_fences() {
        let body = "```rust\nfn main() {}\n```\n\nActual prose comes after.\n";

        let doc = parse_document(body);

        assert_eq!(doc.derived_excerpt.as_deref(), Some("Actual prose comes after."));
    }

    #[test]
    fn detects_mermaid_blocks() {
        let body = "Some text.\n\n```mermaid\ngraph TD;\nA-->B;\n```\n";

        let doc = parse_document(body);

        assert!(doc.has_mermaid);
    }

    #[test]
    fn plain_code_is_not_mermaid() {
        let body = "```rust\nlet x = 1;\n```\n";

        assert!(!parse_document(body).has_mermaid);
    }

    #[test]
    fn empty_body_is_valid() {
        let doc = parse_document("");

        assert!(doc.toc.is_empty());
        assert!(doc.derived_excerpt.is_none());
    }

    #[test]
    fn truncates_at_word_boundary() {
        let text = "one two three four five";

        assert_eq!(truncate_excerpt(text, 11), "one two…");
        assert_eq!(truncate_excerpt(text, 100), text);
    }

    #[test]
    fn slugify_works() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Gatsby, Goodbye!"), "gatsby-goodbye");
        assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
        assert_eq!(slugify("2023_year_in_review"), "2023-year-in-review");
    }
}
