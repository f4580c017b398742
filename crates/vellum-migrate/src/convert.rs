//! HTML fragment to Markdown conversion.
//!
//! Walks the parsed DOM and emits Markdown block by block. Unknown elements
//! contribute their children; `script`, `style`, `nav`, `header`, and
//! `footer` subtrees contribute nothing.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};

static SEL_TR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());

/// Options for a conversion run.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Drop the first `<h1>` (the page title lives in frontmatter)
    pub drop_leading_h1: bool,
}

/// Convert an HTML fragment to Markdown.
pub fn to_markdown(fragment: &str, opts: &ConvertOptions) -> String {
    let dom = Html::parse_fragment(fragment);

    let mut conv = Converter {
        drop_leading_h1: opts.drop_leading_h1,
        dropped_h1: false,
        blocks: Vec::new(),
    };
    conv.walk_blocks(dom.root_element());

    let mut out = conv.blocks.join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

struct Converter {
    drop_leading_h1: bool,
    dropped_h1: bool,
    blocks: Vec<String>,
}

/// Elements whose subtrees never reach the output.
fn is_skipped(name: &str) -> bool {
    matches!(
        name,
        "script" | "style" | "nav" | "header" | "footer" | "noscript" | "template" | "head"
    )
}

fn is_inline(name: &str) -> bool {
    matches!(
        name,
        "a" | "abbr"
            | "b"
            | "strong"
            | "i"
            | "em"
            | "code"
            | "span"
            | "img"
            | "br"
            | "small"
            | "sub"
            | "sup"
            | "mark"
            | "kbd"
            | "del"
            | "s"
            | "u"
            | "time"
    )
}

impl Converter {
    /// Walk an element's children, gathering runs of inline content into
    /// implicit paragraphs between block elements.
    fn walk_blocks(&mut self, el: ElementRef) {
        let mut para = String::new();

        for child in el.children() {
            match child.value() {
                Node::Text(t) => para.push_str(&collapse_ws_edges(&**t)),
                Node::Element(e) => {
                    let name = e.name();
                    let Some(cel) = ElementRef::wrap(child) else {
                        continue;
                    };
                    if is_skipped(name) {
                        continue;
                    }
                    if is_inline(name) {
                        self.inline_element(cel, &mut para);
                    } else {
                        self.flush_para(&mut para);
                        self.block_element(cel);
                    }
                }
                _ => {}
            }
        }

        self.flush_para(&mut para);
    }

    fn flush_para(&mut self, para: &mut String) {
        let text = tidy_inline(para);
        if !text.is_empty() {
            self.blocks.push(text);
        }
        para.clear();
    }

    fn push_block(&mut self, block: String) {
        if !block.trim().is_empty() {
            self.blocks.push(block);
        }
    }

    fn block_element(&mut self, el: ElementRef) {
        let name = el.value().name();

        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                if name == "h1" && self.drop_leading_h1 && !self.dropped_h1 {
                    self.dropped_h1 = true;
                    return;
                }
                let level = name[1..].parse::<usize>().unwrap_or(1);
                let mut text = String::new();
                self.inline_children(el, &mut text);
                let text = tidy_inline(&text).replace('\n', " ");
                if !text.is_empty() {
                    self.push_block(format!("{} {}", "#".repeat(level), text));
                }
            }

            "p" => {
                let mut text = String::new();
                self.inline_children(el, &mut text);
                self.push_block(tidy_inline(&text));
            }

            "pre" => self.code_block(el),

            "blockquote" => {
                let mut sub = Converter {
                    drop_leading_h1: false,
                    dropped_h1: false,
                    blocks: Vec::new(),
                };
                sub.walk_blocks(el);
                let inner = sub.blocks.join("\n\n");
                let quoted: Vec<String> = inner
                    .lines()
                    .map(|l| {
                        if l.is_empty() {
                            ">".to_string()
                        } else {
                            format!("> {}", l)
                        }
                    })
                    .collect();
                self.push_block(quoted.join("\n"));
            }

            "ul" | "ol" => {
                let list = self.list(el, name == "ol", 0);
                self.push_block(list);
            }

            "hr" => self.push_block("---".to_string()),

            "table" => self.table(el),

            // Everything else (div, section, figure, ...) contributes its
            // children
            _ => self.walk_blocks(el),
        }
    }

    fn inline_children(&mut self, el: ElementRef, out: &mut String) {
        for child in el.children() {
            match child.value() {
                Node::Text(t) => out.push_str(&collapse_ws_edges(&**t)),
                Node::Element(e) => {
                    let name = e.name();
                    let Some(cel) = ElementRef::wrap(child) else {
                        continue;
                    };
                    if is_skipped(name) {
                        continue;
                    }
                    self.inline_element(cel, out);
                }
                _ => {}
            }
        }
    }

    fn inline_element(&mut self, el: ElementRef, out: &mut String) {
        let name = el.value().name();

        match name {
            "strong" | "b" => self.wrapped(el, out, "**"),
            "em" | "i" => self.wrapped(el, out, "*"),
            "del" | "s" => self.wrapped(el, out, "~~"),

            "code" => {
                let text: String = el.text().collect();
                let text = text.replace('\n', " ");
                let text = text.trim();
                if !text.is_empty() {
                    out.push('`');
                    out.push_str(text);
                    out.push('`');
                }
            }

            "a" => {
                let mut text = String::new();
                self.inline_children(el, &mut text);
                let text = tidy_inline(&text);
                match el.value().attr("href").filter(|h| !h.is_empty()) {
                    Some(href) => {
                        if text.is_empty() {
                            out.push_str(&format!("<{}>", href));
                        } else {
                            out.push_str(&format!("[{}]({})", text, href));
                        }
                    }
                    None => out.push_str(&text),
                }
            }

            "img" => {
                let alt = el.value().attr("alt").unwrap_or("");
                if let Some(src) = el.value().attr("src").filter(|s| !s.is_empty()) {
                    out.push_str(&format!("![{}]({})", alt, src));
                }
            }

            "br" => out.push_str("\\\n"),

            // span, abbr, mark, time, ... contribute their children
            _ => self.inline_children(el, out),
        }
    }

    fn wrapped(&mut self, el: ElementRef, out: &mut String, marker: &str) {
        let mut text = String::new();
        self.inline_children(el, &mut text);
        let text = tidy_inline(&text);
        if !text.is_empty() {
            out.push_str(marker);
            out.push_str(&text);
            out.push_str(marker);
        }
    }

    fn code_block(&mut self, pre: ElementRef) {
        let code_el = pre
            .children()
            .filter_map(ElementRef::wrap)
            .find(|c| c.value().name() == "code");

        let lang = code_el
            .and_then(|c| c.value().attr("class"))
            .or_else(|| pre.value().attr("class"))
            .and_then(language_from_class)
            .unwrap_or_default();

        let source: String = match code_el {
            Some(c) => c.text().collect(),
            None => pre.text().collect(),
        };
        let source = source.trim_matches('\n');

        self.push_block(format!("```{}\n{}\n```", lang, source));
    }

    fn list(&mut self, el: ElementRef, ordered: bool, depth: usize) -> String {
        let mut items = Vec::new();
        let mut index = 1;

        for child in el.children() {
            let Some(cel) = ElementRef::wrap(child) else {
                continue;
            };
            if cel.value().name() != "li" {
                continue;
            }
            items.push(self.list_item(cel, ordered, depth, index));
            index += 1;
        }

        items.join("\n")
    }

    fn list_item(&mut self, li: ElementRef, ordered: bool, depth: usize, index: usize) -> String {
        let indent = "  ".repeat(depth);
        let marker = if ordered {
            format!("{}. ", index)
        } else {
            "- ".to_string()
        };

        let mut text = String::new();
        let mut nested = Vec::new();

        for child in li.children() {
            match child.value() {
                Node::Text(t) => text.push_str(&collapse_ws_edges(&**t)),
                Node::Element(e) => {
                    let name = e.name();
                    let Some(cel) = ElementRef::wrap(child) else {
                        continue;
                    };
                    if is_skipped(name) {
                        continue;
                    }
                    if name == "ul" || name == "ol" {
                        nested.push(self.list(cel, name == "ol", depth + 1));
                    } else if is_inline(name) {
                        self.inline_element(cel, &mut text);
                    } else {
                        // Block content inside an item flattens onto the line
                        if !text.trim().is_empty() {
                            text.push(' ');
                        }
                        self.inline_children(cel, &mut text);
                    }
                }
                _ => {}
            }
        }

        let mut line = format!("{}{}{}", indent, marker, tidy_inline(&text));
        for n in nested {
            if !n.is_empty() {
                line.push('\n');
                line.push_str(&n);
            }
        }
        line
    }

    fn table(&mut self, el: ElementRef) {
        let mut rows: Vec<Vec<String>> = Vec::new();

        for tr in el.select(&SEL_TR) {
            let mut cells = Vec::new();
            for child in tr.children() {
                let Some(cel) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = cel.value().name();
                if name != "td" && name != "th" {
                    continue;
                }
                let mut text = String::new();
                self.inline_children(cel, &mut text);
                cells.push(tidy_inline(&text).replace('\n', " ").replace('|', "\\|"));
            }
            if !cells.is_empty() {
                rows.push(cells);
            }
        }

        if rows.is_empty() {
            return;
        }

        let header = &rows[0];
        let mut lines = vec![
            format!("| {} |", header.join(" | ")),
            format!("| {} |", vec!["---"; header.len()].join(" | ")),
        ];
        for row in &rows[1..] {
            lines.push(format!("| {} |", row.join(" | ")));
        }

        self.push_block(lines.join("\n"));
    }
}

/// Collapse whitespace runs to single spaces and trim.
pub(crate) fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapse whitespace runs to single spaces, keeping one boundary space on
/// either edge so `foo <b>bar</b>` survives tag boundaries.
fn collapse_ws_edges(text: &str) -> String {
    let collapsed = collapse_ws(text);
    let leading = text.starts_with(char::is_whitespace) && !collapsed.is_empty();
    let trailing = text.ends_with(char::is_whitespace) && !collapsed.is_empty();

    let mut out = String::new();
    if leading || (collapsed.is_empty() && !text.is_empty()) {
        out.push(' ');
    }
    out.push_str(&collapsed);
    if trailing {
        out.push(' ');
    }
    out
}

/// Per-line space collapsing and trimming for assembled inline runs.
fn tidy_inline(text: &str) -> String {
    let lines: Vec<String> = text
        .lines()
        .map(|l| {
            let mut out = String::new();
            let mut last_space = false;
            for c in l.trim().chars() {
                if c == ' ' || c == '\t' {
                    if !last_space {
                        out.push(' ');
                    }
                    last_space = true;
                } else {
                    out.push(c);
                    last_space = false;
                }
            }
            out
        })
        .collect();

    lines.join("\n").trim().to_string()
}

/// Pull a fence language out of `language-*` / `lang-*` classes.
fn language_from_class(class: &str) -> Option<String> {
    class.split_whitespace().find_map(|c| {
        c.strip_prefix("language-")
            .or_else(|| c.strip_prefix("lang-"))
            .map(|l| l.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn md(html: &str) -> String {
        to_markdown(html, &ConvertOptions::default())
    }

    #[test]
    fn converts_headings_and_paragraphs() {
        let html = "<h2>Section</h2><p>First.</p><p>Second.</p>";

        assert_eq!(md(html), "## Section\n\nFirst.\n\nSecond.\n");
    }

    #[test]
    fn converts_inline_markup() {
        let html = "<p>Use <strong>bold</strong>, <em>italics</em> and <code>let x</code>.</p>";

        assert_eq!(md(html), "Use **bold**, *italics* and `let x`.\n");
    }

    #[test]
    fn converts_links_and_images() {
        let html = r#"<p>See <a href="/posts/other/">the <em>other</em> post</a>.</p>
            <p><img src="/img/chart.png" alt="A chart"></p>"#;

        assert_eq!(
            md(html),
            "See [the *other* post](/posts/other/).\n\n![A chart](/img/chart.png)\n"
        );
    }

    #[test]
    fn drops_leading_h1_when_asked() {
        let html = "<h1>Title</h1><p>Body.</p><h1>Another H1</h1>";

        let out = to_markdown(
            html,
            &ConvertOptions {
                drop_leading_h1: true,
            },
        );

        assert_eq!(out, "Body.\n\n# Another H1\n");
    }

    #[test]
    fn converts_code_blocks_with_language() {
        let html = r#"<pre><code class="language-rust">fn main() {
    println!("hi");
}</code></pre>"#;

        assert_eq!(md(html), "```rust\nfn main() {\n    println!(\"hi\");\n}\n```\n");
    }

    #[test]
    fn code_block_language_from_pre_class() {
        let html = r#"<pre class="lang-js"><code>console.log(1);</code></pre>"#;

        assert_eq!(md(html), "```js\nconsole.log(1);\n```\n");
    }

    #[test]
    fn converts_nested_lists() {
        let html = "<ul><li>one</li><li>two<ul><li>two-a</li><li>two-b</li></ul></li></ul>";

        assert_eq!(md(html), "- one\n- two\n  - two-a\n  - two-b\n");
    }

    #[test]
    fn converts_ordered_lists() {
        let html = "<ol><li>first</li><li>second</li><li>third</li></ol>";

        assert_eq!(md(html), "1. first\n2. second\n3. third\n");
    }

    #[test]
    fn converts_blockquotes() {
        let html = "<blockquote><p>Line one.</p><p>Line two.</p></blockquote>";

        assert_eq!(md(html), "> Line one.\n>\n> Line two.\n");
    }

    #[test]
    fn converts_tables() {
        let html = "<table><tr><th>Name</th><th>Age</th></tr>\
            <tr><td>Ada</td><td>36</td></tr></table>";

        assert_eq!(
            md(html),
            "| Name | Age |\n| --- | --- |\n| Ada | 36 |\n"
        );
    }

    #[test]
    fn converts_hr_and_br() {
        let html = "<p>above<br>below</p><hr>";

        assert_eq!(md(html), "above\\\nbelow\n\n---\n");
    }

    #[test]
    fn skips_chrome_elements() {
        let html = "<nav><a href='/'>Home</a></nav>\
            <p>Kept.</p>\
            <script>alert(1)</script>\
            <style>p { color: red }</style>\
            <footer>bye</footer>";

        assert_eq!(md(html), "Kept.\n");
    }

    #[test]
    fn unknown_elements_contribute_children() {
        let html = "<section><div><p>Deep text.</p></div></section>";

        assert_eq!(md(html), "Deep text.\n");
    }

    #[test]
    fn collapses_source_whitespace() {
        let html = "<p>\n    spread\n    over\n    lines\n  </p>";

        assert_eq!(md(html), "spread over lines\n");
    }

    #[test]
    fn keeps_space_at_tag_boundaries() {
        let html = "<p>plain <strong>bold</strong> tail</p>";

        assert_eq!(md(html), "plain **bold** tail\n");
    }

    #[test]
    fn bare_inline_content_becomes_a_paragraph() {
        let html = "loose text with <em>emphasis</em>";

        assert_eq!(md(html), "loose text with *emphasis*\n");
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(md(""), "");
    }
}
