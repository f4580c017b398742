//! Frontmatter extraction and typed schemas.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Frontmatter schema for blog posts (`content/posts/`).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PostMatter {
    /// Post title (required)
    pub title: String,

    /// Publication date (required, `YYYY-MM-DD`)
    pub date: NaiveDate,

    /// Short summary shown in listings and feeds
    #[serde(default)]
    pub excerpt: Option<String>,

    /// Topic tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Drafts are excluded from builds unless requested
    #[serde(default)]
    pub draft: bool,

    /// Custom slug override
    #[serde(default)]
    pub slug: Option<String>,
}

/// Frontmatter schema for standalone pages (`content/pages/`).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PageMatter {
    /// Page title (required)
    pub title: String,

    /// Position in the navigation bar (lower = first)
    #[serde(default)]
    pub nav_order: Option<i32>,

    /// Whether the page appears in navigation
    #[serde(default = "default_true")]
    pub nav: bool,

    /// Custom slug override
    #[serde(default)]
    pub slug: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Extract frontmatter from Markdown source.
///
/// Returns the parsed frontmatter and the remaining content after the
/// frontmatter block. A file without a leading `---` fence yields `None`;
/// whether that is an error is the caller's call.
pub fn extract_frontmatter<M: DeserializeOwned>(
    source: &str,
) -> Result<(Option<M>, &str), FrontmatterError> {
    let trimmed = source.trim_start();

    if !trimmed.starts_with("---") {
        return Ok((None, source));
    }

    let after_open = &trimmed[3..];
    let Some(close_pos) = after_open.find("\n---") else {
        return Err(FrontmatterError::Unclosed);
    };

    let yaml_content = after_open[..close_pos].trim();
    let remaining = &after_open[close_pos + 4..];

    let matter: M = serde_yaml::from_str(yaml_content)
        .map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?;

    Ok((Some(matter), remaining.trim_start()))
}

/// Errors that can occur when parsing frontmatter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Unclosed frontmatter block - missing closing ---")]
    Unclosed,

    #[error("Invalid frontmatter: {0}")]
    InvalidYaml(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_post_matter() {
        let source = r#"---
title: Migrating off Gatsby
date: 2023-04-12
excerpt: Why and how the old site moved
tags: [meta, rust]
---

The body starts here.
"#;

        let (fm, content) = extract_frontmatter::<PostMatter>(source).unwrap();
        let fm = fm.unwrap();

        assert_eq!(fm.title, "Migrating off Gatsby");
        assert_eq!(fm.date, NaiveDate::from_ymd_opt(2023, 4, 12).unwrap());
        assert_eq!(fm.excerpt.as_deref(), Some("Why and how the old site moved"));
        assert_eq!(fm.tags, vec!["meta", "rust"]);
        assert!(!fm.draft);
        assert!(content.starts_with("The body starts here."));
    }

    #[test]
    fn extracts_page_matter_with_defaults() {
        let source = "---\ntitle: About\n---\n\nHi.";

        let (fm, _) = extract_frontmatter::<PageMatter>(source).unwrap();
        let fm = fm.unwrap();

        assert_eq!(fm.title, "About");
        assert!(fm.nav);
        assert_eq!(fm.nav_order, None);
    }

    #[test]
    fn handles_no_frontmatter() {
        let source = "# Just Markdown\n\nNo frontmatter here.";

        let (fm, content) = extract_frontmatter::<PageMatter>(source).unwrap();

        assert!(fm.is_none());
        assert_eq!(content, source);
    }

    #[test]
    fn errors_on_unclosed_frontmatter() {
        let source = "---\ntitle: Test\n# No closing";

        let result = extract_frontmatter::<PageMatter>(source);

        assert!(matches!(result, Err(FrontmatterError::Unclosed)));
    }

    #[test]
    fn errors_on_missing_required_field() {
        // A post needs a date
        let source = "---\ntitle: Undated\n---\nbody";

        let result = extract_frontmatter::<PostMatter>(source);

        assert!(matches!(result, Err(FrontmatterError::InvalidYaml(_))));
    }

    #[test]
    fn errors_on_bad_date() {
        let source = "---\ntitle: T\ndate: April twelfth\n---\n";

        let result = extract_frontmatter::<PostMatter>(source);

        assert!(matches!(result, Err(FrontmatterError::InvalidYaml(_))));
    }
}
