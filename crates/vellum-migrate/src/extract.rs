//! Selector-heuristic extraction of post fields from exported HTML.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{Html, Selector};

use crate::convert::collapse_ws;

/// How far into the article text to look for a written-out date.
const TEXT_DATE_WINDOW: usize = 400;

static SEL_ARTICLE_H1: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article h1").unwrap());
static SEL_H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static SEL_OG_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());
static SEL_TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static SEL_TIME: LazyLock<Selector> = LazyLock::new(|| Selector::parse("time[datetime]").unwrap());
static SEL_PUBLISHED: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="article:published_time"]"#).unwrap());
static SEL_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());
static SEL_OG_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:description"]"#).unwrap());
static SEL_BODY_CANDIDATES: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    ["article", ".post-content", "main", "body"]
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});

static RE_TEXT_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},\s+\d{4}",
    )
    .unwrap()
});

/// Fields recovered from a post's HTML.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    /// Post title
    pub title: String,

    /// Publication date, when one could be recovered
    pub date: Option<NaiveDate>,

    /// Summary from description meta tags
    pub excerpt: Option<String>,

    /// HTML fragment of the post body
    pub body_html: String,

    /// Whether the title also appears as an `<h1>` inside the body
    pub title_in_body: bool,
}

/// Errors that can occur during extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("no title found (tried article h1, h1, og:title, <title>)")]
    NoTitle,
}

/// Extract title, date, excerpt, and body from a post's HTML.
///
/// Every heuristic falls through to the next candidate; only a completely
/// missing title is an error.
pub fn extract(html: &str) -> Result<Extracted, ExtractError> {
    let doc = Html::parse_document(html);

    let title = extract_title(&doc).ok_or(ExtractError::NoTitle)?;

    let (body_html, body_text, title_in_body) = extract_body(&doc, &title);

    let date = extract_date(&doc, &body_text);
    let excerpt = extract_excerpt(&doc);

    Ok(Extracted {
        title,
        date,
        excerpt,
        body_html,
        title_in_body,
    })
}

fn extract_title(doc: &Html) -> Option<String> {
    for sel in [&*SEL_ARTICLE_H1, &*SEL_H1] {
        if let Some(el) = doc.select(sel).next() {
            let text = collapse_ws(&el.text().collect::<String>());
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    if let Some(content) = meta_content(doc, &SEL_OG_TITLE) {
        return Some(content);
    }

    if let Some(el) = doc.select(&SEL_TITLE).next() {
        let text = collapse_ws(&el.text().collect::<String>());
        // Page titles carry a " | site name" suffix
        let stripped = text.split(" | ").next().unwrap_or(&text).trim();
        if !stripped.is_empty() {
            return Some(stripped.to_string());
        }
    }

    None
}

fn extract_date(doc: &Html, body_text: &str) -> Option<NaiveDate> {
    if let Some(el) = doc.select(&SEL_TIME).next() {
        if let Some(value) = el.value().attr("datetime") {
            if let Some(date) = parse_date_value(value) {
                return Some(date);
            }
        }
    }

    if let Some(value) = meta_content(doc, &SEL_PUBLISHED) {
        if let Some(date) = parse_date_value(&value) {
            return Some(date);
        }
    }

    // Last resort: a written-out date near the top of the article
    let window: String = body_text.chars().take(TEXT_DATE_WINDOW).collect();
    if let Some(m) = RE_TEXT_DATE.find(&window) {
        return parse_date_value(m.as_str());
    }

    None
}

fn extract_excerpt(doc: &Html) -> Option<String> {
    meta_content(doc, &SEL_DESCRIPTION).or_else(|| meta_content(doc, &SEL_OG_DESCRIPTION))
}

fn extract_body(doc: &Html, title: &str) -> (String, String, bool) {
    for sel in SEL_BODY_CANDIDATES.iter() {
        if let Some(el) = doc.select(sel).next() {
            let text = collapse_ws(&el.text().collect::<String>());
            let title_in_body = el
                .select(&SEL_H1)
                .next()
                .map(|h1| collapse_ws(&h1.text().collect::<String>()) == title)
                .unwrap_or(false);
            return (el.inner_html(), text, title_in_body);
        }
    }

    // parse_document always synthesizes <body>, so this is unreachable in
    // practice; an empty fragment keeps the caller total
    (String::new(), String::new(), false)
}

fn meta_content(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|c| collapse_ws(c))
        .filter(|c| !c.is_empty())
}

/// Parse a date in any of the formats the old site used.
fn parse_date_value(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }

    NaiveDate::parse_from_str(value, "%B %d, %Y").ok()
}
