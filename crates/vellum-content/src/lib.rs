//! Markdown content collections with typed frontmatter.
//!
//! This crate loads a directory of Markdown files, validates each file's
//! YAML frontmatter against a typed schema, and exposes the results as
//! sorted collections ready for rendering.

pub mod collection;
pub mod document;
pub mod frontmatter;

pub use collection::{load_pages, load_posts, ContentError, Entry};
pub use document::{markdown_options, parse_document, slugify, truncate_excerpt, Document, TocEntry};
pub use frontmatter::{extract_frontmatter, FrontmatterError, PageMatter, PostMatter};
