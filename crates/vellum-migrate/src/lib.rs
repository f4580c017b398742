//! HTML-to-Markdown import for vellum.
//!
//! Converts an exported HTML site (one directory per post, each holding an
//! `index.html`) into Markdown files with YAML frontmatter. Title, date, and
//! excerpt are recovered with CSS selector heuristics; the post body is
//! converted to Markdown element by element.

pub mod convert;
pub mod extract;
pub mod migrator;

pub use convert::{to_markdown, ConvertOptions};
pub use extract::{extract, ExtractError, Extracted};
pub use migrator::{migrate_dir, MigrateError, MigrateOptions, MigrateReport};
