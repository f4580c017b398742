//! Content collection loading and validation.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::document::{parse_document, slugify, Document};
use crate::frontmatter::{extract_frontmatter, FrontmatterError, PageMatter, PostMatter};

/// A validated collection entry.
#[derive(Debug, Clone)]
pub struct Entry<M> {
    /// URL slug, derived from the file stem unless overridden
    pub slug: String,

    /// Source file path
    pub source_path: PathBuf,

    /// Validated frontmatter
    pub matter: M,

    /// Parsed document body
    pub doc: Document,
}

/// Errors that can occur when loading a collection.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Frontmatter {
        path: PathBuf,
        source: FrontmatterError,
    },

    #[error("{path}: missing frontmatter (every collection entry needs a --- block)")]
    MissingFrontmatter { path: PathBuf },

    #[error("Duplicate slug '{slug}': {first} and {second}")]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Load the posts collection from a directory.
///
/// Entries come back sorted reverse-chronologically, ties broken by slug so
/// builds are deterministic. Drafts are excluded unless `include_drafts`.
pub fn load_posts(dir: &Path, include_drafts: bool) -> Result<Vec<Entry<PostMatter>>, ContentError> {
    let mut posts = load_collection::<PostMatter>(dir, |m| m.slug.as_deref())?;

    if !include_drafts {
        posts.retain(|p| !p.matter.draft);
    }

    posts.sort_by(|a, b| {
        b.matter
            .date
            .cmp(&a.matter.date)
            .then_with(|| a.slug.cmp(&b.slug))
    });

    Ok(posts)
}

/// Load the pages collection from a directory.
///
/// Entries come back ordered by `nav_order` (unordered pages last), then
/// title.
pub fn load_pages(dir: &Path) -> Result<Vec<Entry<PageMatter>>, ContentError> {
    let mut pages = load_collection::<PageMatter>(dir, |m| m.slug.as_deref())?;

    pages.sort_by(|a, b| {
        let order_a = a.matter.nav_order.unwrap_or(i32::MAX);
        let order_b = b.matter.nav_order.unwrap_or(i32::MAX);
        order_a
            .cmp(&order_b)
            .then_with(|| a.matter.title.cmp(&b.matter.title))
    });

    Ok(pages)
}

/// Scan a directory for Markdown files and validate each against schema `M`.
///
/// A missing directory is an empty collection, not an error.
fn load_collection<M: DeserializeOwned>(
    dir: &Path,
    slug_override: impl Fn(&M) -> Option<&str>,
) -> Result<Vec<Entry<M>>, ContentError> {
    let mut entries = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    if !dir.exists() {
        return Ok(entries);
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| ContentError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            p.is_file() && (ext == "md" || ext == "markdown")
        })
        .collect();

    // Stable scan order so duplicate-slug errors are reproducible
    paths.sort();

    for path in paths {
        let source = fs::read_to_string(&path).map_err(|e| ContentError::Io {
            path: path.clone(),
            source: e,
        })?;

        let (matter, body) =
            extract_frontmatter::<M>(&source).map_err(|e| ContentError::Frontmatter {
                path: path.clone(),
                source: e,
            })?;

        let matter = matter.ok_or_else(|| ContentError::MissingFrontmatter { path: path.clone() })?;

        let slug = match slug_override(&matter) {
            Some(s) => s.to_string(),
            None => {
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("untitled");
                slugify(stem)
            }
        };

        if let Some(first) = seen.insert(slug.clone(), path.clone()) {
            return Err(ContentError::DuplicateSlug {
                slug,
                first,
                second: path,
            });
        }

        entries.push(Entry {
            slug,
            source_path: path,
            matter,
            doc: parse_document(body),
        });
    }

    Ok(entries)
}
