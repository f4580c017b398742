//! Directory-level migration driver.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use walkdir::WalkDir;

use crate::convert::{to_markdown, ConvertOptions};
use crate::extract::{extract, ExtractError};

/// Options for a migration run.
#[derive(Debug, Clone)]
pub struct MigrateOptions {
    /// Directory holding one subdirectory per post, each with an `index.html`
    pub input: PathBuf,

    /// Directory to write `<slug>.md` files into
    pub output: PathBuf,

    /// Overwrite existing output files
    pub force: bool,
}

/// Outcome of a migration run.
#[derive(Debug, Default, PartialEq)]
pub struct MigrateReport {
    /// Directories converted to Markdown
    pub converted: usize,

    /// Directories without an `index.html`, or whose output already existed
    pub skipped: usize,

    /// Directories that failed (logged and carried on)
    pub failed: Vec<PathBuf>,
}

/// Errors that can occur during migration.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("Input directory not found: {0}")]
    InputDirMissing(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Extract {
        path: PathBuf,
        source: ExtractError,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Frontmatter written at the top of each migrated file.
#[derive(Debug, Serialize)]
struct MigratedMatter {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    excerpt: Option<String>,
}

/// Migrate every post directory under `input` into Markdown files.
///
/// Each failing directory is logged and recorded in the report; the run
/// continues with the rest.
pub fn migrate_dir(opts: &MigrateOptions) -> Result<MigrateReport, MigrateError> {
    if !opts.input.is_dir() {
        return Err(MigrateError::InputDirMissing(opts.input.clone()));
    }

    fs::create_dir_all(&opts.output).map_err(|e| MigrateError::Write {
        path: opts.output.clone(),
        source: e,
    })?;

    let mut dirs: Vec<PathBuf> = WalkDir::new(&opts.input)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .collect();
    dirs.sort();

    let mut report = MigrateReport::default();

    for dir in dirs {
        let index = dir.join("index.html");
        if !index.is_file() {
            tracing::debug!("No index.html in {}, skipping", dir.display());
            report.skipped += 1;
            continue;
        }

        match migrate_post(&index, &dir, &opts.output, opts.force) {
            Ok(true) => report.converted += 1,
            Ok(false) => report.skipped += 1,
            Err(e) => {
                tracing::warn!("Failed to migrate {}: {}", dir.display(), e);
                report.failed.push(dir);
            }
        }
    }

    tracing::info!(
        "Migration finished: {} converted, {} skipped, {} failed",
        report.converted,
        report.skipped,
        report.failed.len()
    );

    Ok(report)
}

/// Migrate a single post. Returns `Ok(false)` when the output already
/// exists and `force` is off.
fn migrate_post(
    index: &Path,
    dir: &Path,
    output: &Path,
    force: bool,
) -> Result<bool, MigrateError> {
    let html = fs::read_to_string(index).map_err(|e| MigrateError::Read {
        path: index.to_path_buf(),
        source: e,
    })?;

    let extracted = extract(&html).map_err(|e| MigrateError::Extract {
        path: index.to_path_buf(),
        source: e,
    })?;

    let slug = slug_from_dir(dir);
    let target = output.join(format!("{}.md", slug));

    if target.exists() && !force {
        tracing::warn!("{} already exists, skipping (use --force)", target.display());
        return Ok(false);
    }

    if extracted.date.is_none() {
        tracing::warn!(
            "{}: no publication date found; add one before the file validates",
            target.display()
        );
    }

    let markdown = to_markdown(
        &extracted.body_html,
        &ConvertOptions {
            drop_leading_h1: extracted.title_in_body,
        },
    );

    let matter = MigratedMatter {
        title: extracted.title,
        date: extracted.date,
        excerpt: extracted.excerpt,
    };

    // serde_yaml rejects nothing we feed it here; map the error anyway
    let yaml = serde_yaml::to_string(&matter).map_err(|e| MigrateError::Write {
        path: target.clone(),
        source: std::io::Error::other(e),
    })?;

    let file = format!("---\n{}---\n\n{}", yaml, markdown);

    fs::write(&target, file).map_err(|e| MigrateError::Write {
        path: target.clone(),
        source: e,
    })?;

    tracing::info!("{} -> {}", dir.display(), target.display());

    Ok(true)
}

/// Derive the output slug from the post directory name.
fn slug_from_dir(dir: &Path) -> String {
    let name = dir
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled");

    // Exported directories are already slugs; normalize just in case
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use vellum_content::{extract_frontmatter, PostMatter};

    fn write_export(input: &Path, slug: &str, html: &str) {
        let dir = input.join(slug);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("index.html"), html).unwrap();
    }

    const GOOD_POST: &str = r#"<html>
<head>
  <title>A Fine Post | Old Site</title>
  <meta name="description" content="Short summary.">
</head>
<body>
  <article>
    <h1>A Fine Post</h1>
    <time datetime="2022-08-01">August 1, 2022</time>
    <p>Hello from the <strong>old</strong> site.</p>
  </article>
</body>
</html>"#;

    #[test]
    fn migrates_a_post_directory() {
        let temp = tempdir().unwrap();
        let input = temp.path().join("public");
        let output = temp.path().join("posts");
        write_export(&input, "a-fine-post", GOOD_POST);

        let report = migrate_dir(&MigrateOptions {
            input,
            output: output.clone(),
            force: false,
        })
        .unwrap();

        assert_eq!(report.converted, 1);
        assert!(report.failed.is_empty());

        let md = fs::read_to_string(output.join("a-fine-post.md")).unwrap();
        assert!(md.starts_with("---\n"));
        assert!(md.contains("title: A Fine Post"));
        assert!(md.contains("date: 2022-08-01"));
        assert!(md.contains("excerpt: Short summary."));
        assert!(md.contains("Hello from the **old** site."));
        // The h1 moved into frontmatter
        assert!(!md.contains("# A Fine Post"));
    }

    #[test]
    fn migrated_frontmatter_round_trips_through_the_post_schema() {
        let temp = tempdir().unwrap();
        let input = temp.path().join("public");
        let output = temp.path().join("posts");
        write_export(&input, "a-fine-post", GOOD_POST);

        migrate_dir(&MigrateOptions {
            input,
            output: output.clone(),
            force: false,
        })
        .unwrap();

        let md = fs::read_to_string(output.join("a-fine-post.md")).unwrap();
        let (matter, _) = extract_frontmatter::<PostMatter>(&md).unwrap();
        let matter = matter.unwrap();

        assert_eq!(matter.title, "A Fine Post");
        assert_eq!(matter.excerpt.as_deref(), Some("Short summary."));
    }

    #[test]
    fn failing_directory_does_not_stop_the_run() {
        let temp = tempdir().unwrap();
        let input = temp.path().join("public");
        let output = temp.path().join("posts");
        write_export(&input, "broken", "<html><body><p>no title</p></body></html>");
        write_export(&input, "fine", GOOD_POST);

        let report = migrate_dir(&MigrateOptions {
            input: input.clone(),
            output,
            force: false,
        })
        .unwrap();

        assert_eq!(report.converted, 1);
        assert_eq!(report.failed, vec![input.join("broken")]);
    }

    #[test]
    fn directory_without_index_is_skipped_not_failed() {
        let temp = tempdir().unwrap();
        let input = temp.path().join("public");
        fs::create_dir_all(input.join("assets")).unwrap();
        write_export(&input, "fine", GOOD_POST);

        let report = migrate_dir(&MigrateOptions {
            input,
            output: temp.path().join("posts"),
            force: false,
        })
        .unwrap();

        assert_eq!(report.converted, 1);
        assert_eq!(report.skipped, 1);
        assert!(report.failed.is_empty());
    }

    #[test]
    fn does_not_overwrite_without_force() {
        let temp = tempdir().unwrap();
        let input = temp.path().join("public");
        let output = temp.path().join("posts");
        write_export(&input, "a-fine-post", GOOD_POST);
        fs::create_dir_all(&output).unwrap();
        fs::write(output.join("a-fine-post.md"), "hand-edited").unwrap();

        let opts = MigrateOptions {
            input,
            output: output.clone(),
            force: false,
        };
        let report = migrate_dir(&opts).unwrap();

        assert_eq!(report.converted, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(
            fs::read_to_string(output.join("a-fine-post.md")).unwrap(),
            "hand-edited"
        );

        // Same run with force replaces the file
        let report = migrate_dir(&MigrateOptions {
            force: true,
            ..opts
        })
        .unwrap();

        assert_eq!(report.converted, 1);
        let md = fs::read_to_string(output.join("a-fine-post.md")).unwrap();
        assert!(md.contains("title: A Fine Post"));
    }

    #[test]
    fn missing_input_dir_is_an_error() {
        let temp = tempdir().unwrap();

        let result = migrate_dir(&MigrateOptions {
            input: temp.path().join("nope"),
            output: temp.path().join("out"),
            force: false,
        });

        assert!(matches!(result, Err(MigrateError::InputDirMissing(_))));
    }

    #[test]
    fn undated_post_still_converts() {
        let temp = tempdir().unwrap();
        let input = temp.path().join("public");
        let output = temp.path().join("posts");
        write_export(
            &input,
            "undated",
            "<html><body><article><h1>Undated</h1><p>Body.</p></article></body></html>",
        );

        let report = migrate_dir(&MigrateOptions {
            input,
            output: output.clone(),
            force: false,
        })
        .unwrap();

        assert_eq!(report.converted, 1);
        let md = fs::read_to_string(output.join("undated.md")).unwrap();
        assert!(md.contains("title: Undated"));
        assert!(!md.contains("date:"));
    }
}
