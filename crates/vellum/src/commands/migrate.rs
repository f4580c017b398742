//! HTML import command.

use std::path::PathBuf;

use anyhow::Result;
use vellum_migrate::{migrate_dir, MigrateOptions};

/// Run the migrate command.
pub async fn run(input: PathBuf, output: PathBuf, force: bool) -> Result<()> {
    tracing::info!(
        "Importing posts from {} into {}",
        input.display(),
        output.display()
    );

    let report = migrate_dir(&MigrateOptions {
        input,
        output,
        force,
    })?;

    tracing::info!(
        "{} converted, {} skipped, {} failed",
        report.converted,
        report.skipped,
        report.failed.len()
    );

    if !report.failed.is_empty() {
        tracing::warn!("Failed directories:");
        for dir in &report.failed {
            tracing::warn!("  {}", dir.display());
        }
    }

    Ok(())
}
