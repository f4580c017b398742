//! Configuration file handling (vellum.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;
use vellum_static::BuildConfig;

/// Configuration file structure (vellum.toml).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub site: SiteSettings,
    #[serde(default)]
    pub content: ContentSettings,
    #[serde(default)]
    pub build: BuildSettings,
}

#[derive(Debug, Deserialize)]
pub struct SiteSettings {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    /// Absolute site URL (needed for the RSS feed)
    pub url: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            title: default_title(),
            description: String::new(),
            author: String::new(),
            url: None,
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ContentSettings {
    #[serde(default = "default_content_dir")]
    pub dir: String,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            dir: default_content_dir(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BuildSettings {
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default = "default_minify")]
    pub minify: bool,
    /// Paths to extra CSS stylesheets to include
    pub styles: Option<Vec<String>>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            output: default_output(),
            minify: default_minify(),
            styles: None,
        }
    }
}

fn default_title() -> String {
    "A vellum site".to_string()
}
fn default_base_url() -> String {
    "/".to_string()
}
fn default_content_dir() -> String {
    "content".to_string()
}
fn default_output() -> String {
    "dist".to_string()
}
fn default_minify() -> bool {
    true
}

/// Load configuration from the given path if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let config: ConfigFile = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
        tracing::info!("Loaded config from {}", path.display());
        return Ok(config);
    }
    Ok(ConfigFile::default())
}

impl ConfigFile {
    /// Turn the file settings into a build configuration.
    pub fn build_config(&self) -> BuildConfig {
        BuildConfig {
            content_dir: PathBuf::from(&self.content.dir),
            output_dir: PathBuf::from(&self.build.output),
            base_url: self.site.base_url.clone(),
            url: self.site.url.clone(),
            title: self.site.title.clone(),
            description: self.site.description.clone(),
            author: self.site.author.clone(),
            minify: self.build.minify,
            include_drafts: false,
            styles: self.build.styles.clone().unwrap_or_default(),
        }
    }
}
