//! Initialize a new site.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command.
pub async fn run(yes: bool) -> Result<()> {
    tracing::info!("Initializing vellum site...");

    let content_dir = Path::new("content");

    // Check if content already exists
    if content_dir.exists() {
        if !yes {
            tracing::warn!("content/ directory already exists. Use --yes to overwrite.");
            return Ok(());
        }
    } else {
        fs::create_dir_all(content_dir).context("Failed to create content directory")?;
    }

    // Create default config
    let config_path = Path::new("vellum.toml");
    if !config_path.exists() || yes {
        fs::write(config_path, DEFAULT_CONFIG).context("Failed to write vellum.toml")?;
        tracing::info!("Created vellum.toml");
    }

    // Create posts directory with a first post
    let posts_dir = content_dir.join("posts");
    if !posts_dir.exists() {
        fs::create_dir_all(&posts_dir).context("Failed to create posts directory")?;
    }

    let hello_path = posts_dir.join("hello-world.md");
    if !hello_path.exists() || yes {
        fs::write(&hello_path, DEFAULT_POST).context("Failed to write hello-world.md")?;
        tracing::info!("Created content/posts/hello-world.md");
    }

    // Create pages directory with about and projects
    let pages_dir = content_dir.join("pages");
    if !pages_dir.exists() {
        fs::create_dir_all(&pages_dir).context("Failed to create pages directory")?;
    }

    let about_path = pages_dir.join("about.md");
    if !about_path.exists() || yes {
        fs::write(&about_path, DEFAULT_ABOUT).context("Failed to write about.md")?;
        tracing::info!("Created content/pages/about.md");
    }

    let projects_path = pages_dir.join("projects.md");
    if !projects_path.exists() || yes {
        fs::write(&projects_path, DEFAULT_PROJECTS).context("Failed to write projects.md")?;
        tracing::info!("Created content/pages/projects.md");
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'vellum dev' to start the development server.");

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Vellum Configuration

[site]
# Site title
title = "My Blog"

# Site description (meta tag, feed)
description = "Notes and posts"

# Author name
author = ""

# Absolute site URL, needed for the RSS feed
# url = "https://blog.example.com"

# Base URL path prefix (for deployment under a subpath)
base_url = "/"

[content]
# Directory holding posts/ and pages/
dir = "content"

[build]
# Output directory for the built site
output = "dist"

# Enable CSS minification
minify = true
"#;

const DEFAULT_POST: &str = r#"---
title: Hello World
date: 2024-01-01
excerpt: The first post on this site.
tags: [meta]
---

Welcome to your new blog.

## Writing posts

Add Markdown files to `content/posts/`. Each file needs frontmatter with a
`title` and a `date`:

```markdown
---
title: Post Title
date: 2024-01-01
---
```

## Diagrams

Fenced `mermaid` blocks render as diagrams:

```mermaid
graph LR;
  write --> build;
  build --> publish;
```

## Importing an old site

If you are moving from an HTML export, run:

```bash
vellum migrate --input public/
```
"#;

const DEFAULT_ABOUT: &str = r#"---
title: About
nav_order: 1
---

A few words about who writes this site.
"#;

const DEFAULT_PROJECTS: &str = r#"---
title: Projects
nav_order: 2
---

Things currently being built or maintained.

- This site
"#;
