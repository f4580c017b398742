//! Static site builder.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Parser, Tag, TagEnd};
use rayon::prelude::*;

use vellum_content::{
    load_pages, load_posts, markdown_options, slugify, ContentError, Entry, PageMatter, PostMatter,
};

use crate::assets::AssetPipeline;
use crate::feed::{build_feed, FeedError};
use crate::templates::{Context, NavItem, PostSummary, TemplateEngine, TocEntry};

/// Configuration for building a site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Content root (holds `posts/` and `pages/`)
    pub content_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Base URL path prefix for links
    pub base_url: String,

    /// Absolute site URL (needed for the feed and sitemap)
    pub url: Option<String>,

    /// Site title
    pub title: String,

    /// Site description (meta tag, feed channel)
    pub description: String,

    /// Site author (feed metadata)
    pub author: String,

    /// Minify CSS output
    pub minify: bool,

    /// Include draft posts
    pub include_drafts: bool,

    /// Paths to extra CSS stylesheets to include
    pub styles: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
            output_dir: PathBuf::from("dist"),
            base_url: "/".to_string(),
            url: None,
            title: "A vellum site".to_string(),
            description: String::new(),
            author: String::new(),
            minify: true,
            include_drafts: false,
            styles: vec![],
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of posts rendered
    pub posts: usize,

    /// Number of pages rendered
    pub pages: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to read content: {0}")]
    ReadError(String),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("Failed to render template: {0}")]
    TemplateError(String),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("Failed to write output: {0}")]
    WriteError(String),
}

/// Static site builder.
pub struct SiteBuilder {
    config: BuildConfig,
    templates: TemplateEngine,
}

impl SiteBuilder {
    /// Create a new site builder.
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            templates: TemplateEngine::new(),
        }
    }

    /// Build the site.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        if !self.config.content_dir.exists() {
            return Err(BuildError::ReadError(format!(
                "Content directory not found: {}",
                self.config.content_dir.display()
            )));
        }

        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        let posts = load_posts(
            &self.config.content_dir.join("posts"),
            self.config.include_drafts,
        )?;
        let pages = load_pages(&self.config.content_dir.join("pages"))?;

        let nav = self.navigation(&pages);

        // Render posts and pages in parallel
        let results: Vec<Result<(), BuildError>> = posts
            .par_iter()
            .map(|post| self.build_post(post, &nav))
            .chain(pages.par_iter().map(|page| self.build_page(page, &nav)))
            .collect();

        for result in results {
            result?;
        }

        self.build_index(&posts, &nav)?;
        self.generate_assets()?;
        self.generate_feed(&posts)?;
        self.generate_sitemap(&posts, &pages)?;

        let duration = start.elapsed();

        Ok(BuildResult {
            posts: posts.len(),
            pages: pages.len(),
            duration_ms: duration.as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Navigation: Home plus every page that opts in, in `nav_order`.
    fn navigation(&self, pages: &[Entry<PageMatter>]) -> Vec<NavItem> {
        let mut nav = vec![NavItem {
            title: "Home".to_string(),
            path: self.config.base_url.clone(),
        }];

        for page in pages {
            if !page.matter.nav {
                continue;
            }
            nav.push(NavItem {
                title: page.matter.title.clone(),
                path: format!("{}{}/", self.config.base_url, page.slug),
            });
        }

        nav
    }

    /// Context with site-wide fields, navigation, and stylesheet links set.
    fn base_context(&self, nav: &[NavItem]) -> Context {
        let mut ctx = Context::site(
            &self.config.title,
            &self.config.description,
            &self.config.author,
            &self.config.base_url,
        );
        ctx.nav = nav.to_vec();
        ctx.styles = self
            .config
            .styles
            .iter()
            .map(|s| {
                let filename = Path::new(s)
                    .file_name()
                    .and_then(|f| f.to_str())
                    .unwrap_or("style.css");
                format!("{}assets/{}", self.config.base_url, filename)
            })
            .collect();
        ctx
    }

    fn build_post(&self, post: &Entry<PostMatter>, nav: &[NavItem]) -> Result<(), BuildError> {
        let mut ctx = self.base_context(nav);
        ctx.title = post.matter.title.clone();
        ctx.content = render_markdown(&post.doc.body);
        ctx.date = Some(post.matter.date.to_string());
        ctx.tags = post.matter.tags.clone();
        ctx.has_mermaid = post.doc.has_mermaid;
        ctx.toc = post
            .doc
            .toc
            .iter()
            .map(|e| TocEntry {
                title: e.title.clone(),
                id: e.id.clone(),
                level: e.level,
            })
            .collect();

        let html = self
            .templates
            .render_page("post.html", &ctx)
            .map_err(|e| BuildError::TemplateError(e.to_string()))?;

        let out = self
            .config
            .output_dir
            .join("posts")
            .join(&post.slug)
            .join("index.html");
        write_page(&out, &html)
    }

    fn build_page(&self, page: &Entry<PageMatter>, nav: &[NavItem]) -> Result<(), BuildError> {
        let mut ctx = self.base_context(nav);
        ctx.title = page.matter.title.clone();
        ctx.content = render_markdown(&page.doc.body);
        ctx.has_mermaid = page.doc.has_mermaid;

        let html = self
            .templates
            .render_page("page.html", &ctx)
            .map_err(|e| BuildError::TemplateError(e.to_string()))?;

        let out = self.config.output_dir.join(&page.slug).join("index.html");
        write_page(&out, &html)
    }

    fn build_index(&self, posts: &[Entry<PostMatter>], nav: &[NavItem]) -> Result<(), BuildError> {
        let mut ctx = self.base_context(nav);
        ctx.posts = posts.iter().map(|p| self.summarize(p)).collect();

        let html = self
            .templates
            .render_page("index.html", &ctx)
            .map_err(|e| BuildError::TemplateError(e.to_string()))?;

        write_page(&self.config.output_dir.join("index.html"), &html)
    }

    fn summarize(&self, post: &Entry<PostMatter>) -> PostSummary {
        PostSummary {
            title: post.matter.title.clone(),
            path: format!("{}posts/{}/", self.config.base_url, post.slug),
            date: post.matter.date.to_string(),
            date_display: post.matter.date.format("%B %-d, %Y").to_string(),
            excerpt: post
                .matter
                .excerpt
                .clone()
                .or_else(|| post.doc.derived_excerpt.clone()),
            tags: post.matter.tags.clone(),
        }
    }

    /// Write embedded assets and copy configured stylesheets.
    fn generate_assets(&self) -> Result<(), BuildError> {
        let assets_dir = self.config.output_dir.join("assets");
        fs::create_dir_all(&assets_dir).map_err(|e| BuildError::WriteError(e.to_string()))?;

        let css = AssetPipeline::generate_css();
        let css = if self.config.minify {
            AssetPipeline::minify_css(&css).unwrap_or(css)
        } else {
            css
        };
        fs::write(assets_dir.join("site.css"), css)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        fs::write(assets_dir.join("site.js"), AssetPipeline::generate_js())
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        for style_path in &self.config.styles {
            let source_path = PathBuf::from(style_path);
            if source_path.exists() {
                let filename = source_path
                    .file_name()
                    .and_then(|f| f.to_str())
                    .unwrap_or("style.css");
                let content = fs::read_to_string(&source_path).map_err(|e| {
                    BuildError::ReadError(format!("Failed to read stylesheet: {}", e))
                })?;
                fs::write(assets_dir.join(filename), content)
                    .map_err(|e| BuildError::WriteError(e.to_string()))?;
            } else {
                tracing::warn!("Stylesheet not found: {}", style_path);
            }
        }

        Ok(())
    }

    fn generate_feed(&self, posts: &[Entry<PostMatter>]) -> Result<(), BuildError> {
        let Some(url) = self.config.url.as_deref() else {
            tracing::warn!("No site url configured; skipping feed.xml");
            return Ok(());
        };

        let xml = build_feed(url, &self.config, posts)?;

        fs::write(self.config.output_dir.join("feed.xml"), xml)
            .map_err(|e| BuildError::WriteError(e.to_string()))
    }

    fn generate_sitemap(
        &self,
        posts: &[Entry<PostMatter>],
        pages: &[Entry<PageMatter>],
    ) -> Result<(), BuildError> {
        let base = self
            .config
            .url
            .as_deref()
            .unwrap_or(&self.config.base_url)
            .trim_end_matches('/')
            .to_string();

        let mut urls = vec![format!("  <url>\n    <loc>{}/</loc>\n  </url>", base)];
        urls.extend(
            posts
                .iter()
                .map(|p| format!("  <url>\n    <loc>{}/posts/{}/</loc>\n  </url>", base, p.slug)),
        );
        urls.extend(
            pages
                .iter()
                .map(|p| format!("  <url>\n    <loc>{}/{}/</loc>\n  </url>", base, p.slug)),
        );

        let sitemap = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
{}
</urlset>"#,
            urls.join("\n")
        );

        fs::write(self.config.output_dir.join("sitemap.xml"), sitemap)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        let robots = format!(
            "User-agent: *\nAllow: /\nSitemap: {}sitemap.xml",
            self.config.base_url
        );
        fs::write(self.config.output_dir.join("robots.txt"), robots)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        Ok(())
    }
}

fn write_page(path: &Path, html: &str) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::WriteError(e.to_string()))?;
    }
    fs::write(path, html).map_err(|e| BuildError::WriteError(e.to_string()))
}

/// Render Markdown to HTML with heading anchors and Mermaid blocks.
///
/// Headings get `id` attributes matching the TOC slugs; fenced `mermaid`
/// blocks come out as `<pre class="mermaid">` so the site script can render
/// them client-side.
pub fn render_markdown(body: &str) -> String {
    let parser = Parser::new_ext(body, markdown_options());

    let mut events: Vec<Event> = Vec::new();
    let mut heading: Option<(Tag, Vec<Event>)> = None;
    let mut mermaid: Option<String> = None;

    for event in parser {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info)))
                if fence_is_mermaid(&info) =>
            {
                mermaid = Some(String::new());
            }

            Event::Text(text) if mermaid.is_some() => {
                if let Some(buf) = mermaid.as_mut() {
                    buf.push_str(&text);
                }
            }

            Event::End(TagEnd::CodeBlock) if mermaid.is_some() => {
                let source = mermaid.take().unwrap_or_default();
                events.push(Event::Html(
                    format!(
                        "<pre class=\"mermaid\">{}</pre>",
                        escape_html(source.trim_end())
                    )
                    .into(),
                ));
            }

            Event::Start(tag @ Tag::Heading { .. }) => {
                heading = Some((tag, Vec::new()));
            }

            Event::End(end @ TagEnd::Heading(_)) => {
                if let Some((tag, inner)) = heading.take() {
                    let text: String = inner
                        .iter()
                        .filter_map(|e| match e {
                            Event::Text(t) | Event::Code(t) => Some(t.as_ref()),
                            _ => None,
                        })
                        .collect();

                    let tag = match tag {
                        Tag::Heading {
                            level,
                            id,
                            classes,
                            attrs,
                        } => Tag::Heading {
                            level,
                            id: id.or_else(|| Some(CowStr::from(slugify(&text)))),
                            classes,
                            attrs,
                        },
                        other => other,
                    };

                    events.push(Event::Start(tag));
                    events.extend(inner);
                    events.push(Event::End(end));
                }
            }

            e => {
                if let Some((_, inner)) = heading.as_mut() {
                    inner.push(e);
                } else {
                    events.push(e);
                }
            }
        }
    }

    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());
    out
}

fn fence_is_mermaid(info: &str) -> bool {
    info.split_whitespace()
        .next()
        .is_some_and(|lang| lang.eq_ignore_ascii_case("mermaid"))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn scaffold(root: &Path) {
        let posts = root.join("content/posts");
        let pages = root.join("content/pages");
        fs::create_dir_all(&posts).unwrap();
        fs::create_dir_all(&pages).unwrap();

        fs::write(
            posts.join("going-static.md"),
            "---\ntitle: Going Static\ndate: 2023-04-12\nexcerpt: A rebuild story.\n---\n\nHello from the new site.\n\n## Details\n\nMore text.\n",
        )
        .unwrap();
        fs::write(
            pages.join("about.md"),
            "---\ntitle: About\nnav_order: 1\n---\n\nWho writes this.\n",
        )
        .unwrap();
    }

    fn config(root: &Path) -> BuildConfig {
        BuildConfig {
            content_dir: root.join("content"),
            output_dir: root.join("dist"),
            title: "Test Blog".to_string(),
            description: "A test".to_string(),
            url: Some("https://blog.test".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn builds_a_simple_site() {
        let temp = tempdir().unwrap();
        scaffold(temp.path());

        let result = SiteBuilder::new(config(temp.path())).build().await.unwrap();

        assert_eq!(result.posts, 1);
        assert_eq!(result.pages, 1);

        let out = temp.path().join("dist");
        assert!(out.join("index.html").exists());
        assert!(out.join("posts/going-static/index.html").exists());
        assert!(out.join("about/index.html").exists());
        assert!(out.join("assets/site.css").exists());
        assert!(out.join("feed.xml").exists());
        assert!(out.join("sitemap.xml").exists());
        assert!(out.join("robots.txt").exists());

        let index = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(index.contains("Going Static"));
        assert!(index.contains("A rebuild story."));
        assert!(index.contains(r#"<a href="/about/">About</a>"#));

        let post = fs::read_to_string(out.join("posts/going-static/index.html")).unwrap();
        assert!(post.contains("Hello from the new site."));
        assert!(post.contains(r#"<h2 id="details">"#));
    }

    #[tokio::test]
    async fn drafts_are_excluded_by_default() {
        let temp = tempdir().unwrap();
        scaffold(temp.path());
        fs::write(
            temp.path().join("content/posts/wip.md"),
            "---\ntitle: WIP\ndate: 2024-01-01\ndraft: true\n---\n\nNot yet.\n",
        )
        .unwrap();

        let result = SiteBuilder::new(config(temp.path())).build().await.unwrap();

        assert_eq!(result.posts, 1);
        assert!(!temp.path().join("dist/posts/wip").exists());

        let with_drafts = BuildConfig {
            include_drafts: true,
            ..config(temp.path())
        };
        let result = SiteBuilder::new(with_drafts).build().await.unwrap();

        assert_eq!(result.posts, 2);
        assert!(temp.path().join("dist/posts/wip/index.html").exists());
    }

    #[tokio::test]
    async fn empty_posts_collection_still_builds_an_index() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("content")).unwrap();

        let result = SiteBuilder::new(config(temp.path())).build().await.unwrap();

        assert_eq!(result.posts, 0);
        let index = fs::read_to_string(temp.path().join("dist/index.html")).unwrap();
        assert!(index.contains("Nothing published yet."));
    }

    #[tokio::test]
    async fn missing_content_dir_is_an_error() {
        let temp = tempdir().unwrap();

        let result = SiteBuilder::new(config(temp.path())).build().await;

        assert!(matches!(result, Err(BuildError::ReadError(_))));
    }

    #[test]
    fn renders_mermaid_blocks_as_diagram_pres() {
        let body = "Intro.\n\n```mermaid\ngraph TD;\n  A --> B;\n```\n";

        let html = render_markdown(body);

        assert!(html.contains(r#"<pre class="mermaid">graph TD;
  A --&gt; B;</pre>"#));
        assert!(!html.contains("<code"));
    }

    #[test]
    fn injects_heading_anchors() {
        let html = render_markdown("## Reading Notes\n");

        assert!(html.contains(r#"<h2 id="reading-notes">Reading Notes</h2>"#));
    }

    #[tokio::test]
    async fn feed_is_skipped_without_a_site_url() {
        let temp = tempdir().unwrap();
        scaffold(temp.path());
        let config = BuildConfig {
            url: None,
            ..config(temp.path())
        };

        SiteBuilder::new(config).build().await.unwrap();

        assert!(!temp.path().join("dist/feed.xml").exists());
        assert!(temp.path().join("dist/sitemap.xml").exists());
    }

    #[tokio::test]
    async fn feed_links_are_absolute() {
        let temp = tempdir().unwrap();
        scaffold(temp.path());

        SiteBuilder::new(config(temp.path())).build().await.unwrap();

        let feed = fs::read_to_string(temp.path().join("dist/feed.xml")).unwrap();
        assert!(feed.contains("https://blog.test/posts/going-static/"));
    }
}
