//! Template engine for rendering site pages.

use minijinja::{context, Environment};

/// A navigation item.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NavItem {
    /// Display title
    pub title: String,
    /// URL path
    pub path: String,
}

/// A table of contents entry.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TocEntry {
    /// Heading text
    pub title: String,
    /// Anchor ID
    pub id: String,
    /// Heading level (1-6)
    pub level: u8,
}

/// A post as shown in the index listing and feeds.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PostSummary {
    /// Post title
    pub title: String,
    /// URL path
    pub path: String,
    /// ISO date (`YYYY-MM-DD`)
    pub date: String,
    /// Human-readable date
    pub date_display: String,
    /// Listing excerpt
    pub excerpt: Option<String>,
    /// Topic tags
    pub tags: Vec<String>,
}

/// Context for rendering a page template.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Context {
    /// Page title
    pub title: String,
    /// Site title
    pub site_title: String,
    /// Site description
    pub description: String,
    /// Site author
    pub author: String,
    /// Rendered content HTML
    pub content: String,
    /// Navigation items
    pub nav: Vec<NavItem>,
    /// Table of contents
    pub toc: Vec<TocEntry>,
    /// Base URL
    pub base_url: String,
    /// Post date, for post pages
    pub date: Option<String>,
    /// Post tags, for post pages
    pub tags: Vec<String>,
    /// Post listing, for the index page
    pub posts: Vec<PostSummary>,
    /// Whether the page needs the Mermaid runtime
    pub has_mermaid: bool,
    /// Paths to CSS stylesheets to include
    pub styles: Vec<String>,
}

impl Context {
    /// A context with site-wide fields set and page fields empty.
    pub fn site(site_title: &str, description: &str, author: &str, base_url: &str) -> Self {
        Self {
            title: String::new(),
            site_title: site_title.to_string(),
            description: description.to_string(),
            author: author.to_string(),
            content: String::new(),
            nav: Vec::new(),
            toc: Vec::new(),
            base_url: base_url.to_string(),
            date: None,
            tags: Vec::new(),
            posts: Vec::new(),
            has_mermaid: false,
            styles: Vec::new(),
        }
    }
}

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with the built-in templates.
    pub fn new() -> Self {
        let mut env = Environment::new();

        env.add_template_owned("base.html".to_string(), BASE_TEMPLATE.to_string())
            .expect("Failed to add base template");
        env.add_template_owned("index.html".to_string(), INDEX_TEMPLATE.to_string())
            .expect("Failed to add index template");
        env.add_template_owned("post.html".to_string(), POST_TEMPLATE.to_string())
            .expect("Failed to add post template");
        env.add_template_owned("page.html".to_string(), PAGE_TEMPLATE.to_string())
            .expect("Failed to add page template");
        env.add_template_owned("nav.html".to_string(), NAV_TEMPLATE.to_string())
            .expect("Failed to add nav template");

        Self { env }
    }

    /// Render a page using the specified template.
    pub fn render_page(
        &self,
        template: &str,
        context: &Context,
    ) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template(template)?;

        tmpl.render(context! {
            title => &context.title,
            site_title => &context.site_title,
            description => &context.description,
            author => &context.author,
            content => &context.content,
            nav => &context.nav,
            toc => &context.toc,
            base_url => &context.base_url,
            date => &context.date,
            tags => &context.tags,
            posts => &context.posts,
            has_mermaid => &context.has_mermaid,
            styles => &context.styles,
        })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

const BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <meta name="description" content="{{ description }}">
  {% if author %}<meta name="author" content="{{ author }}">
  {% endif %}<title>{% if title %}{{ title }} - {% endif %}{{ site_title }}</title>
  <link rel="alternate" type="application/rss+xml" title="{{ site_title }}" href="{{ base_url }}feed.xml">
  {% if has_mermaid %}<link rel="modulepreload" href="https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.esm.min.mjs">
  {% endif %}
  {% for style in styles %}<link rel="stylesheet" href="{{ style }}">
  {% endfor %}<link rel="stylesheet" href="{{ base_url }}assets/site.css">
</head>
<body>
  <header class="site-header">
    {% include "nav.html" %}
  </header>
  <main class="main">
    {% block content %}{% endblock %}
  </main>
  <footer class="site-footer">
    <p>{% if author %}{{ author }} · {% endif %}{{ site_title }} · <a href="{{ base_url }}feed.xml">RSS</a></p>
  </footer>
  <script src="{{ base_url }}assets/site.js"></script>
</body>
</html>"##;

const INDEX_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<section class="post-list">
  {% for post in posts %}
  <article class="post-entry">
    <h2><a href="{{ post.path }}">{{ post.title }}</a></h2>
    <time datetime="{{ post.date }}">{{ post.date_display }}</time>
    {% if post.excerpt %}<p>{{ post.excerpt }}</p>{% endif %}
  </article>
  {% else %}
  <p class="empty">Nothing published yet.</p>
  {% endfor %}
</section>
{% endblock %}"##;

const POST_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<article class="post">
  <header class="post-header">
    <h1>{{ title }}</h1>
    {% if date %}<time datetime="{{ date }}">{{ date }}</time>{% endif %}
    {% if tags %}
    <ul class="tags">
      {% for tag in tags %}<li>{{ tag }}</li>{% endfor %}
    </ul>
    {% endif %}
  </header>
  <div class="content">
    {{ content | safe }}
  </div>
</article>

{% if toc | length > 1 %}
<aside class="toc">
  <h2>On this page</h2>
  <ul>
  {% for entry in toc %}
    <li class="toc-level-{{ entry.level }}">
      <a href="#{{ entry.id }}">{{ entry.title }}</a>
    </li>
  {% endfor %}
  </ul>
</aside>
{% endif %}
{% endblock %}"##;

const PAGE_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<article class="page">
  <h1>{{ title }}</h1>
  <div class="content">
    {{ content | safe }}
  </div>
</article>
{% endblock %}"##;

const NAV_TEMPLATE: &str = r##"<a href="{{ base_url }}" class="site-title">{{ site_title }}</a>
<nav class="site-nav">
{% for item in nav %}  <a href="{{ item.path }}">{{ item.title }}</a>
{% endfor %}</nav>"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_a_post_page() {
        let engine = TemplateEngine::new();

        let mut ctx = Context::site("Feldner's Blog", "Notes", "", "/");
        ctx.title = "Going Static".to_string();
        ctx.content = "<p>Hello world</p>".to_string();
        ctx.date = Some("2023-04-12".to_string());
        ctx.tags = vec!["meta".to_string()];

        let html = engine.render_page("post.html", &ctx).unwrap();

        assert!(html.contains("<title>Going Static - Feldner's Blog</title>"));
        assert!(html.contains("<p>Hello world</p>"));
        assert!(html.contains(r#"<time datetime="2023-04-12">"#));
        assert!(html.contains("<li>meta</li>"));
    }

    #[test]
    fn renders_index_listing() {
        let engine = TemplateEngine::new();

        let mut ctx = Context::site("Blog", "Notes", "", "/");
        ctx.posts = vec![PostSummary {
            title: "First Post".to_string(),
            path: "/posts/first-post/".to_string(),
            date: "2023-01-01".to_string(),
            date_display: "January 1, 2023".to_string(),
            excerpt: Some("An opening.".to_string()),
            tags: vec![],
        }];

        let html = engine.render_page("index.html", &ctx).unwrap();

        assert!(html.contains(r#"<a href="/posts/first-post/">First Post</a>"#));
        assert!(html.contains("January 1, 2023"));
        assert!(html.contains("An opening."));
    }

    #[test]
    fn empty_index_still_renders() {
        let engine = TemplateEngine::new();

        let ctx = Context::site("Blog", "Notes", "", "/");

        let html = engine.render_page("index.html", &ctx).unwrap();

        assert!(html.contains("Nothing published yet."));
    }

    #[test]
    fn renders_navigation() {
        let engine = TemplateEngine::new();

        let mut ctx = Context::site("Blog", "Notes", "", "/");
        ctx.nav = vec![
            NavItem {
                title: "About".to_string(),
                path: "/about/".to_string(),
            },
            NavItem {
                title: "Projects".to_string(),
                path: "/projects/".to_string(),
            },
        ];

        let html = engine.render_page("page.html", &ctx).unwrap();

        assert!(html.contains(r#"<a href="/about/">About</a>"#));
        assert!(html.contains(r#"<a href="/projects/">Projects</a>"#));
    }
}
