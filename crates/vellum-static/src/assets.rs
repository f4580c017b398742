//! Embedded site assets.

/// Asset pipeline utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// Generate the site CSS.
    pub fn generate_css() -> String {
        SITE_CSS.to_string()
    }

    /// Generate the site JavaScript.
    pub fn generate_js() -> String {
        SITE_JS.to_string()
    }

    /// Minify CSS using lightningcss.
    pub fn minify_css(css: &str) -> Result<String, String> {
        use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

        let stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| format!("CSS parse error: {}", e))?;

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..Default::default()
            })
            .map_err(|e| format!("CSS minify error: {}", e))?;

        Ok(minified.code)
    }
}

const SITE_CSS: &str = r#"/* vellum default theme */

:root {
  --content-width: 42rem;
  --background: #fffdf8;
  --foreground: #2a2a28;
  --muted: #6b6b66;
  --accent: #2f6f4f;
  --accent-hover: #245a3f;
  --border: #e4e0d6;
  --code-bg: #f4f1e9;
  --radius: 0.375rem;
  --font-sans: system-ui, -apple-system, sans-serif;
  --font-mono: ui-monospace, "SF Mono", monospace;
}

@media (prefers-color-scheme: dark) {
  :root {
    --background: #1b1b19;
    --foreground: #e8e6df;
    --muted: #9a988f;
    --accent: #7fbf9c;
    --accent-hover: #9ed2b4;
    --border: #33322e;
    --code-bg: #242421;
  }
}

* {
  box-sizing: border-box;
  margin: 0;
  padding: 0;
}

body {
  font-family: var(--font-sans);
  background: var(--background);
  color: var(--foreground);
  line-height: 1.65;
}

.site-header {
  display: flex;
  align-items: baseline;
  justify-content: space-between;
  max-width: var(--content-width);
  margin: 0 auto;
  padding: 1.5rem 1rem;
  border-bottom: 1px solid var(--border);
}

.site-title {
  font-weight: 700;
  font-size: 1.25rem;
  color: var(--foreground);
  text-decoration: none;
}

.site-nav a {
  margin-left: 1rem;
  color: var(--muted);
  text-decoration: none;
}

.site-nav a:hover,
.site-nav a.active {
  color: var(--accent);
}

.main {
  max-width: var(--content-width);
  margin: 0 auto;
  padding: 2rem 1rem;
}

/* Post listing */
.post-entry {
  margin-bottom: 2rem;
}

.post-entry h2 {
  font-size: 1.35rem;
  margin-bottom: 0.25rem;
}

.post-entry h2 a {
  color: var(--foreground);
  text-decoration: none;
}

.post-entry h2 a:hover {
  color: var(--accent);
}

.post-entry time {
  font-size: 0.875rem;
  color: var(--muted);
}

.post-entry p {
  margin-top: 0.5rem;
}

/* Posts and pages */
.post-header {
  margin-bottom: 2rem;
}

.post-header h1,
.page h1 {
  font-size: 2rem;
  line-height: 1.2;
  margin-bottom: 0.5rem;
}

.post-header time {
  color: var(--muted);
  font-size: 0.875rem;
}

.tags {
  list-style: none;
  display: flex;
  gap: 0.5rem;
  margin-top: 0.5rem;
}

.tags li {
  font-size: 0.75rem;
  color: var(--accent);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 0.1rem 0.5rem;
}

.content h2 {
  font-size: 1.5rem;
  margin: 2rem 0 1rem;
}

.content h3 {
  font-size: 1.2rem;
  margin: 1.5rem 0 0.75rem;
}

.content p,
.content ul,
.content ol {
  margin-bottom: 1rem;
}

.content ul,
.content ol {
  padding-left: 1.5rem;
}

.content a {
  color: var(--accent);
  text-underline-offset: 3px;
}

.content a:hover {
  color: var(--accent-hover);
}

.content img {
  max-width: 100%;
  border-radius: var(--radius);
}

.content blockquote {
  border-left: 3px solid var(--accent);
  padding-left: 1rem;
  color: var(--muted);
  margin-bottom: 1rem;
}

.content hr {
  border: 0;
  border-top: 1px solid var(--border);
  margin: 2rem 0;
}

.content table {
  border-collapse: collapse;
  margin-bottom: 1rem;
  width: 100%;
}

.content th,
.content td {
  border: 1px solid var(--border);
  padding: 0.4rem 0.75rem;
  text-align: left;
}

/* Code */
.content pre {
  background: var(--code-bg);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 1rem;
  overflow-x: auto;
  font-family: var(--font-mono);
  font-size: 0.875rem;
  margin-bottom: 1rem;
  position: relative;
}

.content code {
  font-family: var(--font-mono);
  font-size: 0.875em;
  background: var(--code-bg);
  padding: 0.125rem 0.3rem;
  border-radius: 0.25rem;
}

.content pre code {
  background: none;
  padding: 0;
}

/* Mermaid diagrams keep their own text rendering */
.content pre.mermaid {
  background: none;
  border: none;
  text-align: center;
}

.copy-btn {
  position: absolute;
  top: 0.5rem;
  right: 0.5rem;
  padding: 0.2rem 0.6rem;
  font-size: 0.75rem;
  background: var(--background);
  color: var(--muted);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  cursor: pointer;
}

.copy-btn:hover {
  color: var(--accent);
}

/* TOC */
.toc {
  margin-top: 2rem;
  border-top: 1px solid var(--border);
  padding-top: 1rem;
}

.toc h2 {
  font-size: 0.75rem;
  text-transform: uppercase;
  letter-spacing: 0.05em;
  color: var(--muted);
  margin-bottom: 0.5rem;
}

.toc ul {
  list-style: none;
}

.toc a {
  font-size: 0.875rem;
  color: var(--muted);
  text-decoration: none;
}

.toc a:hover {
  color: var(--accent);
}

.toc-level-3 {
  padding-left: 1rem;
}

.toc-level-4 {
  padding-left: 2rem;
}

.site-footer {
  max-width: var(--content-width);
  margin: 0 auto;
  padding: 1.5rem 1rem;
  border-top: 1px solid var(--border);
  color: var(--muted);
  font-size: 0.875rem;
}

.site-footer a {
  color: var(--muted);
}
"#;

const SITE_JS: &str = r#"// vellum site runtime
(function() {
  'use strict';

  // Highlight current nav item
  const currentPath = window.location.pathname;
  document.querySelectorAll('.site-nav a').forEach(link => {
    const href = link.getAttribute('href');
    if (href === currentPath || (href !== '/' && currentPath.startsWith(href))) {
      link.classList.add('active');
    }
  });

  // Copy button for code blocks (not diagrams)
  document.querySelectorAll('.content pre:not(.mermaid)').forEach(pre => {
    if (pre.querySelector('.copy-btn')) return;

    const btn = document.createElement('button');
    btn.className = 'copy-btn';
    btn.textContent = 'Copy';
    btn.setAttribute('type', 'button');

    btn.addEventListener('click', async () => {
      const code = pre.querySelector('code');
      const text = code ? code.textContent : pre.textContent;

      try {
        await navigator.clipboard.writeText(text || '');
        btn.textContent = 'Copied!';
        setTimeout(() => { btn.textContent = 'Copy'; }, 2000);
      } catch (err) {
        btn.textContent = 'Error';
        setTimeout(() => { btn.textContent = 'Copy'; }, 2000);
      }
    });

    pre.appendChild(btn);
  });

  // Mermaid diagrams: load the runtime only when a page has one
  if (document.querySelector('pre.mermaid')) {
    const theme = window.matchMedia('(prefers-color-scheme: dark)').matches
      ? 'dark'
      : 'neutral';

    import('https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.esm.min.mjs')
      .then(({ default: mermaid }) => {
        mermaid.initialize({ startOnLoad: false, theme: theme });
        mermaid.run({ querySelector: 'pre.mermaid' });
      })
      .catch(err => {
        console.error('mermaid failed to load:', err);
      });
  }
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_css() {
        let css = AssetPipeline::generate_css();
        assert!(css.contains(":root"));
        assert!(css.contains("--accent"));
        assert!(css.contains("pre.mermaid"));
    }

    #[test]
    fn generates_js_with_mermaid_init() {
        let js = AssetPipeline::generate_js();
        assert!(js.contains("mermaid.initialize"));
        assert!(js.contains("clipboard"));
    }

    #[test]
    fn minifies_css() {
        let css = r#"
.post-entry {
    background-color: blue;
    padding: 10px;
}
        "#;

        let minified = AssetPipeline::minify_css(css).unwrap();

        assert!(!minified.contains('\n'));
        assert!(minified.contains(".post-entry"));
    }
}
