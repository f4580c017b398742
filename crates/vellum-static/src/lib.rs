//! Static site builder for vellum blogs.
//!
//! Renders the posts and pages collections into a static site: an index
//! listing, per-post and per-page HTML, embedded assets, an RSS feed, and a
//! sitemap.

pub mod assets;
pub mod builder;
pub mod feed;
pub mod templates;

pub use builder::{BuildConfig, BuildError, BuildResult, SiteBuilder};
