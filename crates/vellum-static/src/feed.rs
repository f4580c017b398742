//! RSS 2.0 feed generation.

use chrono::{NaiveTime, TimeZone, Utc};
use rss::validation::Validate;
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder};

use vellum_content::{Entry, PostMatter};

use crate::builder::BuildConfig;

/// Errors that can occur when building the feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Feed validation failed: {0}")]
    Validation(String),
}

/// Build the RSS 2.0 feed XML for the published posts.
///
/// Posts are expected in listing order (newest first); every entry becomes
/// one item. `site_url` must be absolute, the validator rejects relative
/// links.
pub fn build_feed(
    site_url: &str,
    config: &BuildConfig,
    posts: &[Entry<PostMatter>],
) -> Result<String, FeedError> {
    let base = site_url.trim_end_matches('/');

    let items: Vec<rss::Item> = posts
        .iter()
        .map(|post| {
            let link = format!("{}{}posts/{}/", base, config.base_url, post.slug);
            let description = post
                .matter
                .excerpt
                .clone()
                .or_else(|| post.doc.derived_excerpt.clone());

            ItemBuilder::default()
                .title(Some(post.matter.title.clone()))
                .link(Some(link.clone()))
                .guid(Some(GuidBuilder::default().permalink(true).value(link).build()))
                .description(description)
                .pub_date(Some(rfc2822_midnight(post.matter.date)))
                .build()
        })
        .collect();

    let channel = ChannelBuilder::default()
        .title(&config.title)
        .link(format!("{}{}", base, config.base_url))
        .description(&config.description)
        .generator(Some("vellum".to_string()))
        .items(items)
        .build();

    channel
        .validate()
        .map_err(|e| FeedError::Validation(e.to_string()))?;

    Ok(channel.to_string())
}

/// RFC 2822 timestamp for a calendar date (midnight UTC).
fn rfc2822_midnight(date: chrono::NaiveDate) -> String {
    let dt = date.and_time(NaiveTime::MIN);
    Utc.from_utc_datetime(&dt).to_rfc2822()
}
