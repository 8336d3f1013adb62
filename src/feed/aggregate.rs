use std::collections::HashSet;
use std::time::{Duration, Instant};

use chrono::{Duration as ChronoDuration, Utc};
use futures::future::join_all;
use parking_lot::Mutex;
use reqwest::Client;
use tracing::{debug, info, warn};

use super::types::NewsItem;
use super::{FeedError, download, formats, looks_like_xml, parser};

pub const DEFAULT_NEWS_FEEDS: &[&str] = &[
    "https://feeds.bbci.co.uk/news/world/rss.xml",
    "https://rss.cnn.com/rss/edition.rss",
    "https://feeds.reuters.com/reuters/topNews",
    "https://timesofindia.indiatimes.com/rssfeedstopstories.cms",
    "https://www.hindustantimes.com/feeds/rss/latest/rssfeed.xml",
    "https://indianexpress.com/feed/",
    "https://www.onmanorama.com/news/kerala.feed",
    "https://www.mathrubhumi.com/rss/kerala.rss",
    "https://english.mathrubhumi.com/rss/kerala-news.xml",
    "https://www.asianetnews.com/rss/kerala",
];

/// Only the first feeds of the configured list are queried per refresh.
const FEEDS_QUERIED: usize = 8;
const ITEMS_PER_FEED: usize = 10;
const FEED_TIMEOUT: Duration = Duration::from_secs(10);
const CACHE_TTL: Duration = Duration::from_secs(10 * 60);
/// Items returned after merging every feed.
pub const MAX_AGGREGATED: usize = 25;
const DEDUP_KEY_CHARS: usize = 40;

struct CachedNews {
    fetched: Instant,
    items: Vec<NewsItem>,
}

/// Merges several publishers' feeds into one newest-first list.
///
/// A successful merge is cached for ten minutes. When no feed produces
/// anything the two built-in headlines are served and nothing is cached.
pub struct NewsAggregator {
    http: Client,
    feeds: Vec<String>,
    feed_timeout: Duration,
    cache: Mutex<Option<CachedNews>>,
}

impl NewsAggregator {
    pub fn new(http: Client, feeds: Vec<String>) -> Self {
        Self {
            http,
            feeds,
            feed_timeout: FEED_TIMEOUT,
            cache: Mutex::new(None),
        }
    }

    pub fn with_feed_timeout(mut self, timeout: Duration) -> Self {
        self.feed_timeout = timeout;
        self
    }

    pub async fn latest(&self) -> Vec<NewsItem> {
        if let Some(items) = self.cached() {
            debug!(items = items.len(), "serving cached headlines");
            return items;
        }

        let collected = self.collect().await;
        if collected.is_empty() {
            warn!("no news feed succeeded, serving fallback headlines");
            return merge(fallback_headlines());
        }

        let items = merge(collected);
        *self.cache.lock() = Some(CachedNews {
            fetched: Instant::now(),
            items: items.clone(),
        });
        info!(items = items.len(), "headlines refreshed");
        items
    }

    fn cached(&self) -> Option<Vec<NewsItem>> {
        self.cache
            .lock()
            .as_ref()
            .filter(|c| c.fetched.elapsed() < CACHE_TTL)
            .map(|c| c.items.clone())
    }

    async fn collect(&self) -> Vec<NewsItem> {
        let fetches = self
            .feeds
            .iter()
            .take(FEEDS_QUERIED)
            .map(|url| fetch_feed(&self.http, url, self.feed_timeout));
        let outcomes = join_all(fetches).await;

        let mut items = Vec::new();
        for (url, outcome) in self.feeds.iter().zip(outcomes) {
            match outcome {
                Ok(feed_items) => {
                    debug!(url = %url, items = feed_items.len(), "feed collected");
                    items.extend(feed_items);
                }
                Err(e) => warn!(url = %url, error = %e, "feed skipped"),
            }
        }
        items
    }
}

async fn fetch_feed(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<Vec<NewsItem>, FeedError> {
    let xml = tokio::time::timeout(timeout, download(client, url))
        .await
        .unwrap_or(Err(FeedError::Timeout(timeout)))?;

    if !looks_like_xml(&xml) {
        return Err(FeedError::NotXml);
    }

    let mut items = formats::parse_feed(&xml, url, Utc::now());
    items.truncate(ITEMS_PER_FEED);
    Ok(items)
}

/// Drop repeated headlines, sort newest first, cap at [`MAX_AGGREGATED`].
///
/// The first occurrence of a headline wins, so earlier feeds take priority.
fn merge(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    let mut unique: Vec<NewsItem> = items
        .into_iter()
        .filter(|item| seen.insert(dedup_key(&item.title)))
        .collect();

    // Every date is rendered by the same ISO formatter, so text order is time order.
    unique.sort_by(|a, b| b.date.cmp(&a.date));
    unique.truncate(MAX_AGGREGATED);
    unique
}

fn dedup_key(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .take(DEDUP_KEY_CHARS)
        .collect()
}

fn fallback_headlines() -> Vec<NewsItem> {
    let now = Utc::now();
    vec![
        NewsItem {
            id: "fallback-1".to_string(),
            title: "Kochi Metro Extension to Kakkanad Approved by State Government".to_string(),
            date: parser::iso8601(now),
            excerpt: "The long-awaited Metro expansion will connect the IT hub of Kakkanad with the city center, reducing travel time significantly.".to_string(),
            category: parser::CATEGORY.to_string(),
            url: "#".to_string(),
            source: "Smart City News".to_string(),
            language: parser::LANGUAGE.to_string(),
            content: "The project, spanning 11 km and 11 stations, is expected to reduce congestion and improve connectivity for thousands of tech professionals. The extension will pass through major residential and commercial areas, providing a much-needed public transport solution for the growing population.".to_string(),
            full_content: Some("The Kochi Metro Rail Corporation has received final approval from the state government for the much-anticipated extension to Kakkanad. The 11-kilometer stretch will include 11 new stations connecting the city center to the IT hub. This project is expected to be completed within three years and will significantly reduce traffic congestion in the area. The extension will serve major tech parks, residential complexes, and commercial centers, providing seamless connectivity for daily commuters.".to_string()),
        },
        NewsItem {
            id: "fallback-2".to_string(),
            title: "Smart City Kochi Launches Urban Command Center".to_string(),
            date: parser::iso8601(now - ChronoDuration::hours(2)),
            excerpt: "A step toward making Kochi one of India's most digitally managed cities with real-time monitoring of urban services.".to_string(),
            category: parser::CATEGORY.to_string(),
            url: "#".to_string(),
            source: "Smart City Mission".to_string(),
            language: parser::LANGUAGE.to_string(),
            content: "The integrated control center will monitor traffic, utilities, and emergency services, marking a major leap in Kochi's smart city transformation. The facility uses AI and IoT sensors to optimize urban management.".to_string(),
            full_content: Some("Kochi Smart City Mission today inaugurated the Integrated Urban Command Center, a state-of-the-art facility that will monitor and manage city services in real-time. The center uses artificial intelligence, Internet of Things sensors, and data analytics to optimize traffic flow, utility distribution, and emergency response systems. This initiative positions Kochi as a leader in urban digital transformation in India. The command center will coordinate with various municipal departments to ensure efficient service delivery and quick response to citizen needs.".to_string()),
        },
    ]
}
