use serde::Serialize;

/// A normalized news entry as served to the front end.
///
/// `id` is derived from the fetch time and the item's position, so it is not
/// stable across fetches and must not be used for deduplication.
#[derive(Debug, Clone, Serialize)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub date: String,
    pub excerpt: String,
    pub category: String,
    pub url: String,
    pub source: String,
    pub language: String,
    pub content: String,
    /// Untruncated body; only the multi-source aggregator fills it in.
    #[serde(rename = "fullContent", skip_serializing_if = "Option::is_none")]
    pub full_content: Option<String>,
}
