//! Format-tolerant item extraction for the multi-source aggregator.
//!
//! Each feed is tried as RSS 2.0, then Atom, then a loose scan that accepts
//! either element with attributes. The first strategy that yields anything wins.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use regex::{Captures, Regex};

use super::parser::{clean_text, iso8601, parse_date};
use super::types::NewsItem;

const ITEMS_PER_STRATEGY: usize = 15;
const EXCERPT_CHARS: usize = 160;
const CONTENT_CHARS: usize = 500;
const ID_SUFFIX_LEN: usize = 7;

const KNOWN_TAGS: &[&str] = &[
    "title",
    "link",
    "guid",
    "description",
    "summary",
    "content",
    "content:encoded",
    "pubDate",
    "dc:date",
    "updated",
    "published",
];

const SOURCES: &[(&str, &str)] = &[
    ("bbc", "BBC News"),
    ("cnn", "CNN"),
    ("reuters", "Reuters"),
    ("timesofindia", "Times of India"),
    ("hindustantimes", "Hindustan Times"),
    ("indianexpress", "Indian Express"),
    ("onmanorama", "Manorama Online"),
    ("mathrubhumi", "Mathrubhumi"),
    ("asianetnews", "Asianet News"),
];
const UNKNOWN_SOURCE: &str = "News Source";

const CATEGORIES: &[(&[&str], &str)] = &[
    (&["kochi", "ernakulam"], "Kochi Local"),
    (&["kerala", "trivandrum", "thiruvananthapuram"], "Kerala"),
    (&["india", "delhi", "mumbai"], "India"),
    (&["tech", "software", "ai", "artificial intelligence"], "Technology"),
    (&["sports", "cricket", "football"], "Sports"),
    (&["business", "economy", "market"], "Business"),
    (&["health", "medical", "hospital"], "Health"),
    (&["education", "school", "college"], "Education"),
    (&["weather", "rain", "monsoon"], "Weather"),
    (&["politics", "election", "minister"], "Politics"),
];
const DEFAULT_CATEGORY: &str = "General";

static RSS_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<item>(.*?)</item>").expect("static pattern"));
static ATOM_ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<entry>(.*?)</entry>").expect("static pattern"));
static LOOSE_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<item[^>]*>.*?</item>|<entry[^>]*>.*?</entry>").expect("static pattern")
});
static ATOM_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<link[^>]*href="([^"]*)"[^>]*/?>"#).expect("static pattern"));
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("static pattern")
});

struct TagPatterns {
    element: Regex,
    href: Regex,
}

static TAGS: LazyLock<HashMap<&'static str, TagPatterns>> = LazyLock::new(|| {
    KNOWN_TAGS
        .iter()
        .map(|&tag| {
            let name = regex::escape(tag);
            let patterns = TagPatterns {
                element: Regex::new(&format!(r"(?is)<{name}(?:\s[^>]*)?>(.*?)</{name}>"))
                    .expect("static pattern"),
                href: Regex::new(&format!(r#"(?i)<{name}\s[^>]*href=["']([^"']+)["'][^>]*/?>"#))
                    .expect("static pattern"),
            };
            (tag, patterns)
        })
        .collect()
});

/// Raw, undecoded fields pulled out of one item or entry.
struct Fields {
    title: String,
    link: Option<String>,
    summary: Option<String>,
    body: Option<String>,
    date: Option<String>,
}

/// Parse a feed body with the first strategy that yields items.
pub(super) fn parse_feed(xml: &str, feed_url: &str, now: DateTime<Utc>) -> Vec<NewsItem> {
    let strategies: [fn(&str) -> Vec<Fields>; 3] = [rss_items, atom_entries, loose_items];

    strategies
        .iter()
        .map(|strategy| strategy(xml))
        .find(|fields| !fields.is_empty())
        .unwrap_or_default()
        .into_iter()
        .map(|fields| build_item(fields, feed_url, now))
        .collect()
}

fn rss_items(xml: &str) -> Vec<Fields> {
    RSS_ITEM_RE
        .captures_iter(xml)
        .filter_map(|caps| {
            let body = caps.get(1)?.as_str();
            Some(Fields {
                title: extract_value(body, &["title"])?,
                link: extract_value(body, &["link"]).or_else(|| extract_value(body, &["guid"])),
                summary: extract_value(body, &["description"]),
                body: extract_value(body, &["content:encoded"]),
                date: extract_value(body, &["pubDate", "dc:date"]),
            })
        })
        .take(ITEMS_PER_STRATEGY)
        .collect()
}

fn atom_entries(xml: &str) -> Vec<Fields> {
    ATOM_ENTRY_RE
        .captures_iter(xml)
        .filter_map(|caps| {
            let body = caps.get(1)?.as_str();
            Some(Fields {
                title: extract_value(body, &["title"])?,
                link: ATOM_LINK_RE
                    .captures(body)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string()),
                summary: extract_value(body, &["summary"]),
                body: extract_value(body, &["content"]),
                date: extract_value(body, &["updated", "published"]),
            })
        })
        .take(ITEMS_PER_STRATEGY)
        .collect()
}

/// Last resort: any `<item ...>` or `<entry ...>` block, first fifteen only.
fn loose_items(xml: &str) -> Vec<Fields> {
    LOOSE_ITEM_RE
        .find_iter(xml)
        .take(ITEMS_PER_STRATEGY)
        .filter_map(|m| {
            let block = m.as_str();
            Some(Fields {
                title: extract_value(block, &["title"])?,
                link: extract_value(block, &["link", "guid"]),
                summary: extract_value(block, &["description", "summary"]),
                body: extract_value(block, &["content:encoded", "content"]),
                date: extract_value(block, &["pubDate", "dc:date", "updated"]),
            })
        })
        .collect()
}

/// First non-empty value among `tags`, as element text or an `href` attribute.
fn extract_value(fragment: &str, tags: &[&str]) -> Option<String> {
    tags.iter().find_map(|tag| {
        let patterns = TAGS.get(*tag)?;
        if let Some(inner) = patterns.element.captures(fragment).and_then(|c| c.get(1)) {
            let text = clean_text(inner.as_str());
            return (!text.is_empty()).then_some(text);
        }
        patterns
            .href
            .captures(fragment)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    })
}

fn build_item(fields: Fields, feed_url: &str, now: DateTime<Utc>) -> NewsItem {
    let Fields {
        title,
        link,
        summary,
        body,
        date,
    } = fields;

    let title = decode_html_entities(&title);
    let summary = summary.map(|s| decode_html_entities(&s));
    let full = body
        .map(|b| decode_html_entities(&b))
        .or_else(|| summary.clone())
        .unwrap_or_else(|| title.clone());

    let mut excerpt: String = summary
        .as_deref()
        .unwrap_or(&title)
        .chars()
        .take(EXCERPT_CHARS)
        .collect();
    excerpt.push_str("...");

    let mut content: String = full.chars().take(CONTENT_CHARS).collect();
    if full.chars().count() > CONTENT_CHARS {
        content.push_str("...");
    }

    let date = date.as_deref().and_then(parse_date).unwrap_or(now);

    NewsItem {
        id: format!("news-{}-{}", now.timestamp_millis(), random_suffix()),
        category: categorize(&title, summary.as_deref()).to_string(),
        title,
        date: iso8601(date),
        excerpt,
        url: link
            .filter(|l| l.starts_with("http"))
            .unwrap_or_else(|| "#".to_string()),
        source: source_name(feed_url).to_string(),
        language: "en".to_string(),
        content,
        full_content: Some(full),
    }
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Publisher name by substring of the feed URL.
pub(super) fn source_name(feed_url: &str) -> &'static str {
    SOURCES
        .iter()
        .find(|(key, _)| feed_url.contains(key))
        .map_or(UNKNOWN_SOURCE, |&(_, name)| name)
}

/// First category whose keyword appears in the title or summary.
///
/// Plain substring match, so short keywords like `ai` also hit inside words.
pub(super) fn categorize(title: &str, summary: Option<&str>) -> &'static str {
    let text = format!("{} {}", title, summary.unwrap_or_default()).to_lowercase();
    CATEGORIES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
        .map_or(DEFAULT_CATEGORY, |&(_, label)| label)
}

/// Named entities common in news feeds plus decimal and hex references.
/// Unknown or invalid references are left as written.
pub(super) fn decode_html_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            let decoded = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => name
                    .strip_prefix("#x")
                    .or_else(|| name.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| name.strip_prefix('#').map(str::parse::<u32>))
                    .and_then(Result::ok)
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}
