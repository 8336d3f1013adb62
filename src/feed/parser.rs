use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::{Captures, Regex};
use tracing::debug;

use super::types::NewsItem;

/// Items accepted while scanning; the endpoint trims further.
pub(super) const MAX_EXTRACTED: usize = 20;
const EXCERPT_CHARS: usize = 120;

pub(super) const CATEGORY: &str = "Kochi Local";
pub(super) const SOURCE: &str = "Manorama Online";
pub(super) const LANGUAGE: &str = "en";

static ITEM_RE: LazyLock<Regex> = LazyLock::new(|| tag_regex("item"));
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| tag_regex("title"));
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| tag_regex("link"));
static DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| tag_regex("description"));
static PUB_DATE_RE: LazyLock<Regex> = LazyLock::new(|| tag_regex("pubDate"));

static CDATA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("static pattern"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static pattern"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static pattern"));
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(amp|lt|gt|quot|#39);").expect("static pattern"));

/// Non-greedy, case-insensitive `<tag ...>inner</tag>` matcher.
/// `<item>` is matched without attributes, the same as the feed emits it.
fn tag_regex(tag: &str) -> Regex {
    let pattern = if tag == "item" {
        r"(?is)<item>(.*?)</item>".to_string()
    } else {
        format!(r"(?is)<{tag}(?:\s[^>]*)?>(.*?)</{tag}>")
    };
    Regex::new(&pattern).expect("static pattern")
}

/// Extract up to [`MAX_EXTRACTED`] items from a raw RSS body.
///
/// Fragments without a title or link are skipped; extraction continues with
/// the next fragment.
pub(super) fn parse_items(xml: &str, now: DateTime<Utc>) -> Vec<NewsItem> {
    let millis = now.timestamp_millis();
    let mut items = Vec::new();

    for fragment in ITEM_RE.captures_iter(xml) {
        if items.len() >= MAX_EXTRACTED {
            break;
        }
        let body = fragment.get(1).map_or("", |m| m.as_str());

        let title = extract_tag(&TITLE_RE, body);
        let link = extract_tag(&LINK_RE, body);
        let (Some(title), Some(link)) = (title, link) else {
            debug!("skipping feed item without title or link");
            continue;
        };

        let title = decode_entities(&title);
        let description = extract_tag(&DESCRIPTION_RE, body)
            .map(|d| decode_entities(&d))
            .unwrap_or_default();
        let date = extract_tag(&PUB_DATE_RE, body)
            .and_then(|raw| parse_date(&raw))
            .unwrap_or(now);

        items.push(NewsItem {
            id: format!("manorama-{millis}-{}", items.len()),
            title,
            date: iso8601(date),
            excerpt: excerpt(&description),
            category: CATEGORY.to_string(),
            url: link,
            source: SOURCE.to_string(),
            language: LANGUAGE.to_string(),
            content: description,
            full_content: None,
        });
    }

    items
}

fn extract_tag(re: &Regex, fragment: &str) -> Option<String> {
    let inner = re.captures(fragment)?.get(1)?.as_str();
    let text = clean_text(inner);
    if text.is_empty() { None } else { Some(text) }
}

/// Unwrap CDATA, strip raw tags, collapse whitespace.
///
/// Entities are left alone: decoding happens afterwards so escaped text such
/// as `5 &lt; 10` is never mistaken for markup.
pub(super) fn clean_text(raw: &str) -> String {
    let unwrapped = CDATA_RE.replace_all(raw, "$1");
    let stripped = TAG_RE.replace_all(&unwrapped, "");
    WHITESPACE_RE.replace_all(&stripped, " ").trim().to_string()
}

/// Single pass over the five entities the feed uses, so `&amp;lt;` stays `&lt;`.
pub(super) fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| match &caps[1] {
            "amp" => "&",
            "lt" => "<",
            "gt" => ">",
            "quot" => "\"",
            _ => "'",
        })
        .into_owned()
}

/// First 120 characters plus an ellipsis; never longer than 123 characters.
pub(super) fn excerpt(description: &str) -> String {
    let mut out: String = description.chars().take(EXCERPT_CHARS).collect();
    out.push_str("...");
    out
}

pub(super) fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|d| d.with_timezone(&Utc))
        .inspect_err(|e| debug!(date = raw, error = %e, "unparseable pubDate, using fetch time"))
        .ok()
}

pub(super) fn iso8601(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 20, 8, 0, 0).unwrap()
    }

    fn rss(items: &str) -> String {
        format!(r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Kerala</title>{items}</channel></rss>"#)
    }

    fn item(n: usize) -> String {
        format!(
            "<item><title>Story {n}</title><link>https://example.com/{n}</link>\
             <description>Body {n}</description><pubDate>Mon, 20 Oct 2025 06:00:00 +0530</pubDate></item>"
        )
    }

    #[test]
    fn parses_standard_item() {
        let xml = rss(&item(1));
        let items = parse_items(&xml, now());

        assert_eq!(items.len(), 1);
        let first = &items[0];
        assert_eq!(first.title, "Story 1");
        assert_eq!(first.url, "https://example.com/1");
        assert_eq!(first.content, "Body 1");
        assert_eq!(first.excerpt, "Body 1...");
        assert_eq!(first.date, "2025-10-20T00:30:00.000Z");
        assert_eq!(first.category, "Kochi Local");
        assert_eq!(first.source, "Manorama Online");
        assert_eq!(first.language, "en");
        assert!(first.id.starts_with("manorama-"));
    }

    #[test]
    fn empty_channel_yields_no_items() {
        assert!(parse_items(&rss(""), now()).is_empty());
    }

    #[test]
    fn caps_extraction_at_twenty() {
        let body: String = (0..30).map(item).collect();
        let items = parse_items(&rss(&body), now());
        assert_eq!(items.len(), MAX_EXTRACTED);
        assert_eq!(items[19].title, "Story 19");
    }

    #[test]
    fn skips_items_missing_title_or_link() {
        let body = format!(
            "<item><link>https://example.com/x</link></item>\
             <item><title>No link</title></item>{}",
            item(3)
        );
        let items = parse_items(&rss(&body), now());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Story 3");
        assert!(items[0].id.ends_with("-0"));
    }

    #[test]
    fn missing_pub_date_uses_fetch_time() {
        let body = "<item><title>T</title><link>https://example.com</link></item>";
        let items = parse_items(&rss(body), now());
        assert_eq!(items[0].date, "2025-10-20T08:00:00.000Z");
        assert_eq!(items[0].content, "");
        assert_eq!(items[0].excerpt, "...");
    }

    #[test]
    fn unwraps_cdata_and_strips_markup() {
        let body = "<item><title><![CDATA[Rain <b>alert</b> in Kochi]]></title>\
                    <link>https://example.com/rain</link>\
                    <description><p>Heavy   rain</p>\n expected</description></item>";
        let items = parse_items(&rss(body), now());
        assert_eq!(items[0].title, "Rain alert in Kochi");
        assert_eq!(items[0].content, "Heavy rain expected");
    }

    #[test]
    fn escaped_comparisons_survive_cleaning() {
        let body = "<item><title>Fares: 5 &lt; 10 and 20 &gt; 3</title>\
                    <link>https://example.com/fares</link>\
                    <description>Rent &lt; Rs 10,000 near Kakkanad, deposit &gt; 2 months</description></item>";
        let items = parse_items(&rss(body), now());
        assert_eq!(items[0].title, "Fares: 5 < 10 and 20 > 3");
        assert_eq!(
            items[0].content,
            "Rent < Rs 10,000 near Kakkanad, deposit > 2 months"
        );
    }

    #[test]
    fn inline_markup_does_not_split_words() {
        assert_eq!(clean_text("Ko<b>chi</b> Metro"), "Kochi Metro");
        assert_eq!(clean_text("  <p>Fort\n\tKochi</p> "), "Fort Kochi");
    }

    #[test]
    fn excerpt_is_bounded() {
        let long = "മ".repeat(300);
        let out = excerpt(&long);
        assert_eq!(out.chars().count(), 123);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn decodes_fixed_entity_set_once() {
        assert_eq!(
            decode_entities("Tom &amp; Jerry &lt;3 &quot;hi&quot; it&#39;s &amp;lt;"),
            "Tom & Jerry <3 \"hi\" it's &lt;"
        );
        assert_eq!(decode_entities("&nbsp;&copy;"), "&nbsp;&copy;");
    }

    #[test]
    fn title_tag_does_not_match_longer_names() {
        let body = "<item><titlebar>x</titlebar><title>Real</title><link>https://e.com</link></item>";
        let items = parse_items(&rss(body), now());
        assert_eq!(items[0].title, "Real");
    }

    #[test]
    fn item_tag_is_case_insensitive() {
        let body = "<ITEM><TITLE>Upper</TITLE><LINK>https://e.com</LINK></ITEM>";
        let items = parse_items(&rss(body), now());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Upper");
    }
}
