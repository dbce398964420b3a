//! Extraction module tests
//!
//! These tests drive the full parse pipeline with in-memory fetchers and a
//! local mock HTTP server.

use async_trait::async_trait;
use message_parser::error::FetchError;
use message_parser::extraction::{
    normalize, HttpFetcher, Link, LinkResolver, MessageInfo, MessageParser, PageFetcher,
    PatternExtractor, FALLBACK_TITLE,
};
use pretty_assertions::assert_eq;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Canned pages keyed by the URL actually requested; anything else is a
/// connection failure. Each fetch sleeps for a random 0-40ms.
struct PageMap {
    pages: HashMap<String, String>,
}

impl PageMap {
    fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, body)| (url.to_string(), body.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl PageFetcher for PageMap {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let delay = rand::rng().random_range(0..40);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Connect {
                url: url.to_string(),
                message: "connection refused".to_string(),
            })
    }
}

fn parser(pages: PageMap) -> MessageParser {
    MessageParser::new(LinkResolver::new(Arc::new(pages), 8))
}

fn as_set(values: &[String]) -> HashSet<&str> {
    values.iter().map(String::as_str).collect()
}

#[tokio::test]
async fn test_simple_message() {
    let info = parser(PageMap::new(&[(
        "http://google.com",
        "response <title>Google</title>",
    )]))
    .parse("@asd http://google.com/ (sss)")
    .await;

    assert_eq!(
        info,
        MessageInfo::aggregate(
            vec!["asd".to_string()],
            vec!["sss".to_string()],
            vec![Link::new("http://google.com", "Google")],
        )
    );
}

#[tokio::test]
async fn test_emoticons_only() {
    let info = parser(PageMap::new(&[]))
        .parse("(sda)(), asd, (sads( sas), (абвгд) (morethanfifteencharactersemoticon)")
        .await;

    assert_eq!(info.emoticons, vec!["sda"]);
    assert!(info.mentions.is_empty());
    assert!(info.links.is_empty());
}

#[tokio::test]
async fn test_mentions_only() {
    let info = parser(PageMap::new(&[]))
        .parse("@@asd, @SDlds@asd, @asdasd")
        .await;

    assert_eq!(
        as_set(&info.mentions),
        HashSet::from(["asd", "SDlds", "asdasd"])
    );
    assert_eq!(info.mentions.len(), 3);
    assert!(info.emoticons.is_empty());
}

#[tokio::test]
async fn test_links_with_titles_and_fallbacks() {
    let info = parser(PageMap::new(&[
        ("http://foo", "Foo site without title"),
        ("http://google.com", "vlsvddv <title>Google</title> asdsa"),
        ("http://site.com", "<title id=123>Site</title> asdasd"),
        (
            "http://example.com/asd?sd=wd%2Fsd",
            "<title>いくつかのテキスト</title>",
        ),
        (
            "http://xn--e1aqbiajf.xn--p1ai",
            "<title \n id=3 >Торрент треккер</title>",
        ),
    ]))
    .parse(
        "Emxample http://foo. http://google.com http://site.com/ \
         http://example.com/asd?sd=wd%2Fsd http://торрент.рф http://unreachable.test",
    )
    .await;

    assert_eq!(
        info.links,
        vec![
            Link::new("http://foo", FALLBACK_TITLE),
            Link::new("http://google.com", "Google"),
            Link::new("http://site.com", "Site"),
            Link::new("http://example.com/asd?sd=wd%2Fsd", "いくつかのテキスト"),
            Link::new("http://торрент.рф", "Торрент треккер"),
            Link::new("http://unreachable.test", FALLBACK_TITLE),
        ]
    );
}

#[tokio::test]
async fn test_reported_url_normalizes_to_fetched_url() {
    let info = parser(PageMap::new(&[(
        "http://xn--e1aqbiajf.xn--p1ai",
        "<title>T</title>",
    )]))
    .parse("http://торрент.рф")
    .await;

    // The reported url is the literal match; normalizing it gives the fetched url
    assert_eq!(
        normalize(&info.links[0].url).unwrap(),
        "http://xn--e1aqbiajf.xn--p1ai"
    );
    assert_eq!(info.links[0].title, "T");
}

#[tokio::test]
async fn test_positional_correctness_under_random_latency() {
    let pages: Vec<(String, String)> = (0..40)
        .map(|i| {
            let body = if i % 3 == 0 {
                "no title here".to_string()
            } else {
                format!("<title>Page {i}</title>")
            };
            (format!("http://host{i}.example/p"), body)
        })
        .collect();
    let page_refs: Vec<(&str, &str)> = pages
        .iter()
        .map(|(u, b)| (u.as_str(), b.as_str()))
        .collect();

    // Duplicates and failures interleaved with successes
    let mut raw_links: Vec<String> = pages.iter().map(|(u, _)| u.clone()).collect();
    raw_links.push("http://host1.example/p".to_string());
    raw_links.insert(5, "http://missing.example/x".to_string());

    let resolver = LinkResolver::new(Arc::new(PageMap::new(&page_refs)), 6);
    let concurrent = resolver
        .resolve(&raw_links, &CancellationToken::new())
        .await;

    let mut sequential = Vec::with_capacity(raw_links.len());
    for raw in &raw_links {
        sequential.push(resolver.resolve_one(raw).await);
    }

    assert_eq!(concurrent.len(), raw_links.len());
    assert_eq!(concurrent, sequential);
    for (link, raw) in concurrent.iter().zip(&raw_links) {
        assert_eq!(&link.url, raw);
    }
}

#[tokio::test]
async fn test_empty_message_has_stable_shape() {
    let info = parser(PageMap::new(&[])).parse("nothing to see here").await;
    let json = serde_json::to_value(&info).unwrap();

    assert_eq!(
        json,
        serde_json::json!({ "mentions": [], "emoticons": [], "links": [] })
    );
}

#[tokio::test]
async fn test_mention_dedup_any_count() {
    for k in 1..=5 {
        let text = vec!["@repeat"; k].join(" and ");
        let info = parser(PageMap::new(&[])).parse(&text).await;
        assert_eq!(info.mentions, vec!["repeat"], "k = {k}");
    }
}

#[test]
fn test_extractor_is_synchronous() {
    let extracted = PatternExtractor::extract("@a (b) http://c.com/d");
    assert_eq!(extracted.links, vec!["http://c.com/d"]);
}

#[tokio::test]
async fn test_http_fetcher_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/google"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Google</title>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tracker"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<html><title id="3">Torrent Tracker</title></html>"#)
                .set_delay(Duration::from_millis(150)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_string("no title"))
        .mount(&server)
        .await;

    // Bound then released: nothing listens here
    let refused_port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let fetcher = HttpFetcher::new(Duration::from_secs(5), 1024 * 1024).unwrap();
    let parser = MessageParser::new(LinkResolver::new(Arc::new(fetcher), 4));

    let base = server.uri();
    let refused = format!("http://127.0.0.1:{refused_port}/down");
    let text = format!("@me {base}/tracker then {base}/google {refused} {base}/plain (ok)");
    let info = parser.parse(&text).await;

    assert_eq!(
        info.links,
        vec![
            Link::new(format!("{base}/tracker"), "Torrent Tracker"),
            Link::new(format!("{base}/google"), "Google"),
            Link::new(refused, FALLBACK_TITLE),
            Link::new(format!("{base}/plain"), FALLBACK_TITLE),
        ]
    );
    assert_eq!(info.mentions, vec!["me"]);
    assert_eq!(info.emoticons, vec!["ok"]);
}
