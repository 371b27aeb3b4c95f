use common::{NewsConfig, SafeSearch};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{NewsItem, NewsProvider, SearchHit, TIME_WINDOW};
use crate::error::BriefError;

/// Upper bound on `news.js` pages requested for one topic
pub const MAX_PAGES: usize = 5;

/// News search backed by DuckDuckGo's `news.js` endpoint
#[derive(Debug, Clone)]
pub struct DuckDuckGoNews {
    base_url: String,
    region: String,
    safesearch: SafeSearch,
    timeout: Duration,
    sessions: Arc<SessionCounters>,
}

/// Sessions opened over the provider's lifetime and sessions still live
#[derive(Debug, Default)]
struct SessionCounters {
    opened: AtomicUsize,
    live: AtomicUsize,
}

impl DuckDuckGoNews {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            region: common::DEFAULT_NEWS_REGION.to_string(),
            safesearch: SafeSearch::default(),
            timeout: Duration::from_secs(common::DEFAULT_NEWS_TIMEOUT_SECONDS),
            sessions: Arc::new(SessionCounters::default()),
        }
    }

    pub fn with_options(
        mut self,
        region: impl Into<String>,
        safesearch: SafeSearch,
        timeout_secs: u64,
    ) -> Self {
        self.region = region.into();
        self.safesearch = safesearch;
        self.timeout = Duration::from_secs(timeout_secs);
        self
    }

    pub fn from_config(cfg: &NewsConfig) -> Self {
        Self::new(cfg.base_url()).with_options(cfg.region(), cfg.safesearch(), cfg.timeout_seconds())
    }

    /// Number of sessions opened so far
    pub fn sessions_opened(&self) -> usize {
        self.sessions.opened.load(Ordering::SeqCst)
    }

    /// Number of sessions not yet released
    pub fn live_sessions(&self) -> usize {
        self.sessions.live.load(Ordering::SeqCst)
    }

    /// Open a session scoped to one fetch. It is released when dropped.
    fn open_session(&self) -> Result<NewsSession<'_>, BriefError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent("Newsbrief/0.1.0")
            .build()
            .map_err(|e| BriefError::ProviderUnavailable(format!("failed to build HTTP client: {}", e)))?;

        self.sessions.opened.fetch_add(1, Ordering::SeqCst);
        self.sessions.live.fetch_add(1, Ordering::SeqCst);
        debug!(base_url = %self.base_url, "news session opened");
        Ok(NewsSession {
            provider: self,
            client,
            opened_at: Instant::now(),
        })
    }
}

#[async_trait::async_trait]
impl NewsProvider for DuckDuckGoNews {
    async fn fetch(&self, topic: &str, max_results: usize) -> Result<Vec<NewsItem>, BriefError> {
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let session = self.open_session()?;
        let hits = session.search(topic, max_results).await;
        drop(session);

        let items: Vec<NewsItem> = hits?.into_iter().map(NewsItem::from).collect();
        info!(topic, count = items.len(), "news fetch complete");
        Ok(items)
    }
}

/// Live connection state for one search; dropping it closes the session.
struct NewsSession<'a> {
    provider: &'a DuckDuckGoNews,
    client: Client,
    opened_at: Instant,
}

impl Drop for NewsSession<'_> {
    fn drop(&mut self) {
        self.provider.sessions.live.fetch_sub(1, Ordering::SeqCst);
        debug!(
            elapsed_ms = self.opened_at.elapsed().as_millis() as u64,
            "news session closed"
        );
    }
}

impl NewsSession<'_> {
    /// Get the per-query `vqd` token DuckDuckGo requires on `news.js`.
    async fn vqd(&self, topic: &str) -> Result<String, BriefError> {
        let url = format!("{}/", self.provider.base_url);
        let body = self.get_text(&url, &[("q", topic.to_string())]).await?;

        extract_vqd(&body).ok_or_else(|| {
            BriefError::ProviderUnavailable(format!("no vqd token in search page for '{}'", topic))
        })
    }

    async fn search(&self, topic: &str, max_results: usize) -> Result<Vec<SearchHit>, BriefError> {
        let vqd = self.vqd(topic).await?;
        let url = format!("{}/news.js", self.provider.base_url);

        let mut params = vec![
            ("l", self.provider.region.clone()),
            ("o", "json".to_string()),
            ("noamp", "1".to_string()),
            ("q", topic.to_string()),
            ("vqd", vqd),
            ("p", self.provider.safesearch.as_param().to_string()),
            ("df", TIME_WINDOW.to_string()),
        ];

        let mut seen: HashSet<String> = HashSet::new();
        let mut hits: Vec<SearchHit> = Vec::new();

        for page in 0..MAX_PAGES {
            let body = self.get_text(&url, &params).await?;
            let data: NewsPage = serde_json::from_str(&body).map_err(|e| {
                BriefError::ProviderUnavailable(format!("failed to parse news.js response: {}", e))
            })?;

            let before = hits.len();
            for raw in data.results {
                if let Some(u) = &raw.url {
                    if !seen.insert(u.clone()) {
                        continue;
                    }
                }
                hits.push(raw.into_hit());
            }
            debug!(page, added = hits.len() - before, total = hits.len(), "news page parsed");

            if hits.len() >= max_results || hits.len() == before {
                break;
            }
            let Some(offset) = data.next.as_deref().and_then(next_offset) else {
                break;
            };
            params.retain(|(k, _)| *k != "s");
            params.push(("s", offset));
        }

        hits.truncate(max_results);
        Ok(hits)
    }

    async fn get_text(&self, url: &str, params: &[(&str, String)]) -> Result<String, BriefError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| BriefError::ProviderUnavailable(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(%status, url, "news provider returned non-OK status");
            return Err(BriefError::ProviderUnavailable(format!(
                "{} returned status {}",
                url, status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| BriefError::ProviderUnavailable(format!("failed to read response body: {}", e)))
    }
}

#[derive(Debug, Deserialize)]
struct NewsPage {
    #[serde(default)]
    results: Vec<RawResult>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    #[serde(default)]
    date: Option<serde_json::Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

impl RawResult {
    fn into_hit(self) -> SearchHit {
        SearchHit {
            title: self.title,
            source: self.source,
            date: self.date.as_ref().and_then(format_date),
            url: self.url,
            body: self.excerpt.as_deref().map(strip_html),
        }
    }
}

/// Unix seconds become RFC 3339 UTC; string dates pass through untouched.
fn format_date(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => {
            let secs = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            chrono::DateTime::from_timestamp(secs, 0).map(|d| d.to_rfc3339())
        }
        _ => None,
    }
}

/// Drop tags and decode entities from an excerpt fragment.
fn strip_html(fragment: &str) -> String {
    let doc = scraper::Html::parse_fragment(fragment);
    doc.root_element().text().collect::<String>().trim().to_string()
}

fn extract_vqd(html: &str) -> Option<String> {
    for (start, end) in [("vqd=\"", "\""), ("vqd='", "'"), ("vqd=", "&")] {
        if let Some(i) = html.find(start) {
            let rest = &html[i + start.len()..];
            if let Some(j) = rest.find(end) {
                let token = &rest[..j];
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }
    None
}

/// Offset from a `next` link such as `news.js?q=rust&s=30&...`
fn next_offset(next: &str) -> Option<String> {
    let query = next.split_once('?').map(|(_, q)| q).unwrap_or(next);
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("s="))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
