use crate::error::BriefError;

pub mod duckduckgo;

/// Recency filter applied to every search ("past day")
pub const TIME_WINDOW: &str = "d";

pub use common::DEFAULT_MAX_RESULTS;

/// Core trait for news search providers
#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    /// Fetch at most `max_results` recent items for `topic`, in provider order.
    /// An empty result set is `Ok(vec![])`, never an error.
    async fn fetch(&self, topic: &str, max_results: usize) -> Result<Vec<NewsItem>, BriefError>;
}

/// Normalized record of one search result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    /// Provider-supplied date, not normalized
    pub date: String,
    pub url: String,
    pub snippet: String,
}

/// One raw hit as produced by a provider, before normalization
#[derive(Debug, Clone, Default)]
pub struct SearchHit {
    pub title: Option<String>,
    pub source: Option<String>,
    pub date: Option<String>,
    pub url: Option<String>,
    pub body: Option<String>,
}

impl From<SearchHit> for NewsItem {
    fn from(hit: SearchHit) -> Self {
        Self {
            title: hit.title.unwrap_or_default(),
            source: hit.source.unwrap_or_default(),
            date: hit.date.unwrap_or_default(),
            url: hit.url.unwrap_or_default(),
            snippet: hit.body.unwrap_or_default(),
        }
    }
}

/// Render the items block embedded in the digest prompt.
///
/// One line-group per item, fields in fixed order:
/// ```text
/// - {title} ({source}, {date})
///   {url}
///   {snippet}
/// ```
pub fn render_items_block(items: &[NewsItem]) -> String {
    items
        .iter()
        .map(|n| {
            format!(
                "- {} ({}, {})\n  {}\n  {}",
                n.title, n.source, n.date, n.url, n.snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(n: usize) -> NewsItem {
        NewsItem {
            title: format!("Title {n}"),
            source: format!("Source {n}"),
            date: format!("2024-05-0{n}T10:00:00+00:00"),
            url: format!("https://example.com/{n}"),
            snippet: format!("Snippet {n}"),
        }
    }

    #[test]
    fn test_render_one_group_per_item() {
        let items: Vec<NewsItem> = (1..=3).map(item).collect();
        let block = render_items_block(&items);

        let groups: Vec<&str> = block.lines().filter(|l| l.starts_with("- ")).collect();
        assert_eq!(groups.len(), 3);
        assert_eq!(block.lines().count(), 9);
    }

    #[test]
    fn test_render_field_order() {
        let block = render_items_block(&[item(1)]);
        assert_eq!(
            block,
            "- Title 1 (Source 1, 2024-05-01T10:00:00+00:00)\n  https://example.com/1\n  Snippet 1"
        );

        let positions: Vec<usize> = ["Title 1", "Source 1", "2024-05-01", "https://example.com/1", "Snippet 1"]
            .iter()
            .map(|needle| block.find(needle).expect("field present"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_items_block(&[]), "");
    }

    #[test]
    fn test_each_missing_field_defaults_to_empty() {
        let full = || SearchHit {
            title: Some("T".into()),
            source: Some("S".into()),
            date: Some("D".into()),
            url: Some("U".into()),
            body: Some("B".into()),
        };
        assert_eq!(NewsItem::from(full()).snippet, "B");

        let cases: [(&str, fn(&mut SearchHit), fn(&NewsItem) -> &str); 5] = [
            ("title", |h| h.title = None, |n| n.title.as_str()),
            ("source", |h| h.source = None, |n| n.source.as_str()),
            ("date", |h| h.date = None, |n| n.date.as_str()),
            ("url", |h| h.url = None, |n| n.url.as_str()),
            ("body", |h| h.body = None, |n| n.snippet.as_str()),
        ];
        for (field, clear, pick) in cases {
            let mut hit = full();
            clear(&mut hit);
            let item = NewsItem::from(hit);

            assert_eq!(pick(&item), "", "{field} should default to empty");
            let filled = [&item.title, &item.source, &item.date, &item.url, &item.snippet]
                .iter()
                .filter(|v| !v.is_empty())
                .count();
            assert_eq!(filled, 4, "only {field} should be empty");
        }
    }

    #[test]
    fn test_empty_hit_is_all_empty() {
        assert_eq!(NewsItem::from(SearchHit::default()), NewsItem::default());
    }
}
