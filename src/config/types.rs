use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for Paper-Tide
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub ingest: IngestConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceConfig>,
    #[serde(default, rename = "topic")]
    pub topics: Vec<TopicEntry>,
}

/// Ingestion behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Maximum number of sources ingested concurrently
    #[serde(rename = "max-concurrent-sources")]
    pub max_concurrent_sources: u32,

    /// Delay between consecutive requests to the same source (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Maximum retry attempts for transient fetch failures
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base delay for exponential retry backoff (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Wall-clock budget for one source's whole ingestion (seconds)
    #[serde(rename = "source-timeout-secs")]
    pub source_timeout_secs: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// How a source presents its items on the listing pages
///
/// Ordinal reconstruction depends on this: a source listing oldest items
/// first has its concatenated pages reversed before ordinals are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemOrder {
    NewestFirst,
    OldestFirst,
}

impl Default for ItemOrder {
    fn default() -> Self {
        ItemOrder::NewestFirst
    }
}

/// One configured publisher source
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Short stable identifier, used in identity keys (e.g. "jasa")
    pub id: String,

    /// Human-readable source name
    pub name: String,

    /// URL of the article listing page
    #[serde(rename = "list-url")]
    pub list_url: String,

    /// Query parameter carrying the page index; absent means a single page
    #[serde(default, rename = "page-param")]
    pub page_param: Option<String>,

    /// Hard cap on pages walked per run
    #[serde(default = "default_max_pages", rename = "max-pages")]
    pub max_pages: u32,

    /// Presentation order of items on the listing
    #[serde(default)]
    pub order: ItemOrder,

    /// Syndication feed URL used as the secondary access method
    #[serde(default, rename = "feed-url")]
    pub feed_url: Option<String>,

    /// Per-source politeness delay override (milliseconds)
    #[serde(default, rename = "request-delay-ms")]
    pub request_delay_ms: Option<u64>,

    /// Header profile sent with every request to this source
    pub headers: HeaderProfile,

    /// Extraction strategies, tried in rank order
    #[serde(rename = "strategy")]
    pub strategies: Vec<StrategyConfig>,
}

impl SourceConfig {
    /// Builds the URL for a given page index
    ///
    /// Sources without a page parameter always fetch the bare listing URL.
    pub fn page_url(&self, page: u32) -> String {
        match &self.page_param {
            Some(param) => {
                let sep = if self.list_url.contains('?') { '&' } else { '?' };
                format!("{}{}{}={}", self.list_url, sep, param, page)
            }
            None => self.list_url.clone(),
        }
    }
}

fn default_max_pages() -> u32 {
    1
}

/// Browser-like header profile for one source
///
/// Publishers reject requests lacking a complete, internally consistent
/// header set, so the whole profile is operator-configurable.
#[derive(Debug, Clone, Deserialize)]
pub struct HeaderProfile {
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    #[serde(default)]
    pub accept: Option<String>,

    #[serde(default, rename = "accept-language")]
    pub accept_language: Option<String>,

    #[serde(default, rename = "accept-encoding")]
    pub accept_encoding: Option<String>,

    #[serde(default)]
    pub referer: Option<String>,

    #[serde(default, rename = "cache-control")]
    pub cache_control: Option<String>,

    /// Additional headers sent verbatim (e.g. Sec-Fetch-*)
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

/// One extraction strategy: a set of CSS selectors for one markup shape
///
/// Multiple strategies per source provide resilience to markup drift; the
/// engine tries them in rank order and keeps the first that yields items.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    /// Priority rank; lower ranks are tried first
    pub rank: u32,

    /// Selector matching one item container per paper
    pub item: String,

    /// Selector for the title, relative to the item
    pub title: String,

    /// Selector for the anchor carrying the detail-page link
    #[serde(default)]
    pub link: Option<String>,

    /// Selector for the author element(s); multiple matches are joined
    #[serde(default)]
    pub authors: Option<String>,

    /// Selector for the publication date text
    #[serde(default)]
    pub date: Option<String>,

    /// Selector for text containing a DOI
    #[serde(default)]
    pub doi: Option<String>,

    /// Selector for the abstract/preview text
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,

    /// Selector for the section label
    #[serde(default)]
    pub section: Option<String>,
}

/// One topic vocabulary entry for the tagger
#[derive(Debug, Clone, Deserialize)]
pub struct TopicEntry {
    /// Topic label assigned to matching papers
    pub name: String,

    /// Keywords matched case-insensitively against title and abstract
    pub keywords: Vec<String>,
}
