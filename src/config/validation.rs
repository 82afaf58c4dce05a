use crate::config::types::{Config, IngestConfig, SourceConfig, StrategyConfig, TopicEntry};
use crate::ConfigError;
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_ingest_config(&config.ingest)?;

    if config.output.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.sources.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[source]] must be configured".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();
    for source in &config.sources {
        validate_source(source)?;
        if !seen_ids.insert(source.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source id '{}'",
                source.id
            )));
        }
    }

    for topic in &config.topics {
        validate_topic(topic)?;
    }

    Ok(())
}

/// Validates ingestion configuration
fn validate_ingest_config(config: &IngestConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_sources < 1 || config.max_concurrent_sources > 32 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_sources must be between 1 and 32, got {}",
            config.max_concurrent_sources
        )));
    }

    if config.request_delay_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "request_delay_ms must be >= 100ms, got {}ms",
            config.request_delay_ms
        )));
    }

    if config.source_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "source_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates one source descriptor
fn validate_source(source: &SourceConfig) -> Result<(), ConfigError> {
    if source.id.is_empty() {
        return Err(ConfigError::Validation(
            "source id cannot be empty".to_string(),
        ));
    }

    if !source
        .id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "source id must be lowercase alphanumeric with hyphens, got '{}'",
            source.id
        )));
    }

    let list_url = Url::parse(&source.list_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("source '{}' list-url: {}", source.id, e))
    })?;

    if list_url.scheme() != "https" && list_url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "source '{}' list-url must be http(s), got '{}'",
            source.id,
            list_url.scheme()
        )));
    }

    if let Some(feed_url) = &source.feed_url {
        Url::parse(feed_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("source '{}' feed-url: {}", source.id, e))
        })?;
    }

    if source.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "source '{}' max-pages must be >= 1",
            source.id
        )));
    }

    if source.headers.user_agent.is_empty() {
        return Err(ConfigError::Validation(format!(
            "source '{}' must configure a user-agent",
            source.id
        )));
    }

    if source.strategies.is_empty() {
        return Err(ConfigError::Validation(format!(
            "source '{}' must have at least one [[source.strategy]]",
            source.id
        )));
    }

    for strategy in &source.strategies {
        validate_strategy(&source.id, strategy)?;
    }

    Ok(())
}

/// Validates one extraction strategy
///
/// All selectors are compiled once here so a typo fails at startup instead
/// of silently yielding empty extractions at run time.
fn validate_strategy(source_id: &str, strategy: &StrategyConfig) -> Result<(), ConfigError> {
    let required = [("item", Some(&strategy.item)), ("title", Some(&strategy.title))];
    let optional = [
        ("link", strategy.link.as_ref()),
        ("authors", strategy.authors.as_ref()),
        ("date", strategy.date.as_ref()),
        ("doi", strategy.doi.as_ref()),
        ("abstract", strategy.abstract_text.as_ref()),
        ("section", strategy.section.as_ref()),
    ];

    for (field, selector) in required.iter().chain(optional.iter()) {
        if let Some(sel) = selector {
            if Selector::parse(sel).is_err() {
                return Err(ConfigError::InvalidSelector(format!(
                    "source '{}' strategy rank {} field '{}': '{}'",
                    source_id, strategy.rank, field, sel
                )));
            }
        }
    }

    Ok(())
}

/// Validates one topic vocabulary entry
fn validate_topic(topic: &TopicEntry) -> Result<(), ConfigError> {
    if topic.name.is_empty() {
        return Err(ConfigError::Validation(
            "topic name cannot be empty".to_string(),
        ));
    }

    if topic.keywords.is_empty() {
        return Err(ConfigError::Validation(format!(
            "topic '{}' must have at least one keyword",
            topic.name
        )));
    }

    if topic.keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "topic '{}' contains an empty keyword",
            topic.name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{HeaderProfile, ItemOrder, OutputConfig};
    use std::collections::BTreeMap;

    fn test_strategy() -> StrategyConfig {
        StrategyConfig {
            rank: 0,
            item: ".article".to_string(),
            title: ".title".to_string(),
            link: None,
            authors: Some(".authors".to_string()),
            date: None,
            doi: None,
            abstract_text: None,
            section: None,
        }
    }

    fn test_source(id: &str) -> SourceConfig {
        SourceConfig {
            id: id.to_string(),
            name: "Test Journal".to_string(),
            list_url: "https://example.com/advance-articles".to_string(),
            page_param: None,
            max_pages: 1,
            order: ItemOrder::NewestFirst,
            feed_url: None,
            request_delay_ms: None,
            headers: HeaderProfile {
                user_agent: "Mozilla/5.0".to_string(),
                accept: None,
                accept_language: None,
                accept_encoding: None,
                referer: None,
                cache_control: None,
                extra: BTreeMap::new(),
            },
            strategies: vec![test_strategy()],
        }
    }

    fn test_config() -> Config {
        Config {
            ingest: IngestConfig {
                max_concurrent_sources: 3,
                request_delay_ms: 1000,
                max_retries: 3,
                retry_backoff_ms: 500,
                source_timeout_secs: 60,
            },
            output: OutputConfig {
                database_path: "./test.db".to_string(),
            },
            sources: vec![test_source("test")],
            topics: vec![],
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&test_config()).is_ok());
    }

    #[test]
    fn test_no_sources_rejected() {
        let mut config = test_config();
        config.sources.clear();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_duplicate_source_ids_rejected() {
        let mut config = test_config();
        config.sources.push(test_source("test"));
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_uppercase_source_id_rejected() {
        let mut config = test_config();
        config.sources[0].id = "JASA".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_list_url_rejected() {
        let mut config = test_config();
        config.sources[0].list_url = "not a url".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_bad_selector_rejected() {
        let mut config = test_config();
        config.sources[0].strategies[0].title = ":::not-a-selector".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_source_without_strategy_rejected() {
        let mut config = test_config();
        config.sources[0].strategies.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_topic_without_keywords_rejected() {
        let mut config = test_config();
        config.topics.push(TopicEntry {
            name: "Empty".to_string(),
            keywords: vec![],
        });
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_short_delay_rejected() {
        let mut config = test_config();
        config.ingest.request_delay_ms = 10;
        assert!(validate(&config).is_err());
    }
}
