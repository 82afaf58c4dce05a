//! Strategy-table HTML extraction
//!
//! One polymorphic engine parses every source: each source configures an
//! ordered list of selector strategies, and the first strategy that yields
//! at least one structurally valid item (non-empty title) wins for that
//! page. Adding a publisher is adding configuration, not a new type.

use crate::config::StrategyConfig;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Best-effort raw fields parsed from one listing item
///
/// Every field is optional at this stage; a missing selector or empty match
/// yields None, never a page-level failure. Transient, per run.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub title: Option<String>,
    pub authors: Option<String>,
    pub date: Option<String>,
    pub doi: Option<String>,
    pub url: Option<String>,
    pub abstract_text: Option<String>,
    pub section: Option<String>,
}

/// Result of extracting one page
#[derive(Debug, Default)]
pub struct ExtractionOutcome {
    /// Records with a usable title, in page order
    pub records: Vec<RawRecord>,

    /// Rank of the strategy that produced the records, if any matched
    pub strategy_rank: Option<u32>,

    /// Items dropped for missing the required title field
    pub parse_errors: usize,
}

/// Extracts raw records from one fetched page
///
/// Strategies are tried in rank order. Within the winning strategy each item
/// is parsed independently: a selector miss nulls that field only, and an
/// item without a title is dropped and counted rather than aborting the
/// page.
///
/// # Arguments
///
/// * `html` - The page body
/// * `strategies` - The source's strategies, any order (sorted here by rank)
/// * `base_url` - Base URL for resolving relative detail links
pub fn extract_records(
    html: &str,
    strategies: &[StrategyConfig],
    base_url: &Url,
) -> ExtractionOutcome {
    let document = Html::parse_document(html);

    let mut ranked: Vec<&StrategyConfig> = strategies.iter().collect();
    ranked.sort_by_key(|s| s.rank);

    for strategy in ranked {
        let outcome = try_strategy(&document, strategy, base_url);
        if !outcome.records.is_empty() {
            tracing::debug!(
                "Strategy rank {} extracted {} records ({} dropped)",
                strategy.rank,
                outcome.records.len(),
                outcome.parse_errors
            );
            return outcome;
        }
    }

    ExtractionOutcome::default()
}

/// Applies one strategy to the document
fn try_strategy(document: &Html, strategy: &StrategyConfig, base_url: &Url) -> ExtractionOutcome {
    // Selectors were validated at config load; a parse failure here means
    // the config changed underneath us, so treat it as a non-match.
    let item_selector = match Selector::parse(&strategy.item) {
        Ok(s) => s,
        Err(_) => return ExtractionOutcome::default(),
    };

    let mut records = Vec::new();
    let mut parse_errors = 0;

    for item in document.select(&item_selector) {
        match parse_item(&item, strategy, base_url) {
            Some(record) => records.push(record),
            None => parse_errors += 1,
        }
    }

    ExtractionOutcome {
        strategy_rank: if records.is_empty() {
            None
        } else {
            Some(strategy.rank)
        },
        records,
        parse_errors,
    }
}

/// Parses one item container; None when the required title is missing
fn parse_item(item: &ElementRef, strategy: &StrategyConfig, base_url: &Url) -> Option<RawRecord> {
    let title = select_text(item, &strategy.title)?;

    let url = detail_url(item, strategy, base_url);

    let record = RawRecord {
        title: Some(title),
        authors: strategy
            .authors
            .as_deref()
            .and_then(|sel| select_all_text(item, sel)),
        date: strategy.date.as_deref().and_then(|sel| select_text(item, sel)),
        doi: strategy.doi.as_deref().and_then(|sel| select_text(item, sel)),
        url,
        abstract_text: strategy
            .abstract_text
            .as_deref()
            .and_then(|sel| select_text(item, sel)),
        section: strategy
            .section
            .as_deref()
            .and_then(|sel| select_text(item, sel)),
    };

    Some(record)
}

/// Resolves the detail-page URL for an item
///
/// Uses the configured link selector when present, otherwise the first
/// anchor inside the item. Relative hrefs are resolved against the listing
/// URL.
fn detail_url(item: &ElementRef, strategy: &StrategyConfig, base_url: &Url) -> Option<String> {
    let selector_str = strategy.link.as_deref().unwrap_or("a[href]");
    let selector = Selector::parse(selector_str).ok()?;

    let href = item
        .select(&selector)
        .find_map(|el| el.value().attr("href"))?;

    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }

    base_url.join(href).ok().map(|u| u.to_string())
}

/// Text of the first element matching the selector, whitespace-collapsed
fn select_text(item: &ElementRef, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;

    item.select(&selector)
        .next()
        .map(collapse_text)
        .filter(|s| !s.is_empty())
}

/// Joined text of every element matching the selector
///
/// Author markup is the main consumer: some publishers put one name per
/// element, others one delimited string in a single element. Joining all
/// matches with commas feeds both shapes to the same author splitter.
fn select_all_text(item: &ElementRef, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;

    let parts: Vec<String> = item
        .select(&selector)
        .map(|el| collapse_text(el))
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

fn collapse_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
