//! Syndication feed parsing (secondary access method)
//!
//! When a source blocks its listing pages outright, its RSS/Atom feed is a
//! degraded but workable substitute: titles, links, and sometimes a summary
//! and date, rarely full author lists. Batches produced this way are
//! explicitly flagged so consumers know fewer fields and fewer records are
//! expected, not lost.

use crate::harvester::extractor::RawRecord;
use feed_rs::parser::{self, ParseFeedError};
use scraper::Html;

/// Parses a feed body into raw records, newest entry first
///
/// Entries without a title are skipped; feeds that cannot be parsed at all
/// surface the parse error so the fallback chain can report the source as
/// failed.
pub fn parse_feed(body: &str) -> Result<Vec<RawRecord>, ParseFeedError> {
    let feed = parser::parse(body.as_bytes())?;

    let records = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let title = entry
                .title
                .map(|t| t.content.trim().to_string())
                .filter(|t| !t.is_empty())?;

            let url = entry.links.first().map(|link| link.href.clone());

            let abstract_text = entry
                .summary
                .map(|s| strip_markup(&s.content))
                .filter(|s| !s.is_empty());

            let authors = {
                let names: Vec<String> = entry
                    .authors
                    .iter()
                    .map(|person| person.name.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .collect();
                if names.is_empty() {
                    None
                } else {
                    Some(names.join(", "))
                }
            };

            // Stringified ISO date round-trips through the normalizer's
            // date parser like any scraped date text.
            let date = entry
                .published
                .or(entry.updated)
                .map(|d| d.format("%Y-%m-%d").to_string());

            Some(RawRecord {
                title: Some(title),
                authors,
                date,
                doi: None,
                url,
                abstract_text,
                section: None,
            })
        })
        .collect();

    Ok(records)
}

/// Flattens HTML markup that feeds often embed in summaries
fn strip_markup(content: &str) -> String {
    Html::parse_fragment(content)
        .root_element()
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
