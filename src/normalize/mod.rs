//! Field normalization
//!
//! This module turns raw extracted records into the canonical paper shape:
//! - Author-string splitting with the trailing "others" sentinel
//! - Publication date parsing across publisher formats
//! - Ordinal reconstruction of the newest-first order

mod authors;
mod dates;

pub use authors::split_authors;
pub use dates::parse_date;

use crate::config::ItemOrder;
use crate::harvester::RawRecord;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static DOI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"10\.\d{4,9}/[^\s"<>]+"#).unwrap());

/// Canonical normalized paper record
///
/// One logical record as stored and merged. `ordinal` ranks the paper
/// newest-first within its source for the run that produced it; it is the
/// authoritative order whenever `published` is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPaper {
    pub title: String,

    /// Ordered author names; the "others" sentinel, when present, is last
    pub authors: Vec<String>,

    /// Publication date; None means "unknown, order by ordinal"
    pub published: Option<NaiveDate>,

    pub doi: Option<String>,

    pub url: Option<String>,

    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,

    pub section: Option<String>,

    /// Source identifier this record was ingested from
    pub source: String,

    /// Newest-first rank within this source's batch for this run
    pub ordinal: u32,

    /// Topic labels assigned by the tagger
    pub topics: Vec<String>,
}

/// Normalizes one raw record
///
/// Returns None when the record has no usable title after trimming. Missing
/// optional fields stay None; they never fail the record.
pub fn normalize_record(raw: &RawRecord, source_id: &str) -> Option<NormalizedPaper> {
    let title = collapse_whitespace(raw.title.as_deref()?);
    if title.is_empty() {
        return None;
    }

    let authors = raw
        .authors
        .as_deref()
        .map(split_authors)
        .unwrap_or_default();

    let published = raw.date.as_deref().and_then(parse_date);

    // A DOI may arrive via its own selector or buried in citation text or
    // the detail URL; the same pattern covers all three.
    let doi = raw
        .doi
        .as_deref()
        .and_then(extract_doi)
        .or_else(|| raw.url.as_deref().and_then(extract_doi));

    Some(NormalizedPaper {
        title,
        authors,
        published,
        doi,
        url: raw.url.clone(),
        abstract_text: raw.abstract_text.as_deref().map(collapse_whitespace),
        section: raw.section.as_deref().map(collapse_whitespace),
        source: source_id.to_string(),
        ordinal: 0,
        topics: Vec::new(),
    })
}

/// Assigns ordinals consistent with the source's presentation order
///
/// Pages are concatenated in fetch order before this is called. A source
/// presenting newest items first keeps that order; an oldest-first source is
/// reversed so that ordinal 0 is the item that appeared last on the last
/// fetched page. Ordinals are relative to this batch only; they never rewrite
/// ordinals of previously stored records.
pub fn assign_ordinals(papers: &mut Vec<NormalizedPaper>, order: ItemOrder) {
    if order == ItemOrder::OldestFirst {
        papers.reverse();
    }
    for (index, paper) in papers.iter_mut().enumerate() {
        paper.ordinal = index as u32;
    }
}

/// Extracts a DOI from free text
pub fn extract_doi(text: &str) -> Option<String> {
    DOI_RE
        .find(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';']).to_string())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
