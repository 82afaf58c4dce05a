//! Pagination walker
//!
//! Drives sequential page retrieval for one source until a stop condition:
//! - A page yielding zero extracted items (normal termination)
//! - A page byte-identical to the previous page (misconfigured pagination
//!   would otherwise loop on the same content forever)
//! - The configured hard page cap
//!
//! Page fetches are strictly sequential; pagination is cursor-dependent and
//! the total page count is not reliably available up front.

use crate::config::SourceConfig;
use crate::harvester::extractor::{extract_records, RawRecord};
use crate::harvester::session::{FetchError, FetchSession};
use sha2::{Digest, Sha256};
use url::Url;

/// Concatenated extraction result of one pagination walk
#[derive(Debug, Default)]
pub struct PageSet {
    /// Records in fetch order: page 0 items first, each page top-to-bottom
    pub records: Vec<RawRecord>,

    /// Pages successfully fetched (including the terminating empty page)
    pub pages_fetched: u32,

    /// Items dropped across all pages for missing the required title
    pub parse_errors: usize,

    /// Non-fatal anomalies worth surfacing in the run summary
    pub warnings: Vec<String>,
}

/// Walks a source's listing pages and extracts every item
///
/// # Errors
///
/// Fails only when page 0 cannot be retrieved at all; that is the signal the
/// fallback chain uses to escalate. A failure on a later page keeps the
/// partial result and records a warning instead, since some data beats none
/// and the merge is idempotent across runs.
pub async fn walk_pages(
    session: &mut FetchSession,
    source: &SourceConfig,
) -> Result<PageSet, FetchError> {
    let base_url = Url::parse(&source.list_url).map_err(|e| FetchError::Request {
        url: source.list_url.clone(),
        message: e.to_string(),
    })?;

    let mut set = PageSet::default();
    let mut previous_hash: Option<[u8; 32]> = None;

    for page in 0..source.max_pages {
        let url = source.page_url(page);

        let body = match session.fetch(&url).await {
            Ok(body) => body,
            Err(e) if page == 0 => return Err(e),
            Err(e) => {
                tracing::warn!("Source {}: page {} failed, keeping partial walk: {}", source.id, page, e);
                set.warnings
                    .push(format!("page {} failed after retries: {}", page, e));
                break;
            }
        };

        let hash: [u8; 32] = Sha256::digest(body.as_bytes()).into();
        if previous_hash == Some(hash) {
            tracing::debug!("Source {}: page {} identical to previous page, stopping", source.id, page);
            set.warnings
                .push(format!("page {} identical to page {}", page, page - 1));
            break;
        }
        previous_hash = Some(hash);
        set.pages_fetched += 1;

        let outcome = extract_records(&body, &source.strategies, &base_url);
        if outcome.records.is_empty() {
            // Normal terminal condition, not a failure
            tracing::debug!("Source {}: page {} empty, stopping", source.id, page);
            break;
        }

        tracing::debug!(
            "Source {}: page {} yielded {} records",
            source.id,
            page,
            outcome.records.len()
        );
        set.parse_errors += outcome.parse_errors;
        set.records.extend(outcome.records);

        // Sources without a page parameter have exactly one page
        if source.page_param.is_none() {
            break;
        }
    }

    Ok(set)
}
