//! Remote lookup sources.
//!
//! Every source implements [`LookupOracle`]. Failures never cross the trait
//! boundary: transport errors, non-2xx responses and malformed payloads are
//! logged with the failing key and turned into an empty [`FieldMap`].

pub mod genderize;
pub mod google_books;
pub mod open_library;
pub mod wikidata;

pub use genderize::GenderizeOracle;
pub use google_books::GoogleBooksOracle;
pub use open_library::OpenLibraryOracle;
pub use wikidata::WikidataOracle;

use crate::common::error::Result;
use crate::common::types::{Field, FieldMap, KeyKind};
use crate::observability::metrics;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

/// Core trait that all lookup sources must implement
#[async_trait]
pub trait LookupOracle: Send + Sync {
    /// Unique identifier for this source, used in logs and metrics
    fn name(&self) -> &'static str;

    /// The derived key this source is queried with
    fn key_kind(&self) -> KeyKind;

    /// Fields this source can fill; drives row selection
    fn provides(&self) -> &'static [Field];

    /// Look `key` up. An empty map means "no data", whatever the reason.
    async fn lookup(&self, key: &str) -> FieldMap;
}

/// Send `request` and decode the body as JSON, treating non-2xx as an error.
pub(crate) async fn get_json(request: reqwest::RequestBuilder) -> Result<Value> {
    let response = request.send().await?.error_for_status()?;
    let payload = response.json::<Value>().await?;
    Ok(payload)
}

/// Collapse a fetch-and-extract result into the oracle contract.
pub(crate) fn absorb_failure(oracle: &'static str, key: &str, result: Result<FieldMap>) -> FieldMap {
    metrics::oracle::lookup_performed(oracle);
    match result {
        Ok(fields) => {
            if fields.is_empty() {
                debug!(oracle, key, "No data returned");
                metrics::oracle::lookup_empty(oracle);
            }
            fields
        }
        Err(e) => {
            warn!(oracle, key, error = %e, "Lookup failed, treating as no data");
            metrics::oracle::lookup_failed(oracle);
            FieldMap::new()
        }
    }
}

/// `value` if it is exactly four ASCII digits.
pub(crate) fn four_digit_year(value: &str) -> Option<&str> {
    (value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit())).then_some(value)
}
