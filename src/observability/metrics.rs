//! Counters for oracle lookups and merges.
//!
//! Recording is a no-op until [`init`] installs the Prometheus recorder, which
//! the CLI only does when a snapshot path is configured.

use crate::common::error::{EnricherError, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;

/// All metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    OracleLookups,
    OracleLookupsEmpty,
    OracleLookupsFailed,
    OracleKeysMissing,
    MergeFieldsFilled,
    MergeAgesComputed,
    MergeAgeParseFailures,
    PassRowsSelected,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::OracleLookups => "enricher_oracle_lookups_total",
            MetricName::OracleLookupsEmpty => "enricher_oracle_lookups_empty_total",
            MetricName::OracleLookupsFailed => "enricher_oracle_lookups_failed_total",
            MetricName::OracleKeysMissing => "enricher_oracle_keys_missing_total",
            MetricName::MergeFieldsFilled => "enricher_merge_fields_filled_total",
            MetricName::MergeAgesComputed => "enricher_merge_ages_computed_total",
            MetricName::MergeAgeParseFailures => "enricher_merge_age_parse_failures_total",
            MetricName::PassRowsSelected => "enricher_pass_rows_selected_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install the Prometheus recorder and return a handle for rendering.
pub fn init() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| EnricherError::Config(format!("Failed to install Prometheus recorder: {}", e)))?;
    info!("Metrics recorder installed");
    Ok(handle)
}

/// Write the current Prometheus text exposition to `path`.
pub fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, handle.render())?;
    info!("Wrote metrics snapshot to {}", path.display());
    Ok(())
}

pub mod oracle {
    use super::MetricName;

    pub fn lookup_performed(oracle: &'static str) {
        ::metrics::counter!(MetricName::OracleLookups.as_str(), "oracle" => oracle).increment(1);
    }

    pub fn lookup_empty(oracle: &'static str) {
        ::metrics::counter!(MetricName::OracleLookupsEmpty.as_str(), "oracle" => oracle).increment(1);
    }

    pub fn lookup_failed(oracle: &'static str) {
        ::metrics::counter!(MetricName::OracleLookupsFailed.as_str(), "oracle" => oracle).increment(1);
    }

    pub fn key_missing(oracle: &'static str) {
        ::metrics::counter!(MetricName::OracleKeysMissing.as_str(), "oracle" => oracle).increment(1);
    }
}

pub mod merge {
    use super::MetricName;

    pub fn field_filled(column: &str) {
        ::metrics::counter!(MetricName::MergeFieldsFilled.as_str(), "column" => column.to_string())
            .increment(1);
    }

    pub fn age_computed() {
        ::metrics::counter!(MetricName::MergeAgesComputed.as_str()).increment(1);
    }

    pub fn age_parse_failed() {
        ::metrics::counter!(MetricName::MergeAgeParseFailures.as_str()).increment(1);
    }
}

pub mod pass {
    use super::MetricName;

    pub fn rows_selected(pass: &'static str, rows: usize) {
        ::metrics::counter!(MetricName::PassRowsSelected.as_str(), "pass" => pass)
            .increment(rows as u64);
    }
}
