//! The enrichment merge pipeline.
//!
//! A pass is an ordered list of steps, each an oracle with its own pacer. For
//! every incomplete row, in dataset order, each step whose targets are still
//! missing derives its key, looks it up, merges the result and paces.

pub mod merge;
pub mod passes;

pub use merge::{merge_fields, AgeOutcome, MergeOutcome};
pub use passes::{build_pass, PassKind};

use crate::common::error::Result;
use crate::common::types::KeyKind;
use crate::config::ColumnsConfig;
use crate::filter::{incomplete_rows, is_incomplete};
use crate::keys::{isbn13, AuthorKeys};
use crate::observability::metrics;
use crate::oracles::LookupOracle;
use crate::pacing::Pacer;
use crate::record_store::RecordStore;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, instrument};

/// An oracle and the pacer that spaces out its calls.
pub struct PassStep {
    oracle: Box<dyn LookupOracle>,
    pacer: Box<dyn Pacer>,
}

impl PassStep {
    pub fn new(oracle: Box<dyn LookupOracle>, pacer: Box<dyn Pacer>) -> Self {
        Self { oracle, pacer }
    }

    pub fn oracle_name(&self) -> &'static str {
        self.oracle.name()
    }

    fn target_columns<'a>(&self, columns: &'a ColumnsConfig) -> Vec<&'a str> {
        self.oracle
            .provides()
            .iter()
            .map(|field| columns.column_for(*field))
            .collect()
    }
}

pub struct EnrichmentPass {
    name: &'static str,
    columns: ColumnsConfig,
    steps: Vec<PassStep>,
}

impl fmt::Debug for EnrichmentPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<&str> = self.steps.iter().map(PassStep::oracle_name).collect();
        f.debug_struct("EnrichmentPass")
            .field("name", &self.name)
            .field("steps", &steps)
            .finish()
    }
}

impl EnrichmentPass {
    pub fn new(name: &'static str, columns: ColumnsConfig, steps: Vec<PassStep>) -> Self {
        Self {
            name,
            columns,
            steps,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Union of the steps' target columns, in step order.
    pub fn target_columns(&self) -> Vec<&str> {
        let mut targets: Vec<&str> = Vec::new();
        for step in &self.steps {
            for column in step.target_columns(&self.columns) {
                if !targets.contains(&column) {
                    targets.push(column);
                }
            }
        }
        targets
    }

    /// Enrich `store` in place.
    ///
    /// Oracle failures arrive here as empty results, so nothing in this loop
    /// can abort the pass.
    #[instrument(skip(self, store), fields(pass = self.name))]
    pub async fn run(&self, store: &mut RecordStore) -> PassSummary {
        let targets = self.target_columns();
        // Output carries every target column even when nothing gets filled
        for column in &targets {
            store.ensure_column(column);
        }

        let rows = incomplete_rows(store, &targets);
        let mut summary = PassSummary::new(self.name);
        summary.rows_selected = rows.len();
        metrics::pass::rows_selected(self.name, rows.len());
        info!(
            "{} of {} records need enrichment",
            rows.len(),
            store.len()
        );

        for row in rows {
            for step in &self.steps {
                let step_targets = step.target_columns(&self.columns);
                if !is_incomplete(store, row, &step_targets) {
                    continue;
                }

                let oracle = step.oracle.as_ref();
                let Some(key) = derive_key(store, row, oracle.key_kind(), &self.columns) else {
                    debug!(row, oracle = oracle.name(), "No usable {} key, skipping", oracle.key_kind());
                    metrics::oracle::key_missing(oracle.name());
                    summary.skipped_no_key += 1;
                    continue;
                };

                let fields = oracle.lookup(&key).await;
                summary.lookups += 1;
                if fields.is_empty() {
                    summary.empty_lookups += 1;
                }

                let outcome = merge_fields(store, row, &fields, &self.columns);
                if !outcome.filled.is_empty() {
                    debug!(row, key = %key, filled = ?outcome.filled, "Merged lookup result");
                }
                summary.record(&outcome);

                step.pacer.pace().await;
            }
        }

        info!(
            lookups = summary.lookups,
            filled = summary.fields_filled_total(),
            "Pass complete"
        );
        summary
    }
}

/// The key `kind` derived from the row's raw cells, if one can be derived.
pub fn derive_key(
    store: &RecordStore,
    row: usize,
    kind: KeyKind,
    columns: &ColumnsConfig,
) -> Option<String> {
    match kind {
        KeyKind::Isbn13 => store.get(row, &columns.isbn).and_then(isbn13),
        KeyKind::FirstName => store
            .get(row, &columns.author)
            .and_then(AuthorKeys::derive)
            .and_then(|keys| keys.first_name),
        KeyKind::FullName => store
            .get(row, &columns.author)
            .and_then(AuthorKeys::derive)
            .map(|keys| keys.full_name),
    }
}

/// Per-pass counters reported to the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub pass: &'static str,
    pub rows_selected: usize,
    pub lookups: usize,
    pub empty_lookups: usize,
    pub skipped_no_key: usize,
    pub filled: BTreeMap<String, usize>,
    pub ages_computed: usize,
    pub age_failures: usize,
}

impl PassSummary {
    pub fn new(pass: &'static str) -> Self {
        Self {
            pass,
            ..Default::default()
        }
    }

    fn record(&mut self, outcome: &MergeOutcome) {
        for column in &outcome.filled {
            *self.filled.entry(column.clone()).or_insert(0) += 1;
        }
        match outcome.age {
            AgeOutcome::Computed(_) => self.ages_computed += 1,
            AgeOutcome::Unparseable | AgeOutcome::MissingPublicationYear => {
                self.age_failures += 1
            }
            AgeOutcome::NotAttempted => {}
        }
    }

    pub fn fields_filled_total(&self) -> usize {
        self.filled.values().sum()
    }
}

/// One chained pass: load `input`, enrich, save to `output`.
///
/// Nothing is written when loading fails.
pub async fn run_pass_file(
    pass: &EnrichmentPass,
    input: &Path,
    output: &Path,
) -> Result<PassSummary> {
    info!(
        "Running {} pass: {} -> {}",
        pass.name(),
        input.display(),
        output.display()
    );
    let mut store = RecordStore::load(input)?;
    let summary = pass.run(&mut store).await;
    store.save(output)?;
    Ok(summary)
}
