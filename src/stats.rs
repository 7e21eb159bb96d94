//! Category counts over an enriched reading log.
//!
//! Books are filtered by shelf and rating, then counted per genre, year
//! published, publisher and rating. Small categories are folded into "Other";
//! "Unknown" is never folded.

use crate::common::constants::{
    EXCLUSIVE_SHELF_COLUMN, MY_RATING_COLUMN, PUBLISHER_COLUMN, TITLE_COLUMN, YEAR_PUBLISHED_COLUMN,
};
use crate::config::{ColumnsConfig, StatsConfig};
use crate::record_store::RecordStore;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

pub const UNKNOWN_LABEL: &str = "Unknown";
pub const OTHER_LABEL: &str = "Other";

/// Which books take part in the summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// Required `Exclusive Shelf` value; `None` keeps every shelf.
    pub shelf: Option<String>,
    pub min_rating: Option<i64>,
}

/// How a column's raw cell becomes a category label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Text,
    /// Leading integer if positive, otherwise unknown.
    Year,
    /// Leading integer, 0 when missing.
    Rating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketOrder {
    /// Largest first, ties by label.
    ByCount,
    /// Ascending year, then "Unknown", then "Other".
    ByYear,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breakdown {
    pub column: String,
    pub threshold: usize,
    pub order: BucketOrder,
    pub buckets: Vec<Bucket>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    pub books: usize,
    pub breakdowns: Vec<Breakdown>,
}

/// Integer at the start of `raw`, the way a lenient parser reads "1869.0" or "4 stars".
fn leading_int(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let digits_start = usize::from(raw.starts_with('-') || raw.starts_with('+'));
    let end = raw[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(raw.len(), |i| i + digits_start);
    raw[..end].parse().ok()
}

fn rating(store: &RecordStore, row: usize) -> i64 {
    store
        .get(row, MY_RATING_COLUMN)
        .and_then(leading_int)
        .unwrap_or(0)
}

/// Rows with a title that pass `filter`, in dataset order.
pub fn select_books(store: &RecordStore, filter: &BookFilter) -> Vec<usize> {
    (0..store.len())
        .filter(|&row| store.get(row, TITLE_COLUMN).is_some())
        .filter(|&row| match &filter.shelf {
            Some(shelf) => store.get(row, EXCLUSIVE_SHELF_COLUMN).map(str::trim) == Some(shelf.as_str()),
            None => true,
        })
        .filter(|&row| filter.min_rating.map_or(true, |min| rating(store, row) >= min))
        .collect()
}

fn label(store: &RecordStore, row: usize, column: &str, kind: LabelKind) -> String {
    match kind {
        LabelKind::Text => store.get(row, column).unwrap_or(UNKNOWN_LABEL).trim().to_string(),
        LabelKind::Year => store
            .get(row, column)
            .and_then(leading_int)
            .filter(|year| *year > 0)
            .map_or_else(|| UNKNOWN_LABEL.to_string(), |year| year.to_string()),
        LabelKind::Rating => store
            .get(row, column)
            .and_then(leading_int)
            .unwrap_or(0)
            .to_string(),
    }
}

/// Count `rows` per label of `column`.
pub fn breakdown(
    store: &RecordStore,
    rows: &[usize],
    column: &str,
    kind: LabelKind,
    threshold: usize,
    order: BucketOrder,
) -> Breakdown {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for &row in rows {
        *counts.entry(label(store, row, column, kind)).or_insert(0) += 1;
    }

    let mut other = 0;
    let mut buckets: Vec<Bucket> = Vec::new();
    for (label, count) in counts {
        if count < threshold && label != UNKNOWN_LABEL {
            other += count;
        } else {
            buckets.push(Bucket { label, count });
        }
    }

    match order {
        BucketOrder::ByCount => {
            if other > 0 {
                buckets.push(Bucket {
                    label: OTHER_LABEL.to_string(),
                    count: other,
                });
            }
            buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
        }
        BucketOrder::ByYear => {
            // Unknown sorts after every year, Other goes last
            buckets.sort_by_key(|b| b.label.parse::<i64>().unwrap_or(i64::MAX));
            if other > 0 {
                buckets.push(Bucket {
                    label: OTHER_LABEL.to_string(),
                    count: other,
                });
            }
        }
    }

    Breakdown {
        column: column.to_string(),
        threshold,
        order,
        buckets,
    }
}

/// The four standard breakdowns over the books `filter` selects.
pub fn summarize(
    store: &RecordStore,
    filter: &BookFilter,
    columns: &ColumnsConfig,
    config: &StatsConfig,
) -> StatsReport {
    let rows = select_books(store, filter);
    info!("Summarizing {} of {} records", rows.len(), store.len());

    let breakdowns = vec![
        breakdown(
            store,
            &rows,
            &columns.genre,
            LabelKind::Text,
            config.genre_threshold,
            BucketOrder::ByCount,
        ),
        breakdown(
            store,
            &rows,
            YEAR_PUBLISHED_COLUMN,
            LabelKind::Year,
            config.year_threshold,
            BucketOrder::ByYear,
        ),
        breakdown(
            store,
            &rows,
            PUBLISHER_COLUMN,
            LabelKind::Text,
            config.publisher_threshold,
            BucketOrder::ByCount,
        ),
        breakdown(
            store,
            &rows,
            MY_RATING_COLUMN,
            LabelKind::Rating,
            config.rating_threshold,
            BucketOrder::ByCount,
        ),
    ];

    StatsReport {
        books: rows.len(),
        breakdowns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
Title,Exclusive Shelf,My Rating,Genre,Year Published,Publisher
A,read,5,Fiction,1999,Penguin
B,read,4,Fiction,2001.0,Penguin
C,read,3,Fiction,0,Vintage
D,read,0,History,,Penguin
E,to-read,0,Fiction,1999,Vintage
,read,5,Fiction,1999,Penguin
F,read,2,,nope,
";

    fn store() -> RecordStore {
        RecordStore::from_reader(LOG.as_bytes()).unwrap()
    }

    fn labels(breakdown: &Breakdown) -> Vec<(&str, usize)> {
        breakdown
            .buckets
            .iter()
            .map(|b| (b.label.as_str(), b.count))
            .collect()
    }

    fn read_shelf() -> BookFilter {
        BookFilter {
            shelf: Some("read".into()),
            min_rating: None,
        }
    }

    #[test]
    fn leading_int_reads_like_a_lenient_parser() {
        assert_eq!(leading_int("1869.0"), Some(1869));
        assert_eq!(leading_int(" 4 stars"), Some(4));
        assert_eq!(leading_int("-12"), Some(-12));
        assert_eq!(leading_int("nope"), None);
        assert_eq!(leading_int(""), None);
    }

    #[test]
    fn read_shelf_keeps_titled_read_books() {
        assert_eq!(select_books(&store(), &read_shelf()), vec![0, 1, 2, 3, 6]);
        assert_eq!(select_books(&store(), &BookFilter::default()).len(), 6);
    }

    #[test]
    fn minimum_rating_drops_lower_rated_books() {
        let filter = BookFilter {
            shelf: Some("read".into()),
            min_rating: Some(4),
        };
        assert_eq!(select_books(&store(), &filter), vec![0, 1]);
    }

    #[test]
    fn small_categories_fold_into_other() {
        let store = store();
        let rows = select_books(&store, &read_shelf());
        let genres = breakdown(&store, &rows, "Genre", LabelKind::Text, 3, BucketOrder::ByCount);
        assert_eq!(labels(&genres), vec![("Fiction", 3), ("Other", 1), ("Unknown", 1)]);
    }

    #[test]
    fn years_are_ordered_with_unknown_and_other_last() {
        let store = store();
        let rows = select_books(&store, &read_shelf());

        let years = breakdown(&store, &rows, "Year Published", LabelKind::Year, 1, BucketOrder::ByYear);
        assert_eq!(labels(&years), vec![("1999", 1), ("2001", 1), ("Unknown", 3)]);

        let folded = breakdown(&store, &rows, "Year Published", LabelKind::Year, 2, BucketOrder::ByYear);
        assert_eq!(labels(&folded), vec![("Unknown", 3), ("Other", 2)]);
    }

    #[test]
    fn summary_uses_configured_thresholds() {
        let report = summarize(
            &store(),
            &read_shelf(),
            &ColumnsConfig::default(),
            &StatsConfig::default(),
        );
        assert_eq!(report.books, 5);
        let columns: Vec<&str> = report.breakdowns.iter().map(|b| b.column.as_str()).collect();
        assert_eq!(columns, vec!["Genre", "Year Published", "Publisher", "My Rating"]);

        // Threshold 1 never folds ratings
        assert_eq!(
            labels(&report.breakdowns[3]),
            vec![("0", 1), ("2", 1), ("3", 1), ("4", 1), ("5", 1)]
        );
        // Publisher threshold 5: Penguin (3) and Vintage (1) both fold
        assert_eq!(labels(&report.breakdowns[2]), vec![("Other", 4), ("Unknown", 1)]);
    }
}
