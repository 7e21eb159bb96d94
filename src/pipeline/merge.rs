//! Null-coalescing merge of oracle results into a record.
//!
//! A value is written only when the record's cell is absent and the oracle
//! value is present. Filled cells are never touched, which makes every pass
//! idempotent.

use crate::common::types::{Field, FieldMap};
use crate::config::ColumnsConfig;
use crate::observability::metrics;
use crate::record_store::{is_null, RecordStore};
use tracing::debug;

/// What happened to the "age when written" column for one merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgeOutcome {
    /// No birth year returned, or the age was already filled.
    #[default]
    NotAttempted,
    Computed(i32),
    /// Birth year returned but the row has no publication year.
    MissingPublicationYear,
    /// Publication year or birth year is not an integer, or the difference overflows.
    Unparseable,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Columns written by this merge, in field order.
    pub filled: Vec<String>,
    pub age: AgeOutcome,
}

/// Merge `fields` into `row`.
pub fn merge_fields(
    store: &mut RecordStore,
    row: usize,
    fields: &FieldMap,
    columns: &ColumnsConfig,
) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();

    for (field, value) in fields {
        if *field == Field::AuthorBirthYear {
            outcome.age = merge_age(store, row, value, columns);
            if let AgeOutcome::Computed(_) = outcome.age {
                outcome.filled.push(columns.author_age.clone());
            }
            continue;
        }

        let column = columns.column_for(*field);
        if store.get(row, column).is_some() || is_null(value) {
            continue;
        }
        debug!(row, column, value = %value, "Filling field");
        store.set(row, column, value.as_str());
        metrics::merge::field_filled(column);
        outcome.filled.push(column.to_string());
    }

    outcome
}

fn merge_age(store: &mut RecordStore, row: usize, birth_year: &str, columns: &ColumnsConfig) -> AgeOutcome {
    if store.get(row, &columns.author_age).is_some() {
        return AgeOutcome::NotAttempted;
    }
    let Some(published) = store
        .get(row, &columns.publication_year)
        .map(|year| year.trim().parse::<i32>())
    else {
        return AgeOutcome::MissingPublicationYear;
    };

    let age = match (published, birth_year.trim().parse::<i32>()) {
        (Ok(published), Ok(born)) => published.checked_sub(born),
        _ => None,
    };
    match age {
        Some(age) => {
            store.set(row, &columns.author_age, age.to_string());
            metrics::merge::field_filled(&columns.author_age);
            metrics::merge::age_computed();
            AgeOutcome::Computed(age)
        }
        None => {
            debug!(row, birth_year, "Cannot compute age from these years");
            metrics::merge::age_parse_failed();
            AgeOutcome::Unparseable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(rows: &str) -> RecordStore {
        let csv = format!(
            "Author,Genre,Original Publication Year,Author Age When Written\n{}",
            rows
        );
        RecordStore::from_reader(csv.as_bytes()).unwrap()
    }

    fn fields(pairs: &[(Field, &str)]) -> FieldMap {
        pairs.iter().map(|(f, v)| (*f, v.to_string())).collect()
    }

    #[test]
    fn fills_only_absent_cells() {
        let mut store = store("Leo Tolstoy,,1869,\n");
        let columns = ColumnsConfig::default();
        let outcome = merge_fields(
            &mut store,
            0,
            &fields(&[(Field::Genre, "Fiction"), (Field::PublicationYear, "1999")]),
            &columns,
        );

        assert_eq!(outcome.filled, vec!["Genre".to_string()]);
        assert_eq!(store.get(0, "Genre"), Some("Fiction"));
        assert_eq!(store.get(0, "Original Publication Year"), Some("1869"));
    }

    #[test]
    fn existing_values_are_never_overwritten() {
        let mut store = store("Leo Tolstoy,History,1869,41\n");
        let before = store.clone();
        let outcome = merge_fields(
            &mut store,
            0,
            &fields(&[
                (Field::Genre, "Fiction"),
                (Field::AuthorName, "Someone Else"),
                (Field::AuthorBirthYear, "1800"),
            ]),
            &ColumnsConfig::default(),
        );

        assert!(outcome.filled.is_empty());
        assert_eq!(outcome.age, AgeOutcome::NotAttempted);
        assert_eq!(store, before);
    }

    #[test]
    fn age_is_publication_minus_birth_year() {
        let mut store = store("Someone,,1999,\n");
        let outcome = merge_fields(
            &mut store,
            0,
            &fields(&[(Field::AuthorBirthYear, "1950")]),
            &ColumnsConfig::default(),
        );

        assert_eq!(outcome.age, AgeOutcome::Computed(49));
        assert_eq!(store.get(0, "Author Age When Written"), Some("49"));
        assert_eq!(outcome.filled, vec!["Author Age When Written".to_string()]);
    }

    #[test]
    fn non_numeric_publication_year_leaves_age_unset() {
        let mut store = store("Someone,,N/A,\nSomeone,,sometime,\n");
        let columns = ColumnsConfig::default();
        let birth = fields(&[(Field::AuthorBirthYear, "1950")]);

        let first = merge_fields(&mut store, 0, &birth, &columns);
        let second = merge_fields(&mut store, 1, &birth, &columns);

        assert_eq!(first.age, AgeOutcome::MissingPublicationYear);
        assert_eq!(second.age, AgeOutcome::Unparseable);
        assert_eq!(store.get(0, "Author Age When Written"), None);
        assert_eq!(store.get(1, "Author Age When Written"), None);
    }

    #[test]
    fn out_of_range_years_leave_age_unset() {
        let mut store = store("X,,2147483647,\n");
        let outcome = merge_fields(
            &mut store,
            0,
            &fields(&[(Field::AuthorBirthYear, "-1")]),
            &ColumnsConfig::default(),
        );

        assert_eq!(outcome.age, AgeOutcome::Unparseable);
        assert!(outcome.filled.is_empty());
        assert_eq!(store.get(0, "Author Age When Written"), None);
    }

    #[test]
    fn publication_year_from_the_same_lookup_feeds_the_age() {
        let mut store = store("Someone,,,\n");
        let outcome = merge_fields(
            &mut store,
            0,
            &fields(&[(Field::PublicationYear, "2001"), (Field::AuthorBirthYear, "1960")]),
            &ColumnsConfig::default(),
        );
        assert_eq!(outcome.age, AgeOutcome::Computed(41));
        assert_eq!(
            outcome.filled,
            vec![
                "Original Publication Year".to_string(),
                "Author Age When Written".to_string()
            ]
        );
    }

    #[test]
    fn missing_target_column_is_created() {
        let mut store = store("Someone,,1999,\n");
        merge_fields(
            &mut store,
            0,
            &fields(&[(Field::AuthorNationality, "Japan")]),
            &ColumnsConfig::default(),
        );
        assert_eq!(store.get(0, "Author Nationality"), Some("Japan"));
    }
}
