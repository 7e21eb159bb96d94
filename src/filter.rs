//! Selection of rows that still lack one or more target fields.

use crate::record_store::RecordStore;

/// Whether `row` is missing at least one of `targets`.
pub fn is_incomplete(store: &RecordStore, row: usize, targets: &[&str]) -> bool {
    targets.iter().any(|column| store.get(row, column).is_none())
}

/// Indices of incomplete rows, in dataset order.
pub fn incomplete_rows(store: &RecordStore, targets: &[&str]) -> Vec<usize> {
    (0..store.len())
        .filter(|&row| is_incomplete(store, row, targets))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> RecordStore {
        RecordStore::from_reader(
            "Title,Genre,Author Gender\n\
             A,Fiction,female\n\
             B,,male\n\
             C,NaN,\n\
             D,History,nan\n"
                .as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn selects_rows_missing_any_target() {
        let rows = incomplete_rows(&store(), &["Genre", "Author Gender"]);
        assert_eq!(rows, vec![1, 2, 3]);
    }

    #[test]
    fn missing_column_makes_every_row_incomplete() {
        let rows = incomplete_rows(&store(), &["Genre", "Author Nationality"]);
        assert_eq!(rows, vec![0, 1, 2, 3]);
    }

    #[test]
    fn no_targets_selects_nothing() {
        assert!(incomplete_rows(&store(), &[]).is_empty());
        assert!(!is_incomplete(&store(), 0, &["Genre", "Author Gender"]));
    }
}
