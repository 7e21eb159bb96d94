use super::{absorb_failure, four_digit_year, get_json, LookupOracle};
use crate::common::constants::OPEN_LIBRARY_ORACLE;
use crate::common::error::Result;
use crate::common::types::{insert_present, Field, FieldMap, KeyKind};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

const PROVIDES: &[Field] = &[Field::Genre, Field::AuthorName, Field::PublicationYear];

/// Books-detail source: Open Library's `api/books` endpoint, keyed by ISBN-13.
pub struct OpenLibraryOracle {
    client: reqwest::Client,
    base_url: String,
}

impl OpenLibraryOracle {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn fetch(&self, isbn: &str) -> Result<Value> {
        let url = format!("{}/api/books", self.base_url.trim_end_matches('/'));
        let bibkey = format!("ISBN:{isbn}");
        let request = self.client.get(url).query(&[
            ("bibkeys", bibkey.as_str()),
            ("jscmd", "details"),
            ("format", "json"),
        ]);
        get_json(request).await
    }
}

/// Pull genre, first author and publish year out of a `jscmd=details` payload.
///
/// A payload without an entry for `isbn` means the source has no record.
pub fn extract_details(isbn: &str, payload: &Value) -> FieldMap {
    let mut fields = FieldMap::new();
    let Some(details) = payload
        .get(format!("ISBN:{isbn}"))
        .and_then(|entry| entry.get("details"))
    else {
        return fields;
    };

    // Subjects are usually `{ "name": ... }` objects but older records carry bare strings
    let genre = details["subjects"].as_array().and_then(|subjects| {
        subjects
            .iter()
            .find_map(|s| s.get("name").and_then(Value::as_str).or_else(|| s.as_str()))
    });
    insert_present(&mut fields, Field::Genre, genre);

    let author = details["authors"][0]["name"].as_str();
    insert_present(&mut fields, Field::AuthorName, author);

    // "March 2004" or "1869": the year is the trailing four characters. Dates
    // that end in anything else yield no year.
    let year = details["publish_date"].as_str().and_then(|date| {
        let date = date.trim();
        let start = date.char_indices().rev().nth(3).map(|(i, _)| i)?;
        four_digit_year(&date[start..])
    });
    insert_present(&mut fields, Field::PublicationYear, year);

    fields
}

#[async_trait]
impl LookupOracle for OpenLibraryOracle {
    fn name(&self) -> &'static str {
        OPEN_LIBRARY_ORACLE
    }

    fn key_kind(&self) -> KeyKind {
        KeyKind::Isbn13
    }

    fn provides(&self) -> &'static [Field] {
        PROVIDES
    }

    #[instrument(skip(self), fields(oracle = OPEN_LIBRARY_ORACLE))]
    async fn lookup(&self, key: &str) -> FieldMap {
        debug!("Querying Open Library");
        let result = self
            .fetch(key)
            .await
            .map(|payload| extract_details(key, &payload));
        absorb_failure(OPEN_LIBRARY_ORACLE, key, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ISBN: &str = "9780140449136";

    #[test]
    fn extracts_first_named_subject_author_and_year() {
        let payload = json!({
            "ISBN:9780140449136": {
                "details": {
                    "subjects": [{"url": "x"}, {"name": "Fiction"}, {"name": "Russia"}],
                    "authors": [{"name": "Fyodor Dostoyevsky"}, {"name": "David McDuff"}],
                    "publish_date": "March 2003"
                }
            }
        });
        let fields = extract_details(ISBN, &payload);

        assert_eq!(fields.get(&Field::Genre).map(String::as_str), Some("Fiction"));
        assert_eq!(
            fields.get(&Field::AuthorName).map(String::as_str),
            Some("Fyodor Dostoyevsky")
        );
        assert_eq!(fields.get(&Field::PublicationYear).map(String::as_str), Some("2003"));
    }

    #[test]
    fn bare_string_subjects_are_accepted() {
        let payload = json!({
            "ISBN:9780140449136": {"details": {"subjects": ["Classics"], "publish_date": "1869"}}
        });
        let fields = extract_details(ISBN, &payload);
        assert_eq!(fields.get(&Field::Genre).map(String::as_str), Some("Classics"));
        assert_eq!(fields.get(&Field::PublicationYear).map(String::as_str), Some("1869"));
        assert!(!fields.contains_key(&Field::AuthorName));
    }

    #[test]
    fn unknown_isbn_yields_nothing() {
        assert!(extract_details(ISBN, &json!({})).is_empty());
        assert!(extract_details(ISBN, &json!([])).is_empty());
    }

    #[test]
    fn missing_subjects_and_odd_dates_are_skipped() {
        let payload = json!({
            "ISBN:9780140449136": {"details": {"subjects": [], "publish_date": "n.d."}}
        });
        assert!(extract_details(ISBN, &payload).is_empty());
    }

    #[test]
    fn iso_dates_do_not_end_in_a_year() {
        let payload = json!({
            "ISBN:9780140449136": {"details": {"publish_date": "2004-03-01"}}
        });
        assert!(!extract_details(ISBN, &payload).contains_key(&Field::PublicationYear));
    }

    #[tokio::test]
    async fn unreachable_host_yields_no_data() {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(2))
            .build()
            .unwrap();
        let oracle = OpenLibraryOracle::new(client, "http://127.0.0.1:9");
        assert!(oracle.lookup(ISBN).await.is_empty());
    }
}
