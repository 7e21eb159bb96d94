use super::{absorb_failure, four_digit_year, get_json, LookupOracle};
use crate::common::constants::GOOGLE_BOOKS_ORACLE;
use crate::common::error::Result;
use crate::common::types::{insert_present, Field, FieldMap, KeyKind};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

const PROVIDES: &[Field] = &[Field::Genre, Field::PublicationYear];

/// Books-search source: Google Books volume search by ISBN.
pub struct GoogleBooksOracle {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleBooksOracle {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn fetch(&self, isbn: &str) -> Result<Value> {
        let url = format!("{}/books/v1/volumes", self.base_url.trim_end_matches('/'));
        let query = format!("isbn:{isbn}");
        get_json(self.client.get(url).query(&[("q", query.as_str())])).await
    }
}

/// Genre and year from the first search hit's `volumeInfo`.
pub fn extract_volume(payload: &Value) -> FieldMap {
    let mut fields = FieldMap::new();
    let Some(info) = payload["items"]
        .as_array()
        .and_then(|items| items.first())
        .map(|item| &item["volumeInfo"])
    else {
        return fields;
    };

    insert_present(&mut fields, Field::Genre, info["categories"][0].as_str());

    // publishedDate is "2003", "2003-03" or "2003-03-01"
    let year = info["publishedDate"]
        .as_str()
        .and_then(|date| date.get(..4))
        .and_then(four_digit_year);
    insert_present(&mut fields, Field::PublicationYear, year);

    fields
}

#[async_trait]
impl LookupOracle for GoogleBooksOracle {
    fn name(&self) -> &'static str {
        GOOGLE_BOOKS_ORACLE
    }

    fn key_kind(&self) -> KeyKind {
        KeyKind::Isbn13
    }

    fn provides(&self) -> &'static [Field] {
        PROVIDES
    }

    #[instrument(skip(self), fields(oracle = GOOGLE_BOOKS_ORACLE))]
    async fn lookup(&self, key: &str) -> FieldMap {
        debug!("Querying Google Books");
        let result = self.fetch(key).await.map(|payload| extract_volume(&payload));
        absorb_failure(GOOGLE_BOOKS_ORACLE, key, result)
    }
}
