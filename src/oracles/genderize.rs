use super::{absorb_failure, get_json, LookupOracle};
use crate::common::constants::GENDERIZE_ORACLE;
use crate::common::error::Result;
use crate::common::types::{insert_present, Field, FieldMap, KeyKind};
use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

const PROVIDES: &[Field] = &[Field::AuthorGender];

/// Gender-inference source: genderize.io, keyed by first name.
pub struct GenderizeOracle {
    client: reqwest::Client,
    base_url: String,
}

impl GenderizeOracle {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn fetch(&self, first_name: &str) -> Result<Value> {
        get_json(self.client.get(&self.base_url).query(&[("name", first_name)])).await
    }
}

/// The categorical label, absent when the name could not be classified
/// (`"gender": null`).
pub fn extract_gender(payload: &Value) -> FieldMap {
    let mut fields = FieldMap::new();
    insert_present(&mut fields, Field::AuthorGender, payload["gender"].as_str());
    fields
}

#[async_trait]
impl LookupOracle for GenderizeOracle {
    fn name(&self) -> &'static str {
        GENDERIZE_ORACLE
    }

    fn key_kind(&self) -> KeyKind {
        KeyKind::FirstName
    }

    fn provides(&self) -> &'static [Field] {
        PROVIDES
    }

    #[instrument(skip(self), fields(oracle = GENDERIZE_ORACLE))]
    async fn lookup(&self, key: &str) -> FieldMap {
        let result = self.fetch(key).await.map(|payload| extract_gender(&payload));
        absorb_failure(GENDERIZE_ORACLE, key, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classified_name() {
        let payload = json!({"count": 1094417, "name": "jane", "gender": "female", "probability": 0.98});
        let fields = extract_gender(&payload);
        assert_eq!(fields.get(&Field::AuthorGender).map(String::as_str), Some("female"));
    }

    #[test]
    fn unclassified_name_is_absent() {
        let payload = json!({"count": 0, "name": "zzyzx", "gender": null, "probability": 0.0});
        assert!(extract_gender(&payload).is_empty());
    }

    #[test]
    fn error_payload_is_absent() {
        assert!(extract_gender(&json!({"error": "Request limit reached"})).is_empty());
    }
}
