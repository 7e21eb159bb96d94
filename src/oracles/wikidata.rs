use super::{absorb_failure, get_json, LookupOracle};
use crate::common::constants::{SPARQL_RESULTS_JSON, WIKIDATA_ORACLE};
use crate::common::error::{EnricherError, Result};
use crate::common::types::{insert_present, Field, FieldMap, KeyKind};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::{debug, instrument};

const PROVIDES: &[Field] = &[Field::AuthorNationality, Field::AuthorBirthYear];

/// Knowledge-graph source: Wikidata SPARQL, keyed by the cleaned author name.
///
/// Names are matched by exact English literal, so spelling variants and
/// transliterations miss.
pub struct WikidataOracle {
    client: reqwest::Client,
    endpoint: String,
}

impl WikidataOracle {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    async fn fetch(&self, name: &str) -> Result<Value> {
        let query = build_query(name);
        let request = self
            .client
            .get(&self.endpoint)
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .query(&[("query", query.as_str())]);
        get_json(request).await
    }
}

/// Escape a value for use inside a double-quoted SPARQL string literal.
fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Birth year and nationality label of the first entity carrying `name` as an English literal.
pub fn build_query(name: &str) -> String {
    format!(
        r#"SELECT ?birthYear ?nationalityLabel WHERE {{
  ?author ?label "{}"@en .
  OPTIONAL {{ ?author wdt:P27 ?nationality. }}
  OPTIONAL {{
    ?author wdt:P569 ?birthDate.
    BIND(YEAR(?birthDate) AS ?birthYear)
  }}
  SERVICE wikibase:label {{ bd:serviceParam wikibase:language "en". }}
}} LIMIT 1"#,
        escape_literal(name)
    )
}

/// Read the first binding. A birth year that is not an integer makes the whole
/// result malformed, so neither value is used.
pub fn extract_author_info(payload: &Value) -> Result<FieldMap> {
    let mut fields = FieldMap::new();
    let Some(row) = payload["results"]["bindings"]
        .as_array()
        .and_then(|bindings| bindings.first())
    else {
        return Ok(fields);
    };

    if let Some(raw) = row["birthYear"]["value"].as_str() {
        let year: i32 = raw.trim().parse().map_err(|_| EnricherError::MalformedPayload {
            oracle: WIKIDATA_ORACLE,
            message: format!("birthYear '{}' is not an integer", raw),
        })?;
        fields.insert(Field::AuthorBirthYear, year.to_string());
    }
    insert_present(
        &mut fields,
        Field::AuthorNationality,
        row["nationalityLabel"]["value"].as_str(),
    );
    Ok(fields)
}

#[async_trait]
impl LookupOracle for WikidataOracle {
    fn name(&self) -> &'static str {
        WIKIDATA_ORACLE
    }

    fn key_kind(&self) -> KeyKind {
        KeyKind::FullName
    }

    fn provides(&self) -> &'static [Field] {
        PROVIDES
    }

    #[instrument(skip(self), fields(oracle = WIKIDATA_ORACLE))]
    async fn lookup(&self, key: &str) -> FieldMap {
        debug!("Querying Wikidata");
        let result = self
            .fetch(key)
            .await
            .and_then(|payload| extract_author_info(&payload));
        absorb_failure(WIKIDATA_ORACLE, key, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_embeds_escaped_name() {
        let query = build_query(r#"Dwayne "The Rock" Johnson"#);
        assert!(query.contains(r#"?author ?label "Dwayne \"The Rock\" Johnson"@en ."#));
        assert!(query.ends_with("LIMIT 1"));
    }

    #[test]
    fn reads_birth_year_and_nationality() {
        let payload = json!({
            "head": {"vars": ["birthYear", "nationalityLabel"]},
            "results": {"bindings": [{
                "birthYear": {"datatype": "http://www.w3.org/2001/XMLSchema#integer", "type": "literal", "value": "1950"},
                "nationalityLabel": {"xml:lang": "en", "type": "literal", "value": "United Kingdom"}
            }]}
        });
        let fields = extract_author_info(&payload).unwrap();
        assert_eq!(fields.get(&Field::AuthorBirthYear).map(String::as_str), Some("1950"));
        assert_eq!(
            fields.get(&Field::AuthorNationality).map(String::as_str),
            Some("United Kingdom")
        );
    }

    #[test]
    fn each_value_is_independently_optional() {
        let payload = json!({"results": {"bindings": [{
            "nationalityLabel": {"type": "literal", "value": "Nigeria"}
        }]}});
        let fields = extract_author_info(&payload).unwrap();
        assert_eq!(fields.len(), 1);
        assert!(fields.contains_key(&Field::AuthorNationality));
    }

    #[test]
    fn no_bindings_yields_nothing() {
        let payload = json!({"results": {"bindings": []}});
        assert!(extract_author_info(&payload).unwrap().is_empty());
        assert!(extract_author_info(&json!({})).unwrap().is_empty());
    }

    #[test]
    fn malformed_birth_year_discards_both_values() {
        let payload = json!({"results": {"bindings": [{
            "birthYear": {"type": "literal", "value": "unknown"},
            "nationalityLabel": {"type": "literal", "value": "France"}
        }]}});
        let result = extract_author_info(&payload);
        assert!(matches!(result, Err(EnricherError::MalformedPayload { .. })));
        assert!(absorb_failure(WIKIDATA_ORACLE, "Someone", result).is_empty());
    }
}
