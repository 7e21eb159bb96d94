//! Lookup keys derived from raw reading-log cells.

use once_cell::sync::Lazy;
use regex::Regex;

static ISBN13_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{13}").expect("valid regex"));
static QUALIFIER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.*\)").expect("valid regex"));
static FIRST_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z\-']+").expect("valid regex"));

/// First 13 consecutive ASCII digits in a raw ISBN cell such as `="9780140449136"`.
pub fn isbn13(raw: &str) -> Option<String> {
    ISBN13_RE.find(raw).map(|m| m.as_str().to_string())
}

/// Author name with any parenthesized qualifier (translator credit etc.) removed.
pub fn clean_author(raw: &str) -> Option<String> {
    let cleaned = QUALIFIER_RE.replace_all(raw, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Leading run of letters, hyphens and apostrophes of a cleaned name.
pub fn first_name(clean: &str) -> Option<String> {
    FIRST_NAME_RE.find(clean).map(|m| m.as_str().to_string())
}

/// Keys derived from one author cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorKeys {
    /// Used for nationality and birth-year lookups.
    pub full_name: String,
    /// Used for gender lookups only.
    pub first_name: Option<String>,
}

impl AuthorKeys {
    pub fn derive(raw: &str) -> Option<Self> {
        let full_name = clean_author(raw)?;
        let first_name = first_name(&full_name);
        Some(Self {
            full_name,
            first_name,
        })
    }
}
