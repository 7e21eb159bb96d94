use std::collections::BTreeMap;
use std::fmt;

/// A value an oracle can contribute to a record.
///
/// Ordering matters: `AuthorBirthYear` sorts last so that a publication year
/// returned in the same lookup is merged before the age is derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Genre,
    AuthorName,
    PublicationYear,
    AuthorGender,
    AuthorNationality,
    /// Never stored directly; feeds the "age when written" column.
    AuthorBirthYear,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Genre => "genre",
            Field::AuthorName => "author_name",
            Field::PublicationYear => "publish_year",
            Field::AuthorGender => "author_gender",
            Field::AuthorNationality => "author_nationality",
            Field::AuthorBirthYear => "author_birth_year",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partial result of a lookup. Only non-null values are ever stored.
pub type FieldMap = BTreeMap<Field, String>;

/// Store `value` under `field` when it carries actual text.
pub fn insert_present(map: &mut FieldMap, field: Field, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        map.insert(field, value.to_string());
    }
}

/// Which derived key an oracle is queried with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Isbn13,
    /// Leading token of the cleaned author name.
    FirstName,
    /// Cleaned author name with qualifiers removed.
    FullName,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KeyKind::Isbn13 => "isbn13",
            KeyKind::FirstName => "first_name",
            KeyKind::FullName => "full_name",
        };
        f.write_str(s)
    }
}
