use crate::common::constants::*;
use crate::common::error::{EnricherError, Result};
use crate::common::types::Field;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Runtime configuration. Every section and key is optional in the TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub columns: ColumnsConfig,
    pub endpoints: EndpointsConfig,
    pub pacing: PacingConfig,
    pub http: HttpConfig,
    pub metrics: MetricsConfig,
    pub stats: StatsConfig,
}

/// Column names in the reading-log table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    pub isbn: String,
    pub author: String,
    pub genre: String,
    pub publication_year: String,
    pub author_gender: String,
    pub author_nationality: String,
    pub author_age: String,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            isbn: ISBN_COLUMN.to_string(),
            author: AUTHOR_COLUMN.to_string(),
            genre: GENRE_COLUMN.to_string(),
            publication_year: PUBLICATION_YEAR_COLUMN.to_string(),
            author_gender: AUTHOR_GENDER_COLUMN.to_string(),
            author_nationality: AUTHOR_NATIONALITY_COLUMN.to_string(),
            author_age: AUTHOR_AGE_COLUMN.to_string(),
        }
    }
}

impl ColumnsConfig {
    /// The column a field lands in. A birth year is never stored; it targets the age column.
    pub fn column_for(&self, field: Field) -> &str {
        match field {
            Field::Genre => &self.genre,
            Field::AuthorName => &self.author,
            Field::PublicationYear => &self.publication_year,
            Field::AuthorGender => &self.author_gender,
            Field::AuthorNationality => &self.author_nationality,
            Field::AuthorBirthYear => &self.author_age,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub open_library: String,
    pub google_books: String,
    pub genderize: String,
    pub wikidata_sparql: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            open_library: OPEN_LIBRARY_BASE_URL.to_string(),
            google_books: GOOGLE_BOOKS_BASE_URL.to_string(),
            genderize: GENDERIZE_BASE_URL.to_string(),
            wikidata_sparql: WIKIDATA_SPARQL_URL.to_string(),
        }
    }
}

/// Milliseconds between consecutive calls to each source
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub open_library_ms: u64,
    pub google_books_ms: u64,
    pub genderize_ms: u64,
    pub wikidata_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            open_library_ms: OPEN_LIBRARY_PACING_MS,
            google_books_ms: GOOGLE_BOOKS_PACING_MS,
            genderize_ms: GENDERIZE_PACING_MS,
            wikidata_ms: WIKIDATA_PACING_MS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// When set, a Prometheus text snapshot is written here after the run.
    pub snapshot_path: Option<PathBuf>,
}

/// Reading-log summary settings. Categories with fewer rows than their
/// threshold are folded into "Other"; a threshold of 1 never folds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub shelf: String,
    pub genre_threshold: usize,
    pub year_threshold: usize,
    pub publisher_threshold: usize,
    pub rating_threshold: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            shelf: READ_SHELF.to_string(),
            genre_threshold: GENRE_OTHER_THRESHOLD,
            year_threshold: YEAR_OTHER_THRESHOLD,
            publisher_threshold: PUBLISHER_OTHER_THRESHOLD,
            rating_threshold: RATING_OTHER_THRESHOLD,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicitly given path must exist. Without one, `enricher.toml` in the
    /// working directory is used when present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };
        config.apply_overrides_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EnricherError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ENRICHER_*` overrides using `lookup` to read variables.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(agent) = lookup(ENV_USER_AGENT).filter(|v| !v.trim().is_empty()) {
            self.http.user_agent = agent;
        }
        if let Some(raw) = lookup(ENV_HTTP_TIMEOUT_SECS) {
            self.http.timeout_secs = raw.trim().parse().map_err(|_| {
                EnricherError::Config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_HTTP_TIMEOUT_SECS, raw
                ))
            })?;
        }
        if let Some(path) = lookup(ENV_METRICS_SNAPSHOT).filter(|v| !v.trim().is_empty()) {
            self.metrics.snapshot_path = Some(PathBuf::from(path));
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 {
            return Err(EnricherError::Config(
                "http.timeout_secs must be greater than zero".into(),
            ));
        }
        let columns = [
            &self.columns.isbn,
            &self.columns.author,
            &self.columns.genre,
            &self.columns.publication_year,
            &self.columns.author_gender,
            &self.columns.author_nationality,
            &self.columns.author_age,
        ];
        if columns.iter().any(|c| c.trim().is_empty()) {
            return Err(EnricherError::Config("column names must not be empty".into()));
        }
        Ok(())
    }
}
