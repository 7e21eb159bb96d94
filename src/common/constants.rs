/// Source name constants to ensure consistency across logs, metrics and the CLI
// Oracle names (used in logs and metric labels)
pub const OPEN_LIBRARY_ORACLE: &str = "open_library";
pub const GOOGLE_BOOKS_ORACLE: &str = "google_books";
pub const GENDERIZE_ORACLE: &str = "genderize";
pub const WIKIDATA_ORACLE: &str = "wikidata";

// Public endpoints
pub const OPEN_LIBRARY_BASE_URL: &str = "https://openlibrary.org";
pub const GOOGLE_BOOKS_BASE_URL: &str = "https://www.googleapis.com";
pub const GENDERIZE_BASE_URL: &str = "https://api.genderize.io";
pub const WIKIDATA_SPARQL_URL: &str = "https://query.wikidata.org/sparql";

pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

// Goodreads export column names
pub const ISBN_COLUMN: &str = "ISBN13";
pub const AUTHOR_COLUMN: &str = "Author";
pub const GENRE_COLUMN: &str = "Genre";
pub const PUBLICATION_YEAR_COLUMN: &str = "Original Publication Year";
pub const AUTHOR_GENDER_COLUMN: &str = "Author Gender";
pub const AUTHOR_NATIONALITY_COLUMN: &str = "Author Nationality";
pub const AUTHOR_AGE_COLUMN: &str = "Author Age When Written";
pub const TITLE_COLUMN: &str = "Title";
pub const EXCLUSIVE_SHELF_COLUMN: &str = "Exclusive Shelf";
pub const MY_RATING_COLUMN: &str = "My Rating";
pub const YEAR_PUBLISHED_COLUMN: &str = "Year Published";
pub const PUBLISHER_COLUMN: &str = "Publisher";

// Reading-log summary defaults
pub const READ_SHELF: &str = "read";
pub const GENRE_OTHER_THRESHOLD: usize = 3;
pub const YEAR_OTHER_THRESHOLD: usize = 5;
pub const PUBLISHER_OTHER_THRESHOLD: usize = 5;
pub const RATING_OTHER_THRESHOLD: usize = 1;

// Pass file names, chained in this order by `run`
pub const LIBRARY_EXPORT_FILE: &str = "goodreads_library_export.csv";
pub const BOOKS_DETAIL_OUTPUT_FILE: &str = "goodreads_enriched.csv";
pub const BOOKS_SEARCH_OUTPUT_FILE: &str = "goodreads_enriched_google.csv";
pub const AUTHORS_OUTPUT_FILE: &str = "goodreads_fully_enriched.csv";

// Minimum spacing between calls to each source, in milliseconds
pub const OPEN_LIBRARY_PACING_MS: u64 = 1000;
pub const GOOGLE_BOOKS_PACING_MS: u64 = 1000;
pub const GENDERIZE_PACING_MS: u64 = 500;
pub const WIKIDATA_PACING_MS: u64 = 1200;

pub const DEFAULT_CONFIG_FILE: &str = "enricher.toml";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!(
    "reading_log_enricher/",
    env!("CARGO_PKG_VERSION"),
    " (personal reading-log enrichment)"
);

// Environment overrides
pub const ENV_USER_AGENT: &str = "ENRICHER_USER_AGENT";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "ENRICHER_HTTP_TIMEOUT_SECS";
pub const ENV_METRICS_SNAPSHOT: &str = "ENRICHER_METRICS_SNAPSHOT";
