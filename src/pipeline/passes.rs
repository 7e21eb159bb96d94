use super::{EnrichmentPass, PassStep};
use crate::common::constants::*;
use crate::config::Config;
use crate::oracles::{GenderizeOracle, GoogleBooksOracle, LookupOracle, OpenLibraryOracle, WikidataOracle};
use crate::pacing::{MinIntervalPacer, Pacer, Unpaced};
use std::fmt;

/// The three chained passes, in the order `run` applies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    BooksDetail,
    BooksSearch,
    Authors,
}

impl PassKind {
    pub const ALL: [PassKind; 3] = [PassKind::BooksDetail, PassKind::BooksSearch, PassKind::Authors];

    pub fn name(self) -> &'static str {
        match self {
            PassKind::BooksDetail => "books-detail",
            PassKind::BooksSearch => "books-search",
            PassKind::Authors => "authors",
        }
    }

    /// File this pass reads when chained by `run`.
    pub fn default_input(self) -> &'static str {
        match self {
            PassKind::BooksDetail => LIBRARY_EXPORT_FILE,
            PassKind::BooksSearch => BOOKS_DETAIL_OUTPUT_FILE,
            PassKind::Authors => BOOKS_SEARCH_OUTPUT_FILE,
        }
    }

    pub fn default_output(self) -> &'static str {
        match self {
            PassKind::BooksDetail => BOOKS_DETAIL_OUTPUT_FILE,
            PassKind::BooksSearch => BOOKS_SEARCH_OUTPUT_FILE,
            PassKind::Authors => AUTHORS_OUTPUT_FILE,
        }
    }
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn pacer(paced: bool, millis: u64) -> Box<dyn Pacer> {
    if paced {
        Box::new(MinIntervalPacer::from_millis(millis))
    } else {
        Box::new(Unpaced)
    }
}

/// Wire up the oracles for `kind` against the configured endpoints.
pub fn build_pass(kind: PassKind, config: &Config, client: &reqwest::Client, paced: bool) -> EnrichmentPass {
    let endpoints = &config.endpoints;
    let pacing = &config.pacing;

    let step = |oracle: Box<dyn LookupOracle>, millis: u64| PassStep::new(oracle, pacer(paced, millis));

    let steps = match kind {
        PassKind::BooksDetail => vec![step(
            Box::new(OpenLibraryOracle::new(client.clone(), endpoints.open_library.as_str())),
            pacing.open_library_ms,
        )],
        PassKind::BooksSearch => vec![step(
            Box::new(GoogleBooksOracle::new(client.clone(), endpoints.google_books.as_str())),
            pacing.google_books_ms,
        )],
        // Gender first, then the knowledge graph, per row
        PassKind::Authors => vec![
            step(
                Box::new(GenderizeOracle::new(client.clone(), endpoints.genderize.as_str())),
                pacing.genderize_ms,
            ),
            step(
                Box::new(WikidataOracle::new(client.clone(), endpoints.wikidata_sparql.as_str())),
                pacing.wikidata_ms,
            ),
        ],
    };
    EnrichmentPass::new(kind.name(), config.columns.clone(), steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chained_files_line_up() {
        for pair in PassKind::ALL.windows(2) {
            assert_eq!(pair[0].default_output(), pair[1].default_input());
        }
        assert_eq!(PassKind::BooksDetail.default_input(), LIBRARY_EXPORT_FILE);
        assert_eq!(PassKind::Authors.default_output(), AUTHORS_OUTPUT_FILE);
    }

    #[test]
    fn passes_target_their_oracle_columns() {
        let config = Config::default();
        let client = reqwest::Client::new();

        let detail = build_pass(PassKind::BooksDetail, &config, &client, false);
        assert_eq!(
            detail.target_columns(),
            vec![GENRE_COLUMN, AUTHOR_COLUMN, PUBLICATION_YEAR_COLUMN]
        );

        let authors = build_pass(PassKind::Authors, &config, &client, false);
        assert_eq!(authors.name(), "authors");
        assert_eq!(
            authors.target_columns(),
            vec![AUTHOR_GENDER_COLUMN, AUTHOR_NATIONALITY_COLUMN, AUTHOR_AGE_COLUMN]
        );
    }
}
