use std::fmt;
use thiserror::Error;

/// Outcome of an ingestion or removal, as seen by callers.
#[derive(Debug, Error)]
pub enum Error {
    #[error("company already exists: {ticker}")]
    AlreadyExists { ticker: String },

    #[error("no company with ticker: {ticker}")]
    NotFound { ticker: String },

    #[error("failed to scrape {ticker}: {source}")]
    ScrapeFailed {
        ticker: String,
        #[source]
        source: ScrapeError,
    },

    #[error("store failure: {0}")]
    StoreFailed(#[from] StoreError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ScrapeFailed { .. } => ErrorKind::ScrapeFailed,
            Self::StoreFailed(_) => ErrorKind::StoreFailed,
        }
    }
}

/// Stable outward category of an [`Error`].
///
/// Both the string code and the exit code are part of the external contract;
/// do not renumber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    ScrapeFailed,
    StoreFailed,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyExists => "already_exists",
            Self::NotFound => "not_found",
            Self::ScrapeFailed => "scrape_failed",
            Self::StoreFailed => "store_failed",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::AlreadyExists => 3,
            Self::NotFound => 4,
            Self::ScrapeFailed => 5,
            Self::StoreFailed => 6,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// -------------------------------------------------------------------------------------------------

/// Failure while fetching or reading the external pages.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("summary page has no <h1> heading")]
    MissingHeading,

    #[error("heading {0:?} has no \" - \" delimiter")]
    MissingDelimiter(String),

    #[error("historical prices table not found")]
    MissingTable,

    #[error(transparent)]
    Malformed(#[from] MalformedRow),
}

/// A dividend row that could not be read; aborts the whole fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed dividend row {row:?}: {reason}")]
pub struct MalformedRow {
    pub row: String,
    pub reason: String,
}

impl MalformedRow {
    pub(crate) fn new(row: &str, reason: impl Into<String>) -> Self {
        Self {
            row: row.to_string(),
            reason: reason.into(),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Failure inside one of the repositories.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),

    #[error(transparent)]
    Pool(#[from] deadpool_postgres::PoolError),

    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Classify a driver error, lifting unique violations into [`StoreError::Conflict`].
    pub(crate) fn from_pg(err: tokio_postgres::Error) -> Self {
        if err.code() == Some(&tokio_postgres::error::SqlState::UNIQUE_VIOLATION) {
            return Self::Conflict(err.to_string());
        }
        Self::Postgres(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_distinct_signal() {
        let kinds = [
            ErrorKind::AlreadyExists,
            ErrorKind::NotFound,
            ErrorKind::ScrapeFailed,
            ErrorKind::StoreFailed,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a.code(), b.code());
                assert_ne!(a.exit_code(), b.exit_code());
            }
        }
    }

    #[test]
    fn errors_map_to_their_kind() {
        let err = Error::AlreadyExists {
            ticker: "AAPL".into(),
        };
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(err.to_string(), "company already exists: AAPL");

        let err = Error::ScrapeFailed {
            ticker: "AAPL".into(),
            source: MalformedRow::new("Foo 15, 2021 0.42 Dividend", "unknown month \"Foo\"").into(),
        };
        assert_eq!(err.kind(), ErrorKind::ScrapeFailed);

        let err: Error = StoreError::Other("disk full".into()).into();
        assert_eq!(err.kind(), ErrorKind::StoreFailed);
    }
}
