use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("artifact not in catalog: {0}")]
    NotFound(String),

    #[error("invalid base URL {url}: {source}")]
    InvalidBase {
        url:    String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid family tag: {0:?}")]
    InvalidFamily(String),

    #[error("invalid artifact path {0:?}")]
    InvalidPath(String),

    #[error("invalid SHA-256 checksum: {0}")]
    InvalidChecksum(String),

    #[error("negative size for {0}")]
    NegativeSize(String),

    #[error("duplicate artifact: {0}")]
    Duplicate(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantityParseError {
    #[error("empty storage quantity")]
    Empty,

    #[error("invalid number in storage quantity: {0:?}")]
    InvalidNumber(String),

    #[error("unknown storage unit: {0:?}")]
    UnknownUnit(String),
}
