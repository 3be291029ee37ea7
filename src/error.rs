use jiff::civil::Date;
use thiserror::Error;

/// Bad run parameters, detected before any network access.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("run parameters are null")]
    MissingParameters,
    #[error("run parameter at position {position} is empty")]
    EmptyParameter { position: usize },
    #[error("expected {expected} parameters, got {actual}")]
    ParameterCount { expected: usize, actual: usize },
    #[error("currency symbol should contain only 3 letters, got '{value}'")]
    CurrencySymbol { value: String },
    #[error("{field} '{value}' is not a YYYY-MM-DD date: {reason}")]
    Date {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("start date is not before end date, start date = {start}, end date = {end}")]
    DateOrder { start: Date, end: Date },
}

/// Index or table retrieval failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: ureq::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("{url} declares unsupported encoding '{label}'")]
    Encoding { url: String, label: String },
    #[error("malformed XML in {url}: {source}")]
    Markup {
        url: String,
        #[source]
        source: roxmltree::Error,
    },
}

/// Something the table should contain is not there.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("document has no <{tag}> tags")]
    TagMissing { tag: &'static str },
    #[error("no <{tag}> with value '{symbol}'")]
    Currency { tag: &'static str, symbol: String },
    #[error("<{tag}> missing for currency '{symbol}'")]
    Rate { tag: &'static str, symbol: String },
}

/// Text found in the table does not have the expected format.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("<{tag}> value '{value}' is not a number")]
    Number { tag: &'static str, value: String },
    #[error("<{tag}> not found in document header")]
    MissingDate { tag: &'static str },
    #[error("<{tag}> value '{value}' is not a date: {reason}")]
    Date {
        tag: &'static str,
        value: String,
        reason: String,
    },
}

/// Top-level error for a statistics run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid parameters: {0}")]
    Validation(#[from] ValidationError),
    #[error("download failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("rate lookup failed: {0}")]
    Lookup(#[from] LookupError),
    #[error("rate parsing failed: {0}")]
    Parse(#[from] ParseError),
    #[error("no rate tables published between {start} and {end}")]
    NoTables { start: Date, end: Date },
}

impl Error {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Fetch(_) => 3,
            Self::Lookup(_) => 4,
            Self::Parse(_) => 5,
            Self::NoTables { .. } => 6,
        }
    }
}
