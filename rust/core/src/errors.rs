use thiserror::Error;

/// File-level detection failure. Non-fatal to a batch: other files continue.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DetectError {
    #[error("unrecognized hand history format near: {excerpt:?}")]
    UnrecognizedFormat { excerpt: String },
    #[error("input is empty")]
    EmptyInput,
}

/// Hand-level parse failure. The hand is retained as a best-effort partial
/// record for audit and excluded from statistics.
#[derive(Debug, Error, PartialEq, Eq, Clone, serde::Serialize, serde::Deserialize)]
pub enum ParseError {
    #[error("malformed header: {0}")]
    BadHeader(String),
    #[error("invalid card token: {0}")]
    BadCard(String),
    #[error("invalid monetary amount: {0}")]
    BadAmount(String),
    #[error("unparseable action line: {0}")]
    BadAction(String),
    #[error("missing summary section")]
    MissingSummary,
    #[error("truncated {0} block")]
    TruncatedBlock(String),
    #[error("invalid timestamp: {0}")]
    BadTimestamp(String),
}

/// Store access failure. Fatal for the current ingest/statistics call:
/// callers fail fast instead of returning partial or silently wrong results.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("hand store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the ingestion pipeline entry points.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("upload is not valid UTF-8 text")]
    NotText,
    #[error(transparent)]
    Detect(#[from] DetectError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
