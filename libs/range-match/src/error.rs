//! Error types for this library

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A query address failed to parse. Malformed query addresses are a caller
    /// error and are never silently treated as "not matched"
    #[error(transparent)]
    Codec(#[from] addr_codec::Error),
    /// The external range source could not supply the current CIDR lists. The
    /// previously loaded snapshot stays active
    #[error("Range source {id:?} unavailable: {reason}")]
    SourceUnavailable { id: String, reason: String },
    /// Another refresh already holds the writer guard
    #[error("A refresh is already in progress")]
    RefreshInProgress,
}
