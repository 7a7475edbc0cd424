//! Error types for this library

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Invalid IP address: {0:?}")]
    InvalidAddress(String),
    #[error("Invalid CIDR block: {0:?}")]
    InvalidCidr(String),
}
