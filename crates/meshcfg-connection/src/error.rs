//! Connection error types

/// Errors parsing connection descriptors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// Role string is neither `admin` nor `client`
    #[error("unknown connection role: {0}")]
    UnknownRole(String),

    /// Transport string is not `tcp`, `serial` or `mqtt`
    #[error("unknown connection type: {0}")]
    UnknownType(String),
}
