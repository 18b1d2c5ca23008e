//! Registry error types

use crate::transaction::TransactionId;

/// Errors returned by [`ChangeRegistry`](crate::ChangeRegistry) operations
///
/// Neither variant is fatal: unknown ids are expected when racing with
/// cleanup, and inactive transactions simply decline further mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No transaction with this id
    #[error("transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Transaction already completed or aborted
    #[error("transaction is not active: {0}")]
    TransactionInactive(TransactionId),
}

impl RegistryError {
    /// Unknown transaction id
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TransactionNotFound(_))
    }

    /// Transaction exists but no longer accepts mutation
    #[inline]
    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::TransactionInactive(_))
    }

    /// Transaction the error refers to
    #[must_use]
    pub fn transaction_id(&self) -> &TransactionId {
        match self {
            Self::TransactionNotFound(id) | Self::TransactionInactive(id) => id,
        }
    }
}
