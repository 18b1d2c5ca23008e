//! meshcfg PKI
//!
//! Taxonomy of the error codes a node reports in its admin acknowledgment.
//!
//! - [`ErrorClass::RecoverableSession`]: stale or rejected session; retry
//!   after establishing a fresh admin session
//! - [`ErrorClass::RequiresKeyConfiguration`]: trust problem; retrying is
//!   futile until an operator configures keys
//! - [`ErrorClass::Unrelated`]: ordinary transport errors for generic
//!   retry/backoff, including any code this crate does not know

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod codes;

pub use codes::{
    classify, is_key_configuration_error, is_pki_related, is_recoverable_session_error,
    AdminErrorCode, ErrorClass, RECOVERABLE_SESSION_ERRORS, REQUIRES_KEY_CONFIGURATION,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
