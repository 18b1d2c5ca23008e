//! Admin error codes and their classification

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Codes that clear after re-establishing an admin session
pub const RECOVERABLE_SESSION_ERRORS: [AdminErrorCode; 2] =
    [AdminErrorCode::AdminBadSessionKey, AdminErrorCode::PkiFailed];

/// Codes that need operator key configuration before any retry can succeed
pub const REQUIRES_KEY_CONFIGURATION: [AdminErrorCode; 3] = [
    AdminErrorCode::PkiUnknownPubkey,
    AdminErrorCode::AdminPublicKeyUnauthorized,
    AdminErrorCode::NotAuthorized,
];

/// Error code reported by a node's routing/admin acknowledgment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AdminErrorCode {
    /// No error
    None,
    /// No route to destination
    NoRoute,
    /// Received a NAK
    GotNak,
    /// Timed out waiting for an ack
    Timeout,
    /// No suitable interface
    NoInterface,
    /// Retransmission limit reached
    MaxRetransmit,
    /// No channel for the request
    NoChannel,
    /// Payload too large
    TooLarge,
    /// Destination did not respond
    NoResponse,
    /// Regional duty cycle exhausted
    DutyCycleLimit,
    /// Malformed request
    BadRequest,
    /// Sender not authorized
    NotAuthorized,
    /// Public-key handshake failed
    PkiFailed,
    /// Destination does not know our public key
    PkiUnknownPubkey,
    /// Session key rejected or expired
    AdminBadSessionKey,
    /// Our public key is not in the node's admin list
    AdminPublicKeyUnauthorized,
    /// Rate limited
    RateLimitExceeded,
    /// Any code this crate does not know
    Unrecognized(String),
}

impl AdminErrorCode {
    /// Wire spelling of the code
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "NONE",
            Self::NoRoute => "NO_ROUTE",
            Self::GotNak => "GOT_NAK",
            Self::Timeout => "TIMEOUT",
            Self::NoInterface => "NO_INTERFACE",
            Self::MaxRetransmit => "MAX_RETRANSMIT",
            Self::NoChannel => "NO_CHANNEL",
            Self::TooLarge => "TOO_LARGE",
            Self::NoResponse => "NO_RESPONSE",
            Self::DutyCycleLimit => "DUTY_CYCLE_LIMIT",
            Self::BadRequest => "BAD_REQUEST",
            Self::NotAuthorized => "NOT_AUTHORIZED",
            Self::PkiFailed => "PKI_FAILED",
            Self::PkiUnknownPubkey => "PKI_UNKNOWN_PUBKEY",
            Self::AdminBadSessionKey => "ADMIN_BAD_SESSION_KEY",
            Self::AdminPublicKeyUnauthorized => "ADMIN_PUBLIC_KEY_UNAUTHORIZED",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::Unrecognized(code) => code,
        }
    }

    /// Class of this code
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::AdminBadSessionKey | Self::PkiFailed => ErrorClass::RecoverableSession,
            Self::PkiUnknownPubkey | Self::AdminPublicKeyUnauthorized | Self::NotAuthorized => {
                ErrorClass::RequiresKeyConfiguration
            }
            Self::None
            | Self::NoRoute
            | Self::GotNak
            | Self::Timeout
            | Self::NoInterface
            | Self::MaxRetransmit
            | Self::NoChannel
            | Self::TooLarge
            | Self::NoResponse
            | Self::DutyCycleLimit
            | Self::BadRequest
            | Self::RateLimitExceeded
            | Self::Unrecognized(_) => ErrorClass::Unrelated,
        }
    }
}

impl FromStr for AdminErrorCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "NONE" => Self::None,
            "NO_ROUTE" => Self::NoRoute,
            "GOT_NAK" => Self::GotNak,
            "TIMEOUT" => Self::Timeout,
            "NO_INTERFACE" => Self::NoInterface,
            "MAX_RETRANSMIT" => Self::MaxRetransmit,
            "NO_CHANNEL" => Self::NoChannel,
            "TOO_LARGE" => Self::TooLarge,
            "NO_RESPONSE" => Self::NoResponse,
            "DUTY_CYCLE_LIMIT" => Self::DutyCycleLimit,
            "BAD_REQUEST" => Self::BadRequest,
            "NOT_AUTHORIZED" => Self::NotAuthorized,
            "PKI_FAILED" => Self::PkiFailed,
            "PKI_UNKNOWN_PUBKEY" => Self::PkiUnknownPubkey,
            "ADMIN_BAD_SESSION_KEY" => Self::AdminBadSessionKey,
            "ADMIN_PUBLIC_KEY_UNAUTHORIZED" => Self::AdminPublicKeyUnauthorized,
            "RATE_LIMIT_EXCEEDED" => Self::RateLimitExceeded,
            other => Self::Unrecognized(other.to_string()),
        })
    }
}

impl From<&str> for AdminErrorCode {
    fn from(value: &str) -> Self {
        match value.parse() {
            Ok(code) => code,
            Err(never) => match never {},
        }
    }
}

impl From<String> for AdminErrorCode {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<AdminErrorCode> for String {
    fn from(value: AdminErrorCode) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for AdminErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an admin error should be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Retry after a fresh admin session
    RecoverableSession,
    /// Surface to the operator; halt retries
    RequiresKeyConfiguration,
    /// Ordinary error for generic retry/backoff
    Unrelated,
}

impl ErrorClass {
    /// Whether retrying the operation can succeed without operator action
    #[inline]
    #[must_use]
    pub fn is_retryable(self) -> bool {
        match self {
            Self::RecoverableSession | Self::Unrelated => true,
            Self::RequiresKeyConfiguration => false,
        }
    }

    /// Whether the error must be surfaced to an operator
    #[inline]
    #[must_use]
    pub fn requires_operator(self) -> bool {
        matches!(self, Self::RequiresKeyConfiguration)
    }

    /// Whether the error stems from the PKI/admin session layer
    #[inline]
    #[must_use]
    pub fn is_pki(self) -> bool {
        !matches!(self, Self::Unrelated)
    }
}

/// Classify a wire error code
#[must_use]
pub fn classify(code: &str) -> ErrorClass {
    AdminErrorCode::from(code).class()
}

/// Whether `code` clears after re-establishing an admin session
#[must_use]
pub fn is_recoverable_session_error(code: &str) -> bool {
    classify(code) == ErrorClass::RecoverableSession
}

/// Whether `code` needs operator key configuration
#[must_use]
pub fn is_key_configuration_error(code: &str) -> bool {
    classify(code) == ErrorClass::RequiresKeyConfiguration
}

/// Whether `code` belongs to either PKI class
#[must_use]
pub fn is_pki_related(code: &str) -> bool {
    classify(code).is_pki()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn recoverable_codes() {
        assert!(is_recoverable_session_error("ADMIN_BAD_SESSION_KEY"));
        assert!(is_recoverable_session_error("PKI_FAILED"));

        assert!(!is_recoverable_session_error("NONE"));
        assert!(!is_recoverable_session_error("PKI_UNKNOWN_PUBKEY"));
        assert!(!is_recoverable_session_error("NOT_AUTHORIZED"));
        assert!(!is_recoverable_session_error("TIMEOUT"));
    }

    #[test]
    fn key_configuration_codes() {
        assert!(is_key_configuration_error("PKI_UNKNOWN_PUBKEY"));
        assert!(is_key_configuration_error("ADMIN_PUBLIC_KEY_UNAUTHORIZED"));
        assert!(is_key_configuration_error("NOT_AUTHORIZED"));

        assert!(!is_key_configuration_error("NONE"));
        assert!(!is_key_configuration_error("ADMIN_BAD_SESSION_KEY"));
        assert!(!is_key_configuration_error("PKI_FAILED"));
        assert!(!is_key_configuration_error("TIMEOUT"));
    }

    #[test]
    fn pki_related_is_union() {
        for code in ["ADMIN_BAD_SESSION_KEY", "PKI_FAILED", "PKI_UNKNOWN_PUBKEY", "ADMIN_PUBLIC_KEY_UNAUTHORIZED", "NOT_AUTHORIZED"] {
            assert!(is_pki_related(code), "{code}");
        }
        for code in ["NONE", "TIMEOUT", "NO_ROUTE", "MAX_RETRANSMIT", "", "SOMETHING_NEW"] {
            assert!(!is_pki_related(code), "{code}");
        }
    }

    #[test]
    fn sets_are_disjoint() {
        for code in &RECOVERABLE_SESSION_ERRORS {
            assert!(!REQUIRES_KEY_CONFIGURATION.contains(code));
        }
    }

    #[test]
    fn set_members_classify_consistently() {
        for code in &RECOVERABLE_SESSION_ERRORS {
            assert_eq!(code.class(), ErrorClass::RecoverableSession);
        }
        for code in &REQUIRES_KEY_CONFIGURATION {
            assert_eq!(code.class(), ErrorClass::RequiresKeyConfiguration);
        }
    }

    #[test]
    fn wire_spelling_round_trips() {
        let code = AdminErrorCode::from("ADMIN_PUBLIC_KEY_UNAUTHORIZED");
        assert_eq!(code, AdminErrorCode::AdminPublicKeyUnauthorized);
        assert_eq!(code.to_string(), "ADMIN_PUBLIC_KEY_UNAUTHORIZED");

        let unknown = AdminErrorCode::from("FUTURE_CODE");
        assert_eq!(unknown, AdminErrorCode::Unrecognized("FUTURE_CODE".to_string()));
        assert_eq!(unknown.as_str(), "FUTURE_CODE");
    }

    #[test]
    fn parsing_is_case_sensitive() {
        assert_eq!(classify("pki_failed"), ErrorClass::Unrelated);
    }

    #[test]
    fn class_helpers() {
        assert!(ErrorClass::RecoverableSession.is_retryable());
        assert!(ErrorClass::Unrelated.is_retryable());
        assert!(!ErrorClass::RequiresKeyConfiguration.is_retryable());
        assert!(ErrorClass::RequiresKeyConfiguration.requires_operator());
        assert!(!ErrorClass::RecoverableSession.requires_operator());
    }

    proptest! {
        #[test]
        fn prop_classes_never_overlap(code in "[A-Z_]{0,32}") {
            prop_assert!(!(is_recoverable_session_error(&code) && is_key_configuration_error(&code)));
            prop_assert_eq!(
                is_pki_related(&code),
                is_recoverable_session_error(&code) || is_key_configuration_error(&code)
            );
        }
    }
}
