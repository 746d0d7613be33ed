//! # Sync Error Types
//!
//! Error types for remote calls and session orchestration.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Remote              │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  Remote { status, msg } │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  Deserialization        │ │
//! │  │  ConfigLoad     │  │  Http           │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │    Session      │  │     Cart        │                              │
//! │  │                 │  │                 │                              │
//! │  │  ActionInProg.  │  │  Core(..)       │                              │
//! │  │  NothingToBook  │  │  (salon-core)   │                              │
//! │  │  NoRemoteOrder  │  │                 │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use salon_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Shown when the server gave no message of its own.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// A user action that may only run once at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    CreatingOrders,
    Cancelling,
    LoadingSession,
}

impl fmt::Display for PendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingAction::CreatingOrders => write!(f, "booking services"),
            PendingAction::Cancelling => write!(f, "cancelling a service"),
            PendingAction::LoadingSession => write!(f, "loading the customer's visit"),
        }
    }
}

/// Sync error type covering all remote and session failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid client configuration.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// API base URL does not parse or uses the wrong scheme.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Could not reach the API.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request exceeded the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// Any other HTTP client failure.
    #[error("HTTP error: {0}")]
    Http(String),

    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// The API answered with a non-success status.
    ///
    /// ## When This Occurs
    /// - 4xx: the server rejected the booking or cancellation
    /// - 5xx: the server failed while handling it
    ///
    /// `message` is the server's `message` (or `error`) field when present.
    #[error("Remote API returned {status}: {}", message.as_deref().unwrap_or("no message"))]
    Remote { status: u16, message: Option<String> },

    /// Response body did not match the expected shape.
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// The same action is already in flight.
    #[error("Already {0}")]
    ActionInProgress(PendingAction),

    /// Booking was requested with no unbooked service lines.
    #[error("No unbooked services in the cart")]
    NothingToBook,

    /// The server accepted a booking but returned no order id for these
    /// cart lines. They are left unbooked.
    #[error("Server did not confirm {} service(s); they were left unbooked", .0.len())]
    BookingUnconfirmed(Vec<String>),

    /// Cancellation was requested for a line with no server order.
    #[error("Cart line {0} has no booked service order to cancel")]
    NoRemoteOrder(String),

    /// Cart rule violation from salon-core.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Background task is gone.
    #[error("Background task is shutting down")]
    ShuttingDown,

    /// Channel send/receive failed.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ValidationError> for SyncError {
    fn from(err: ValidationError) -> Self {
        SyncError::Core(CoreError::Validation(err))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Timeout
        } else if err.is_connect() {
            SyncError::ConnectionFailed(err.to_string())
        } else if err.is_decode() {
            SyncError::DeserializationFailed(err.to_string())
        } else {
            SyncError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::DeserializationFailed(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if the request may succeed when repeated.
    ///
    /// ## Retryable Errors
    /// - Connection failures and timeouts
    /// - 5xx and 429 responses
    ///
    /// ## Non-Retryable Errors
    /// - Configuration and validation errors
    /// - 4xx rejections
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::ConnectionFailed(_) | SyncError::Timeout | SyncError::Http(_) => true,
            SyncError::Remote { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }

    /// Text for the notification shown to the operator.
    ///
    /// The server's own message wins; local rule violations describe
    /// themselves; everything else falls back to a generic message.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Remote {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            SyncError::Core(err) => err.to_string(),
            SyncError::ActionInProgress(_)
            | SyncError::NothingToBook
            | SyncError::BookingUnconfirmed(_)
            | SyncError::NoRemoteOrder(_) => self.to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(SyncError::ConnectionFailed("refused".into()).is_retryable());
        assert!(SyncError::Timeout.is_retryable());
        assert!(SyncError::Remote {
            status: 503,
            message: None
        }
        .is_retryable());

        assert!(!SyncError::Remote {
            status: 422,
            message: None
        }
        .is_retryable());
        assert!(!SyncError::InvalidConfig("bad".into()).is_retryable());
        assert!(!SyncError::NothingToBook.is_retryable());
    }

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = SyncError::Remote {
            status: 409,
            message: Some("Stylist is already busy".into()),
        };
        assert_eq!(err.user_message(), "Stylist is already busy");

        let err = SyncError::Remote {
            status: 500,
            message: None,
        };
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);

        assert_eq!(SyncError::Timeout.user_message(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_user_message_for_local_errors() {
        let err = SyncError::ActionInProgress(PendingAction::CreatingOrders);
        assert_eq!(err.user_message(), "Already booking services");

        let err: SyncError = ValidationError::ContributionTotal { total: 90 }.into();
        assert!(err.user_message().contains("90%"));

        let err = SyncError::BookingUnconfirmed(vec!["line-2".into()]);
        assert_eq!(
            err.user_message(),
            "Server did not confirm 1 service(s); they were left unbooked"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_config_errors() {
        assert!(SyncError::InvalidUrl("ftp://x".into()).is_config_error());
        assert!(SyncError::ConfigLoadFailed("missing".into()).is_config_error());
        assert!(!SyncError::Timeout.is_config_error());
    }

    #[test]
    fn test_remote_display() {
        let err = SyncError::Remote {
            status: 404,
            message: None,
        };
        assert_eq!(err.to_string(), "Remote API returned 404: no message");
    }
}
