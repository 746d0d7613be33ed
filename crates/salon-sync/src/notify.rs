//! # Notifications
//!
//! Outcome messages for the operator. The frontend decides how to show them
//! (toast, banner); this crate only says what happened.

use tracing::{error, info};

/// Receives user-facing outcome messages.
pub trait Notifier: Send + Sync {
    /// A user action succeeded.
    fn success(&self, message: &str);

    /// A user action failed. Never called for background poll failures.
    fn error(&self, message: &str);
}

/// Writes notifications to the log. Used when no UI is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!(target: "salon::notify", "{}", message);
    }

    fn error(&self, message: &str) {
        error!(target: "salon::notify", "{}", message);
    }
}

/// Discards notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpNotifier;

impl Notifier for NoOpNotifier {
    fn success(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}
