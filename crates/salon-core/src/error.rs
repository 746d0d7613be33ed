//! # Error Types
//!
//! Domain-specific error types for salon-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  salon-core errors (this file)                                         │
//! │  ├── CoreError        - Cart rule violations                           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  salon-sync errors (separate crate)                                    │
//! │  └── SyncError        - Remote API and configuration failures          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SyncError → user message          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these are fatal. Every failing cart operation leaves the cart
//! exactly as it was.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Cart rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// No line with this id is in the cart.
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    /// The line is already booked on the server.
    ///
    /// ## When This Occurs
    /// - Changing quantity of an in-progress service
    /// - Reassigning staff on an in-progress service
    ///
    /// Booked lines change only through cancellation.
    #[error("Cart line {0} is already booked and cannot be edited")]
    LineBooked(String),

    /// A staff operation was attempted on a retail product line.
    #[error("Cart line {0} is not a service")]
    NotAService(String),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Checkout was attempted on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The stored global discount no longer fits the cart.
    ///
    /// ## When This Occurs
    /// ```text
    /// subtotal ₹1000, discount ₹300 applied
    ///      │
    ///      ▼
    /// line removed → subtotal ₹200
    ///      │
    ///      ▼
    /// checkout → DiscountExceedsSubtotal { discount: 30000, subtotal: 20000 }
    /// ```
    #[error("Discount of {discount} paise exceeds subtotal of {subtotal} paise")]
    DiscountExceedsSubtotal { discount: i64, subtotal: i64 },

    /// A line or cart amount no longer fits in paise.
    ///
    /// ## When This Occurs
    /// - Adding a line whose `unit_price × quantity` overflows
    /// - Adding or resizing a line would overflow the cart subtotal
    #[error("{0} is larger than the supported amount")]
    AmountOverflow(String),

    /// A multi-staff line does not split to exactly 100%.
    #[error("Staff contributions for {line_id} total {total}%, expected 100%")]
    InvalidSplit { line_id: String, total: u32 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any state change or network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., unparsable amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Referenced value is not present (e.g., staff not on the split).
    #[error("{field} '{value}' not found")]
    NotFound { field: String, value: String },

    /// Duplicate value (e.g., staff already on the split).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// Percentages do not add up to 100.
    #[error("Contributions must total 100%, got {total}%")]
    ContributionTotal { total: u32 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
