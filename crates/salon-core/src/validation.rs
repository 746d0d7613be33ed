//! # Validation Module
//!
//! Input validation for the checkout screen.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend form                                                │
//! │  └── Immediate inline feedback                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: salon-core (THIS MODULE)                                     │
//! │  └── Business rules: quantity, discount, split totals                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Remote API                                                   │
//! │  └── Authoritative checks on booking                                   │
//! │                                                                         │
//! │  Nothing that fails here ever reaches the network.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use salon_core::validation::{validate_quantity, validate_split_total};
//!
//! validate_quantity(2).unwrap();
//! validate_split_total([50, 50]).unwrap();
//! assert!(validate_split_total([50, 49]).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_ITEM_QUANTITY, MAX_UNIT_PRICE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a catalog or staff reference id.
pub fn validate_reference(field: &str, id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 64,
        });
    }

    Ok(())
}

/// Validates a customer phone number used for session lookup.
///
/// ## Rules
/// - Optional leading `+`
/// - 10 to 15 digits; spaces and hyphens are ignored
///
/// ## Returns
/// The phone with separators stripped.
pub fn validate_phone(phone: &str) -> ValidationResult<String> {
    let trimmed = phone.trim();
    let (plus, rest) = match trimmed.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", trimmed),
    };

    let digits: String = rest.chars().filter(|c| *c != ' ' && *c != '-').collect();

    if digits.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    if !digits.chars().all(|c| c.is_ascii_digit()) || !(10..=15).contains(&digits.len()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain 10 to 15 digits".to_string(),
        });
    }

    Ok(format!("{}{}", plus, digits))
}

/// Validates a free-text cancellation reason.
pub fn validate_cancel_reason(reason: &str) -> ValidationResult<()> {
    if reason.chars().count() > 500 {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: 500,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price.
///
/// ## Rules
/// - Zero is allowed (complimentary services)
/// - Must not exceed MAX_UNIT_PRICE (₹1 crore)
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() || price > MAX_UNIT_PRICE {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE.paise(),
        });
    }

    Ok(())
}

/// Validates a discount against the amount it is taken from.
///
/// ## Rules
/// - Must be non-negative
/// - Must not exceed `limit` (line gross or cart subtotal)
///
/// ## Example
/// ```rust
/// use salon_core::money::Money;
/// use salon_core::validation::validate_discount;
///
/// let gross = Money::from_paise(100000);
/// assert!(validate_discount("discount", Money::from_paise(10000), gross).is_ok());
/// assert!(validate_discount("discount", Money::from_paise(100001), gross).is_err());
/// ```
pub fn validate_discount(field: &str, discount: Money, limit: Money) -> ValidationResult<()> {
    if discount.is_negative() || discount > limit {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: limit.paise().max(0),
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

/// Validates a single contribution percentage.
pub fn validate_percent(pct: u8) -> ValidationResult<()> {
    if pct > 100 {
        return Err(ValidationError::OutOfRange {
            field: "contribution_percent".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

/// Validates that a staff split is non-empty and totals exactly 100.
pub fn validate_split_total<I>(percents: I) -> ValidationResult<()>
where
    I: IntoIterator<Item = u8>,
{
    let mut count = 0usize;
    let mut total = 0u32;
    for pct in percents {
        count += 1;
        total += u32::from(pct);
    }

    if count == 0 {
        return Err(ValidationError::Required {
            field: "staff".to_string(),
        });
    }

    if total != 100 {
        return Err(ValidationError::ContributionTotal { total });
    }

    Ok(())
}
