//! # Money Module
//!
//! Provides the `Money` type for handling rupee amounts safely.
//!
//! ## Why Integer Paise?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Splitting ₹100.00 three ways as floats drifts by fractions of a paisa │
//! │  that show up later as a ₹0.01 mismatch in end-of-day cash-up.          │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    10000 paise / 3 = 3333 paise (×3 = 9999 paise)                      │
//! │    We KNOW we lost 1 paisa, and handle it explicitly                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Conversions from rupees (user input) round half-up to a whole paisa and
//! never keep a fractional paisa.
//!
//! ## Usage
//! ```rust
//! use salon_core::money::Money;
//!
//! let price = Money::from_paise(50000); // ₹500.00
//! let doubled = price * 2;              // ₹1000.00
//! assert_eq!(doubled.paise(), 100000);
//!
//! let typed = Money::from_rupees_str("499.995").unwrap();
//! assert_eq!(typed.paise(), 50000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (1/100 of a rupee).
///
/// Signed so that refunds and intermediate differences are representable.
///
/// The arithmetic operators saturate at the `i64` bounds instead of
/// panicking. Cart code that must report an overflow uses
/// [`Money::checked_add`] and [`Money::checked_mul_quantity`].
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Service.price ──► CartLine.unit_price ──► CartLine.net()              │
/// │                                                                         │
/// │  Cart.subtotal ──► − global discount ──► Cart.total ──► payment        │
/// │       │                                                                 │
/// │       └──► Cart.tax_amount (GST already inside the price, display only)│
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    ///
    /// ## Example
    /// ```rust
    /// use salon_core::money::Money;
    ///
    /// let price = Money::from_paise(1099); // ₹10.99
    /// assert_eq!(price.paise(), 1099);
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees.saturating_mul(100))
    }

    /// Parses a rupee amount typed by an operator.
    ///
    /// Accepts `"500"`, `"500.5"`, `"499.995"`. Digits past the second
    /// decimal place round half-up into the last paisa.
    ///
    /// ## Example
    /// ```rust
    /// use salon_core::money::Money;
    ///
    /// assert_eq!(Money::from_rupees_str("10.5").unwrap().paise(), 1050);
    /// assert_eq!(Money::from_rupees_str("10.005").unwrap().paise(), 1001);
    /// assert_eq!(Money::from_rupees_str("10.004").unwrap().paise(), 1000);
    /// assert!(Money::from_rupees_str("ten").is_err());
    /// ```
    pub fn from_rupees_str(input: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let text = input.trim();
        if text.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let (whole, frac) = match text.split_once('.') {
            Some((w, f)) => (w, f),
            None => (text, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("must contain digits"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("must be a non-negative decimal number"));
        }

        let rupees: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount is too large"))?
        };

        let digits: Vec<i64> = frac
            .bytes()
            .take(3)
            .map(|b| i64::from(b - b'0'))
            .collect();
        let tens = digits.first().copied().unwrap_or(0);
        let ones = digits.get(1).copied().unwrap_or(0);
        let round_up = digits.get(2).is_some_and(|d| *d >= 5);

        rupees
            .checked_mul(100)
            .and_then(|p| p.checked_add(tens * 10 + ones + i64::from(round_up)))
            .map(Money)
            .ok_or_else(|| invalid("amount is too large"))
    }

    /// Converts a floating rupee amount, rounding half-up to a whole paisa.
    ///
    /// Prefer [`Money::from_rupees_str`] for typed input; binary floats cannot
    /// represent every decimal exactly.
    pub fn from_rupees_f64(rupees: f64) -> Result<Self, ValidationError> {
        if !rupees.is_finite() {
            return Err(ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: "must be a finite number".to_string(),
            });
        }
        Ok(Money((rupees * 100.0 + 0.5).floor() as i64))
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion (truncated toward zero).
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Calculates `self × rate`, rounded half-up to a whole paisa.
    ///
    /// Used for the GST line on the bill. With GST-inclusive pricing the
    /// result is informational: it is never added to the total.
    ///
    /// ## Example
    /// ```rust
    /// use salon_core::money::Money;
    /// use salon_core::types::TaxRate;
    ///
    /// let net = Money::from_paise(100000);           // ₹1000.00
    /// let gst = net.percent_of(TaxRate::from_percent(18));
    /// assert_eq!(gst.paise(), 18000);                 // ₹180.00
    ///
    /// // ₹0.25 × 18% = 4.5 paise → 5 paise
    /// assert_eq!(Money::from_paise(25).percent_of(TaxRate::from_percent(18)).paise(), 5);
    /// ```
    pub fn percent_of(&self, rate: TaxRate) -> Money {
        // i128 keeps large bills from overflowing before the division
        let scaled = self.0 as i128 * rate.bps() as i128;
        Money(div_round_half_up(scaled, 10_000) as i64)
    }

    /// Multiplies money by a quantity, saturating on overflow.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// `self × qty`, or `None` if it does not fit in paise.
    #[inline]
    pub const fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(paise) => Some(Money(paise)),
            None => None,
        }
    }

    /// `self + other`, or `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(paise) => Some(Money(paise)),
            None => None,
        }
    }
}

/// Integer division rounding half toward positive infinity.
fn div_round_half_up(numerator: i128, denominator: i128) -> i128 {
    (2 * numerator + denominator).div_euclid(2 * denominator)
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly rendering. The frontend does locale formatting itself.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}₹{}.{:02}",
            sign,
            self.rupees().abs(),
            self.paise_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paise() {
        let money = Money::from_paise(50050);
        assert_eq!(money.paise(), 50050);
        assert_eq!(money.rupees(), 500);
        assert_eq!(money.paise_part(), 50);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_paise(50000).to_string(), "₹500.00");
        assert_eq!(Money::from_paise(-550).to_string(), "-₹5.50");
        assert_eq!(Money::zero().to_string(), "₹0.00");
    }

    #[test]
    fn test_parse_rupees() {
        assert_eq!(Money::from_rupees_str("500").unwrap().paise(), 50000);
        assert_eq!(Money::from_rupees_str(" 500.5 ").unwrap().paise(), 50050);
        assert_eq!(Money::from_rupees_str(".75").unwrap().paise(), 75);
        assert_eq!(Money::from_rupees_str("0.125").unwrap().paise(), 13);
        assert_eq!(Money::from_rupees_str("0.1249").unwrap().paise(), 12);
        assert_eq!(Money::from_rupees_str("99.995").unwrap().paise(), 10000);
    }

    #[test]
    fn test_parse_rupees_rejects_garbage() {
        assert!(Money::from_rupees_str("").is_err());
        assert!(Money::from_rupees_str(".").is_err());
        assert!(Money::from_rupees_str("-5").is_err());
        assert!(Money::from_rupees_str("1.2.3").is_err());
        assert!(Money::from_rupees_str("₹10").is_err());
        assert!(Money::from_rupees_str("99999999999999999999").is_err());
    }

    #[test]
    fn test_from_rupees_f64_rounds_half_up() {
        assert_eq!(Money::from_rupees_f64(10.0).unwrap().paise(), 1000);
        assert_eq!(Money::from_rupees_f64(0.125).unwrap().paise(), 13);
        assert!(Money::from_rupees_f64(f64::NAN).is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_paise(1000);
        let b = Money::from_paise(500);

        assert_eq!((a + b).paise(), 1500);
        assert_eq!((a - b).paise(), 500);
        assert_eq!((a * 3).paise(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.paise(), 2000);
    }

    #[test]
    fn test_operators_saturate_instead_of_panicking() {
        let huge = Money::from_paise(i64::MAX / 2 + 1);

        assert_eq!((huge + huge).paise(), i64::MAX);
        assert_eq!(huge.multiply_quantity(2).paise(), i64::MAX);
        assert_eq!((Money::from_paise(i64::MIN) - Money::from_paise(1)).paise(), i64::MIN);

        let total: Money = vec![huge, huge, huge].into_iter().sum();
        assert_eq!(total.paise(), i64::MAX);
    }

    #[test]
    fn test_checked_arithmetic() {
        let huge = Money::from_paise(i64::MAX / 2 + 1);
        assert_eq!(huge.checked_add(huge), None);
        assert_eq!(huge.checked_mul_quantity(2), None);
        assert_eq!(
            Money::from_paise(500).checked_mul_quantity(3),
            Some(Money::from_paise(1500))
        );
        assert_eq!(
            Money::from_paise(500).checked_add(Money::from_paise(1)),
            Some(Money::from_paise(501))
        );
    }

    #[test]
    fn test_percent_of_rounding() {
        let rate = TaxRate::from_percent(18);
        assert_eq!(Money::from_paise(100000).percent_of(rate).paise(), 18000);
        // 2.5 paise rounds up, -2.5 paise rounds toward +inf
        assert_eq!(Money::from_paise(25).percent_of(TaxRate::from_percent(10)).paise(), 3);
        assert_eq!(Money::from_paise(-25).percent_of(TaxRate::from_percent(10)).paise(), -2);
        assert_eq!(Money::from_paise(24).percent_of(TaxRate::from_percent(10)).paise(), 2);
    }

    /// Splitting ₹100.00 three ways loses a paisa; callers must assign it.
    #[test]
    fn test_division_precision_loss_documented() {
        let hundred = Money::from_rupees(100);
        let third = Money::from_paise(hundred.paise() / 3);
        let reconstructed = third * 3;
        assert_eq!((hundred - reconstructed).paise(), 1);
    }
}
