//! # Domain Types
//!
//! Small value types shared by the cart, the contribution editor and the
//! remote API layer.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │    Customer     │   │    StaffRef     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  id (optional)  │   │  id             │       │
//! │  │  1800 = 18% GST │   │  name           │   │  name           │       │
//! │  └─────────────────┘   │  phone          │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │    LineId       │   │   SessionId     │                              │
//! │  │  uuid v4, local │   │  visit token    │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::WALK_IN_CUSTOMER_NAME;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1800 bps = 18% GST. Fractional rates such as
/// 2.5% (250 bps) stay exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// The 18% GST slab applied to salon services.
    pub const STANDARD_GST: TaxRate = TaxRate(1800);

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a whole percentage.
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        TaxRate(pct * 100)
    }

    /// Creates a tax rate from a fractional percentage (e.g. 2.5).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::STANDARD_GST
    }
}

// =============================================================================
// Identifiers
// =============================================================================

/// Locally generated id of a cart line.
///
/// Lives only as long as the cart; a fresh uuid v4 per line means ids are
/// never reused, even after a removal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineId(String);

impl LineId {
    pub fn generate() -> Self {
        LineId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LineId {
    fn from(value: &str) -> Self {
        LineId(value.to_string())
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token tying a cart to a server-side multi-service visit.
///
/// Generated on the client before the first booking call; the server echoes
/// it back from the active walk-ins query when the visit is resumed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        SessionId(format!("ws-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        SessionId(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        SessionId(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Staff
// =============================================================================

/// A staff member picked for a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StaffRef {
    pub id: String,
    pub name: String,
}

impl StaffRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        StaffRef {
            id: id.into(),
            name: name.into(),
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// The customer the pending sale is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Registered customer id. `None` for walk-ins.
    pub id: Option<String>,
    pub name: String,
    pub phone: Option<String>,
}

impl Customer {
    /// An anonymous walk-in.
    pub fn walk_in() -> Self {
        Customer {
            id: None,
            name: WALK_IN_CUSTOMER_NAME.to_string(),
            phone: None,
        }
    }

    pub fn registered(id: impl Into<String>, name: impl Into<String>) -> Self {
        Customer {
            id: Some(id.into()),
            name: name.into(),
            phone: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn is_walk_in(&self) -> bool {
        self.id.is_none() && self.phone.is_none()
    }
}

impl Default for Customer {
    fn default() -> Self {
        Customer::walk_in()
    }
}
