//! # salon-core: Checkout Logic for the Salon POS
//!
//! Everything the point-of-sale screen needs to price a pending visit, as
//! plain data and pure functions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Salon POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web Frontend                                 │   │
//! │  │    Customer picker ──► Cart ──► Staff split dialog ──► Pay     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    salon-sync                                   │   │
//! │  │    PosSession: booking, cancellation, session resumption       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ salon-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌─────────────┐  ┌──────────┐  │   │
//! │  │   │   types   │  │   money   │  │    cart     │  │contribu- │  │   │
//! │  │   │  TaxRate  │  │   Money   │  │    Cart     │  │  tion    │  │   │
//! │  │   │  Customer │  │  (paise)  │  │  CartLine   │  │  editor  │  │   │
//! │  │   └───────────┘  └───────────┘  └─────────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • INTEGER MONEY                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Shared value types (TaxRate, Customer, StaffRef, ids)
//! - [`money`] - Money type with integer paise arithmetic
//! - [`cart`] - The pending sale and its derived totals
//! - [`contribution`] - Multi-staff percentage split editor
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use salon_core::cart::{Cart, NewLine};
//! use salon_core::money::Money;
//! use salon_core::types::{StaffRef, TaxRate};
//!
//! let mut cart = Cart::new();
//! cart.add_item(
//!     NewLine::service("svc-haircut", "Haircut", Money::from_paise(50000))
//!         .with_quantity(2)
//!         .with_tax_rate(TaxRate::from_percent(18))
//!         .with_staff(StaffRef::new("stf-1", "Asha")),
//! )
//! .unwrap();
//! cart.set_global_discount(Money::from_paise(10000)).unwrap();
//!
//! assert_eq!(cart.subtotal().paise(), 100000);
//! assert_eq!(cart.tax_amount().paise(), 18000); // included, not added
//! assert_eq!(cart.total().paise(), 90000);
//! ```

pub mod cart;
pub mod contribution;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

pub use cart::{Cart, CartLine, CartTotals, LineItem, NewLine, StaffAssignment};
pub use contribution::{ContributionEditor, StaffContribution};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

/// Maximum lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity on a single line.
///
/// Guards against typing 100 instead of 10 at the counter.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price a line accepts: ₹1,00,00,000.00.
pub const MAX_UNIT_PRICE: Money = Money::from_paise(1_000_000_000);

/// Display name used when no customer has been picked.
pub const WALK_IN_CUSTOMER_NAME: &str = "Walk-in Customer";
