//! # salon-sync: Remote API Client and POS Session
//!
//! Connects the pure cart in salon-core to the salon's HTTP API: booking
//! services as soon as they are added, cancelling booked ones, resuming a
//! customer's in-progress visit and watching active walk-ins.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Salon POS Sync Layer                              │
//! │                                                                         │
//! │   Frontend action                                                      │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ┌─────────────┐  book / cancel   ┌─────────────┐   HTTP  ┌─────────┐  │
//! │  │ PosSession  │ ───────────────► │  SalonApi   │ ──────► │  Salon  │  │
//! │  │ Mutex<Cart> │ ◄─────────────── │ (reqwest)   │ ◄────── │   API   │  │
//! │  └──────┬──────┘  session resume  └──────▲──────┘         └─────────┘  │
//! │         │                                │                              │
//! │         ▼                                │ every 15s                    │
//! │  ┌─────────────┐               ┌─────────┴──────────┐                  │
//! │  │  Notifier   │ ◄──────────── │ActiveWalkInsMonitor│                  │
//! │  │ (toasts)    │  load errors  │ (background task)  │                  │
//! │  └─────────────┘               └────────────────────┘                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`api`] - `SalonApi` trait and its reqwest implementation
//! - [`config`] - Client configuration (TOML + `SALON_*` env overrides)
//! - [`error`] - Sync error types and user-facing messages
//! - [`monitor`] - Background poller for active walk-ins
//! - [`notify`] - Operator notification sink
//! - [`protocol`] - Request/response bodies of the salon API
//! - [`session`] - `PosSession`, the cart plus its remote side effects
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use salon_core::{Customer, Money, NewLine};
//! use salon_sync::{ClientConfig, HttpSalonApi, PosSession};
//!
//! let config = ClientConfig::load_or_default(None);
//! let api = Arc::new(HttpSalonApi::from_config(&config)?);
//! let session = PosSession::from_config(api, &config);
//!
//! session.select_customer(Customer::registered("cus-1", "Meera")).await?;
//! session.with_cart_mut(|cart| {
//!     cart.add_item(NewLine::service("svc-1", "Haircut", Money::from_rupees(500)))
//! })?;
//! let outcome = session.book_services().await?;
//! println!("Booked {} service(s)", outcome.created_count);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod config;
pub mod error;
pub mod monitor;
pub mod notify;
pub mod protocol;
pub mod session;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use api::{CustomerLookup, HttpSalonApi, SalonApi};
pub use config::ClientConfig;
pub use error::{PendingAction, SyncError, SyncResult};
pub use monitor::{ActiveWalkInsHandle, ActiveWalkInsMonitor, WalkInsSnapshot};
pub use notify::{NoOpNotifier, Notifier, TracingNotifier};
pub use protocol::{ActiveSession, ServiceOrder, ServiceOrderStatus};
pub use session::{BookingOutcome, PosSession, SessionLoad};
