//! # POS Session
//!
//! The checkout screen's cart plus the three remote actions that touch it:
//! booking services, cancelling a booked service, and resuming a customer's
//! in-progress visit.
//!
//! ## Action Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PosSession Actions                               │
//! │                                                                         │
//! │  book_services()                                                        │
//! │    1. flag is_creating_orders       (duplicate → ActionInProgress)     │
//! │    2. build request from unbooked service lines                        │
//! │    3. POST /service-orders/bulk     (cart lock NOT held)               │
//! │    4. ok  → adopt session id, mark booked, link order ids              │
//! │             (skipped if the cart was cleared or switched meanwhile)    │
//! │       err → notify, cart untouched                                     │
//! │                                                                         │
//! │  cancel_booked_item()                                                   │
//! │    1. flag is_cancelling                                               │
//! │    2. POST /service-orders/{id}/cancel                                 │
//! │    3. ok  → remove line       err → notify, line kept                  │
//! │                                                                         │
//! │  select_customer()                                                      │
//! │    same customer + booked lines ──► AlreadyLoaded (no request)         │
//! │    otherwise GET /walk-ins/active?customerId=|phone=                   │
//! │      found     → populate booked lines, adopt session → Resumed        │
//! │      not found → clear other customer's visit → NoActiveSession        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//! The cart sits behind a `std::sync::Mutex` that is only ever locked inside
//! `with_cart` / `with_cart_mut` closures, so no guard lives across an
//! `.await`. Each remote action has its own in-flight flag.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use salon_core::cart::CheckoutSummary;
use salon_core::validation::validate_cancel_reason;
use salon_core::{Cart, CartLine, CoreError, Customer, LineId, SessionId, TaxRate};

use crate::api::{CustomerLookup, SalonApi};
use crate::config::ClientConfig;
use crate::error::{PendingAction, SyncError, SyncResult};
use crate::notify::{Notifier, TracingNotifier};
use crate::protocol::BookServicesRequest;

// =============================================================================
// Outcomes
// =============================================================================

/// Result of a successful booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingOutcome {
    pub session_id: SessionId,
    pub created_count: u32,
    /// Cart lines now flagged as booked.
    pub booked: Vec<LineId>,
}

/// Result of [`PosSession::select_customer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLoad {
    /// The customer's visit is already in the cart; nothing was fetched.
    AlreadyLoaded,
    /// An in-progress visit was found and loaded.
    Resumed {
        session_id: SessionId,
        lines: Vec<CartLine>,
    },
    /// The customer has no in-progress visit.
    NoActiveSession,
}

// =============================================================================
// In-Flight Guard
// =============================================================================

/// Holds an action flag for as long as the action runs.
struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool, action: PendingAction) -> SyncResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SyncError::ActionInProgress(action))?;
        Ok(InFlight { flag })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// =============================================================================
// POS Session
// =============================================================================

/// One operator's checkout screen.
pub struct PosSession {
    api: Arc<dyn SalonApi>,
    notifier: Arc<dyn Notifier>,
    cart: Mutex<Cart>,
    /// Lookup key of the customer whose visit is in the cart.
    loaded_for: Mutex<Option<String>>,
    default_tax_rate: TaxRate,
    creating_orders: AtomicBool,
    cancelling: AtomicBool,
    loading_session: AtomicBool,
}

impl PosSession {
    /// Creates a session with an empty cart.
    ///
    /// `default_tax_rate` is applied to lines resumed from the server.
    pub fn new(api: Arc<dyn SalonApi>, default_tax_rate: TaxRate) -> Self {
        PosSession {
            api,
            notifier: Arc::new(TracingNotifier),
            cart: Mutex::new(Cart::new()),
            loaded_for: Mutex::new(None),
            default_tax_rate,
            creating_orders: AtomicBool::new(false),
            cancelling: AtomicBool::new(false),
            loading_session: AtomicBool::new(false),
        }
    }

    pub fn from_config(api: Arc<dyn SalonApi>, config: &ClientConfig) -> Self {
        Self::new(api, config.default_tax_rate())
    }

    /// Sets where user-facing messages go.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    // -------------------------------------------------------------------------
    // Cart Access
    // -------------------------------------------------------------------------

    /// Executes a function with read access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let totals = session.with_cart(|cart| cart.totals());
    /// ```
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.lock_cart();
        f(&cart)
    }

    /// Executes a function with write access to the cart.
    ///
    /// Local edits (add, quantity, staff, discount) go through here.
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.lock_cart();
        f(&mut cart)
    }

    /// A copy of the cart for rendering.
    pub fn snapshot(&self) -> Cart {
        self.with_cart(Cart::clone)
    }

    pub fn is_creating_orders(&self) -> bool {
        self.creating_orders.load(Ordering::Acquire)
    }

    pub fn is_cancelling(&self) -> bool {
        self.cancelling.load(Ordering::Acquire)
    }

    pub fn is_loading_session(&self) -> bool {
        self.loading_session.load(Ordering::Acquire)
    }

    // -------------------------------------------------------------------------
    // Booking
    // -------------------------------------------------------------------------

    /// Books every unbooked service line as an in-progress service order.
    ///
    /// The cart's session id is reused; if there is none a fresh one is sent
    /// and only stored once the server accepts the booking.
    ///
    /// ## Applying the Response
    /// - Only lines the server returned an order id for are marked booked.
    ///   Lines without one stay unbooked and the call fails with
    ///   [`SyncError::BookingUnconfirmed`].
    /// - If the cart was cleared or switched to another visit while the
    ///   request was in flight, the response is not applied to it and
    ///   `booked` is empty.
    pub async fn book_services(&self) -> SyncResult<BookingOutcome> {
        let _flag = InFlight::acquire(&self.creating_orders, PendingAction::CreatingOrders)?;

        let request = self
            .with_cart(|cart| {
                let session_id = cart
                    .session_id()
                    .cloned()
                    .unwrap_or_else(SessionId::generate);
                BookServicesRequest::from_cart(cart, session_id)
            })
            .map_err(|e| self.surface("book services", e))?;

        let response = self
            .api
            .book_services(&request)
            .await
            .map_err(|e| self.surface("book services", e))?;

        let session_id = request.session_id.clone();
        let order_ids: HashMap<LineId, String> = response
            .orders
            .iter()
            .map(|o| (o.client_line_id.clone(), o.order_id.clone()))
            .collect();
        let (confirmed, unconfirmed): (Vec<LineId>, Vec<LineId>) = request
            .line_ids()
            .into_iter()
            .partition(|id| order_ids.contains_key(id));

        let applied = self.with_cart_mut(|cart| {
            if !booking_belongs_to(cart, &request) {
                return None;
            }
            if cart.session_id().is_none() {
                cart.set_session_id(Some(session_id.clone()));
            }

            let mut booked = Vec::with_capacity(confirmed.len());
            for id in &confirmed {
                if cart.link_remote_order(id, order_ids[id].clone()).is_err() {
                    debug!(line_id = %id, "Booked line left the cart before linking");
                    continue;
                }
                cart.mark_items_as_booked(std::slice::from_ref(id));
                booked.push(id.clone());
            }
            Some((booked, lookup_key(cart.customer())))
        });

        let Some((booked, marker)) = applied else {
            warn!(
                session_id = %session_id,
                created = response.created_count,
                "Cart changed while booking, response not applied"
            );
            return Ok(BookingOutcome {
                session_id,
                created_count: response.created_count,
                booked: Vec::new(),
            });
        };
        if marker.is_some() {
            *self.lock_marker() = marker;
        }

        info!(
            session_id = %session_id,
            created = response.created_count,
            lines = booked.len(),
            "Services booked"
        );

        if !unconfirmed.is_empty() {
            warn!(
                session_id = %session_id,
                missing = unconfirmed.len(),
                "Booking response is missing order ids"
            );
            let missing = unconfirmed.iter().map(LineId::to_string).collect();
            return Err(self.surface("book services", SyncError::BookingUnconfirmed(missing)));
        }

        self.notifier
            .success(&format!("{} service(s) booked", response.created_count));

        Ok(BookingOutcome {
            session_id,
            created_count: response.created_count,
            booked,
        })
    }

    // -------------------------------------------------------------------------
    // Cancellation
    // -------------------------------------------------------------------------

    /// Cancels a booked line on the server, then removes it locally.
    ///
    /// If the server refuses, the line stays in the cart.
    pub async fn cancel_booked_item(&self, line_id: &LineId, reason: Option<&str>) -> SyncResult<()> {
        let _flag = InFlight::acquire(&self.cancelling, PendingAction::Cancelling)?;

        if let Some(reason) = reason {
            validate_cancel_reason(reason).map_err(|e| self.surface("cancel service", e.into()))?;
        }

        let order_id = self
            .with_cart(|cart| -> SyncResult<String> {
                let line = cart
                    .line(line_id)
                    .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;
                match (line.booked, &line.remote_order_id) {
                    (true, Some(order_id)) => Ok(order_id.clone()),
                    _ => Err(SyncError::NoRemoteOrder(line_id.to_string())),
                }
            })
            .map_err(|e| self.surface("cancel service", e))?;

        self.api
            .cancel_service_order(&order_id, reason)
            .await
            .map_err(|e| self.surface("cancel service", e))?;

        self.with_cart_mut(|cart| cart.remove_item(line_id));
        info!(line_id = %line_id, order_id = %order_id, "Service order cancelled");
        self.notifier.success("Service cancelled");
        Ok(())
    }

    /// Removes a line, cancelling it on the server first if it is booked.
    ///
    /// Returns `false` if the line was not in the cart.
    pub async fn remove_item(&self, line_id: &LineId, reason: Option<&str>) -> SyncResult<bool> {
        let booked = self.with_cart(|cart| cart.line(line_id).map(|l| l.booked));
        match booked {
            None => Ok(false),
            Some(true) => self.cancel_booked_item(line_id, reason).await.map(|_| true),
            Some(false) => Ok(self.with_cart_mut(|cart| cart.remove_item(line_id))),
        }
    }

    // -------------------------------------------------------------------------
    // Session Resumption
    // -------------------------------------------------------------------------

    /// Selects the customer in the cart header and resumes their visit.
    pub async fn select_customer(&self, customer: Customer) -> SyncResult<SessionLoad> {
        let lookup = match CustomerLookup::for_customer(&customer) {
            Ok(lookup) => lookup,
            Err(e) => return Err(self.surface("load visit", e)),
        };

        let Some(lookup) = lookup else {
            self.with_cart_mut(|cart| cart.set_customer(customer));
            return Ok(SessionLoad::NoActiveSession);
        };
        let key = lookup.key();

        let previous = self.lock_marker().clone();
        let same_customer = previous.as_deref() == Some(key.as_str());
        let already_loaded = same_customer
            && self.with_cart(|cart| cart.session_id().is_some() && cart.has_booked_items());
        if already_loaded {
            debug!(customer = %key, "Visit already loaded, skipping fetch");
            self.with_cart_mut(|cart| cart.set_customer(customer));
            return Ok(SessionLoad::AlreadyLoaded);
        }

        let _flag = InFlight::acquire(&self.loading_session, PendingAction::LoadingSession)?;

        let active = self
            .api
            .active_session(&lookup)
            .await
            .map_err(|e| self.surface("load visit", e))?;

        match active {
            Some(active) => {
                let lines = active.to_cart_lines(self.default_tax_rate);
                let session_id = active.session_id.clone();
                self.with_cart_mut(|cart| {
                    cart.populate_from_session(session_id.clone(), lines.clone());
                    cart.set_customer(customer);
                });
                *self.lock_marker() = Some(key.clone());

                info!(
                    customer = %key,
                    session_id = %session_id,
                    services = lines.len(),
                    "Resumed in-progress visit"
                );
                Ok(SessionLoad::Resumed { session_id, lines })
            }
            None => {
                self.with_cart_mut(|cart| {
                    if cart.session_id().is_some() && !same_customer {
                        cart.clear();
                    }
                    cart.set_customer(customer);
                });
                *self.lock_marker() = None;
                debug!(customer = %key, "No active visit");
                Ok(SessionLoad::NoActiveSession)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Completes the sale and starts a fresh cart.
    pub fn checkout(&self) -> SyncResult<CheckoutSummary> {
        let summary = self
            .with_cart_mut(Cart::checkout)
            .map_err(|e| self.surface("checkout", e.into()))?;
        *self.lock_marker() = None;

        info!(
            session_id = ?summary.session_id.as_ref().map(SessionId::as_str),
            total = summary.totals.total.paise(),
            "Checkout complete"
        );
        Ok(summary)
    }

    /// Discards the cart and forgets the loaded customer.
    pub fn clear_cart(&self) {
        self.with_cart_mut(Cart::clear);
        *self.lock_marker() = None;
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    /// Logs and notifies a failure of a user-triggered action.
    fn surface(&self, action: &'static str, err: SyncError) -> SyncError {
        error!(action, error = %err, "Action failed");
        self.notifier.error(&err.user_message());
        err
    }

    fn lock_cart(&self) -> MutexGuard<'_, Cart> {
        self.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_marker(&self) -> MutexGuard<'_, Option<String>> {
        self.loaded_for.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Whether `cart` is still the sale `request` was built from.
fn booking_belongs_to(cart: &Cart, request: &BookServicesRequest) -> bool {
    match cart.session_id() {
        Some(current) => current == &request.session_id,
        None => request
            .items
            .iter()
            .any(|item| cart.line(&item.client_line_id).is_some()),
    }
}

fn lookup_key(customer: &Customer) -> Option<String> {
    CustomerLookup::for_customer(customer)
        .ok()
        .flatten()
        .map(|lookup| lookup.key())
}
