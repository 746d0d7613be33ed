//! In-memory doubles for session and monitor tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::api::{CustomerLookup, SalonApi};
use crate::error::{SyncError, SyncResult};
use crate::notify::Notifier;
use crate::protocol::{ActiveSession, BookServicesRequest, BookServicesResponse, BookedOrder};

/// Scriptable [`SalonApi`].
#[derive(Default)]
pub struct FakeSalonApi {
    pub book_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
    pub session_calls: AtomicUsize,
    pub walk_in_calls: AtomicUsize,
    /// Active sessions keyed by `CustomerLookup::key()`.
    pub sessions: Mutex<HashMap<String, ActiveSession>>,
    pub walk_ins: Mutex<Vec<ActiveSession>>,
    /// When set, every call fails with this status and message.
    pub failure: Mutex<Option<(u16, Option<String>)>>,
    pub last_booking: Mutex<Option<BookServicesRequest>>,
    pub cancelled: Mutex<Vec<(String, Option<String>)>>,
    /// When set, `book_services` waits for a permit before answering.
    pub booking_gate: Option<Notify>,
    /// When set, only the first n booked items get an order id back.
    pub confirmed_orders: Mutex<Option<usize>>,
}

impl FakeSalonApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        FakeSalonApi {
            booking_gate: Some(Notify::new()),
            ..Self::default()
        }
    }

    pub fn with_session(self, lookup: &CustomerLookup, session: ActiveSession) -> Self {
        self.sessions.lock().unwrap().insert(lookup.key(), session);
        self
    }

    pub fn fail_with(&self, status: u16, message: Option<&str>) {
        *self.failure.lock().unwrap() = Some((status, message.map(str::to_string)));
    }

    pub fn confirm_only(&self, count: usize) {
        *self.confirmed_orders.lock().unwrap() = Some(count);
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn set_walk_ins(&self, sessions: Vec<ActiveSession>) {
        *self.walk_ins.lock().unwrap() = sessions;
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> SyncResult<()> {
        match self.failure.lock().unwrap().clone() {
            Some((status, message)) => Err(SyncError::Remote { status, message }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SalonApi for FakeSalonApi {
    async fn book_services(
        &self,
        request: &BookServicesRequest,
    ) -> SyncResult<BookServicesResponse> {
        self.book_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.booking_gate {
            gate.notified().await;
        }
        self.check_failure()?;

        *self.last_booking.lock().unwrap() = Some(request.clone());
        let confirmed = self
            .confirmed_orders
            .lock()
            .unwrap()
            .unwrap_or(request.items.len());
        Ok(BookServicesResponse {
            created_count: request.items.len() as u32,
            orders: request
                .items
                .iter()
                .enumerate()
                .take(confirmed)
                .map(|(i, item)| BookedOrder {
                    client_line_id: item.client_line_id.clone(),
                    order_id: format!("so-{}", i + 1),
                })
                .collect(),
        })
    }

    async fn cancel_service_order(&self, order_id: &str, reason: Option<&str>) -> SyncResult<()> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        self.cancelled
            .lock()
            .unwrap()
            .push((order_id.to_string(), reason.map(str::to_string)));
        Ok(())
    }

    async fn active_session(&self, lookup: &CustomerLookup) -> SyncResult<Option<ActiveSession>> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self.sessions.lock().unwrap().get(&lookup.key()).cloned())
    }

    async fn active_walk_ins(&self) -> SyncResult<Vec<ActiveSession>> {
        self.walk_in_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self.walk_ins.lock().unwrap().clone())
    }
}

/// Records notifications for assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    successes: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.successes.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}
