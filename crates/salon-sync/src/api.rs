//! # Salon API Client
//!
//! The remote calls the POS makes, behind a trait so sessions and monitors
//! can run against an in-memory fake in tests.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       HttpSalonApi Request Flow                         │
//! │                                                                         │
//! │  PosSession / Monitor                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SalonApi (trait) ──► HttpSalonApi                                     │
//! │                          │                                              │
//! │                          ├─ join path onto base URL                     │
//! │                          ├─ bearer token (if configured)                │
//! │                          ├─ timeout (from config)                       │
//! │                          ▼                                              │
//! │                       reqwest ──► 2xx ──► JSON body                    │
//! │                          │                                              │
//! │                          └──────► non-2xx ──► SyncError::Remote         │
//! │                                                                         │
//! │  GETs retry transient failures with exponential backoff.               │
//! │  POSTs are sent exactly once.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use reqwest::{RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};
use url::Url;

use salon_core::validation::validate_phone;
use salon_core::Customer;

use crate::config::{ApiSettings, ClientConfig};
use crate::error::{SyncError, SyncResult};
use crate::protocol::{
    ActiveSession, ActiveSessionEnvelope, ActiveWalkInsEnvelope, BookServicesRequest,
    BookServicesResponse, CancelOrderRequest, ErrorBody,
};

// =============================================================================
// Customer Lookup
// =============================================================================

/// How an active visit is looked up: by registered id, else by phone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CustomerLookup {
    Id(String),
    Phone(String),
}

impl CustomerLookup {
    /// Builds a lookup for `customer`.
    ///
    /// Returns `Ok(None)` for an anonymous walk-in. A phone that fails
    /// validation is an error, so nothing malformed reaches the network.
    pub fn for_customer(customer: &Customer) -> SyncResult<Option<Self>> {
        if let Some(id) = customer.id.as_deref().map(str::trim) {
            if !id.is_empty() {
                return Ok(Some(CustomerLookup::Id(id.to_string())));
            }
        }

        match customer.phone.as_deref() {
            Some(phone) if !phone.trim().is_empty() => {
                Ok(Some(CustomerLookup::Phone(validate_phone(phone)?)))
            }
            _ => Ok(None),
        }
    }

    /// Stable key used to remember which customer's visit is loaded.
    pub fn key(&self) -> String {
        match self {
            CustomerLookup::Id(id) => format!("id:{}", id),
            CustomerLookup::Phone(phone) => format!("phone:{}", phone),
        }
    }

    fn query_pair(&self) -> (&'static str, &str) {
        match self {
            CustomerLookup::Id(id) => ("customerId", id),
            CustomerLookup::Phone(phone) => ("phone", phone),
        }
    }
}

// =============================================================================
// API Trait
// =============================================================================

/// Remote operations against the salon API.
#[async_trait]
pub trait SalonApi: Send + Sync {
    /// Creates in-progress service orders for a visit.
    async fn book_services(&self, request: &BookServicesRequest)
        -> SyncResult<BookServicesResponse>;

    /// Cancels one booked service order.
    async fn cancel_service_order(&self, order_id: &str, reason: Option<&str>) -> SyncResult<()>;

    /// The customer's in-progress visit, if any.
    async fn active_session(&self, lookup: &CustomerLookup) -> SyncResult<Option<ActiveSession>>;

    /// Every in-progress visit in the salon.
    async fn active_walk_ins(&self) -> SyncResult<Vec<ActiveSession>>;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// [`SalonApi`] over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpSalonApi {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    read_retry: Duration,
}

impl HttpSalonApi {
    /// Creates a client from API settings.
    pub fn new(settings: &ApiSettings) -> SyncResult<Self> {
        let mut base_url = Url::parse(&settings.base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(SyncError::InvalidUrl(settings.base_url.clone()));
        }
        // Url::join replaces the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .user_agent(concat!("salon-pos/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(HttpSalonApi {
            client,
            base_url,
            token: settings.token.clone(),
            read_retry: settings.read_retry(),
        })
    }

    /// Creates a client from the full client configuration.
    pub fn from_config(config: &ClientConfig) -> SyncResult<Self> {
        Self::new(&config.api)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> SyncResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turns a non-2xx response into [`SyncError::Remote`].
    async fn ensure_success(response: Response) -> SyncResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(SyncError::Remote {
            status: status.as_u16(),
            message: ErrorBody::message_from(&body),
        })
    }

    /// Runs an idempotent read, retrying transient failures until
    /// `read_retry` has elapsed.
    async fn read_with_retry<T, F, Fut>(&self, what: &'static str, mut op: F) -> SyncResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SyncResult<T>>,
    {
        if self.read_retry.is_zero() {
            return op().await;
        }

        let policy = ExponentialBackoff {
            initial_interval: Duration::from_millis(200),
            max_interval: Duration::from_secs(2),
            max_elapsed_time: Some(self.read_retry),
            ..Default::default()
        };

        backoff::future::retry(policy, || {
            let attempt = op();
            async move {
                attempt.await.map_err(|e| {
                    if e.is_retryable() {
                        warn!(error = %e, request = what, "Transient API failure, retrying");
                        backoff::Error::transient(e)
                    } else {
                        backoff::Error::permanent(e)
                    }
                })
            }
        })
        .await
    }

    async fn fetch_active_session(&self, url: Url) -> SyncResult<Option<ActiveSession>> {
        let response = self.authorized(self.client.get(url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let envelope: ActiveSessionEnvelope = Self::ensure_success(response).await?.json().await?;
        Ok(envelope.session)
    }

    async fn fetch_active_walk_ins(&self, url: Url) -> SyncResult<Vec<ActiveSession>> {
        let response = self.authorized(self.client.get(url)).send().await?;
        let envelope: ActiveWalkInsEnvelope = Self::ensure_success(response).await?.json().await?;
        Ok(envelope.sessions)
    }
}

#[async_trait]
impl SalonApi for HttpSalonApi {
    async fn book_services(
        &self,
        request: &BookServicesRequest,
    ) -> SyncResult<BookServicesResponse> {
        let url = self.endpoint("service-orders/bulk")?;
        debug!(
            session_id = %request.session_id,
            items = request.items.len(),
            "Booking services"
        );

        let response = self
            .authorized(self.client.post(url))
            .json(request)
            .send()
            .await?;
        let body = Self::ensure_success(response).await?.json().await?;
        Ok(body)
    }

    async fn cancel_service_order(&self, order_id: &str, reason: Option<&str>) -> SyncResult<()> {
        let mut url = self.endpoint("service-orders/")?;
        url.path_segments_mut()
            .map_err(|_| SyncError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(order_id)
            .push("cancel");
        debug!(order_id, "Cancelling service order");

        let body = CancelOrderRequest {
            reason: reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
        };
        let response = self
            .authorized(self.client.post(url))
            .json(&body)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn active_session(&self, lookup: &CustomerLookup) -> SyncResult<Option<ActiveSession>> {
        let mut url = self.endpoint("walk-ins/active")?;
        let (key, value) = lookup.query_pair();
        url.query_pairs_mut().append_pair(key, value);
        debug!(lookup = %lookup.key(), "Querying active session");

        self.read_with_retry("active_session", || self.fetch_active_session(url.clone()))
            .await
    }

    async fn active_walk_ins(&self) -> SyncResult<Vec<ActiveSession>> {
        let url = self.endpoint("walk-ins/active")?;
        self.read_with_retry("active_walk_ins", || self.fetch_active_walk_ins(url.clone()))
            .await
    }
}
