//! # Wire Protocol
//!
//! JSON bodies exchanged with the salon API.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Salon API Calls                                 │
//! │                                                                         │
//! │  POST /service-orders/bulk        BookServicesRequest                  │
//! │       ◄──────────────────────     BookServicesResponse                 │
//! │                                                                         │
//! │  POST /service-orders/{id}/cancel CancelOrderRequest                   │
//! │       ◄──────────────────────     (empty / ignored)                    │
//! │                                                                         │
//! │  GET  /walk-ins/active?customerId=..|phone=..                          │
//! │       ◄──────────────────────     { "session": ActiveSession | null }  │
//! │                                                                         │
//! │  GET  /walk-ins/active                                                 │
//! │       ◄──────────────────────     { "sessions": [ActiveSession] }      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All keys are camelCase and all amounts are integer paise.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use salon_core::cart::{CartLine, LineItem, ServiceLine, StaffAssignment};
use salon_core::contribution::{split_total, StaffContribution};
use salon_core::validation::validate_split_total;
use salon_core::{Cart, CoreError, Customer, LineId, Money, SessionId, StaffRef, TaxRate};

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Booking
// =============================================================================

/// Body of `POST /service-orders/bulk`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookServicesRequest {
    pub session_id: SessionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    pub items: Vec<BookServiceItem>,
}

/// One service order to create.
///
/// Single-staff lines carry `staffId`; split lines carry `contributions`
/// instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookServiceItem {
    pub client_line_id: LineId,
    pub service_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<String>,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contributions: Option<Vec<StaffContribution>>,
}

impl BookServicesRequest {
    /// Builds the booking body for every unbooked service line in `cart`.
    ///
    /// Product lines are sold at checkout and never booked. Split lines must
    /// total 100% before anything is sent.
    pub fn from_cart(cart: &Cart, session_id: SessionId) -> SyncResult<Self> {
        let mut items = Vec::new();

        for line in cart.unbooked_items() {
            let LineItem::Service(service) = &line.item else {
                continue;
            };
            items.push(BookServiceItem::from_service_line(line, service)?);
        }

        if items.is_empty() {
            return Err(SyncError::NothingToBook);
        }

        let customer = cart.customer();
        Ok(BookServicesRequest {
            session_id,
            customer_id: customer.id.clone(),
            customer_name: customer.name.clone(),
            customer_phone: customer.phone.clone(),
            items,
        })
    }

    /// Ids of the cart lines this request books.
    pub fn line_ids(&self) -> Vec<LineId> {
        self.items.iter().map(|i| i.client_line_id.clone()).collect()
    }
}

impl BookServiceItem {
    fn from_service_line(line: &CartLine, service: &ServiceLine) -> SyncResult<Self> {
        let (staff_id, contributions) = match &service.assignment {
            StaffAssignment::Unassigned => (None, None),
            StaffAssignment::Single(staff) => (Some(staff.id.clone()), None),
            StaffAssignment::Split(split) => {
                validate_split_total(split.iter().map(|c| c.contribution_percent)).map_err(
                    |_| CoreError::InvalidSplit {
                        line_id: line.id.to_string(),
                        total: split_total(split),
                    },
                )?;
                (None, Some(split.clone()))
            }
        };

        Ok(BookServiceItem {
            client_line_id: line.id.clone(),
            service_id: service.service_id.clone(),
            staff_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
            discount: line.discount,
            contributions,
        })
    }
}

/// Response of `POST /service-orders/bulk`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookServicesResponse {
    pub created_count: u32,
    #[serde(default)]
    pub orders: Vec<BookedOrder>,
}

/// Server order id assigned to one booked line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedOrder {
    pub client_line_id: LineId,
    pub order_id: String,
}

// =============================================================================
// Cancellation
// =============================================================================

/// Body of `POST /service-orders/{id}/cancel`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// =============================================================================
// Active Sessions
// =============================================================================

/// Lifecycle of a server-side service order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceOrderStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// One in-progress service of an active visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrder {
    pub id: String,
    pub service_id: String,
    pub service_name: String,
    pub price: Money,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub staff_id: Option<String>,
    #[serde(default)]
    pub staff_name: Option<String>,
    #[serde(default)]
    pub contributions: Vec<StaffContribution>,
    pub status: ServiceOrderStatus,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_quantity() -> i64 {
    1
}

impl ServiceOrder {
    /// Maps the order to a booked cart line.
    ///
    /// The server does not send tax rates, so `tax_rate` is supplied by the
    /// caller. Contributions win over a single staff id.
    pub fn to_cart_line(&self, tax_rate: TaxRate) -> CartLine {
        let assignment = if !self.contributions.is_empty() {
            let mut split = self.contributions.clone();
            split.sort_by_key(|c| c.sequence_order);
            StaffAssignment::Split(split)
        } else if let Some(staff_id) = &self.staff_id {
            StaffAssignment::Single(StaffRef::new(
                staff_id.clone(),
                self.staff_name.clone().unwrap_or_default(),
            ))
        } else {
            StaffAssignment::Unassigned
        };

        CartLine {
            id: LineId::generate(),
            item: LineItem::Service(ServiceLine {
                service_id: self.service_id.clone(),
                name: self.service_name.clone(),
                duration_minutes: self.duration_minutes,
                assignment,
            }),
            quantity: self.quantity.max(1),
            unit_price: self.price,
            discount: Money::zero(),
            tax_rate,
            booked: true,
            remote_order_id: Some(self.id.clone()),
        }
    }
}

/// A customer's in-progress multi-service visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSession {
    pub session_id: SessionId,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub services: Vec<ServiceOrder>,
}

impl ActiveSession {
    /// Booked cart lines for every service that is still open.
    pub fn to_cart_lines(&self, tax_rate: TaxRate) -> Vec<CartLine> {
        self.services
            .iter()
            .filter(|s| s.status != ServiceOrderStatus::Cancelled)
            .map(|s| s.to_cart_line(tax_rate))
            .collect()
    }

    /// The customer the server recorded for this visit.
    pub fn customer(&self) -> Customer {
        let mut customer = match (&self.customer_id, &self.customer_name) {
            (Some(id), Some(name)) => Customer::registered(id.clone(), name.clone()),
            (Some(id), None) => Customer::registered(id.clone(), id.clone()),
            (None, Some(name)) => Customer {
                name: name.clone(),
                ..Customer::walk_in()
            },
            (None, None) => Customer::walk_in(),
        };
        customer.phone = self.customer_phone.clone();
        customer
    }

    /// Sum of open service prices.
    pub fn running_total(&self) -> Money {
        self.services
            .iter()
            .filter(|s| s.status != ServiceOrderStatus::Cancelled)
            .map(|s| s.price.multiply_quantity(s.quantity.max(1)))
            .sum()
    }
}

/// Response of the per-customer active session query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveSessionEnvelope {
    #[serde(default)]
    pub session: Option<ActiveSession>,
}

/// Response of the all-walk-ins query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveWalkInsEnvelope {
    #[serde(default)]
    pub sessions: Vec<ActiveSession>,
}

/// Error body the API returns with non-2xx statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Extracts the server's message from a raw response body, if any.
    pub fn message_from(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        parsed
            .message
            .or(parsed.error)
            .filter(|m| !m.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salon_core::cart::NewLine;
    use salon_core::contribution::ContributionType;
    use serde_json::json;

    fn split(staff_id: &str, order: u32, pct: u8) -> StaffContribution {
        StaffContribution {
            staff_id: staff_id.to_string(),
            staff_name: staff_id.to_uppercase(),
            role: "Staff".to_string(),
            sequence_order: order,
            contribution_type: ContributionType::Percentage,
            contribution_percent: pct,
            time_spent_minutes: None,
        }
    }

    #[test]
    fn test_booking_request_covers_unbooked_services_only() {
        let mut cart = Cart::new();
        let booked = cart
            .add_item(NewLine::service("svc-1", "Haircut", Money::from_paise(50000)))
            .unwrap();
        let single = cart
            .add_item(
                NewLine::service("svc-2", "Shave", Money::from_paise(20000))
                    .with_staff(StaffRef::new("stf-1", "Asha")),
            )
            .unwrap();
        cart.add_item(NewLine::product("sku-1", "Wax", Money::from_paise(30000)))
            .unwrap();
        cart.mark_items_as_booked(&[booked]);

        let request = BookServicesRequest::from_cart(&cart, SessionId::from("ws-1")).unwrap();
        assert_eq!(request.line_ids(), vec![single]);
        assert_eq!(request.items[0].staff_id.as_deref(), Some("stf-1"));

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["sessionId"], "ws-1");
        assert_eq!(body["customerName"], "Walk-in Customer");
        assert!(body.get("customerId").is_none());
        assert_eq!(body["items"][0]["serviceId"], "svc-2");
        assert!(body["items"][0].get("contributions").is_none());
    }

    #[test]
    fn test_booking_request_rejects_unbalanced_split() {
        let mut cart = Cart::new();
        let id = cart
            .add_item(NewLine::service("svc-1", "Colour", Money::from_paise(200000)))
            .unwrap();
        cart.set_item_staff_contributions(&id, vec![split("a", 1, 60), split("b", 2, 30)])
            .unwrap();

        let err = BookServicesRequest::from_cart(&cart, SessionId::from("ws-1")).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Core(CoreError::InvalidSplit { total: 90, .. })
        ));
    }

    #[test]
    fn test_booking_request_needs_services() {
        let mut cart = Cart::new();
        cart.add_item(NewLine::product("sku-1", "Wax", Money::from_paise(30000)))
            .unwrap();
        assert!(matches!(
            BookServicesRequest::from_cart(&cart, SessionId::from("ws-1")),
            Err(SyncError::NothingToBook)
        ));
    }

    #[test]
    fn test_active_session_maps_to_booked_lines() {
        let session: ActiveSession = serde_json::from_value(json!({
            "sessionId": "ws-77",
            "customerId": "cus-1",
            "customerName": "Meera",
            "services": [
                {
                    "id": "so-1",
                    "serviceId": "svc-1",
                    "serviceName": "Haircut",
                    "price": 50000,
                    "staffId": "stf-1",
                    "staffName": "Asha",
                    "status": "in_progress",
                    "startedAt": "2024-05-01T10:00:00Z"
                },
                {
                    "id": "so-2",
                    "serviceId": "svc-2",
                    "serviceName": "Colour",
                    "price": 200000,
                    "contributions": [
                        { "staffId": "b", "staffName": "B", "role": "Staff", "sequenceOrder": 2, "contributionPercent": 40 },
                        { "staffId": "a", "staffName": "A", "role": "Staff", "sequenceOrder": 1, "contributionPercent": 60 }
                    ],
                    "status": "pending"
                },
                {
                    "id": "so-3",
                    "serviceId": "svc-3",
                    "serviceName": "Spa",
                    "price": 90000,
                    "status": "cancelled"
                }
            ]
        }))
        .unwrap();

        let lines = session.to_cart_lines(TaxRate::STANDARD_GST);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.booked));
        assert!(lines.iter().all(|l| l.tax_rate == TaxRate::STANDARD_GST));
        assert_eq!(lines[0].remote_order_id.as_deref(), Some("so-1"));
        assert_eq!(
            lines[0].service().unwrap().assignment.single(),
            Some(&StaffRef::new("stf-1", "Asha"))
        );

        let contributions = lines[1].service().unwrap().assignment.contributions().unwrap();
        assert_eq!(contributions[0].staff_id, "a");
        assert_eq!(contributions[1].staff_id, "b");

        assert_eq!(session.running_total().paise(), 250000);
        assert_eq!(session.customer().name, "Meera");
    }

    #[test]
    fn test_unknown_status_is_tolerated() {
        let order: ServiceOrder = serde_json::from_value(json!({
            "id": "so-1",
            "serviceId": "svc-1",
            "serviceName": "Haircut",
            "price": 50000,
            "status": "on_hold"
        }))
        .unwrap();
        assert_eq!(order.status, ServiceOrderStatus::Unknown);
        assert_eq!(order.quantity, 1);
    }

    #[test]
    fn test_error_body_message() {
        assert_eq!(
            ErrorBody::message_from(r#"{"message":"Stylist unavailable"}"#).as_deref(),
            Some("Stylist unavailable")
        );
        assert_eq!(
            ErrorBody::message_from(r#"{"error":"Not allowed"}"#).as_deref(),
            Some("Not allowed")
        );
        assert!(ErrorBody::message_from("<html>502</html>").is_none());
        assert!(ErrorBody::message_from(r#"{"message":"  "}"#).is_none());
    }
}
