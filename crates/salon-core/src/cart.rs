//! # Cart
//!
//! The pending sale on the POS screen: services and retail products, who is
//! doing each service, and the totals derived from them.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Operator Action          Method                      State Change      │
//! │  ───────────────          ──────                      ────────────      │
//! │                                                                         │
//! │  Pick service/product ──► add_item() ───────────────► lines.push(line) │
//! │                                                                         │
//! │  "+" with a stylist ────► increase_quantity_with_staff()                │
//! │                             ├─ same stylist ────────► quantity += 1    │
//! │                             └─ other stylist ───────► push clone       │
//! │                                                                         │
//! │  Pick stylist ──────────► set_item_staff() ─────────► Single(staff)    │
//! │                                                                         │
//! │  Split dialog save ─────► set_item_staff_contributions() ► Split(..)   │
//! │                                                                         │
//! │  Book services ─────────► mark_items_as_booked() ───► booked = true    │
//! │                                                                         │
//! │  Resume visit ──────────► populate_from_session() ──► lines replaced   │
//! │                                                                         │
//! │  Pay / Clear ───────────► checkout() / clear() ─────► empty cart       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Pricing Model
//! Prices are GST-inclusive. `tax_amount()` tells the customer how much of
//! the bill is GST but is never added to `total()`:
//!
//! ```text
//! line net   = unit_price × quantity − line discount
//! subtotal   = Σ line net                 (booked and unbooked alike)
//! tax_amount = Σ line net × tax_rate      (informational)
//! total      = subtotal − discount_amount
//! ```
//!
//! The cart is a plain owned value. Whoever holds it is its only writer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::contribution::{split_total, StaffContribution};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Customer, LineId, SessionId, StaffRef, TaxRate};
use crate::validation::{
    validate_discount, validate_price, validate_quantity, validate_reference,
    validate_tax_rate_bps,
};
use crate::MAX_CART_ITEMS;

// =============================================================================
// Line Shapes
// =============================================================================

/// Who performs a service line.
///
/// A line is either unassigned, done by one stylist, or split between
/// several by percentage. Never two of these at once.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "mode", content = "staff", rename_all = "snake_case")]
pub enum StaffAssignment {
    #[default]
    Unassigned,
    Single(StaffRef),
    Split(Vec<StaffContribution>),
}

impl StaffAssignment {
    /// The single assigned stylist, if the line uses simple assignment.
    pub fn single(&self) -> Option<&StaffRef> {
        match self {
            StaffAssignment::Single(staff) => Some(staff),
            _ => None,
        }
    }

    pub fn contributions(&self) -> Option<&[StaffContribution]> {
        match self {
            StaffAssignment::Split(contributions) => Some(contributions),
            _ => None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        !matches!(self, StaffAssignment::Unassigned)
    }
}

/// A catalog service being sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLine {
    pub service_id: String,
    pub name: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub assignment: StaffAssignment,
}

/// A retail product being sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductLine {
    pub sku_id: String,
    pub name: String,
}

/// What a cart line sells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineItem {
    Service(ServiceLine),
    Product(ProductLine),
}

// =============================================================================
// Cart Line
// =============================================================================

/// One purchasable unit in the pending sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: LineId,
    pub item: LineItem,
    /// Always >= 1.
    pub quantity: i64,
    pub unit_price: Money,
    /// Per-line discount, checked against `gross()` when applied.
    pub discount: Money,
    pub tax_rate: TaxRate,
    /// Persisted on the server as an in-progress service order.
    pub booked: bool,
    /// Server service-order id, known for booked lines.
    #[serde(default)]
    pub remote_order_id: Option<String>,
}

impl CartLine {
    /// `unit_price × quantity`.
    pub fn gross(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// `gross − discount`.
    pub fn net(&self) -> Money {
        self.gross() - self.discount
    }

    /// GST contained in `net()`.
    pub fn tax(&self) -> Money {
        self.net().percent_of(self.tax_rate)
    }

    pub fn name(&self) -> &str {
        match &self.item {
            LineItem::Service(service) => &service.name,
            LineItem::Product(product) => &product.name,
        }
    }

    pub fn service(&self) -> Option<&ServiceLine> {
        match &self.item {
            LineItem::Service(service) => Some(service),
            LineItem::Product(_) => None,
        }
    }

    pub fn is_service(&self) -> bool {
        self.service().is_some()
    }

    /// Mutable access to the service part of an unbooked line.
    fn editable_service_mut(&mut self) -> CoreResult<&mut ServiceLine> {
        if self.booked {
            return Err(CoreError::LineBooked(self.id.to_string()));
        }
        match &mut self.item {
            LineItem::Service(service) => Ok(service),
            LineItem::Product(_) => Err(CoreError::NotAService(self.id.to_string())),
        }
    }
}

// =============================================================================
// New Line Builder
// =============================================================================

/// Input for [`Cart::add_item`].
///
/// ## Example
/// ```rust
/// use salon_core::cart::NewLine;
/// use salon_core::money::Money;
/// use salon_core::types::StaffRef;
///
/// let line = NewLine::service("svc-spa", "Hair Spa", Money::from_paise(120000))
///     .with_duration(45)
///     .with_staff(StaffRef::new("stf-2", "Ravi"));
/// assert_eq!(line.quantity, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLine {
    pub item: LineItem,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Money,
    pub tax_rate: TaxRate,
}

impl NewLine {
    pub fn service(service_id: impl Into<String>, name: impl Into<String>, price: Money) -> Self {
        NewLine {
            item: LineItem::Service(ServiceLine {
                service_id: service_id.into(),
                name: name.into(),
                duration_minutes: 0,
                assignment: StaffAssignment::Unassigned,
            }),
            quantity: 1,
            unit_price: price,
            discount: Money::zero(),
            tax_rate: TaxRate::default(),
        }
    }

    pub fn product(sku_id: impl Into<String>, name: impl Into<String>, price: Money) -> Self {
        NewLine {
            item: LineItem::Product(ProductLine {
                sku_id: sku_id.into(),
                name: name.into(),
            }),
            quantity: 1,
            unit_price: price,
            discount: Money::zero(),
            tax_rate: TaxRate::default(),
        }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_discount(mut self, discount: Money) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_tax_rate(mut self, rate: TaxRate) -> Self {
        self.tax_rate = rate;
        self
    }

    /// Assigns a single stylist. No effect on product lines.
    pub fn with_staff(mut self, staff: StaffRef) -> Self {
        if let LineItem::Service(service) = &mut self.item {
            service.assignment = StaffAssignment::Single(staff);
        }
        self
    }

    /// Sets the service duration. No effect on product lines.
    pub fn with_duration(mut self, minutes: u32) -> Self {
        if let LineItem::Service(service) = &mut self.item {
            service.duration_minutes = minutes;
        }
        self
    }

    fn validate(&self) -> CoreResult<()> {
        match &self.item {
            LineItem::Service(service) => validate_reference("service_id", &service.service_id)?,
            LineItem::Product(product) => validate_reference("sku_id", &product.sku_id)?,
        }
        validate_quantity(self.quantity)?;
        validate_price(self.unit_price)?;
        let gross = self
            .unit_price
            .checked_mul_quantity(self.quantity)
            .ok_or_else(|| CoreError::AmountOverflow("line total".to_string()))?;
        validate_discount("discount", self.discount, gross)?;
        validate_tax_rate_bps(self.tax_rate.bps())?;
        Ok(())
    }
}

// =============================================================================
// Quantity Increase Decision
// =============================================================================

/// What "one more of this service, by this stylist" means for a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityIncrease {
    /// Same stylist: bump the quantity.
    Increment,
    /// Different stylist: add a separate line so commission stays per-line.
    CloneAsNewLine,
}

/// Decides how a quantity increase with a chosen stylist applies to `line`.
///
/// Only a line singly assigned to the same stylist increments. Unassigned and
/// split lines always clone.
pub fn resolve_quantity_increase(line: &CartLine, chosen: &StaffRef) -> QuantityIncrease {
    let same_staff = line
        .service()
        .and_then(|service| service.assignment.single())
        .is_some_and(|current| current.id == chosen.id);

    if same_staff {
        QuantityIncrease::Increment
    } else {
        QuantityIncrease::CloneAsNewLine
    }
}

/// Outcome of [`Cart::increase_quantity_with_staff`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityIncreased {
    Incremented { line_id: LineId, quantity: i64 },
    Cloned { line_id: LineId },
}

// =============================================================================
// Cart
// =============================================================================

/// The pending sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,
    customer: Customer,
    session_id: Option<SessionId>,
    global_discount: Money,
    created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

impl Cart {
    /// Creates an empty cart for a walk-in customer.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            customer: Customer::walk_in(),
            session_id: None,
            global_discount: Money::zero(),
            created_at: Utc::now(),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, id: &LineId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.id == id)
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// The discount as entered, before clamping.
    pub fn global_discount(&self) -> Money {
        self.global_discount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of lines.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of quantities across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    // -------------------------------------------------------------------------
    // Line Mutations
    // -------------------------------------------------------------------------

    /// Appends a new line. Never merges with an existing one.
    pub fn add_item(&mut self, new_line: NewLine) -> CoreResult<LineId> {
        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }
        new_line.validate()?;
        let net = new_line.unit_price.multiply_quantity(new_line.quantity) - new_line.discount;
        self.checked_subtotal_with(None, net)?;

        let id = LineId::generate();
        self.lines.push(CartLine {
            id: id.clone(),
            item: new_line.item,
            quantity: new_line.quantity,
            unit_price: new_line.unit_price,
            discount: new_line.discount,
            tax_rate: new_line.tax_rate,
            booked: false,
            remote_order_id: None,
        });
        Ok(id)
    }

    /// Removes a line. Returns `false` (and does nothing) if it is absent.
    ///
    /// Booked lines must be cancelled on the server first; this method does
    /// not check.
    pub fn remove_item(&mut self, id: &LineId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| &l.id != id);
        self.lines.len() != before
    }

    /// Sets a line's quantity.
    ///
    /// Refuses values below 1; deciding to remove the line instead is up to
    /// the caller.
    pub fn update_quantity(&mut self, id: &LineId, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;
        let line = self.editable_line_mut(id)?;
        let net = line
            .unit_price
            .checked_mul_quantity(quantity)
            .ok_or_else(|| CoreError::AmountOverflow("line total".to_string()))?
            - line.discount;
        self.checked_subtotal_with(Some(id), net)?;

        self.editable_line_mut(id)?.quantity = quantity;
        Ok(())
    }

    /// Applies a per-line discount, checked against the line's gross.
    pub fn set_line_discount(&mut self, id: &LineId, discount: Money) -> CoreResult<()> {
        let line = self.editable_line_mut(id)?;
        validate_discount("discount", discount, line.gross())?;
        line.discount = discount;
        Ok(())
    }

    /// One more of a service, performed by `staff`.
    ///
    /// ## Behavior
    /// ```text
    /// Haircut ×1 (Asha) + Asha  →  Haircut ×2 (Asha)
    /// Haircut ×1 (Asha) + Ravi  →  Haircut ×1 (Asha), Haircut ×1 (Ravi)
    /// ```
    /// The clone keeps service, price, duration and tax rate, with quantity 1
    /// and no discount.
    pub fn increase_quantity_with_staff(
        &mut self,
        id: &LineId,
        staff: StaffRef,
    ) -> CoreResult<QuantityIncreased> {
        let line = self
            .line(id)
            .ok_or_else(|| CoreError::LineNotFound(id.to_string()))?;
        let service = line
            .service()
            .ok_or_else(|| CoreError::NotAService(id.to_string()))?;

        match resolve_quantity_increase(line, &staff) {
            QuantityIncrease::Increment => {
                let quantity = line.quantity + 1;
                self.update_quantity(id, quantity)?;
                Ok(QuantityIncreased::Incremented {
                    line_id: id.clone(),
                    quantity,
                })
            }
            QuantityIncrease::CloneAsNewLine => {
                let clone = NewLine::service(
                    service.service_id.clone(),
                    service.name.clone(),
                    line.unit_price,
                )
                .with_duration(service.duration_minutes)
                .with_tax_rate(line.tax_rate)
                .with_staff(staff);
                let line_id = self.add_item(clone)?;
                Ok(QuantityIncreased::Cloned { line_id })
            }
        }
    }

    /// Assigns a single stylist, dropping any split.
    pub fn set_item_staff(&mut self, id: &LineId, staff: StaffRef) -> CoreResult<()> {
        let service = self.editable_line_mut(id)?.editable_service_mut()?;
        service.assignment = StaffAssignment::Single(staff);
        Ok(())
    }

    /// Replaces the staff split wholesale.
    ///
    /// The 100% rule is not checked here; an unbalanced split is stored and
    /// later rejected by [`Cart::validate_for_checkout`].
    pub fn set_item_staff_contributions(
        &mut self,
        id: &LineId,
        contributions: Vec<StaffContribution>,
    ) -> CoreResult<()> {
        let service = self.editable_line_mut(id)?.editable_service_mut()?;
        service.assignment = StaffAssignment::Split(contributions);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Cart-Level Mutations
    // -------------------------------------------------------------------------

    pub fn set_customer(&mut self, customer: Customer) {
        self.customer = customer;
    }

    /// Sets the whole-cart discount.
    ///
    /// Rejected if negative or larger than the current subtotal.
    pub fn set_global_discount(&mut self, discount: Money) -> CoreResult<()> {
        validate_discount("global discount", discount, self.subtotal())?;
        self.global_discount = discount;
        Ok(())
    }

    pub fn set_session_id(&mut self, session_id: Option<SessionId>) {
        self.session_id = session_id;
    }

    /// Returns the cart's session id, creating one on first use.
    pub fn generate_session_id(&mut self) -> &SessionId {
        self.session_id.get_or_insert_with(SessionId::generate)
    }

    /// Flags exactly the given lines as booked. Returns how many changed.
    pub fn mark_items_as_booked(&mut self, ids: &[LineId]) -> usize {
        let mut changed = 0;
        for line in self.lines.iter_mut().filter(|l| ids.contains(&l.id)) {
            if !line.booked {
                line.booked = true;
                changed += 1;
            }
        }
        changed
    }

    /// Records the server's service-order id for a line.
    pub fn link_remote_order(&mut self, id: &LineId, order_id: impl Into<String>) -> CoreResult<()> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or_else(|| CoreError::LineNotFound(id.to_string()))?;
        line.remote_order_id = Some(order_id.into());
        Ok(())
    }

    /// Replaces all lines and the session id in one step.
    ///
    /// Used when resuming an in-progress visit from the server.
    pub fn populate_from_session(&mut self, session_id: SessionId, lines: Vec<CartLine>) {
        self.lines = lines;
        self.session_id = Some(session_id);
    }

    /// Empties the cart and resets customer, session and discount.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.customer = Customer::walk_in();
        self.session_id = None;
        self.global_discount = Money::zero();
        self.created_at = Utc::now();
    }

    // -------------------------------------------------------------------------
    // Derived Totals
    // -------------------------------------------------------------------------

    /// Σ line net, booked or not.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::net).sum()
    }

    /// The global discount, clamped so it never exceeds the subtotal.
    pub fn discount_amount(&self) -> Money {
        self.global_discount.min(self.subtotal().max(Money::zero()))
    }

    /// GST contained in the subtotal. Informational only.
    pub fn tax_amount(&self) -> Money {
        self.lines.iter().map(CartLine::tax).sum()
    }

    /// `subtotal − discount_amount`.
    pub fn total(&self) -> Money {
        self.subtotal() - self.discount_amount()
    }

    /// Lines not yet booked, in cart order.
    pub fn unbooked_items(&self) -> Vec<&CartLine> {
        self.lines.iter().filter(|l| !l.booked).collect()
    }

    pub fn has_booked_items(&self) -> bool {
        self.lines.iter().any(|l| l.booked)
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from(self)
    }

    // -------------------------------------------------------------------------
    // Checkout
    // -------------------------------------------------------------------------

    /// Checks everything that must hold before payment.
    ///
    /// ## Rules
    /// - At least one line
    /// - Every split line totals exactly 100%
    /// - The stored global discount still fits the subtotal
    pub fn validate_for_checkout(&self) -> CoreResult<()> {
        if self.lines.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        for line in &self.lines {
            if let Some(split) = line.service().and_then(|s| s.assignment.contributions()) {
                let total = split_total(split);
                if split.is_empty() || total != 100 {
                    return Err(CoreError::InvalidSplit {
                        line_id: line.id.to_string(),
                        total,
                    });
                }
            }
        }

        let subtotal = self.subtotal();
        if self.global_discount > subtotal {
            return Err(CoreError::DiscountExceedsSubtotal {
                discount: self.global_discount.paise(),
                subtotal: subtotal.paise(),
            });
        }

        Ok(())
    }

    /// Validates, snapshots and clears the cart after a successful payment.
    ///
    /// On error nothing changes.
    pub fn checkout(&mut self) -> CoreResult<CheckoutSummary> {
        self.validate_for_checkout()?;

        let summary = CheckoutSummary {
            session_id: self.session_id.clone(),
            customer: self.customer.clone(),
            totals: self.totals(),
            lines: self.lines.clone(),
            completed_at: Utc::now(),
        };
        self.clear();
        Ok(summary)
    }

    /// Subtotal with line `replacing` (if any) swapped for `net`, failing
    /// instead of saturating when it does not fit.
    fn checked_subtotal_with(&self, replacing: Option<&LineId>, net: Money) -> CoreResult<Money> {
        self.lines
            .iter()
            .filter(|l| Some(&l.id) != replacing)
            .try_fold(net, |acc, l| acc.checked_add(l.net()))
            .ok_or_else(|| CoreError::AmountOverflow("cart subtotal".to_string()))
    }

    fn editable_line_mut(&mut self, id: &LineId) -> CoreResult<&mut CartLine> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or_else(|| CoreError::LineNotFound(id.to_string()))?;
        if line.booked {
            return Err(CoreError::LineBooked(id.to_string()));
        }
        Ok(line)
    }
}

// =============================================================================
// Snapshots
// =============================================================================

/// Totals summary for the bill panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            subtotal: cart.subtotal(),
            discount: cart.discount_amount(),
            tax: cart.tax_amount(),
            total: cart.total(),
        }
    }
}

/// What was sold, captured at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub session_id: Option<SessionId>,
    pub customer: Customer,
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
    pub completed_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contribution::ContributionType;
    use crate::error::ValidationError;
    use crate::MAX_UNIT_PRICE;

    fn asha() -> StaffRef {
        StaffRef::new("stf-asha", "Asha")
    }

    fn ravi() -> StaffRef {
        StaffRef::new("stf-ravi", "Ravi")
    }

    fn haircut() -> NewLine {
        NewLine::service("svc-haircut", "Haircut", Money::from_paise(50000))
            .with_duration(30)
            .with_tax_rate(TaxRate::from_percent(18))
    }

    fn contribution(staff: &StaffRef, order: u32, pct: u8) -> StaffContribution {
        StaffContribution {
            staff_id: staff.id.clone(),
            staff_name: staff.name.clone(),
            role: "Staff".to_string(),
            sequence_order: order,
            contribution_type: ContributionType::Percentage,
            contribution_percent: pct,
            time_spent_minutes: None,
        }
    }

    #[test]
    fn test_bill_scenario() {
        let mut cart = Cart::new();
        cart.add_item(haircut().with_quantity(2).with_staff(asha()))
            .unwrap();
        cart.set_global_discount(Money::from_paise(10000)).unwrap();

        assert_eq!(cart.subtotal().paise(), 100000);
        assert_eq!(cart.tax_amount().paise(), 18000);
        assert_eq!(cart.discount_amount().paise(), 10000);
        assert_eq!(cart.total().paise(), 90000);

        let totals = cart.totals();
        assert_eq!(totals.item_count, 1);
        assert_eq!(totals.total_quantity, 2);
        assert_eq!(totals.total.paise(), 90000);
    }

    #[test]
    fn test_line_discount_reduces_subtotal_and_tax() {
        let mut cart = Cart::new();
        cart.add_item(haircut().with_discount(Money::from_paise(5000)))
            .unwrap();
        cart.add_item(
            NewLine::product("sku-shampoo", "Shampoo", Money::from_paise(39900))
                .with_tax_rate(TaxRate::from_percent(5)),
        )
        .unwrap();

        assert_eq!(cart.subtotal().paise(), 45000 + 39900);
        // 45000 × 18% = 8100, 39900 × 5% = 1995
        assert_eq!(cart.tax_amount().paise(), 8100 + 1995);
        assert_eq!(cart.total(), cart.subtotal());
    }

    #[test]
    fn test_add_item_never_merges() {
        let mut cart = Cart::new();
        let a = cart.add_item(haircut().with_staff(asha())).unwrap();
        let b = cart.add_item(haircut().with_staff(asha())).unwrap();

        assert_ne!(a, b);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_add_item_validates_input() {
        let mut cart = Cart::new();
        assert!(cart.add_item(haircut().with_quantity(0)).is_err());
        assert!(cart
            .add_item(NewLine::service("svc", "Bad", Money::from_paise(-1)))
            .is_err());
        assert!(cart
            .add_item(haircut().with_discount(Money::from_paise(50001)))
            .is_err());
        assert!(cart
            .add_item(NewLine::service(" ", "No id", Money::zero()))
            .is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_size_limit() {
        let mut cart = Cart::new();
        for _ in 0..MAX_CART_ITEMS {
            cart.add_item(haircut()).unwrap();
        }
        assert_eq!(
            cart.add_item(haircut()),
            Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS
            })
        );
    }

    #[test]
    fn test_add_item_rejects_price_above_cap() {
        let mut cart = Cart::new();
        let price = Money::from_rupees_str("92233720368547758").unwrap();

        let result = cart.add_item(NewLine::service("svc-x", "Gold Facial", price).with_quantity(2));
        assert_eq!(
            result,
            Err(CoreError::Validation(ValidationError::OutOfRange {
                field: "price".to_string(),
                min: 0,
                max: MAX_UNIT_PRICE.paise(),
            }))
        );
        assert!(cart.is_empty());

        let id = cart
            .add_item(NewLine::service("svc-x", "Bridal Package", MAX_UNIT_PRICE).with_quantity(999))
            .unwrap();
        assert_eq!(cart.subtotal(), MAX_UNIT_PRICE * 999);
        assert!(cart.line(&id).is_some());
    }

    /// Lines resumed from the server skip add-time validation.
    fn oversized_line() -> CartLine {
        CartLine {
            id: LineId::generate(),
            item: LineItem::Service(ServiceLine {
                service_id: "svc-x".into(),
                name: "Imported".into(),
                duration_minutes: 0,
                assignment: StaffAssignment::Unassigned,
            }),
            quantity: 1,
            unit_price: Money::from_paise(i64::MAX / 2 + 1),
            discount: Money::zero(),
            tax_rate: TaxRate::STANDARD_GST,
            booked: false,
            remote_order_id: None,
        }
    }

    #[test]
    fn test_overflowing_subtotal_is_rejected_not_panicking() {
        let mut cart = Cart::new();
        let first = oversized_line();
        let first_id = first.id.clone();
        cart.populate_from_session(SessionId::from("ws-1"), vec![first, oversized_line()]);

        // derived totals saturate
        assert_eq!(cart.subtotal().paise(), i64::MAX);
        assert_eq!(cart.total().paise(), i64::MAX);
        let _ = cart.tax_amount();

        assert_eq!(
            cart.add_item(haircut()),
            Err(CoreError::AmountOverflow("cart subtotal".to_string()))
        );
        assert_eq!(cart.item_count(), 2);

        assert_eq!(
            cart.update_quantity(&first_id, 2),
            Err(CoreError::AmountOverflow("line total".to_string()))
        );
        assert_eq!(cart.line(&first_id).unwrap().quantity, 1);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut cart = Cart::new();
        let id = cart.add_item(haircut()).unwrap();

        assert!(!cart.remove_item(&LineId::from("nope")));
        assert_eq!(cart.item_count(), 1);
        assert!(cart.remove_item(&id));
        assert!(cart.is_empty());
        assert!(!cart.remove_item(&id));
    }

    #[test]
    fn test_update_quantity_refuses_invalid() {
        let mut cart = Cart::new();
        let id = cart.add_item(haircut()).unwrap();

        assert!(matches!(
            cart.update_quantity(&id, 0),
            Err(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));
        assert_eq!(cart.line(&id).unwrap().quantity, 1);

        cart.update_quantity(&id, 3).unwrap();
        assert_eq!(cart.line(&id).unwrap().quantity, 3);

        assert!(matches!(
            cart.update_quantity(&LineId::from("nope"), 2),
            Err(CoreError::LineNotFound(_))
        ));
    }

    #[test]
    fn test_booked_lines_are_read_only() {
        let mut cart = Cart::new();
        let id = cart.add_item(haircut().with_staff(asha())).unwrap();
        cart.mark_items_as_booked(&[id.clone()]);

        assert!(matches!(
            cart.update_quantity(&id, 2),
            Err(CoreError::LineBooked(_))
        ));
        assert!(matches!(
            cart.set_item_staff(&id, ravi()),
            Err(CoreError::LineBooked(_))
        ));
        assert!(matches!(
            cart.increase_quantity_with_staff(&id, asha()),
            Err(CoreError::LineBooked(_))
        ));
        // booking a second stylist on an in-progress service is a new line
        assert!(matches!(
            cart.increase_quantity_with_staff(&id, ravi()),
            Ok(QuantityIncreased::Cloned { .. })
        ));
    }

    #[test]
    fn test_quantity_increase_same_staff_increments() {
        let mut cart = Cart::new();
        let id = cart.add_item(haircut().with_staff(asha())).unwrap();

        let outcome = cart.increase_quantity_with_staff(&id, asha()).unwrap();
        assert_eq!(
            outcome,
            QuantityIncreased::Incremented {
                line_id: id.clone(),
                quantity: 2
            }
        );
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_quantity_increase_other_staff_clones() {
        let mut cart = Cart::new();
        let id = cart
            .add_item(haircut().with_staff(asha()).with_discount(Money::from_paise(1000)))
            .unwrap();

        let outcome = cart.increase_quantity_with_staff(&id, ravi()).unwrap();
        let QuantityIncreased::Cloned { line_id } = outcome else {
            panic!("expected a clone, got {:?}", outcome);
        };

        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.line(&id).unwrap().quantity, 1);

        let clone = cart.line(&line_id).unwrap();
        let service = clone.service().unwrap();
        assert_eq!(clone.quantity, 1);
        assert_eq!(clone.unit_price.paise(), 50000);
        assert_eq!(clone.discount, Money::zero());
        assert_eq!(clone.tax_rate, TaxRate::from_percent(18));
        assert_eq!(service.duration_minutes, 30);
        assert_eq!(service.assignment.single(), Some(&ravi()));
    }

    #[test]
    fn test_resolve_quantity_increase_on_unassigned_and_split() {
        let mut cart = Cart::new();
        let unassigned = cart.add_item(haircut()).unwrap();
        let split = cart.add_item(haircut()).unwrap();
        cart.set_item_staff_contributions(
            &split,
            vec![contribution(&asha(), 1, 50), contribution(&ravi(), 2, 50)],
        )
        .unwrap();

        assert_eq!(
            resolve_quantity_increase(cart.line(&unassigned).unwrap(), &asha()),
            QuantityIncrease::CloneAsNewLine
        );
        assert_eq!(
            resolve_quantity_increase(cart.line(&split).unwrap(), &asha()),
            QuantityIncrease::CloneAsNewLine
        );
    }

    #[test]
    fn test_quantity_increase_rejects_products() {
        let mut cart = Cart::new();
        let id = cart
            .add_item(NewLine::product("sku-gel", "Gel", Money::from_paise(25000)))
            .unwrap();
        assert!(matches!(
            cart.increase_quantity_with_staff(&id, asha()),
            Err(CoreError::NotAService(_))
        ));
    }

    #[test]
    fn test_staff_modes_are_exclusive() {
        let mut cart = Cart::new();
        let id = cart.add_item(haircut().with_staff(asha())).unwrap();

        cart.set_item_staff_contributions(&id, vec![contribution(&asha(), 1, 100)])
            .unwrap();
        let assignment = &cart.line(&id).unwrap().service().unwrap().assignment;
        assert!(assignment.single().is_none());
        assert_eq!(assignment.contributions().map(|c| c.len()), Some(1));

        cart.set_item_staff(&id, ravi()).unwrap();
        let assignment = &cart.line(&id).unwrap().service().unwrap().assignment;
        assert!(assignment.contributions().is_none());
        assert_eq!(assignment.single(), Some(&ravi()));
    }

    #[test]
    fn test_unbalanced_split_is_stored_but_blocks_checkout() {
        let mut cart = Cart::new();
        let id = cart.add_item(haircut()).unwrap();
        cart.set_item_staff_contributions(
            &id,
            vec![contribution(&asha(), 1, 60), contribution(&ravi(), 2, 30)],
        )
        .unwrap();

        assert_eq!(
            cart.validate_for_checkout(),
            Err(CoreError::InvalidSplit {
                line_id: id.to_string(),
                total: 90
            })
        );
        assert!(cart.checkout().is_err());
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_session_id_is_idempotent_until_cleared() {
        let mut cart = Cart::new();
        let first = cart.generate_session_id().clone();
        let second = cart.generate_session_id().clone();
        assert_eq!(first, second);

        cart.clear();
        assert!(cart.session_id().is_none());
        assert_ne!(cart.generate_session_id(), &first);
    }

    #[test]
    fn test_mark_items_as_booked_touches_only_given_ids() {
        let mut cart = Cart::new();
        let a = cart.add_item(haircut()).unwrap();
        let b = cart.add_item(haircut()).unwrap();
        let c = cart.add_item(haircut()).unwrap();

        assert_eq!(cart.mark_items_as_booked(&[a.clone(), c.clone()]), 2);
        assert!(cart.line(&a).unwrap().booked);
        assert!(!cart.line(&b).unwrap().booked);
        assert!(cart.line(&c).unwrap().booked);

        let unbooked: Vec<&LineId> = cart.unbooked_items().iter().map(|l| &l.id).collect();
        assert_eq!(unbooked, vec![&b]);
        // already booked lines are not counted twice
        assert_eq!(cart.mark_items_as_booked(&[a]), 0);
    }

    #[test]
    fn test_populate_from_session_replaces_everything() {
        let mut cart = Cart::new();
        cart.add_item(haircut()).unwrap();

        let mut source = Cart::new();
        let resumed = source.add_item(haircut().with_staff(ravi())).unwrap();
        source.mark_items_as_booked(&[resumed.clone()]);
        let lines = source.lines().to_vec();

        cart.populate_from_session(SessionId::from("ws-42"), lines);
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.lines()[0].id, resumed);
        assert_eq!(cart.session_id().map(SessionId::as_str), Some("ws-42"));
    }

    #[test]
    fn test_global_discount_rules() {
        let mut cart = Cart::new();
        let id = cart.add_item(haircut().with_quantity(2)).unwrap();

        assert!(cart.set_global_discount(Money::from_paise(-1)).is_err());
        assert!(cart.set_global_discount(Money::from_paise(100001)).is_err());
        cart.set_global_discount(Money::from_paise(80000)).unwrap();

        // dropping the quantity leaves a stale discount: clamped, but checkout refuses
        cart.update_quantity(&id, 1).unwrap();
        assert_eq!(cart.discount_amount().paise(), 50000);
        assert_eq!(cart.total(), Money::zero());
        assert!(matches!(
            cart.validate_for_checkout(),
            Err(CoreError::DiscountExceedsSubtotal { .. })
        ));
    }

    #[test]
    fn test_line_discount_checked_on_application() {
        let mut cart = Cart::new();
        let id = cart.add_item(haircut()).unwrap();

        assert!(cart.set_line_discount(&id, Money::from_paise(50001)).is_err());
        cart.set_line_discount(&id, Money::from_paise(5000)).unwrap();
        assert_eq!(cart.line(&id).unwrap().net().paise(), 45000);
    }

    #[test]
    fn test_checkout_snapshots_and_clears() {
        let mut cart = Cart::new();
        cart.set_customer(Customer::registered("cus-7", "Meera"));
        cart.add_item(haircut().with_staff(asha())).unwrap();
        cart.generate_session_id();

        let summary = cart.checkout().unwrap();
        assert_eq!(summary.customer.name, "Meera");
        assert_eq!(summary.lines.len(), 1);
        assert_eq!(summary.totals.total.paise(), 50000);
        assert!(summary.session_id.is_some());

        assert!(cart.is_empty());
        assert!(cart.session_id().is_none());
        assert!(cart.customer().is_walk_in());
    }

    #[test]
    fn test_empty_cart_cannot_checkout() {
        let mut cart = Cart::new();
        assert_eq!(cart.checkout().unwrap_err(), CoreError::EmptyCart);
    }

    #[test]
    fn test_line_serializes_with_kind_tag() {
        let mut cart = Cart::new();
        let id = cart.add_item(haircut().with_staff(asha())).unwrap();
        let json = serde_json::to_value(cart.line(&id).unwrap()).unwrap();

        assert_eq!(json["item"]["kind"], "service");
        assert_eq!(json["item"]["assignment"]["mode"], "single");
        assert_eq!(json["item"]["assignment"]["staff"]["id"], "stf-asha");
        assert_eq!(json["unitPrice"], 50000);
    }
}
