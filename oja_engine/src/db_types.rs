use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use oja_common::Kobo;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------      OrderNo        ---------------------------------------------------------
/// The public identifier of an order, e.g. `OJA-20240614-7G2K4A`.
///
/// Order numbers are generated by [`crate::helpers::new_order_number`] at intake and are what
/// customers, agents and the payment reference all refer to. The internal row id never leaves the
/// database layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderNo(pub String);

impl FromStr for OrderNo {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderNo {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNo {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderNo {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType   ---------------------------------------------------------
/// The order lifecycle.
///
/// The happy path runs `Pending → (Confirmed | Paid) → Assigned → Preparing → ReadyForDelivery →
/// OutForDelivery → Delivered`. `Cancelled` and `Failed` are absorbing and reachable from any
/// non-terminal state. Transitions outside [`OrderStatusType::can_transition_to`] are rejected by
/// the order flow API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// Newly created. Items may still be added or replaced.
    Pending,
    /// Acknowledged by the market, still awaiting payment. Items may still be changed.
    Confirmed,
    /// Payment received in full.
    Paid,
    /// A fulfilment agent has accepted the order.
    Assigned,
    Preparing,
    ReadyForDelivery,
    OutForDelivery,
    /// Terminal. Earnings settle and the customer session completes on entry.
    Delivered,
    /// Terminal. Cancelled by the customer or an admin.
    Cancelled,
    /// Terminal. The payment failed or the order could not be fulfilled.
    Failed,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Failed)
    }

    /// The set of states this status may legally move to.
    pub fn next_states(&self) -> &'static [OrderStatusType] {
        use OrderStatusType::*;
        match self {
            Pending => &[Confirmed, Paid, Cancelled, Failed],
            Confirmed => &[Paid, Assigned, Cancelled, Failed],
            Paid => &[Assigned, Cancelled, Failed],
            Assigned => &[Preparing, Cancelled, Failed],
            Preparing => &[ReadyForDelivery, Cancelled, Failed],
            ReadyForDelivery => &[OutForDelivery, Cancelled, Failed],
            OutForDelivery => &[Delivered, Cancelled, Failed],
            Delivered | Cancelled | Failed => &[],
        }
    }

    pub fn can_transition_to(&self, new_status: OrderStatusType) -> bool {
        self.next_states().contains(&new_status)
    }

    /// Orders still open for item changes.
    pub fn allows_item_changes(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatusType::Pending => "Pending",
            OrderStatusType::Confirmed => "Confirmed",
            OrderStatusType::Paid => "Paid",
            OrderStatusType::Assigned => "Assigned",
            OrderStatusType::Preparing => "Preparing",
            OrderStatusType::ReadyForDelivery => "ReadyForDelivery",
            OrderStatusType::OutForDelivery => "OutForDelivery",
            OrderStatusType::Delivered => "Delivered",
            OrderStatusType::Cancelled => "Cancelled",
            OrderStatusType::Failed => "Failed",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(pub String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Confirmed" => Ok(Self::Confirmed),
            "Paid" => Ok(Self::Paid),
            "Assigned" => Ok(Self::Assigned),
            "Preparing" => Ok(Self::Preparing),
            "ReadyForDelivery" => Ok(Self::ReadyForDelivery),
            "OutForDelivery" => Ok(Self::OutForDelivery),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------        Market       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Market {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub delivery_fee: Kobo,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        Agent        ---------------------------------------------------------
/// A fulfilment worker scoped to one market. An agent is eligible for assignment when they are
/// active, not suspended, and carrying fewer open orders than `max_active_orders`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Agent {
    pub id: i64,
    pub market_id: i64,
    pub name: String,
    pub phone: String,
    pub is_active: bool,
    pub is_suspended: bool,
    pub max_active_orders: i64,
    /// Fraction of the order subtotal earned on assignment, e.g. 0.1 for 10%.
    pub commission_rate: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    MarketProduct    ---------------------------------------------------------
/// A catalog entry scoped to one market and, optionally, one agent's stock.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MarketProduct {
    pub id: i64,
    pub market_id: i64,
    pub agent_id: Option<i64>,
    /// The canonical product name.
    pub base_name: String,
    /// An agent-customised display name, if any. Both names are matched against by the resolver.
    pub custom_name: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MarketProduct {
    pub fn display_name(&self) -> &str {
        self.custom_name.as_deref().unwrap_or(&self.base_name)
    }
}

//--------------------------------------    ProductPrice     ---------------------------------------------------------
/// A priced variant of a catalog entry, keyed by measurement scale ("1kg", "paint", "tuber", …).
/// At most one row exists per (product, scale).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ProductPrice {
    pub id: i64,
    pub market_product_id: i64,
    pub measurement_scale: String,
    pub price: Kobo,
    pub stock_count: Option<i64>,
    pub is_available: bool,
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_no: OrderNo,
    pub customer_name: Option<String>,
    pub customer_phone: String,
    pub delivery_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub market_id: i64,
    pub agent_id: Option<i64>,
    pub subtotal: Kobo,
    pub delivery_fee: Kobo,
    /// Always equals `subtotal + delivery_fee`. Recomputed in the same transaction as every item
    /// mutation.
    pub total_amount: Kobo,
    /// The reference handed to Paystack at payment initialization. The webhook echoes it back and
    /// the reconciler matches on it.
    pub payment_reference: Option<String>,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

//--------------------------------------      NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_no: OrderNo,
    pub customer_name: Option<String>,
    pub customer_phone: String,
    pub delivery_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub market_id: i64,
    pub delivery_fee: Kobo,
}

impl NewOrder {
    pub fn new(order_no: OrderNo, market_id: i64, customer_phone: String, delivery_address: String) -> Self {
        Self {
            order_no,
            customer_name: None,
            customer_phone,
            delivery_address,
            latitude: None,
            longitude: None,
            market_id,
            delivery_fee: Kobo::default(),
        }
    }

    pub fn with_delivery_fee(mut self, fee: Kobo) -> Self {
        self.delivery_fee = fee;
        self
    }
}

//--------------------------------------      OrderItem      ---------------------------------------------------------
/// A line item, denormalized at order time. `product_name`, `unit_price` and `total_price` are
/// captured copies so that later catalog edits never alter order history.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub market_product_id: Option<i64>,
    pub product_name: String,
    pub measurement_scale: String,
    pub quantity: i64,
    pub unit_price: Kobo,
    pub total_price: Kobo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub market_product_id: Option<i64>,
    pub product_name: String,
    pub measurement_scale: String,
    pub quantity: i64,
    pub unit_price: Kobo,
}

impl NewOrderItem {
    pub fn new<S: Into<String>>(product_name: S, measurement_scale: S, quantity: i64, unit_price: Kobo) -> Self {
        Self {
            market_product_id: None,
            product_name: product_name.into(),
            measurement_scale: measurement_scale.into(),
            quantity,
            unit_price,
        }
    }

    pub fn for_product(mut self, product_id: i64) -> Self {
        self.market_product_id = Some(product_id);
        self
    }

    pub fn total_price(&self) -> Kobo {
        self.unit_price * self.quantity
    }
}

//--------------------------------------   OrderStatusLog    ---------------------------------------------------------
/// One row per status transition. Append-only; a database trigger aborts updates and deletes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderStatusLogEntry {
    pub id: i64,
    pub order_id: i64,
    pub status: OrderStatusType,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------    EarningStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum EarningStatus {
    Pending,
    Paid,
}

impl Display for EarningStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EarningStatus::Pending => write!(f, "Pending"),
            EarningStatus::Paid => write!(f, "Paid"),
        }
    }
}

//--------------------------------------    AgentEarning     ---------------------------------------------------------
/// Commission owed to an agent for one order. Inserted as `Pending` at assignment and flipped to
/// `Paid` when the order is delivered.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AgentEarning {
    pub id: i64,
    pub agent_id: i64,
    pub order_id: i64,
    pub amount: Kobo,
    pub status: EarningStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

//--------------------------------------    SessionStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum SessionStatus {
    Active,
    Completed,
}

impl Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "Active"),
            SessionStatus::Completed => write!(f, "Completed"),
        }
    }
}

//--------------------------------------   CustomerSession   ---------------------------------------------------------
/// The chat session that originated an order, keyed by customer phone. At most one `Active`
/// session per phone; delivery completes it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CustomerSession {
    pub id: i64,
    pub customer_phone: String,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            OrderStatusType::Pending,
            OrderStatusType::Confirmed,
            OrderStatusType::Paid,
            OrderStatusType::Assigned,
            OrderStatusType::Preparing,
            OrderStatusType::ReadyForDelivery,
            OrderStatusType::OutForDelivery,
            OrderStatusType::Delivered,
            OrderStatusType::Cancelled,
            OrderStatusType::Failed,
        ] {
            assert_eq!(status.to_string().parse::<OrderStatusType>().unwrap(), status);
        }
        assert!("ready_for_delivery".parse::<OrderStatusType>().is_err());
    }

    #[test]
    fn transition_table_matches_lifecycle() {
        use OrderStatusType::*;
        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Paid.can_transition_to(Assigned));
        assert!(OutForDelivery.can_transition_to(Delivered));
        // Skipping ahead or moving backwards is not allowed.
        assert!(!Pending.can_transition_to(OutForDelivery));
        assert!(!Delivered.can_transition_to(Paid));
        assert!(!Assigned.can_transition_to(Paid));
        // Terminal states go nowhere.
        for terminal in [Delivered, Cancelled, Failed] {
            assert!(terminal.is_terminal());
            assert!(terminal.next_states().is_empty());
        }
        // Every non-terminal state can be annulled.
        for open in [Pending, Confirmed, Paid, Assigned, Preparing, ReadyForDelivery, OutForDelivery] {
            assert!(open.can_transition_to(Cancelled));
            assert!(open.can_transition_to(Failed));
        }
    }

    #[test]
    fn item_totals() {
        let item = NewOrderItem::new("Rice", "1kg", 3, Kobo::from_naira(1200));
        assert_eq!(item.total_price(), Kobo::from_naira(3600));
    }
}
