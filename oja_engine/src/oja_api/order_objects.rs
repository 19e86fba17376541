use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::db_types::{Order, OrderItem, OrderNo, OrderStatusType};

fn status_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<OrderStatusType>>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<OrderStatusType>().map_err(serde::de::Error::custom))
            .collect()
    })
    .transpose()
}

/// A full order as returned by the query surface: the order row plus its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub order_no: Option<OrderNo>,
    pub customer_phone: Option<String>,
    pub market_id: Option<i64>,
    pub agent_id: Option<i64>,
    /// On the wire this is a single comma-separated value (`status=Paid,Assigned`), since
    /// urlencoded query strings cannot carry a repeated scalar into a `Vec`.
    #[serde(default, deserialize_with = "status_list")]
    pub status: Option<Vec<OrderStatusType>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn with_order_no(mut self, order_no: OrderNo) -> Self {
        self.order_no = Some(order_no);
        self
    }

    pub fn with_customer_phone<S: Into<String>>(mut self, phone: S) -> Self {
        self.customer_phone = Some(phone.into());
        self
    }

    pub fn with_market_id(mut self, market_id: i64) -> Self {
        self.market_id = Some(market_id);
        self
    }

    pub fn with_agent_id(mut self, agent_id: i64) -> Self {
        self.agent_id = Some(agent_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.order_no.is_none()
            && self.customer_phone.is_none()
            && self.market_id.is_none()
            && self.agent_id.is_none()
            && self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true)
            && self.since.is_none()
            && self.until.is_none()
    }
}
