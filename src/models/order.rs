use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::MenuItem;

/// How the order is fulfilled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    #[default]
    DineIn,
    Takeaway,
    Delivery,
}

impl OrderType {
    pub const ALL: [OrderType; 3] = [OrderType::DineIn, OrderType::Takeaway, OrderType::Delivery];

    pub fn label(&self) -> &'static str {
        match self {
            OrderType::DineIn => "Dine In",
            OrderType::Takeaway => "Takeaway",
            OrderType::Delivery => "Delivery",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    MobileMoney,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 2] = [PaymentMethod::Cash, PaymentMethod::MobileMoney];

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::MobileMoney => "Mobile Money",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kitchen workflow status. Orders move strictly forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
    ];

    /// The status the kitchen moves this order to next, if any.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Delivered),
            OrderStatus::Delivered => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::Ready => "Ready",
            OrderStatus::Delivered => "Delivered",
        }
    }

    /// Wire name, as used in `PATCH /orders/<id>/` and CLI filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
        }
    }

    pub fn parse(value: &str) -> Option<OrderStatus> {
        let value = value.trim().to_lowercase();
        OrderStatus::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The not-yet-submitted order configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderDraft {
    pub order_type: OrderType,
    pub table_number: String,
    pub payment_method: PaymentMethod,
    pub customer_name: String,
    pub customer_phone: String,
}

/// Payload for `POST /cart/add/`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartLineRequest {
    pub item: u64,
    pub quantity: u32,
}

/// One embedded line in a batched create-order request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub item_id: u64,
    pub quantity: u32,
}

/// Payload for `POST /orders/create/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub order_type: OrderType,
    pub table_number: Option<String>,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_items: Option<Vec<OrderItemRequest>>,
}

impl CreateOrderRequest {
    /// Build the request body. The table number is only sent for dine-in.
    pub fn from_draft(draft: &OrderDraft, order_items: Option<Vec<OrderItemRequest>>) -> Self {
        Self {
            order_type: draft.order_type,
            table_number: (draft.order_type == OrderType::DineIn)
                .then(|| draft.table_number.trim().to_string()),
            payment_method: draft.payment_method,
            customer_name: non_blank(&draft.customer_name),
            customer_phone: non_blank(&draft.customer_phone),
            order_items,
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Either the customer's primary key or an expanded user object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CustomerRef {
    Id(u64),
    User {
        #[serde(default)]
        id: Option<u64>,
        username: String,
    },
}

impl CustomerRef {
    pub fn username(&self) -> Option<&str> {
        match self {
            CustomerRef::Id(_) => None,
            CustomerRef::User { username, .. } => Some(username),
        }
    }
}

/// Either the menu item's primary key or the full nested item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LineItemRef {
    Id(u64),
    Item(Box<MenuItem>),
}

/// A line of a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub item: Option<LineItemRef>,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default, deserialize_with = "super::decimal::deserialize_option")]
    pub price: Option<f64>,
    pub quantity: u32,
    #[serde(default, deserialize_with = "super::decimal::deserialize_option")]
    pub total_price: Option<f64>,
}

impl OrderLine {
    pub fn name(&self) -> String {
        if let Some(name) = &self.item_name {
            return name.clone();
        }
        match &self.item {
            Some(LineItemRef::Item(item)) => item.name.clone(),
            Some(LineItemRef::Id(id)) => format!("Item #{}", id),
            None => "Unknown item".to_string(),
        }
    }

    pub fn unit_price(&self) -> Option<f64> {
        self.price.or(match &self.item {
            Some(LineItemRef::Item(item)) => Some(item.price),
            _ => None,
        })
    }

    /// Line total: unit price × quantity, or the server's total when no
    /// unit price is known.
    pub fn line_total(&self) -> f64 {
        match self.unit_price() {
            Some(price) => price * self.quantity as f64,
            None => self.total_price.unwrap_or(0.0),
        }
    }
}

/// A placed order as returned by the order endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    #[serde(default)]
    pub customer: Option<CustomerRef>,
    #[serde(default)]
    pub table_number: Option<String>,
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order_items: Vec<OrderLine>,
}

impl Order {
    pub fn total(&self) -> f64 {
        self.order_items.iter().map(OrderLine::line_total).sum()
    }

    pub fn item_count(&self) -> u32 {
        self.order_items.iter().map(|l| l.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_workflow() {
        let mut status = OrderStatus::Pending;
        let mut steps = 0;
        while let Some(next) = status.next() {
            status = next;
            steps += 1;
        }
        assert_eq!(status, OrderStatus::Delivered);
        assert_eq!(steps, 4);
        assert_eq!(OrderStatus::parse(" Ready "), Some(OrderStatus::Ready));
        assert_eq!(OrderStatus::parse("cancelled"), None);
    }

    #[test]
    fn test_create_request_drops_table_unless_dine_in() {
        let mut draft = OrderDraft {
            order_type: OrderType::Takeaway,
            table_number: "12".to_string(),
            ..OrderDraft::default()
        };
        let request = CreateOrderRequest::from_draft(&draft, None);
        assert_eq!(request.table_number, None);

        draft.order_type = OrderType::DineIn;
        let request = CreateOrderRequest::from_draft(&draft, None);
        assert_eq!(request.table_number.as_deref(), Some("12"));

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["order_type"], "dine_in");
        assert_eq!(json["payment_method"], "cash");
        assert!(json.get("order_items").is_none());
        assert!(json.get("customer_name").is_none());
    }

    #[test]
    fn test_order_decodes_history_payload() {
        let json = r#"{
            "id": 7,
            "customer": 3,
            "table_number": "A4",
            "order_type": "dine_in",
            "status": "preparing",
            "created_at": "2025-03-01T12:30:00.123456Z",
            "order_items": [
                {"id": 1, "item": 2, "item_name": "Waakye", "price": "25.00", "quantity": 2, "total_price": "50.00"},
                {"id": 2, "item": 5, "item_name": "Kelewele", "price": "12.50", "quantity": 1, "total_price": 12.5}
            ]
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.status, OrderStatus::Preparing);
        assert_eq!(order.customer, Some(CustomerRef::Id(3)));
        assert_eq!(order.item_count(), 3);
        assert!((order.total() - 62.5).abs() < 1e-9);
        assert_eq!(order.order_items[0].name(), "Waakye");
    }

    #[test]
    fn test_line_total_falls_back_to_server_total() {
        let line = OrderLine {
            id: None,
            item: Some(LineItemRef::Id(9)),
            item_name: None,
            price: None,
            quantity: 3,
            total_price: Some(30.0),
        };
        assert_eq!(line.name(), "Item #9");
        assert!((line.line_total() - 30.0).abs() < 1e-9);
    }
}
