use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::api::PosApi;
use crate::error::{PosError, Result};
use crate::models::{Order, OrderStatus};

/// Which orders the board shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    pub fn accepts(&self, status: OrderStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        OrderStatus::parse(s)
            .map(StatusFilter::Only)
            .ok_or_else(|| format!("unknown order status '{}'", s))
    }
}

/// Search by order id, table number or customer username.
pub fn matches_search(order: &Order, query: &str) -> bool {
    let query = query.trim();
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();

    order.id.to_string().contains(query)
        || order
            .table_number
            .as_deref()
            .map(|t| t.to_lowercase().contains(&needle))
            .unwrap_or(false)
        || order
            .customer
            .as_ref()
            .and_then(|c| c.username())
            .map(|u| u.to_lowercase().contains(&needle))
            .unwrap_or(false)
}

/// Human-readable order age: `Just now`, `12m ago`, `2h 5m ago`.
pub fn time_since(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - created_at).num_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    format!("{}h {}m ago", minutes / 60, minutes % 60)
}

/// A snapshot of the kitchen's orders.
#[derive(Debug, Clone)]
pub struct KitchenBoard {
    orders: Vec<Order>,
    fetched_at: DateTime<Utc>,
}

impl KitchenBoard {
    pub fn new(orders: Vec<Order>, fetched_at: DateTime<Utc>) -> Self {
        Self { orders, fetched_at }
    }

    #[instrument(skip(api))]
    pub async fn fetch<A: PosApi + ?Sized>(api: &A) -> Result<Self> {
        let orders = api.orders().await?;
        info!(count = orders.len(), "Kitchen orders loaded");
        Ok(Self::new(orders, Utc::now()))
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn find(&self, order_id: u64) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == order_id)
    }

    pub fn filtered(&self, filter: StatusFilter, search: &str) -> Vec<&Order> {
        self.orders
            .iter()
            .filter(|o| filter.accepts(o.status) && matches_search(o, search))
            .collect()
    }

    /// Order count per status, in workflow order.
    pub fn status_counts(&self) -> Vec<(OrderStatus, usize)> {
        OrderStatus::ALL
            .into_iter()
            .map(|status| {
                let count = self.orders.iter().filter(|o| o.status == status).count();
                (status, count)
            })
            .collect()
    }
}

/// Move an order to its next workflow status.
#[instrument(skip(api, order), fields(order_id = order.id))]
pub async fn advance_order<A: PosApi + ?Sized>(api: &A, order: &Order) -> Result<Order> {
    let next = order.status.next().ok_or_else(|| {
        PosError::Validation(format!(
            "Order #{} is already {}",
            order.id,
            order.status.as_str()
        ))
    })?;
    let updated = api.update_order_status(order.id, next).await?;
    info!(from = %order.status, to = %updated.status, "Order status updated");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CustomerRef;
    use chrono::{Duration, TimeZone};

    fn order(id: u64, status: OrderStatus, table: Option<&str>, customer: Option<&str>) -> Order {
        Order {
            id,
            customer: customer.map(|u| CustomerRef::User {
                id: None,
                username: u.to_string(),
            }),
            table_number: table.map(str::to_string),
            order_type: Default::default(),
            status,
            created_at: None,
            order_items: Vec::new(),
        }
    }

    fn board() -> KitchenBoard {
        KitchenBoard::new(
            vec![
                order(11, OrderStatus::Pending, Some("A4"), Some("ama")),
                order(12, OrderStatus::Preparing, None, Some("Kofi")),
                order(21, OrderStatus::Pending, Some("b2"), None),
            ],
            Utc::now(),
        )
    }

    #[test]
    fn test_filter_by_status_and_search() {
        let board = board();
        assert_eq!(board.filtered(StatusFilter::All, "").len(), 3);
        assert_eq!(
            board
                .filtered(StatusFilter::Only(OrderStatus::Pending), "")
                .len(),
            2
        );
        assert_eq!(board.filtered(StatusFilter::All, "1").len(), 3);
        assert_eq!(board.filtered(StatusFilter::All, "12")[0].id, 12);
        assert_eq!(board.filtered(StatusFilter::All, "B2")[0].id, 21);
        assert_eq!(board.filtered(StatusFilter::All, "kofi")[0].id, 12);
        assert!(board
            .filtered(StatusFilter::Only(OrderStatus::Ready), "")
            .is_empty());
    }

    #[test]
    fn test_status_counts() {
        let counts = board().status_counts();
        assert_eq!(counts.len(), 5);
        assert_eq!(counts[0], (OrderStatus::Pending, 2));
        assert_eq!(counts[2], (OrderStatus::Preparing, 1));
        assert_eq!(counts[4], (OrderStatus::Delivered, 0));
    }

    #[test]
    fn test_status_filter_parse() {
        assert_eq!("all".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert_eq!(
            "Ready".parse::<StatusFilter>(),
            Ok(StatusFilter::Only(OrderStatus::Ready))
        );
        assert!("cancelled".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn test_time_since() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(time_since(now - Duration::seconds(30), now), "Just now");
        assert_eq!(time_since(now - Duration::minutes(12), now), "12m ago");
        assert_eq!(time_since(now - Duration::minutes(125), now), "2h 5m ago");
    }
}
