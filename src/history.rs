use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::models::Order;

const HEADER: [&str; 8] = [
    "order_id",
    "created_at",
    "status",
    "order_type",
    "table_number",
    "customer",
    "items",
    "total",
];

fn write_rows<W: Write>(wtr: &mut csv::Writer<W>, orders: &[Order]) -> Result<()> {
    wtr.write_record(HEADER)?;

    for order in orders {
        wtr.write_record([
            order.id.to_string(),
            order
                .created_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_default(),
            order.status.as_str().to_string(),
            order.order_type.label().to_string(),
            order.table_number.clone().unwrap_or_default(),
            order
                .customer
                .as_ref()
                .and_then(|c| c.username())
                .unwrap_or_default()
                .to_string(),
            order.item_count().to_string(),
            format!("{:.2}", order.total()),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write order history to a CSV file.
pub fn write_csv(orders: &[Order], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    write_rows(&mut wtr, orders)?;
    tracing::info!(path = %path.display(), count = orders.len(), "History exported");
    Ok(())
}

/// Order history as CSV text.
pub fn to_csv_string(orders: &[Order]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    write_rows(&mut wtr, orders)?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomerRef, OrderLine, OrderStatus, OrderType};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn order() -> Order {
        Order {
            id: 42,
            customer: Some(CustomerRef::User {
                id: Some(1),
                username: "ama".to_string(),
            }),
            table_number: Some("5".to_string()),
            order_type: OrderType::DineIn,
            status: OrderStatus::Ready,
            created_at: Some(Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap()),
            order_items: vec![OrderLine {
                id: None,
                item: None,
                item_name: Some("Jollof Rice".to_string()),
                price: Some(25.0),
                quantity: 2,
                total_price: None,
            }],
        }
    }

    #[test]
    fn test_csv_rows() {
        let text = to_csv_string(&[order()]).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("order_id,created_at,status,order_type,table_number,customer,items,total")
        );
        assert_eq!(
            lines.next(),
            Some("42,2025-03-01T12:30:00+00:00,ready,Dine In,5,ama,2,50.00")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_write_csv_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.csv");
        write_csv(&[order(), order()], &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
    }
}
