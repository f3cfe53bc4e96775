use crate::models::{CartLineRequest, MenuItem, OrderItemRequest};
use crate::pricing::{compute_totals, Totals};

/// One menu item plus its selected quantity. Quantity is always > 0.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub item: MenuItem,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> f64 {
        self.item.price * self.quantity as f64
    }
}

/// Transient notification produced by [`Cart::add_item`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartNotice {
    Added(String),
    QuantityUpdated(String),
}

impl CartNotice {
    pub fn message(&self) -> String {
        match self {
            CartNotice::Added(name) => format!("{} added to cart!", name),
            CartNotice::QuantityUpdated(name) => format!("{} quantity updated in cart!", name),
        }
    }
}

/// In-memory cart keyed by menu item id, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `item`. An existing line for the same id is bumped
    /// instead of duplicated.
    pub fn add_item(&mut self, item: &MenuItem) -> CartNotice {
        if let Some(line) = self.lines.iter_mut().find(|l| l.item.id == item.id) {
            line.quantity += 1;
            tracing::debug!(item_id = item.id, quantity = line.quantity, "Cart line bumped");
            return CartNotice::QuantityUpdated(item.name.clone());
        }

        self.lines.push(CartLine {
            item: item.clone(),
            quantity: 1,
        });
        tracing::debug!(item_id = item.id, "Cart line added");
        CartNotice::Added(item.name.clone())
    }

    /// Apply `delta` to a line's quantity, flooring at zero. Lines that
    /// reach zero are dropped. Unknown ids are ignored.
    pub fn update_quantity(&mut self, item_id: u64, delta: i64) {
        for line in self.lines.iter_mut().filter(|l| l.item.id == item_id) {
            let next = (line.quantity as i64).saturating_add(delta).max(0);
            line.quantity = u32::try_from(next).unwrap_or(u32::MAX);
        }
        self.lines.retain(|l| l.quantity > 0);
    }

    /// Drop the line for `item_id` if present.
    pub fn remove_item(&mut self, item_id: u64) {
        self.lines.retain(|l| l.item.id != item_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn get(&self, item_id: u64) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.item.id == item_id)
    }

    pub fn contains(&self, item_id: u64) -> bool {
        self.get(item_id).is_some()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn totals(&self, tax_rate: f64) -> Totals {
        compute_totals(&self.lines, tax_rate)
    }

    /// Per-line payloads for `POST /cart/add/`.
    pub fn sync_requests(&self) -> Vec<CartLineRequest> {
        self.lines
            .iter()
            .map(|l| CartLineRequest {
                item: l.item.id,
                quantity: l.quantity,
            })
            .collect()
    }

    /// Lines embedded in a batched create-order request.
    pub fn order_items(&self) -> Vec<OrderItemRequest> {
        self.lines
            .iter()
            .map(|l| OrderItemRequest {
                item_id: l.item.id,
                quantity: l.quantity,
            })
            .collect()
    }
}
