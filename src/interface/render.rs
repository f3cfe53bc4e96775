use chrono::{DateTime, Utc};

use crate::cart::Cart;
use crate::checkout::CheckoutState;
use crate::kitchen::{time_since, KitchenBoard, StatusFilter};
use crate::models::{
    page_count, paginate, Category, MenuItem, Order, OrderDraft, OrderType, PaymentInitiation,
    PaymentVerification,
};
use crate::pricing::{format_amount, ITEMS_PER_PAGE};
use crate::session::Session;

/// Show one page of the menu. `page` is 1-indexed.
pub fn display_menu_page(items: &[MenuItem], page: usize, categories: &[Category]) {
    println!();
    if items.is_empty() {
        println!("No menu items found.");
        return;
    }

    let pages = page_count(items.len(), ITEMS_PER_PAGE);
    println!("=== Menu (page {} of {}) ===", page, pages);
    println!();

    let shown = paginate(items, page, ITEMS_PER_PAGE);
    let name_width = shown.iter().map(|i| i.name.len()).max().unwrap_or(10);
    for item in shown {
        let category = item
            .category
            .as_ref()
            .map(|c| c.label(categories))
            .unwrap_or_else(|| "No Category".to_string());
        let availability = if item.available { "" } else { "  [unavailable]" };
        println!(
            "  #{:<4} {:<width$}  {:>10}  {}{}",
            item.id,
            item.name,
            format_amount(item.price),
            category,
            availability,
            width = name_width
        );
    }
    println!();
}

pub fn display_cart(cart: &Cart, tax_rate: f64) {
    println!();
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    println!("=== Cart ({} items) ===", cart.item_count());
    for line in cart.lines() {
        println!(
            "  {:>3} x {:<24} {:>10}",
            line.quantity,
            line.item.name,
            format_amount(line.line_total())
        );
    }

    let totals = cart.totals(tax_rate);
    println!("  {:-<42}", "");
    println!("  {:<30} {:>10}", "Subtotal", format_amount(totals.subtotal));
    println!(
        "  {:<30} {:>10}",
        format!("Tax ({:.0}%)", tax_rate * 100.0),
        format_amount(totals.tax)
    );
    println!("  {:<30} {:>10}", "Total", format_amount(totals.total));
    println!();
}

/// One-line summary of how the order will be placed.
pub fn draft_summary(draft: &OrderDraft) -> String {
    let mut parts = vec![draft.order_type.label().to_string()];
    if draft.order_type == OrderType::DineIn {
        let table = draft.table_number.trim();
        parts.push(if table.is_empty() {
            "no table".to_string()
        } else {
            format!("table {}", table)
        });
    }
    parts.push(draft.payment_method.label().to_string());
    if !draft.customer_name.trim().is_empty() {
        parts.push(draft.customer_name.trim().to_string());
    }
    parts.join(" | ")
}

pub fn display_notice(message: &str) {
    println!(">> {}", message);
}

pub fn display_checkout_state(state: &CheckoutState) {
    match state {
        CheckoutState::Idle => {}
        CheckoutState::Success(order) => {
            println!();
            println!("✓ {}", state.label());
            println!(
                "  {} items, {}",
                order.item_count(),
                format_amount(order.total())
            );
        }
        CheckoutState::Failed(message) => println!("✗ {}", message),
        busy => println!("… {}", busy.label()),
    }
}

fn customer_label(order: &Order) -> String {
    order
        .customer
        .as_ref()
        .and_then(|c| c.username())
        .unwrap_or("walk-in")
        .to_string()
}

fn age_label(order: &Order, now: DateTime<Utc>) -> String {
    order
        .created_at
        .map(|at| time_since(at, now))
        .unwrap_or_default()
}

pub fn display_order(order: &Order, now: DateTime<Utc>) {
    let table = order
        .table_number
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(|t| format!(" table {}", t))
        .unwrap_or_default();
    println!(
        "#{} [{}] {}{} - {}  {}",
        order.id,
        order.status,
        order.order_type,
        table,
        customer_label(order),
        age_label(order, now)
    );
    for line in &order.order_items {
        println!(
            "    {:>3} x {:<24} {:>10}",
            line.quantity,
            line.name(),
            format_amount(line.line_total())
        );
    }
    println!("    Total: {}", format_amount(order.total()));
}

pub fn display_kitchen_board(
    board: &KitchenBoard,
    filter: StatusFilter,
    search: &str,
    now: DateTime<Utc>,
) {
    println!();
    println!("=== Kitchen ({}) ===", board.fetched_at().format("%H:%M:%S"));
    let counts: Vec<String> = board
        .status_counts()
        .iter()
        .map(|(status, count)| format!("{}: {}", status, count))
        .collect();
    println!("{}", counts.join("  "));
    println!();

    let orders = board.filtered(filter, search);
    if orders.is_empty() {
        println!("No orders match.");
        return;
    }
    for order in orders {
        display_order(order, now);
        println!();
    }
}

pub fn display_history(orders: &[Order], now: DateTime<Utc>) {
    println!();
    if orders.is_empty() {
        println!("No past orders.");
        return;
    }
    println!("=== Order history ({} orders) ===", orders.len());
    for order in orders {
        println!(
            "  #{:<5} {:<10} {:<9} {:>3} items {:>10}  {}",
            order.id,
            order.status.label(),
            order.order_type.label(),
            order.item_count(),
            format_amount(order.total()),
            age_label(order, now)
        );
    }
    println!();
}

pub fn display_profile(session: &Session) {
    match (&session.username, session.role) {
        (Some(name), Some(role)) => {
            println!("Signed in as {} ({})", name, role);
            println!("Start with: chefchain {}", role.landing_command());
        }
        (Some(name), None) => println!("Signed in as {}", name),
        _ => println!("Not signed in."),
    }
}

pub fn display_payment_initiation(initiation: &PaymentInitiation) {
    println!();
    println!("Payment started. Reference: {}", initiation.reference);
    if let Some(url) = &initiation.authorization_url {
        println!("Complete the payment at: {}", url);
    }
    println!(
        "Then run: chefchain verify {}",
        initiation.reference
    );
}

pub fn display_verification(verification: &PaymentVerification) {
    let status = verification.status.as_deref().unwrap_or("unknown");
    println!("Payment status: {}", status);
    if let Some(message) = &verification.message {
        println!("{}", message);
    }
    if let Some(balance) = verification.balance {
        println!("Wallet balance: {}", format_amount(balance));
    }
}
