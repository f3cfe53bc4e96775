use dialoguer::{Confirm, Input, Password, Select};
use strsim::jaro_winkler;

use crate::error::{PosError, Result};
use crate::models::{
    Category, Credentials, MenuItem, MenuItemPatch, OrderDraft, OrderType, PaymentMethod,
    RegisterRequest,
};
use crate::session::validate_registration;

/// Minimum Jaro-Winkler score for a fuzzy item match.
const FUZZY_THRESHOLD: f64 = 0.7;

/// One step of the interactive ordering loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    AddItem,
    ChangeQuantity,
    RemoveItem,
    NextPage,
    PreviousPage,
    FilterCategory,
    Search,
    EditOrder,
    Checkout,
    ClearCart,
    Quit,
}

impl MenuAction {
    pub const ALL: [MenuAction; 11] = [
        MenuAction::AddItem,
        MenuAction::ChangeQuantity,
        MenuAction::RemoveItem,
        MenuAction::NextPage,
        MenuAction::PreviousPage,
        MenuAction::FilterCategory,
        MenuAction::Search,
        MenuAction::EditOrder,
        MenuAction::Checkout,
        MenuAction::ClearCart,
        MenuAction::Quit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::AddItem => "Add item",
            MenuAction::ChangeQuantity => "Change quantity",
            MenuAction::RemoveItem => "Remove item",
            MenuAction::NextPage => "Next page",
            MenuAction::PreviousPage => "Previous page",
            MenuAction::FilterCategory => "Filter by category",
            MenuAction::Search => "Search menu",
            MenuAction::EditOrder => "Order type / table / payment",
            MenuAction::Checkout => "Place order",
            MenuAction::ClearCart => "Clear cart",
            MenuAction::Quit => "Quit",
        }
    }
}

pub fn prompt_menu_action() -> Result<MenuAction> {
    let labels: Vec<&str> = MenuAction::ALL.iter().map(|a| a.label()).collect();
    let selection = Select::new()
        .with_prompt("What next?")
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(MenuAction::ALL[selection])
}

pub fn prompt_credentials() -> Result<Credentials> {
    let username: String = Input::new().with_prompt("Username").interact_text()?;
    let password = Password::new().with_prompt("Password").interact()?;
    Ok(Credentials {
        username: username.trim().to_string(),
        password,
    })
}

pub fn prompt_registration() -> Result<RegisterRequest> {
    let username: String = Input::new().with_prompt("Username").interact_text()?;
    let email: String = Input::new().with_prompt("Email").interact_text()?;
    let password = Password::new().with_prompt("Password").interact()?;
    let confirm = Password::new().with_prompt("Confirm password").interact()?;
    validate_registration(&username, &email, &password, &confirm)
}

/// Ask for order type, table, payment method and customer details.
/// Current values are offered as defaults.
pub fn prompt_order_draft(current: &OrderDraft) -> Result<OrderDraft> {
    let types: Vec<&str> = OrderType::ALL.iter().map(|t| t.label()).collect();
    let type_index = Select::new()
        .with_prompt("Order type")
        .items(&types)
        .default(position(&OrderType::ALL, &current.order_type))
        .interact()?;
    let order_type = OrderType::ALL[type_index];

    let table_number = if order_type == OrderType::DineIn {
        Input::<String>::new()
            .with_prompt("Table number")
            .with_initial_text(current.table_number.clone())
            .allow_empty(true)
            .interact_text()?
    } else {
        current.table_number.clone()
    };

    let methods: Vec<&str> = PaymentMethod::ALL.iter().map(|m| m.label()).collect();
    let method_index = Select::new()
        .with_prompt("Payment method")
        .items(&methods)
        .default(position(&PaymentMethod::ALL, &current.payment_method))
        .interact()?;

    let customer_name: String = Input::new()
        .with_prompt("Customer name")
        .with_initial_text(current.customer_name.clone())
        .allow_empty(true)
        .interact_text()?;
    let customer_phone: String = Input::new()
        .with_prompt("Customer phone")
        .with_initial_text(current.customer_phone.clone())
        .allow_empty(true)
        .interact_text()?;

    Ok(OrderDraft {
        order_type,
        table_number,
        payment_method: PaymentMethod::ALL[method_index],
        customer_name,
        customer_phone,
    })
}

fn position<T: PartialEq>(all: &[T], value: &T) -> usize {
    all.iter().position(|v| v == value).unwrap_or(0)
}

/// Candidate items for a typed name or id, best first.
///
/// An id (`3` or `#3`) or exact name wins outright; otherwise names scoring
/// above the fuzzy threshold are returned, at most five.
pub fn match_items<'a>(items: &'a [MenuItem], query: &str) -> Vec<&'a MenuItem> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    if let Ok(id) = query.trim_start_matches('#').parse::<u64>() {
        if let Some(item) = items.iter().find(|i| i.id == id) {
            return vec![item];
        }
    }

    let needle = query.to_lowercase();
    if let Some(item) = items.iter().find(|i| i.name.to_lowercase() == needle) {
        return vec![item];
    }

    let mut candidates: Vec<(&MenuItem, f64)> = items
        .iter()
        .map(|i| (i, jaro_winkler(&i.name.to_lowercase(), &needle)))
        .filter(|(_, score)| *score > FUZZY_THRESHOLD)
        .collect();
    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    candidates.into_iter().take(5).map(|(i, _)| i).collect()
}

/// Pick one item by name or id, confirming fuzzy matches.
pub fn prompt_item(items: &[MenuItem], prompt: &str) -> Result<Option<MenuItem>> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    if input.trim().is_empty() {
        return Ok(None);
    }

    let candidates = match_items(items, &input);
    match candidates.as_slice() {
        [] => {
            println!("No menu item matches '{}'", input.trim());
            Ok(None)
        }
        [only] => {
            let exact = only.name.eq_ignore_ascii_case(input.trim())
                || input.trim().trim_start_matches('#') == only.id.to_string();
            if exact || prompt_yes_no(&format!("Did you mean '{}'?", only.name), true)? {
                Ok(Some((*only).clone()))
            } else {
                Ok(None)
            }
        }
        many => {
            let mut options: Vec<String> = many.iter().map(|i| i.name.clone()).collect();
            options.push("None of these".to_string());
            let selection = Select::new()
                .with_prompt("Which did you mean?")
                .items(&options)
                .default(0)
                .interact()?;
            Ok(many.get(selection).map(|i| (*i).clone()))
        }
    }
}

/// Signed quantity change, e.g. `+2` or `-1`.
pub fn prompt_quantity_delta(name: &str) -> Result<i64> {
    let input: String = Input::new()
        .with_prompt(format!("Change quantity of '{}' by", name))
        .default("+1".to_string())
        .interact_text()?;
    input
        .trim()
        .trim_start_matches('+')
        .parse()
        .map_err(|_| PosError::InvalidInput("Invalid quantity change".to_string()))
}

pub fn prompt_category(categories: &[Category]) -> Result<Option<u64>> {
    let mut options = vec!["All categories".to_string()];
    options.extend(categories.iter().map(|c| c.name.clone()));
    let selection = Select::new()
        .with_prompt("Category")
        .items(&options)
        .default(0)
        .interact()?;
    Ok(selection
        .checked_sub(1)
        .and_then(|i| categories.get(i))
        .map(|c| c.id))
}

pub fn prompt_search() -> Result<Option<String>> {
    let input: String = Input::new()
        .with_prompt("Search (empty to clear)")
        .allow_empty(true)
        .interact_text()?;
    let input = input.trim();
    Ok((!input.is_empty()).then(|| input.to_string()))
}

/// Amount and email for a wallet top-up, asking only for what is missing.
pub fn prompt_funding(amount: Option<String>, email: Option<String>) -> Result<(String, String)> {
    let amount = match amount {
        Some(amount) => amount,
        None => Input::<String>::new().with_prompt("Amount").interact_text()?,
    };
    let email = match email {
        Some(email) => email,
        None => Input::<String>::new().with_prompt("Email").interact_text()?,
    };
    Ok((amount, email))
}

/// Interactive edit of a menu item. Only changed fields end up in the patch.
pub fn prompt_menu_patch(item: &MenuItem, categories: &[Category]) -> Result<MenuItemPatch> {
    let name: String = Input::new()
        .with_prompt("Name")
        .with_initial_text(item.name.clone())
        .interact_text()?;
    let description: String = Input::new()
        .with_prompt("Description")
        .with_initial_text(item.description.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;
    let price: String = Input::new()
        .with_prompt("Price")
        .with_initial_text(format!("{:.2}", item.price))
        .interact_text()?;
    let parsed_price: f64 = price
        .trim()
        .parse()
        .map_err(|_| PosError::InvalidInput("Price must be a number".to_string()))?;
    if parsed_price < 0.0 {
        return Err(PosError::InvalidInput("Price cannot be negative".to_string()));
    }
    let available = Confirm::new()
        .with_prompt("Available?")
        .default(item.available)
        .interact()?;

    let category = if categories.is_empty() {
        None
    } else {
        let current = categories
            .iter()
            .position(|c| item.in_category(c))
            .unwrap_or(0);
        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        let selection = Select::new()
            .with_prompt("Category")
            .items(&names)
            .default(current)
            .interact()?;
        let chosen = &categories[selection];
        (!item.in_category(chosen)).then_some(chosen.id)
    };

    let description = description.trim();
    let old_description = item.description.as_deref().unwrap_or("");
    Ok(MenuItemPatch {
        name: (name.trim() != item.name).then(|| name.trim().to_string()),
        description: (description != old_description).then(|| description.to_string()),
        price: ((parsed_price - item.price).abs() > f64::EPSILON)
            .then(|| format!("{:.2}", parsed_price)),
        available: (available != item.available).then_some(available),
        category,
    })
}

/// Prompt for yes/no confirmation.
pub fn prompt_yes_no(prompt: &str, default: bool) -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> Vec<MenuItem> {
        vec![
            MenuItem::new(1, "Jollof Rice", 25.0),
            MenuItem::new(2, "Fried Rice", 22.0),
            MenuItem::new(3, "Banku and Tilapia", 40.0),
        ]
    }

    #[test]
    fn test_match_by_id_and_exact_name() {
        let items = menu();
        assert_eq!(match_items(&items, "#3")[0].id, 3);
        assert_eq!(match_items(&items, "2")[0].id, 2);
        let exact = match_items(&items, "jollof rice");
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].id, 1);
    }

    #[test]
    fn test_fuzzy_match() {
        let items = menu();
        let found = match_items(&items, "jolof rice");
        assert_eq!(found[0].id, 1);
        assert!(match_items(&items, "pizza").is_empty());
        assert!(match_items(&items, "   ").is_empty());
    }
}
