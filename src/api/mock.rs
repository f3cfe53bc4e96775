//! # Mock API
//!
//! An in-memory [`PosApi`] for exercising views and the checkout flow
//! without a server.
//!
//! Seed it with menu data and orders, inject failures as raw HTTP status +
//! body pairs (decoded through the same path as real responses), then
//! inspect [`MockApi::calls`] to assert what was sent and in which order.
//!
//! ```ignore
//! let api = MockApi::new().with_menu(vec![MenuItem::new(1, "Jollof", 25.0)]);
//! api.fail_create_order(400, r#"{"detail": "Kitchen closed"}"#);
//!
//! let mut checkout = Checkout::new(api.clone(), TimedApproval::default());
//! // drive the checkout...
//! assert_eq!(api.calls().len(), 1);
//! ```
//!
//! Clones share state, so keep one handle for assertions.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::time::Instant;

use crate::api::PosApi;
use crate::api::errors::error_from_response;
use crate::error::{PosError, Result};
use crate::models::{
    CartLineRequest, Category, CategoryRef, CreateOrderRequest, Credentials, LineItemRef,
    MenuItem, MenuItemPatch, MenuQuery, Order, OrderLine, OrderStatus, PaymentInitiation,
    PaymentRequest, PaymentVerification, RegisterRequest, TokenPair, UserProfile,
};

/// A request the mock received.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    Categories,
    Menu(MenuQuery),
    UpdateMenuItem(u64, MenuItemPatch),
    AddToCart(CartLineRequest),
    CreateOrder {
        request: CreateOrderRequest,
        idempotency_key: String,
    },
    Orders,
    UpdateOrderStatus(u64, OrderStatus),
    OrderHistory,
    Login(String),
    Register(String),
    Refresh(String),
    Logout,
    CurrentUser,
    InitiatePayment(PaymentRequest),
    VerifyPayment(String),
}

/// A call plus the (Tokio) instant it arrived.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub call: ApiCall,
    pub at: Instant,
}

#[derive(Debug, Clone)]
struct Failure {
    status: u16,
    body: String,
}

impl Failure {
    fn to_error(&self) -> PosError {
        error_from_response(self.status, &self.body)
    }
}

#[derive(Debug, Default)]
struct MockState {
    categories: Vec<Category>,
    menu: Vec<MenuItem>,
    orders: Vec<Order>,
    history: Vec<Order>,
    profile: Option<UserProfile>,
    tokens: TokenPair,
    payment: Option<PaymentInitiation>,
    verification: Option<PaymentVerification>,
    add_to_cart_failure: Option<(usize, Failure)>,
    add_to_cart_seen: usize,
    server_cart: Vec<CartLineRequest>,
    create_order_failure: Option<Failure>,
    orders_failure: Option<Failure>,
    next_order_id: u64,
    calls: Vec<RecordedCall>,
}

#[derive(Debug, Clone, Default)]
pub struct MockApi {
    state: Arc<Mutex<MockState>>,
}

impl MockApi {
    pub fn new() -> Self {
        let api = Self::default();
        api.state().next_order_id = 1;
        api
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: ApiCall) {
        self.state().calls.push(RecordedCall {
            call,
            at: Instant::now(),
        });
    }

    pub fn with_categories(self, categories: Vec<Category>) -> Self {
        self.state().categories = categories;
        self
    }

    pub fn with_menu(self, menu: Vec<MenuItem>) -> Self {
        self.state().menu = menu;
        self
    }

    pub fn with_orders(self, orders: Vec<Order>) -> Self {
        self.state().orders = orders;
        self
    }

    pub fn with_history(self, history: Vec<Order>) -> Self {
        self.state().history = history;
        self
    }

    pub fn with_profile(self, profile: UserProfile) -> Self {
        self.state().profile = Some(profile);
        self
    }

    pub fn with_tokens(self, tokens: TokenPair) -> Self {
        self.state().tokens = tokens;
        self
    }

    pub fn with_payment(self, initiation: PaymentInitiation) -> Self {
        self.state().payment = Some(initiation);
        self
    }

    pub fn with_verification(self, verification: PaymentVerification) -> Self {
        self.state().verification = Some(verification);
        self
    }

    /// Fail the `call_index`-th (0-based) `add_to_cart` call.
    pub fn fail_add_to_cart(&self, call_index: usize, status: u16, body: &str) {
        self.state().add_to_cart_failure = Some((
            call_index,
            Failure {
                status,
                body: body.to_string(),
            },
        ));
    }

    pub fn fail_create_order(&self, status: u16, body: &str) {
        self.state().create_order_failure = Some(Failure {
            status,
            body: body.to_string(),
        });
    }

    /// Make every `orders` call fail until [`MockApi::clear_failures`].
    pub fn fail_orders(&self, status: u16, body: &str) {
        self.state().orders_failure = Some(Failure {
            status,
            body: body.to_string(),
        });
    }

    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.add_to_cart_failure = None;
        state.create_order_failure = None;
        state.orders_failure = None;
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.iter().map(|r| r.call.clone()).collect()
    }

    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }

    /// Lines added through `add_to_cart` and not yet turned into an order.
    pub fn server_cart(&self) -> Vec<CartLineRequest> {
        self.state().server_cart.clone()
    }

    pub fn orders_snapshot(&self) -> Vec<Order> {
        self.state().orders.clone()
    }

    pub fn count(&self, predicate: impl Fn(&ApiCall) -> bool) -> usize {
        self.state().calls.iter().filter(|r| predicate(&r.call)).count()
    }
}

fn not_found() -> PosError {
    error_from_response(404, r#"{"detail": "Not found."}"#)
}

#[async_trait]
impl PosApi for MockApi {
    async fn categories(&self) -> Result<Vec<Category>> {
        self.record(ApiCall::Categories);
        Ok(self.state().categories.clone())
    }

    async fn menu(&self, query: &MenuQuery) -> Result<Vec<MenuItem>> {
        self.record(ApiCall::Menu(query.clone()));
        let state = self.state();
        let search = query.search.as_ref().map(|s| s.to_lowercase());

        Ok(state
            .menu
            .iter()
            .filter(|item| match (query.category, &item.category) {
                (None, _) => true,
                (Some(id), Some(CategoryRef::Id(item_cat))) => *item_cat == id,
                (Some(id), Some(CategoryRef::Name(name))) => state
                    .categories
                    .iter()
                    .any(|c| c.id == id && c.name.eq_ignore_ascii_case(name)),
                (Some(_), None) => false,
            })
            .filter(|item| {
                search
                    .as_ref()
                    .map(|s| item.name.to_lowercase().contains(s))
                    .unwrap_or(true)
            })
            .filter(|item| !query.available_only || item.available)
            .cloned()
            .collect())
    }

    async fn update_menu_item(&self, id: u64, patch: &MenuItemPatch) -> Result<MenuItem> {
        self.record(ApiCall::UpdateMenuItem(id, patch.clone()));
        let mut state = self.state();
        let item = state
            .menu
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(not_found)?;

        if let Some(name) = &patch.name {
            item.name = name.clone();
        }
        if let Some(description) = &patch.description {
            item.description = Some(description.clone());
        }
        if let Some(price) = &patch.price {
            item.price = price
                .parse()
                .map_err(|_| PosError::ServerValidation("price: A valid number is required.".to_string()))?;
        }
        if let Some(available) = patch.available {
            item.available = available;
        }
        if let Some(category) = patch.category {
            item.category = Some(CategoryRef::Id(category));
        }
        Ok(item.clone())
    }

    async fn add_to_cart(&self, line: &CartLineRequest) -> Result<()> {
        self.record(ApiCall::AddToCart(*line));
        let mut state = self.state();
        let index = state.add_to_cart_seen;
        state.add_to_cart_seen += 1;

        if let Some((fail_at, failure)) = &state.add_to_cart_failure {
            if *fail_at == index {
                return Err(failure.to_error());
            }
        }
        state.server_cart.push(*line);
        Ok(())
    }

    async fn create_order(
        &self,
        request: &CreateOrderRequest,
        idempotency_key: &str,
    ) -> Result<Order> {
        self.record(ApiCall::CreateOrder {
            request: request.clone(),
            idempotency_key: idempotency_key.to_string(),
        });
        let mut state = self.state();
        if let Some(failure) = &state.create_order_failure {
            return Err(failure.to_error());
        }

        // Embedded lines win; otherwise the order takes what was added to
        // the server-side cart.
        let lines: Vec<(u64, u32)> = match &request.order_items {
            Some(items) => items.iter().map(|l| (l.item_id, l.quantity)).collect(),
            None => state
                .server_cart
                .drain(..)
                .map(|l| (l.item, l.quantity))
                .collect(),
        };
        let order_items = lines
            .into_iter()
            .map(|(item_id, quantity)| {
                let item = state.menu.iter().find(|m| m.id == item_id);
                OrderLine {
                    id: None,
                    item: Some(LineItemRef::Id(item_id)),
                    item_name: item.map(|m| m.name.clone()),
                    price: item.map(|m| m.price),
                    quantity,
                    total_price: None,
                }
            })
            .collect();

        let order = Order {
            id: state.next_order_id,
            customer: None,
            table_number: request.table_number.clone(),
            order_type: request.order_type,
            status: OrderStatus::Pending,
            created_at: None,
            order_items,
        };
        state.next_order_id += 1;
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn orders(&self) -> Result<Vec<Order>> {
        self.record(ApiCall::Orders);
        let state = self.state();
        match &state.orders_failure {
            Some(failure) => Err(failure.to_error()),
            None => Ok(state.orders.clone()),
        }
    }

    async fn update_order_status(&self, id: u64, status: OrderStatus) -> Result<Order> {
        self.record(ApiCall::UpdateOrderStatus(id, status));
        let mut state = self.state();
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(not_found)?;
        order.status = status;
        Ok(order.clone())
    }

    async fn order_history(&self) -> Result<Vec<Order>> {
        self.record(ApiCall::OrderHistory);
        Ok(self.state().history.clone())
    }

    async fn login(&self, credentials: &Credentials) -> Result<TokenPair> {
        self.record(ApiCall::Login(credentials.username.clone()));
        Ok(self.state().tokens.clone())
    }

    async fn register(&self, request: &RegisterRequest) -> Result<UserProfile> {
        self.record(ApiCall::Register(request.username.clone()));
        Ok(UserProfile {
            id: Some(1),
            username: request.username.clone(),
            email: Some(request.email.clone()),
            role: Default::default(),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        self.record(ApiCall::Refresh(refresh_token.to_string()));
        Ok(self.state().tokens.clone())
    }

    async fn logout(&self) -> Result<()> {
        self.record(ApiCall::Logout);
        Ok(())
    }

    async fn current_user(&self) -> Result<UserProfile> {
        self.record(ApiCall::CurrentUser);
        self.state()
            .profile
            .clone()
            .ok_or_else(|| error_from_response(401, r#"{"detail": "Authentication credentials were not provided."}"#))
    }

    async fn initiate_payment(&self, request: &PaymentRequest) -> Result<PaymentInitiation> {
        self.record(ApiCall::InitiatePayment(request.clone()));
        self.state()
            .payment
            .clone()
            .ok_or_else(|| error_from_response(400, r#"{"error": "Failed to initiate payment"}"#))
    }

    async fn verify_payment(&self, reference: &str) -> Result<PaymentVerification> {
        self.record(ApiCall::VerifyPayment(reference.to_string()));
        self.state()
            .verification
            .clone()
            .ok_or_else(|| error_from_response(400, r#"{"error": "Payment verification failed"}"#))
    }
}
