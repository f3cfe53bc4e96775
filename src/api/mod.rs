//! Access to the ChefChain REST API.
//!
//! [`PosApi`] is the seam every view and the checkout state machine talk
//! through. [`HttpClient`] is the production implementation; [`mock::MockApi`]
//! records calls for tests.

pub mod client;
pub mod errors;
pub mod mock;

pub use client::HttpClient;
pub use errors::{describe_body, error_from_response, BodyMessage};
pub use mock::{ApiCall, MockApi, RecordedCall};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    CartLineRequest, Category, CreateOrderRequest, Credentials, MenuItem, MenuItemPatch,
    MenuQuery, Order, OrderStatus, PaymentInitiation, PaymentRequest, PaymentVerification,
    RegisterRequest, TokenPair, UserProfile,
};

#[async_trait]
pub trait PosApi: Send + Sync {
    /// `GET /categories/`
    async fn categories(&self) -> Result<Vec<Category>>;

    /// `GET /menu/` with optional filters.
    async fn menu(&self, query: &MenuQuery) -> Result<Vec<MenuItem>>;

    /// `PATCH /menu/<id>/`
    async fn update_menu_item(&self, id: u64, patch: &MenuItemPatch) -> Result<MenuItem>;

    /// `POST /cart/add/`
    async fn add_to_cart(&self, line: &CartLineRequest) -> Result<()>;

    /// `POST /orders/create/`. The key is sent as `Idempotency-Key`.
    async fn create_order(&self, request: &CreateOrderRequest, idempotency_key: &str)
        -> Result<Order>;

    /// `GET /orders/`
    async fn orders(&self) -> Result<Vec<Order>>;

    /// `PATCH /orders/<id>/`
    async fn update_order_status(&self, id: u64, status: OrderStatus) -> Result<Order>;

    /// `GET /orders/history/`
    async fn order_history(&self) -> Result<Vec<Order>>;

    /// `POST /token/`
    async fn login(&self, credentials: &Credentials) -> Result<TokenPair>;

    /// `POST /register/`
    async fn register(&self, request: &RegisterRequest) -> Result<UserProfile>;

    /// `POST /refresh/`
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair>;

    /// `POST /logout/`
    async fn logout(&self) -> Result<()>;

    /// `GET /user/`
    async fn current_user(&self) -> Result<UserProfile>;

    /// `POST /payments/initiate/`
    async fn initiate_payment(&self, request: &PaymentRequest) -> Result<PaymentInitiation>;

    /// `GET /payments/verify/<reference>/`
    async fn verify_payment(&self, reference: &str) -> Result<PaymentVerification>;
}
