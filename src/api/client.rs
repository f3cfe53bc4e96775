use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::api::PosApi;
use crate::api::errors::error_from_response;
use crate::config::Config;
use crate::error::Result;
use crate::models::{
    CartLineRequest, Category, CreateOrderRequest, Credentials, Listing, MenuItem, MenuItemPatch,
    MenuQuery, Order, OrderStatus, PaymentInitiation, PaymentRequest, PaymentVerification,
    RegisterRequest, TokenPair, UserProfile,
};
use crate::session::Session;

/// reqwest-backed API client. Every request goes through one base URL and
/// carries the session's bearer token when there is one.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn from_config(config: &Config, session: &Session) -> Result<Self> {
        Ok(Self::new(&config.api_base_url, config.request_timeout)?
            .with_token(session.access_token.clone()))
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), %body, "Request failed");
            return Err(error_from_response(status.as_u16(), &body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), %body, "Request failed");
            return Err(error_from_response(status.as_u16(), &body));
        }
        Ok(())
    }
}

#[async_trait]
impl PosApi for HttpClient {
    #[instrument(skip(self))]
    async fn categories(&self) -> Result<Vec<Category>> {
        let listing: Listing<Category> =
            self.send_json(self.request(Method::GET, "/categories/")).await?;
        Ok(listing.into_vec())
    }

    #[instrument(skip(self))]
    async fn menu(&self, query: &MenuQuery) -> Result<Vec<MenuItem>> {
        let builder = self
            .request(Method::GET, "/menu/")
            .query(&query.to_query_pairs());
        let listing: Listing<MenuItem> = self.send_json(builder).await?;
        Ok(listing.into_vec())
    }

    #[instrument(skip(self, patch))]
    async fn update_menu_item(&self, id: u64, patch: &MenuItemPatch) -> Result<MenuItem> {
        debug!(?patch, "update_menu_item called");
        let path = format!("/menu/{}/", id);
        self.send_json(self.request(Method::PATCH, &path).json(patch))
            .await
    }

    #[instrument(skip(self))]
    async fn add_to_cart(&self, line: &CartLineRequest) -> Result<()> {
        self.send_empty(self.request(Method::POST, "/cart/add/").json(line))
            .await
    }

    #[instrument(skip(self, request))]
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
        idempotency_key: &str,
    ) -> Result<Order> {
        debug!(?request, "create_order called");
        let builder = self
            .request(Method::POST, "/orders/create/")
            .header("Idempotency-Key", idempotency_key)
            .json(request);
        let order: Order = self.send_json(builder).await?;
        info!(order_id = order.id, "Order created");
        Ok(order)
    }

    #[instrument(skip(self))]
    async fn orders(&self) -> Result<Vec<Order>> {
        let listing: Listing<Order> = self.send_json(self.request(Method::GET, "/orders/")).await?;
        Ok(listing.into_vec())
    }

    #[instrument(skip(self))]
    async fn update_order_status(&self, id: u64, status: OrderStatus) -> Result<Order> {
        let path = format!("/orders/{}/", id);
        let body = json!({ "status": status.as_str() });
        self.send_json(self.request(Method::PATCH, &path).json(&body))
            .await
    }

    #[instrument(skip(self))]
    async fn order_history(&self) -> Result<Vec<Order>> {
        let listing: Listing<Order> = self
            .send_json(self.request(Method::GET, "/orders/history/"))
            .await?;
        Ok(listing.into_vec())
    }

    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    async fn login(&self, credentials: &Credentials) -> Result<TokenPair> {
        self.send_json(self.request(Method::POST, "/token/").json(credentials))
            .await
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    async fn register(&self, request: &RegisterRequest) -> Result<UserProfile> {
        self.send_json(self.request(Method::POST, "/register/").json(request))
            .await
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let body = json!({ "refresh": refresh_token });
        self.send_json(self.request(Method::POST, "/refresh/").json(&body))
            .await
    }

    #[instrument(skip(self))]
    async fn logout(&self) -> Result<()> {
        self.send_empty(self.request(Method::POST, "/logout/")).await
    }

    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<UserProfile> {
        self.send_json(self.request(Method::GET, "/user/")).await
    }

    #[instrument(skip(self))]
    async fn initiate_payment(&self, request: &PaymentRequest) -> Result<PaymentInitiation> {
        self.send_json(self.request(Method::POST, "/payments/initiate/").json(request))
            .await
    }

    #[instrument(skip(self))]
    async fn verify_payment(&self, reference: &str) -> Result<PaymentVerification> {
        let path = format!("/payments/verify/{}/", reference);
        self.send_json(self.request(Method::GET, &path)).await
    }
}
