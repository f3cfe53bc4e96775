pub mod auth;
pub mod menu;
pub mod order;
pub mod payment;

pub use auth::{Credentials, RegisterRequest, Role, TokenPair, UserProfile};
pub use menu::{
    page_count, paginate, Category, CategoryRef, Listing, MenuItem, MenuItemPatch, MenuQuery,
};
pub use order::{
    CartLineRequest, CreateOrderRequest, CustomerRef, LineItemRef, Order, OrderDraft,
    OrderItemRequest, OrderLine, OrderStatus, OrderType, PaymentMethod,
};
pub use payment::{PaymentInitiation, PaymentRequest, PaymentVerification};

/// Serde helpers for Django `DecimalField` values.
///
/// The API serializes decimals as strings (`"25.00"`), but hand-written
/// fixtures and some endpoints send plain numbers. Both parse to `f64`.
pub(crate) mod decimal {
    use serde::{Deserialize, Deserializer, de};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    fn parse<E: de::Error>(raw: Raw) -> Result<f64, E> {
        match raw {
            Raw::Number(n) => Ok(n),
            Raw::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid decimal: {:?}", s))),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        parse(Raw::deserialize(deserializer)?)
    }

    pub fn deserialize_option<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        match Option::<Raw>::deserialize(deserializer)? {
            Some(raw) => parse(raw).map(Some),
            None => Ok(None),
        }
    }
}
