use serde::{Deserialize, Serialize};

/// Payload for `POST /payments/initiate/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRequest {
    pub amount: f64,
    pub email: String,
}

/// Server-prepared Paystack transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInitiation {
    pub reference: String,
    #[serde(default)]
    pub authorization_url: Option<String>,
    #[serde(default)]
    pub paystack_pub_key: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Amount in kobo.
    #[serde(default)]
    pub amount_value: Option<u64>,
}

/// Result of `GET /payments/verify/<ref>/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentVerification {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "super::decimal::deserialize_option")]
    pub balance: Option<f64>,
    #[serde(default)]
    pub order_id: Option<u64>,
}
