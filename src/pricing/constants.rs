use std::time::Duration;

/// Tax applied on top of the cart subtotal (8%).
pub const DEFAULT_TAX_RATE: f64 = 0.08;

/// How long the "order placed" confirmation stays visible.
pub const CONFIRMATION_DISPLAY: Duration = Duration::from_secs(3);

/// Placeholder wait for a mobile-money push confirmation.
pub const MOBILE_MONEY_APPROVAL_WAIT: Duration = Duration::from_secs(10);

/// Longest wait for a provider or operator approval callback.
pub const CALLBACK_APPROVAL_TIMEOUT: Duration = Duration::from_secs(120);

/// Kitchen board refresh interval.
pub const KITCHEN_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Menu items shown per page in the ordering view.
pub const ITEMS_PER_PAGE: usize = 6;

/// Paystack amounts are in kobo (1/100 of the major unit).
pub const KOBO_PER_UNIT: f64 = 100.0;

/// Currency symbol used in rendered amounts.
pub const CURRENCY_SYMBOL: &str = "₵";
