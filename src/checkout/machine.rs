use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::api::PosApi;
use crate::cart::Cart;
use crate::checkout::approval::{ApprovalOutcome, PaymentApproval};
use crate::config::CartSyncMode;
use crate::error::{ORDER_FAILED_FALLBACK, PosError, Result};
use crate::models::{CartLineRequest, CreateOrderRequest, Order, OrderDraft, OrderType, PaymentMethod};
use crate::payments::generate_reference;
use crate::pricing::{CONFIRMATION_DISPLAY, DEFAULT_TAX_RATE};

/// Where a submission currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutState {
    Idle,
    Validating,
    /// Mobile money only: waiting for the customer to approve the push.
    AwaitingApproval,
    SubmittingCartSync { synced: usize, total: usize },
    SubmittingOrder,
    Success(Order),
    Failed(String),
}

impl CheckoutState {
    /// True while a submission is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            CheckoutState::Validating
                | CheckoutState::AwaitingApproval
                | CheckoutState::SubmittingCartSync { .. }
                | CheckoutState::SubmittingOrder
        )
    }

    pub fn label(&self) -> String {
        match self {
            CheckoutState::Idle => "Ready".to_string(),
            CheckoutState::Validating => "Checking order...".to_string(),
            CheckoutState::AwaitingApproval => {
                "Waiting for customer to approve mobile money payment...".to_string()
            }
            CheckoutState::SubmittingCartSync { synced, total } => {
                format!("Sending items to kitchen ({}/{})...", synced, total)
            }
            CheckoutState::SubmittingOrder => "Placing order...".to_string(),
            CheckoutState::Success(order) => format!("Order #{} placed successfully!", order.id),
            CheckoutState::Failed(message) => message.clone(),
        }
    }
}

/// Client-side checks run before anything touches the network.
pub fn validate(cart: &Cart, draft: &OrderDraft) -> Result<()> {
    if cart.is_empty() {
        return Err(PosError::Validation("Your cart is empty!".to_string()));
    }
    if draft.order_type == OrderType::DineIn && draft.table_number.trim().is_empty() {
        return Err(PosError::Validation(
            "Please enter a table number for dine-in orders".to_string(),
        ));
    }
    if draft.payment_method == PaymentMethod::MobileMoney {
        if draft.customer_name.trim().is_empty() {
            return Err(PosError::Validation(
                "Please enter customer name".to_string(),
            ));
        }
        if draft.customer_phone.trim().is_empty() {
            return Err(PosError::Validation(
                "Please enter customer phone number".to_string(),
            ));
        }
    }
    Ok(())
}

/// Banner text for a failed create-order call.
fn order_failure_message(err: &PosError) -> String {
    match err {
        PosError::Http { message, .. } if message.is_empty() => ORDER_FAILED_FALLBACK.to_string(),
        PosError::Network(_) | PosError::Json(_) => ORDER_FAILED_FALLBACK.to_string(),
        other => other.user_message(),
    }
}

/// What was sent on the last unsuccessful attempt, so a retry of the same
/// order reuses its idempotency key.
#[derive(Debug, Clone, PartialEq)]
struct Attempt {
    lines: Vec<CartLineRequest>,
    request: CreateOrderRequest,
    key: String,
}

/// Order submission state machine.
///
/// `idle → validating → [awaitingApproval] → submittingCartSync →
/// submittingOrder → success | failed`. In batched mode the cart-sync step
/// is folded into the create-order request. No automatic retry.
pub struct Checkout<A, P> {
    api: A,
    approval: P,
    tax_rate: f64,
    sync_mode: CartSyncMode,
    confirmation_display: Duration,
    state: watch::Sender<CheckoutState>,
    transitions: Vec<CheckoutState>,
    confirmed_at: Option<Instant>,
    last_attempt: Option<Attempt>,
}

impl<A: PosApi, P: PaymentApproval> Checkout<A, P> {
    pub fn new(api: A, approval: P) -> Self {
        let (state, _) = watch::channel(CheckoutState::Idle);
        Self {
            api,
            approval,
            tax_rate: DEFAULT_TAX_RATE,
            sync_mode: CartSyncMode::default(),
            confirmation_display: CONFIRMATION_DISPLAY,
            state,
            transitions: Vec::new(),
            confirmed_at: None,
            last_attempt: None,
        }
    }

    pub fn with_tax_rate(mut self, tax_rate: f64) -> Self {
        self.tax_rate = tax_rate;
        self
    }

    pub fn with_sync_mode(mut self, mode: CartSyncMode) -> Self {
        self.sync_mode = mode;
        self
    }

    pub fn with_confirmation_display(mut self, display: Duration) -> Self {
        self.confirmation_display = display;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn tax_rate(&self) -> f64 {
        self.tax_rate
    }

    /// Current state. A success older than the confirmation window reads
    /// as idle.
    pub fn state(&mut self) -> CheckoutState {
        self.expire_confirmation();
        self.state.borrow().clone()
    }

    /// Watch state changes, e.g. to drive a progress spinner.
    pub fn subscribe(&self) -> watch::Receiver<CheckoutState> {
        self.state.subscribe()
    }

    /// Every state the last submission passed through, in order.
    pub fn transitions(&self) -> &[CheckoutState] {
        &self.transitions
    }

    fn set_state(&mut self, next: CheckoutState) {
        debug!(state = ?next, "Checkout transition");
        self.transitions.push(next.clone());
        self.state.send_replace(next);
    }

    fn fail(&mut self, message: String) {
        warn!(%message, "Checkout failed");
        self.set_state(CheckoutState::Failed(message));
    }

    /// Revert a visible success to idle once its display window has passed.
    pub fn expire_confirmation(&mut self) {
        if let Some(at) = self.confirmed_at {
            if at.elapsed() >= self.confirmation_display {
                self.confirmed_at = None;
                self.state.send_replace(CheckoutState::Idle);
            }
        }
    }

    /// Keep the confirmation up for its full window, then revert to idle.
    pub async fn hold_confirmation(&mut self) {
        if let Some(at) = self.confirmed_at {
            tokio::time::sleep_until(at + self.confirmation_display).await;
        }
        self.expire_confirmation();
    }

    /// Dismiss an error banner.
    pub fn dismiss_error(&mut self) {
        if matches!(*self.state.borrow(), CheckoutState::Failed(_)) {
            self.state.send_replace(CheckoutState::Idle);
        }
    }

    /// Submit the cart as an order.
    ///
    /// On success the cart and table number are cleared. On failure both
    /// are left intact so the operator can fix the problem and resubmit.
    #[instrument(skip_all, fields(order_type = ?draft.order_type, payment = ?draft.payment_method))]
    pub async fn submit(&mut self, cart: &mut Cart, draft: &mut OrderDraft) -> Result<Order> {
        self.expire_confirmation();
        // `&mut self` rules out a concurrent submit, so a busy state here
        // belongs to an attempt whose future was dropped.
        if self.state.borrow().is_busy() {
            warn!("Previous submission was abandoned, resetting");
            self.state.send_replace(CheckoutState::Idle);
        }

        self.transitions.clear();
        self.confirmed_at = None;
        self.set_state(CheckoutState::Validating);
        if let Err(err) = validate(cart, draft) {
            self.fail(err.user_message());
            return Err(err);
        }

        if draft.payment_method == PaymentMethod::MobileMoney {
            self.set_state(CheckoutState::AwaitingApproval);
            let amount = cart.totals(self.tax_rate).total;
            match self.approval.await_approval(draft, amount).await {
                Ok(ApprovalOutcome::Approved) => info!("Mobile money payment approved"),
                Ok(ApprovalOutcome::Declined(reason)) => {
                    let err = PosError::Validation(format!(
                        "Mobile money payment declined: {}",
                        reason
                    ));
                    self.fail(err.user_message());
                    return Err(err);
                }
                Err(err) => {
                    self.fail(err.user_message());
                    return Err(err);
                }
            }
        }

        let order_items = match self.sync_mode {
            CartSyncMode::Sequential => {
                self.sync_cart(cart).await?;
                None
            }
            CartSyncMode::Batched => Some(cart.order_items()),
        };

        self.set_state(CheckoutState::SubmittingOrder);
        let request = CreateOrderRequest::from_draft(draft, order_items);
        let key = self.idempotency_key(cart, &request);

        match self.api.create_order(&request, &key).await {
            Ok(order) => {
                info!(order_id = order.id, "Order placed");
                cart.clear();
                draft.table_number.clear();
                self.last_attempt = None;
                self.confirmed_at = Some(Instant::now());
                self.set_state(CheckoutState::Success(order.clone()));
                Ok(order)
            }
            Err(err) => {
                self.fail(order_failure_message(&err));
                Err(err)
            }
        }
    }

    /// Push every cart line to the server cart, one request at a time.
    /// The first failure aborts the rest.
    async fn sync_cart(&mut self, cart: &Cart) -> Result<()> {
        let lines = cart.sync_requests();
        let total = lines.len();

        for (synced, line) in lines.iter().enumerate() {
            self.set_state(CheckoutState::SubmittingCartSync { synced, total });
            debug!(item = line.item, quantity = line.quantity, "Adding item to cart");
            if let Err(err) = self.api.add_to_cart(line).await {
                self.fail(err.user_message());
                return Err(err);
            }
        }
        Ok(())
    }

    /// Reuse the key of an identical failed attempt, otherwise mint one.
    fn idempotency_key(&mut self, cart: &Cart, request: &CreateOrderRequest) -> String {
        let lines = cart.sync_requests();
        if let Some(attempt) = &self.last_attempt {
            if attempt.lines == lines && attempt.request == *request {
                return attempt.key.clone();
            }
        }
        let key = generate_reference("checkout");
        self.last_attempt = Some(Attempt {
            lines,
            request: request.clone(),
            key: key.clone(),
        });
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApi;
    use crate::checkout::TimedApproval;
    use crate::models::MenuItem;

    fn checkout(api: MockApi) -> Checkout<MockApi, TimedApproval> {
        Checkout::new(api, TimedApproval::new(Duration::from_secs(10)))
    }

    fn filled_cart() -> Cart {
        let mut cart = Cart::new();
        cart.add_item(&MenuItem::new(1, "Jollof", 25.0));
        cart
    }

    #[test]
    fn test_validation_messages() {
        let mut draft = OrderDraft::default();
        let empty = Cart::new();
        assert_eq!(
            validate(&empty, &draft).unwrap_err().user_message(),
            "Your cart is empty!"
        );

        let cart = filled_cart();
        assert_eq!(
            validate(&cart, &draft).unwrap_err().user_message(),
            "Please enter a table number for dine-in orders"
        );

        draft.order_type = OrderType::Takeaway;
        assert!(validate(&cart, &draft).is_ok());

        draft.payment_method = PaymentMethod::MobileMoney;
        assert_eq!(
            validate(&cart, &draft).unwrap_err().user_message(),
            "Please enter customer name"
        );
        draft.customer_name = "Kwame".to_string();
        assert_eq!(
            validate(&cart, &draft).unwrap_err().user_message(),
            "Please enter customer phone number"
        );
        draft.customer_phone = "0240000000".to_string();
        assert!(validate(&cart, &draft).is_ok());
    }

    #[test]
    fn test_failure_message_fallback() {
        let bare = PosError::Http {
            status: 500,
            message: String::new(),
        };
        assert_eq!(order_failure_message(&bare), ORDER_FAILED_FALLBACK);

        let detailed = PosError::Http {
            status: 400,
            message: "Table 4 is closed".to_string(),
        };
        assert_eq!(order_failure_message(&detailed), "Table 4 is closed");
    }

    #[tokio::test]
    async fn test_retry_reuses_idempotency_key() {
        let api = MockApi::new();
        api.fail_create_order(502, "");
        let mut checkout = checkout(api.clone());
        let mut cart = filled_cart();
        let mut draft = OrderDraft {
            order_type: OrderType::Takeaway,
            ..OrderDraft::default()
        };

        assert!(checkout.submit(&mut cart, &mut draft).await.is_err());
        assert_eq!(
            checkout.state(),
            CheckoutState::Failed(ORDER_FAILED_FALLBACK.to_string())
        );

        api.clear_failures();
        checkout.submit(&mut cart, &mut draft).await.unwrap();

        let keys: Vec<String> = api
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                crate::api::mock::ApiCall::CreateOrder { idempotency_key, .. } => {
                    Some(idempotency_key)
                }
                _ => None,
            })
            .collect();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], keys[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_submit_does_not_block_next() {
        let api = MockApi::new();
        let mut checkout = checkout(api.clone());
        let mut cart = filled_cart();
        let mut draft = OrderDraft {
            order_type: OrderType::Takeaway,
            payment_method: PaymentMethod::MobileMoney,
            customer_name: "Ama".to_string(),
            customer_phone: "0241234567".to_string(),
            ..OrderDraft::default()
        };

        let abandoned =
            tokio::time::timeout(Duration::from_secs(1), checkout.submit(&mut cart, &mut draft))
                .await;
        assert!(abandoned.is_err());
        assert_eq!(checkout.state(), CheckoutState::AwaitingApproval);

        draft.payment_method = PaymentMethod::Cash;
        let order = checkout.submit(&mut cart, &mut draft).await.unwrap();
        assert_eq!(order.id, 1);
        assert!(matches!(checkout.state(), CheckoutState::Success(_)));
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_dismiss_error() {
        let mut checkout = checkout(MockApi::new());
        let mut cart = Cart::new();
        let mut draft = OrderDraft::default();

        assert!(checkout.submit(&mut cart, &mut draft).await.is_err());
        assert!(matches!(checkout.state(), CheckoutState::Failed(_)));

        checkout.dismiss_error();
        assert_eq!(checkout.state(), CheckoutState::Idle);
    }
}
