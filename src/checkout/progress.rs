use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::checkout::{ApprovalSender, CheckoutState};

/// Follow a submission's progress until it settles or `done` flips.
///
/// `report` sees every busy state. When `confirm` is given, reaching
/// [`CheckoutState::AwaitingApproval`] runs it on the blocking pool and
/// forwards the answer through the sender. A confirmation that has already
/// started is always seen through, so awaiting the returned handle
/// guarantees no prompt is still reading the terminal.
pub fn watch_progress<R, C>(
    mut states: watch::Receiver<CheckoutState>,
    mut done: watch::Receiver<bool>,
    report: R,
    confirm: Option<(ApprovalSender, C)>,
) -> JoinHandle<()>
where
    R: Fn(&CheckoutState) + Send + 'static,
    C: FnOnce() -> bool + Send + 'static,
{
    let mut confirm = confirm;
    tokio::spawn(async move {
        loop {
            if *done.borrow_and_update() {
                break;
            }
            tokio::select! {
                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = done.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }

            let state = states.borrow_and_update().clone();
            if !state.is_busy() {
                break;
            }
            report(&state);

            if state == CheckoutState::AwaitingApproval {
                if let Some((sender, ask)) = confirm.take() {
                    let approved = tokio::task::spawn_blocking(ask).await.unwrap_or(false);
                    debug!(approved, "Operator answered the approval prompt");
                    let delivered = if approved {
                        sender.approve().await
                    } else {
                        sender.decline("Not approved by customer").await
                    };
                    if !delivered {
                        warn!("Approval answer arrived after checkout stopped waiting");
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;
    use crate::api::mock::MockApi;
    use crate::cart::Cart;
    use crate::checkout::{CallbackApproval, Checkout};
    use crate::models::{MenuItem, OrderDraft, OrderType, PaymentMethod};

    fn no_confirm() -> Option<(ApprovalSender, fn() -> bool)> {
        None
    }

    #[tokio::test]
    async fn test_done_stops_idle_watcher() {
        let (_state_tx, state_rx) = watch::channel(CheckoutState::Idle);
        let (done_tx, done_rx) = watch::channel(false);
        let handle = watch_progress(state_rx, done_rx, |_| {}, no_confirm());

        done_tx.send_replace(true);
        assert!(tokio::time::timeout(Duration::from_secs(1), handle).await.is_ok());
    }

    #[tokio::test]
    async fn test_open_confirmation_outlives_settled_checkout() {
        let (state_tx, state_rx) = watch::channel(CheckoutState::Idle);
        let (done_tx, done_rx) = watch::channel(false);
        let (_approval, sender) = CallbackApproval::new(Duration::from_secs(5));
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<bool>();

        let handle = watch_progress(
            state_rx,
            done_rx,
            move |state: &CheckoutState| {
                let _ = seen_tx.send(state.clone());
            },
            Some((sender, move || release_rx.recv().unwrap_or(false))),
        );

        state_tx.send_replace(CheckoutState::AwaitingApproval);
        assert_eq!(seen_rx.recv().await, Some(CheckoutState::AwaitingApproval));

        state_tx.send_replace(CheckoutState::Failed("Payment approval timed out".to_string()));
        done_tx.send_replace(true);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());

        release_tx.send(false).unwrap();
        assert!(tokio::time::timeout(Duration::from_secs(1), handle).await.is_ok());
        assert!(seen_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_operator_confirmation_completes_mobile_money_order() {
        let api = MockApi::new();
        let (approval, sender) = CallbackApproval::new(Duration::from_secs(5));
        let mut checkout = Checkout::new(api.clone(), approval);
        let mut cart = Cart::new();
        cart.add_item(&MenuItem::new(1, "Jollof", 25.0));
        let mut draft = OrderDraft {
            order_type: OrderType::Takeaway,
            payment_method: PaymentMethod::MobileMoney,
            customer_name: "Ama".to_string(),
            customer_phone: "0241234567".to_string(),
            ..OrderDraft::default()
        };

        let (done_tx, done_rx) = watch::channel(false);
        let progress =
            watch_progress(checkout.subscribe(), done_rx, |_| {}, Some((sender, || true)));

        let order = checkout.submit(&mut cart, &mut draft).await.unwrap();
        done_tx.send_replace(true);
        progress.await.unwrap();

        assert_eq!(order.id, 1);
        assert!(cart.is_empty());
    }
}
