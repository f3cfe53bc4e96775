use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use crate::error::Result;
use crate::models::OrderDraft;
use crate::pricing::MOBILE_MONEY_APPROVAL_WAIT;

/// The customer's answer to a mobile-money push request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    Approved,
    Declined(String),
}

/// Source of mobile-money approvals.
#[async_trait]
pub trait PaymentApproval: Send + Sync {
    /// Wait until the payment for `amount` is approved or declined.
    async fn await_approval(&self, draft: &OrderDraft, amount: f64) -> Result<ApprovalOutcome>;
}

/// Fixed-delay placeholder: waits, then approves. No provider feedback.
#[derive(Debug, Clone)]
pub struct TimedApproval {
    wait: Duration,
}

impl TimedApproval {
    pub fn new(wait: Duration) -> Self {
        Self { wait }
    }
}

impl Default for TimedApproval {
    fn default() -> Self {
        Self::new(MOBILE_MONEY_APPROVAL_WAIT)
    }
}

#[async_trait]
impl PaymentApproval for TimedApproval {
    async fn await_approval(&self, draft: &OrderDraft, amount: f64) -> Result<ApprovalOutcome> {
        info!(
            phone = %draft.customer_phone,
            amount,
            wait_secs = self.wait.as_secs(),
            "Waiting for mobile money confirmation"
        );
        tokio::time::sleep(self.wait).await;
        Ok(ApprovalOutcome::Approved)
    }
}

/// Approval driven by an external callback (payment provider webhook or an
/// operator confirming on the terminal) delivered through [`ApprovalSender`].
#[derive(Debug)]
pub struct CallbackApproval {
    receiver: Mutex<mpsc::Receiver<ApprovalOutcome>>,
    timeout: Duration,
}

/// Delivers the provider's decision to a waiting [`CallbackApproval`].
#[derive(Debug, Clone)]
pub struct ApprovalSender {
    sender: mpsc::Sender<ApprovalOutcome>,
}

impl ApprovalSender {
    pub async fn approve(&self) -> bool {
        self.sender.send(ApprovalOutcome::Approved).await.is_ok()
    }

    pub async fn decline(&self, reason: &str) -> bool {
        self.sender
            .send(ApprovalOutcome::Declined(reason.to_string()))
            .await
            .is_ok()
    }
}

impl CallbackApproval {
    pub fn new(timeout: Duration) -> (Self, ApprovalSender) {
        let (sender, receiver) = mpsc::channel(4);
        (
            Self {
                receiver: Mutex::new(receiver),
                timeout,
            },
            ApprovalSender { sender },
        )
    }
}

#[async_trait]
impl PaymentApproval for CallbackApproval {
    async fn await_approval(&self, draft: &OrderDraft, amount: f64) -> Result<ApprovalOutcome> {
        let mut receiver = self.receiver.lock().await;

        // Decisions left over from an abandoned attempt do not apply here.
        while receiver.try_recv().is_ok() {}

        info!(phone = %draft.customer_phone, amount, "Awaiting payment provider callback");
        match tokio::time::timeout(self.timeout, receiver.recv()).await {
            Ok(Some(outcome)) => Ok(outcome),
            Ok(None) => {
                warn!("Approval channel closed before a decision arrived");
                Ok(ApprovalOutcome::Declined(
                    "Payment confirmation was cancelled".to_string(),
                ))
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "Mobile money approval timed out");
                Ok(ApprovalOutcome::Declined(
                    "Payment approval timed out".to_string(),
                ))
            }
        }
    }
}
