mod approval;
mod machine;
mod progress;

pub use approval::{
    ApprovalOutcome, ApprovalSender, CallbackApproval, PaymentApproval, TimedApproval,
};
pub use machine::{validate, Checkout, CheckoutState};
pub use progress::watch_progress;
