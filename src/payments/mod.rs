mod paystack;

pub use paystack::{
    check_initiation, fund_wallet, generate_reference, is_valid_email, validate_funding,
    verify_payment,
};
