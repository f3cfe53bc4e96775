use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use tracing::{info, instrument};

use crate::api::PosApi;
use crate::error::{PosError, Result};
use crate::models::{PaymentInitiation, PaymentRequest, PaymentVerification};

/// A unique-enough transaction reference: `<prefix>_<unix millis>_<0..999>`.
pub fn generate_reference(prefix: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let suffix: u32 = rand::thread_rng().gen_range(0..1000);
    format!("{}_{}_{}", prefix, millis, suffix)
}

/// Whole-string match of `\S+@\S+\.\S+`.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    email.match_indices('@').any(|(at, _)| {
        let domain = &email[at + 1..];
        at > 0
            && domain
                .match_indices('.')
                .any(|(dot, _)| dot > 0 && dot + 1 < domain.len())
    })
}

/// Validate the wallet-funding form.
pub fn validate_funding(amount: &str, email: &str) -> Result<PaymentRequest> {
    let (amount, email) = (amount.trim(), email.trim());
    if amount.is_empty() || email.is_empty() {
        return Err(PosError::Validation(
            "Please enter both amount and email".to_string(),
        ));
    }

    let amount: f64 = amount
        .parse()
        .map_err(|_| PosError::InvalidInput(format!("'{}' is not an amount", amount)))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(PosError::Validation(
            "Amount must be greater than 0".to_string(),
        ));
    }
    if !is_valid_email(email) {
        return Err(PosError::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }

    Ok(PaymentRequest {
        amount,
        email: email.to_string(),
    })
}

/// Reject server answers the Paystack checkout cannot be opened with.
pub fn check_initiation(initiation: &PaymentInitiation) -> Result<()> {
    if let Some(key) = &initiation.paystack_pub_key {
        if !key.starts_with("pk_") {
            return Err(PosError::Unknown(
                "Invalid Paystack public key".to_string(),
            ));
        }
    }
    if initiation.amount_value == Some(0) {
        return Err(PosError::Validation("Invalid amount".to_string()));
    }
    if initiation.reference.trim().is_empty() {
        return Err(PosError::Unknown(
            "Payment reference missing from server response".to_string(),
        ));
    }
    Ok(())
}

/// Start a wallet top-up and return the transaction to complete in Paystack.
#[instrument(skip(api))]
pub async fn fund_wallet<A: PosApi + ?Sized>(
    api: &A,
    amount: &str,
    email: &str,
) -> Result<PaymentInitiation> {
    let request = validate_funding(amount, email)?;
    let initiation = api.initiate_payment(&request).await?;
    check_initiation(&initiation)?;
    info!(reference = %initiation.reference, "Payment initiated");
    Ok(initiation)
}

#[instrument(skip(api))]
pub async fn verify_payment<A: PosApi + ?Sized>(
    api: &A,
    reference: &str,
) -> Result<PaymentVerification> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(PosError::Validation(
            "Payment reference is required".to_string(),
        ));
    }
    let verification = api.verify_payment(reference).await?;
    info!(reference, status = ?verification.status, "Payment verified");
    Ok(verification)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_shape() {
        let reference = generate_reference("order");
        let parts: Vec<&str> = reference.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "order");
        assert!(parts[1].parse::<u128>().is_ok());
        assert!(parts[2].parse::<u32>().unwrap() < 1000);
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("ama@chefchain.com"));
        assert!(!is_valid_email("ama@chefchain"));
        assert!(!is_valid_email("@chefchain.com"));
        assert!(!is_valid_email("ama chef@chefchain.com"));
        assert!(!is_valid_email("ama@.com"));
    }

    #[test]
    fn test_email_trailing_and_repeated_separators() {
        assert!(is_valid_email("a@b.c."));
        assert!(is_valid_email("a@b..c"));
        assert!(is_valid_email("a@b@c.d"));
        assert!(!is_valid_email("a@.c"));
        assert!(!is_valid_email("a@b."));
        assert!(!is_valid_email("a b@c.d"));
    }

    #[test]
    fn test_validate_funding() {
        assert!(matches!(
            validate_funding("", "ama@chefchain.com"),
            Err(PosError::Validation(msg)) if msg == "Please enter both amount and email"
        ));
        assert!(matches!(
            validate_funding("0", "ama@chefchain.com"),
            Err(PosError::Validation(msg)) if msg == "Amount must be greater than 0"
        ));
        assert!(matches!(
            validate_funding("ten", "ama@chefchain.com"),
            Err(PosError::InvalidInput(_))
        ));

        let request = validate_funding(" 50.5 ", " ama@chefchain.com ").unwrap();
        assert!((request.amount - 50.5).abs() < 1e-9);
        assert_eq!(request.email, "ama@chefchain.com");
    }

    #[test]
    fn test_check_initiation() {
        let mut initiation = PaymentInitiation {
            reference: "order_1_2".to_string(),
            authorization_url: None,
            paystack_pub_key: Some("pk_test_123".to_string()),
            email: None,
            amount_value: Some(5000),
        };
        assert!(check_initiation(&initiation).is_ok());

        initiation.paystack_pub_key = Some("sk_live_oops".to_string());
        assert!(check_initiation(&initiation).is_err());
    }
}
