use crate::cart::CartLine;
use crate::pricing::constants::{CURRENCY_SYMBOL, KOBO_PER_UNIT};

/// Derived cart totals. Never stored; recompute after every mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

impl Totals {
    /// Totals rounded to cents, for display.
    pub fn rounded(&self) -> Totals {
        Totals {
            subtotal: round_currency(self.subtotal),
            tax: round_currency(self.tax),
            total: round_currency(self.total),
        }
    }
}

/// Sum of price × quantity over all lines.
pub fn subtotal(lines: &[CartLine]) -> f64 {
    lines
        .iter()
        .map(|line| line.item.price * line.quantity as f64)
        .sum()
}

/// Compute subtotal, tax and total for the given lines.
///
/// Arithmetic stays in `f64`; rounding is a display concern, see
/// [`Totals::rounded`].
pub fn compute_totals(lines: &[CartLine], tax_rate: f64) -> Totals {
    let subtotal = subtotal(lines);
    let tax = subtotal * tax_rate;
    Totals {
        subtotal,
        tax,
        total: subtotal + tax,
    }
}

/// Round half away from zero to two decimal places.
pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Convert a major-unit amount to kobo.
pub fn to_kobo(amount: f64) -> u64 {
    let kobo = (amount * KOBO_PER_UNIT).round();
    if kobo <= 0.0 { 0 } else { kobo as u64 }
}

/// Format an amount for display, e.g. `₵91.80`.
pub fn format_amount(amount: f64) -> String {
    format!("{}{:.2}", CURRENCY_SYMBOL, round_currency(amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MenuItem;

    fn line(id: u64, price: f64, quantity: u32) -> CartLine {
        CartLine {
            item: MenuItem::new(id, &format!("Item {}", id), price),
            quantity,
        }
    }

    #[test]
    fn test_empty_totals_are_zero() {
        assert_eq!(compute_totals(&[], 0.08), Totals::default());
    }

    #[test]
    fn test_round_currency() {
        assert_eq!(round_currency(6.8000000001), 6.8);
        assert_eq!(round_currency(1.005 + 1e-9), 1.01);
        assert_eq!(round_currency(2.004), 2.0);
    }

    #[test]
    fn test_to_kobo() {
        assert_eq!(to_kobo(91.8), 9180);
        assert_eq!(to_kobo(0.1 + 0.2), 30);
        assert_eq!(to_kobo(-5.0), 0);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(6.8), "₵6.80");
        let totals = compute_totals(&[line(1, 25.0, 2), line(2, 35.0, 1)], 0.08);
        assert_eq!(format_amount(totals.total), "₵91.80");
    }
}
