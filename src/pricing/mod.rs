pub mod calculations;
pub mod constants;

pub use calculations::{compute_totals, format_amount, round_currency, subtotal, to_kobo, Totals};
pub use constants::*;
