pub mod api;
pub mod cart;
pub mod checkout;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod interface;
pub mod kitchen;
pub mod logging;
pub mod models;
pub mod payments;
pub mod pricing;
pub mod session;

pub use error::{PosError, Result};
pub use models::{MenuItem, Order};
