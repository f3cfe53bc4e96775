mod manager;

pub use manager::{Cart, CartLine, CartNotice};
