//! Kitchen board: order listing, filtering, status workflow and polling.

mod board;
mod poller;

pub use board::{advance_order, matches_search, time_since, KitchenBoard, StatusFilter};
pub use poller::{KitchenPoller, PollEvent};
