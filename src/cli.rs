use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// ChefChain POS: terminal front end for the restaurant ordering API.
#[derive(Parser, Debug)]
#[command(name = "chefchain")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to the session JSON file.
    #[arg(short, long, default_value = "pos_session.json")]
    pub session: PathBuf,

    /// API base URL (overrides CHEFCHAIN_API_URL).
    #[arg(long)]
    pub api_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store the session.
    Login,

    /// Create a new account.
    Register,

    /// Sign out and clear the session.
    Logout,

    /// Show who is signed in.
    Whoami,

    /// Renew the access token.
    Refresh,

    /// Browse the menu.
    Menu {
        /// Only items in this category id.
        #[arg(short, long)]
        category: Option<u64>,

        /// Only items whose name contains this text.
        #[arg(short = 'q', long)]
        search: Option<String>,

        /// Hide unavailable items.
        #[arg(long)]
        available: bool,

        /// Page to show (1-based).
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },

    /// Take an order interactively.
    Order,

    /// Watch the kitchen board.
    Kitchen {
        /// Status filter: all, pending, confirmed, preparing, ready, delivered.
        #[arg(long, default_value = "all")]
        status: String,

        /// Match order id, table number or customer.
        #[arg(short = 'q', long, default_value = "")]
        search: String,

        /// Print the board once instead of polling.
        #[arg(long)]
        once: bool,
    },

    /// Move an order to its next status.
    Advance {
        order_id: u64,
    },

    /// Show past orders.
    History {
        /// Export the history to a CSV file.
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Edit a menu item.
    EditItem {
        id: u64,

        /// Set the price without prompting.
        #[arg(long)]
        price: Option<String>,

        /// Mark the item available.
        #[arg(long, conflicts_with = "unavailable")]
        available: bool,

        /// Mark the item unavailable.
        #[arg(long)]
        unavailable: bool,
    },

    /// Fund the wallet through Paystack.
    Fund {
        #[arg(long)]
        amount: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },

    /// Verify a Paystack payment reference.
    Verify {
        reference: String,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Order
    }
}
