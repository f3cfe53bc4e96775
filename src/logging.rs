//! Structured logging for the terminal client.
//!
//! Filtering follows `RUST_LOG` and defaults to `warn`, so interactive
//! prompts are not interleaved with request chatter. Everything goes to
//! stderr.
//!
//! ```bash
//! RUST_LOG=info chefchain order
//! RUST_LOG=chefchain_pos::checkout=debug chefchain order
//! ```

use tracing_subscriber::EnvFilter;

pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
