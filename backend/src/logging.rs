//! Logging setup
//!
//! Installs a `tracing` fmt subscriber writing to stderr. Records emitted
//! through the `log` facade (the `catmap` core and the repository) are
//! forwarded to it as well.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialise logging once. `RUST_LOG` overrides `verbosity` when set.
///
/// 0 = info, 1 = debug, anything higher = trace.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let result = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    if let Err(e) = result {
        eprintln!("logging already initialised: {}", e);
    }
}
