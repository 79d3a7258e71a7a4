//! Tracing initialisation for the `forge` binary.
//!
//! Only the first call to [`init_tracing`] installs a subscriber; later
//! calls are ignored.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "FORGE_LOG";

/// Install the global subscriber.
///
/// `FORGE_LOG` (then `RUST_LOG`) takes precedence over `level`. With `json`
/// set, every line is a JSON object. Logs go to stderr so stdout stays free
/// for the outcome document.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .json(),
            )
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}
