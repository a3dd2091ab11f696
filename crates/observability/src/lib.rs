//! Process-wide logging setup, shared by the API binary and any tooling
//! built on the workspace crates.

use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is unset. Query logging from sqlx is
/// noisy at info level, so it is capped at warnings.
const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// Install the global tracing subscriber.
///
/// Logs are JSON lines on stdout, filtered via `RUST_LOG`. Set
/// `LOG_FORMAT=pretty` for human-readable output during development.
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let pretty = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("pretty"));
    if pretty {
        let _ = builder.try_init();
    } else {
        let _ = builder.json().try_init();
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_is_idempotent() {
        super::init();
        super::init();
    }
}
