use std::env;
use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "info";

/// Filter directives for the portal: `RUST_LOG` verbatim when set, otherwise
/// `PORTAL_LOG_LEVEL` (or `LOG_LEVEL`) applied to this crate with everything
/// else at `warn`, so reqwest and hyper stay quiet.
fn portal_directives(rust_log: Option<String>, level: Option<String>) -> String {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        return directives;
    }
    let level = level
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string());
    format!("warn,school_portal={level}")
}

pub fn init_logging() {
    let filter = EnvFilter::new(portal_directives(
        env::var("RUST_LOG").ok(),
        env::var("PORTAL_LOG_LEVEL")
            .or_else(|_| env::var("LOG_LEVEL"))
            .ok(),
    ));

    // A second init (e.g. from tests) keeps the first subscriber.
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
    if installed.is_err() {
        tracing::debug!("Logging already initialised");
    }
}
