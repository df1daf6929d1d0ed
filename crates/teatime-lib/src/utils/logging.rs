//! Process-wide `tracing` subscriber setup.
//!
//! Output goes to stderr so stdout stays reserved for command output and the
//! MCP stdio transport. The filter comes from `TEATIME_LOG` (default `info`).

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "TEATIME_LOG";

static INIT: OnceCell<()> = OnceCell::new();

/// Install the stderr subscriber once; later calls are no-ops.
///
/// If the host process already installed a global subscriber, that one is kept.
pub fn init() {
    init_with_default("info");
}

/// Same as [`init`] with a caller-chosen fallback filter.
pub fn init_with_default(default_filter: &str) {
    INIT.get_or_init(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init();
    });
}
