use tracing_subscriber::{EnvFilter, fmt};

/// Initialize logging with a default filter.
///
/// Use the `RUST_LOG` environment variable to override the default, which
/// shows harness steps at `info` and only warnings from the execution layer.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,puzzlepool_harness=info,puzzlepool_chain=warn")
    });

    fmt().with_env_filter(filter).with_target(false).init();
}
