use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over `--verbose`; the
/// default only shows warnings so report output stays clean. Logs go to
/// stderr to keep stdout for reports and the dashboard.
pub fn init(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();
}
