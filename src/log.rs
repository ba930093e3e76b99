//! Log output for the `navdb` binary

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const VERBOSE_DIRECTIVES: &str = "navdb=debug,sqlx=warn";

/// A valid `RUST_LOG` wins over the verbosity flag. Quiet runs log nothing,
/// leaving stderr to the spinner.
fn filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if let Some(filter) = rust_log.and_then(|directives| EnvFilter::try_new(directives).ok()) {
        return filter;
    }
    if verbose {
        EnvFilter::new(VERBOSE_DIRECTIVES)
    } else {
        EnvFilter::new("off")
    }
}

/// Installs the global subscriber, writing one compact line per event to stderr.
pub fn init_logging(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .without_time()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter(verbose, rust_log.as_deref()))
        .init();
}
