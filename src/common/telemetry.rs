use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins; otherwise info for everything.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
