use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "p1_poller=info,p1_client=info";

/// `RUST_LOG` when it is set and valid, otherwise `info` for both crates.
fn env_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Log to stdout without targets.
pub fn init_tracing() {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(rust_log.as_deref()))
        .with_target(false)
        .init();
}
