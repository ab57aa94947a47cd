use tracing_subscriber::EnvFilter;

pub const SERVICE_NAME: &str = "vice-file-transfers";
pub const SERVICE_GROUP: &str = "org.cyverse";

const DEFAULT_DIRECTIVES: &str = "info,actix_server=warn,actix_web=warn";

/// Installs the global fmt subscriber. `RUST_LOG` overrides the default
/// filter. Calling it twice is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Root span carrying the service identity. Startup runs inside one, and the
/// transfer engine keeps its own for request handling and jobs, which run on
/// the HTTP worker threads.
pub fn service_span(invocation_id: &str) -> tracing::Span {
    tracing::info_span!(
        parent: None,
        "service",
        service = SERVICE_NAME,
        art_id = SERVICE_NAME,
        group = SERVICE_GROUP,
        invocation_id = %invocation_id,
    )
}
