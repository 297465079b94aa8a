use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "huddle_client=debug,huddle=debug,huddle_store=info,huddle_shared=info,warn";

/// Install the global `tracing` subscriber. Honours `RUST_LOG`.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
