use tracing_subscriber::EnvFilter;

/// Initialize tracing and bridge `log` records into `tracing`.
///
/// Embedders that already run their own subscriber can skip this entirely.
/// Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_log::LogTracer::init();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Worker threads are named after their rank, so keep thread names visible.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_names(true)
        .try_init()
        .ok();
}
