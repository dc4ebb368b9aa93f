use tracing_subscriber::EnvFilter;

/// Filter directives are read from this variable, e.g. `NDB_LOG=ndb_text=debug`.
pub const LOG_ENV: &str = "NDB_LOG";

/// Installs a stderr `tracing` subscriber for the library's log events.
///
/// Returns false when a global subscriber was already installed, by this
/// call or by the host process; that subscriber is then left in place.
#[no_mangle]
pub extern "C" fn ndb_logging_init() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()
        .is_ok()
}
