use tracing_subscriber::fmt;

/// Installs a compact subscriber for the engine's pipeline traces.
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let _ = fmt()
        .compact()
        .with_target(false)
        .with_level(true)
        .try_init();
}
