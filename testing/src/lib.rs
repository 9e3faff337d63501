pub use insta::{assert_snapshot, with_settings};
use tracing::Level;

/// Installs a TRACE-level subscriber once per test binary; repeated calls
/// are no-ops.
pub fn logging() {
    use std::sync::Once;

    static ONCE: Once = Once::new();

    ONCE.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_test_writer()
            .init();
    });
}
