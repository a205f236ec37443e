//! Tracing/logging setup shared by binaries and test servers.

/// Initialize process-wide logging from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber configuration (filters, formats).
pub mod tracing;

pub use self::tracing::{LogFormat, init_with};
