//! Logging setup shared by binaries, benches and integration tests.

/// Subscriber construction (filters, output format).
pub mod subscriber;

pub use subscriber::{LogFormat, init_with};

/// Initialize process-wide structured logging with the default settings:
/// JSON lines, filter from `RUST_LOG` falling back to `info`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    init_with(LogFormat::Json, "info");
}
