//! Helper to set the backtrace env var.

use std::sync::Once;

static INIT: Once = Once::new();

/// Sets `RUST_BACKTRACE` to `1` unless a value was provided explicitly.
///
/// Must be called before the runtime spawns any thread.
pub fn enable() {
    INIT.call_once(|| {
        if std::env::var_os("RUST_BACKTRACE").is_none() {
            // SAFETY: called once, before any other thread reads the environment.
            unsafe { std::env::set_var("RUST_BACKTRACE", "1") };
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backtrace_enable_is_idempotent() {
        enable();
        enable();
        assert!(std::env::var_os("RUST_BACKTRACE").is_some());
    }
}
