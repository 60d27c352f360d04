//! Logging setup shared by the blobfs crates
//!
//! Verbosity comes from the `BLOBFS_LOG` environment variable:
//! - `off` (default) - nothing is emitted
//! - `error`, `warn`, `info`, `debug` - minimum level written to stderr
//!
//! Library code logs through the macros below so that every crate goes
//! through the same `emit` runtime.

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable consulted by [`init_diagnostics`].
pub const LOG_ENV_VAR: &str = "BLOBFS_LOG";

static INIT: Once = Once::new();

/// Verbosity requested through `BLOBFS_LOG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Off,
    AtLeast(emit::Level),
}

/// Parse a `BLOBFS_LOG` value. Returns `None` for unrecognised values.
pub fn parse_verbosity(value: &str) -> Option<Verbosity> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "off" => Some(Verbosity::Off),
        "error" => Some(Verbosity::AtLeast(emit::Level::Error)),
        "warn" => Some(Verbosity::AtLeast(emit::Level::Warn)),
        "info" => Some(Verbosity::AtLeast(emit::Level::Info)),
        "debug" => Some(Verbosity::AtLeast(emit::Level::Debug)),
        _ => None,
    }
}

/// Initialize diagnostics from the `BLOBFS_LOG` environment variable.
///
/// Safe to call any number of times; only the first call has an effect.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let value = std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| "off".to_string());

        let level = match parse_verbosity(&value) {
            Some(Verbosity::Off) => return,
            Some(Verbosity::AtLeast(level)) => level,
            None => {
                // The emitter is not installed yet, so this has to go to stderr directly
                eprintln!("Warning: Unknown {LOG_ENV_VAR} value '{value}', using 'info'");
                emit::Level::Info
            }
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        // The runtime lives for the rest of the process
        std::mem::forget(rt);
    });
}

/// Log basic operations (connector lifecycle, configuration loading).
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log detailed diagnostics (cache hits and misses, backend calls, byte counts).
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log recoverable conditions, e.g. use of a closed connector.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log failures that abort an operation.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

/// Short form of [`log_info!`].
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Short form of [`log_debug!`].
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Short form of [`log_warn!`].
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Short form of [`log_error!`].
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

pub use init_diagnostics as init;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_safe_to_call_multiple_times() {
        init_diagnostics();
        init_diagnostics();
        init();
    }

    #[test]
    fn test_parse_verbosity() {
        assert_eq!(parse_verbosity("off"), Some(Verbosity::Off));
        assert_eq!(parse_verbosity(""), Some(Verbosity::Off));
        assert_eq!(
            parse_verbosity("DEBUG"),
            Some(Verbosity::AtLeast(emit::Level::Debug))
        );
        assert_eq!(
            parse_verbosity(" warn "),
            Some(Verbosity::AtLeast(emit::Level::Warn))
        );
        assert_eq!(parse_verbosity("trace"), None);
    }

    #[test]
    fn test_macros_compile() {
        log_info!("Connector opened");
        log_debug!("Listed {count} blobs", count: 3);
        log_warn!("Closed connector used");
        log_error!("Backend failed");

        info!("Connector opened");
        debug!("Cache hit for {name}", name: "bucket/a");
        warn!("Closed connector used");
        error!("Backend failed");
    }
}
