//! Log subscriber setup.
//!
//! `RUST_LOG` wins, then `EDGEBENCH_LOG`, then the `-v` count. Logs go to
//! stderr so stdout stays the report.

use tracing_subscriber::EnvFilter;

/// Default level for a `-v` count.
pub fn level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber. Calling twice is harmless.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("EDGEBENCH_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(level(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        assert_eq!(level(0), "warn");
        assert_eq!(level(2), "debug");
        assert_eq!(level(9), "trace");
    }

    #[test]
    fn test_init_twice() {
        init(1);
        init(3);
    }
}
