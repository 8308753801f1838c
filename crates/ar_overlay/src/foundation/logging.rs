//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize logging at a default level; `RUST_LOG` still overrides per module
///
/// Safe to call more than once; later calls are ignored.
pub fn init_with_level(level: log::LevelFilter) {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_harmless() {
        init_with_level(log::LevelFilter::Debug);
        init_with_level(log::LevelFilter::Trace);
        debug!("logging initialized for tests");
        assert!(log::max_level() >= log::LevelFilter::Debug);
    }
}
