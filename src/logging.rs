//=========================================================================
// Logging
//=========================================================================
//
// Installs the `env_logger` backend behind the `log` facade.
//
// Library code only ever talks to `log`; the binary calls
// `init_logging` once, early in `main`.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::sync::Once;

//=== LoggingConfig =======================================================

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. `"info"`,
/// `"breakout=debug,winit=warn"`). When unset, `RUST_LOG` is used, then
/// `info`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    fn builder(&self) -> env_logger::Builder {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = &self.env_filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }

        builder.write_style(self.write_style);
        builder
    }
}

//=== init_logging ========================================================

static INIT: Once = Once::new();

/// Initializes the global logger once; later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        if config.builder().try_init().is_err() {
            // Someone else installed a logger first.
            return;
        }
        log::debug!("logging initialized");
    });
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_filter() {
        let config = LoggingConfig::default();
        assert!(config.env_filter.is_none());
    }

    #[test]
    fn with_filter_sets_filter() {
        let config = LoggingConfig::default().with_filter("breakout=debug");
        assert_eq!(config.env_filter.as_deref(), Some("breakout=debug"));
    }

    #[test]
    fn init_is_idempotent() {
        init_logging(LoggingConfig::default().with_filter("warn"));
        init_logging(LoggingConfig::default().with_filter("trace"));
        assert!(log::max_level() <= log::LevelFilter::Warn);
    }
}
