//! Tracing subscriber setup.

use serde::Deserialize;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Log levels for helmsman code and everything else.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Level for `helmsman*` crates and request tracing.
    #[serde(default = "default_app_log_level")]
    pub app_log_level: String,

    /// Level for every other crate.
    #[serde(default = "default_library_log_level")]
    pub library_log_level: String,
}

fn default_app_log_level() -> String {
    "info".to_string()
}

fn default_library_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_log_level: default_app_log_level(),
            library_log_level: default_library_log_level(),
        }
    }
}

impl LoggingConfig {
    /// Filter directives equivalent to this configuration.
    #[must_use]
    pub fn directives(&self) -> String {
        let app = &self.app_log_level;
        format!(
            "{},helmsman={app},tower_http={app}",
            self.library_log_level
        )
    }

    /// Builds the filter. `RUST_LOG` replaces the configured levels when set.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured level is not a valid directive.
    pub fn filter(&self) -> Result<EnvFilter, ParseError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(self.directives()),
        }
    }
}

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if a configured level is invalid.
pub fn init(config: &LoggingConfig) -> Result<(), ParseError> {
    tracing_subscriber::registry()
        .with(config.filter()?)
        .with(tracing_subscriber::fmt::layer())
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives() {
        assert_eq!(
            LoggingConfig::default().directives(),
            "warn,helmsman=info,tower_http=info"
        );
    }

    #[test]
    fn configured_levels_parse() {
        let config = LoggingConfig {
            app_log_level: "debug".to_string(),
            library_log_level: "error".to_string(),
        };
        assert!(EnvFilter::try_new(config.directives()).is_ok());
    }

    #[test]
    fn invalid_level_is_rejected() {
        let config = LoggingConfig {
            app_log_level: "loud".to_string(),
            library_log_level: "warn".to_string(),
        };
        assert!(EnvFilter::try_new(config.directives()).is_err());
    }
}
