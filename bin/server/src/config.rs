//! Centralized server configuration.
//!
//! Loaded via the `config` crate from an optional TOML file layered under
//! `HELMSMAN__`-prefixed environment variables, e.g.
//! `HELMSMAN__LLM__MODEL=llama3`.
//!
//! See [`LlmBackendConfig`], [`LlmCallConfig`] and [`CacheConfig`] for the
//! library settings composed here.

use crate::logging::LoggingConfig;
use helmsman_ai::{LlmBackendConfig, LlmCallConfig};
use helmsman_conversation::CacheConfig;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_VAR: &str = "HELMSMAN_CONFIG";

/// Configuration file read when `HELMSMAN_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "helmsman.toml";

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Model backend configuration.
    pub llm: LlmBackendConfig,

    /// Per-strategy sampling overrides.
    #[serde(default)]
    pub sampling: SamplingConfig,

    /// Conversation history configuration.
    #[serde(default)]
    pub conversation_cache: CacheConfig,

    /// Log level configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Sampling parameters for each model call the dispatcher makes.
///
/// Unset values fall back to the backend's defaults.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub classifier: LlmCallConfig,
    pub summarizer: LlmCallConfig,
    pub generator: LlmCallConfig,
    pub completion: LlmCallConfig,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

impl ServerConfig {
    /// Loads configuration from the file named by `HELMSMAN_CONFIG` (or
    /// `helmsman.toml`) and the process environment.
    ///
    /// The file is optional; environment variables take precedence.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn load() -> Result<Self, config::ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path), environment())
    }

    /// Loads configuration from a file and an environment source.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn load_from(
        path: &Path,
        environment: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(environment)
            .build()?
            .try_deserialize()
    }
}

/// Environment source for `HELMSMAN__SECTION__KEY` variables.
#[must_use]
pub fn environment() -> config::Environment {
    config::Environment::with_prefix("HELMSMAN")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use helmsman_ai::LlmProvider;
    use helmsman_conversation::CacheKind;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        environment().source(Some(map))
    }

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn env_only_config_uses_defaults() {
        let config = ServerConfig::load_from(
            Path::new("/nonexistent/helmsman.toml"),
            env(&[
                ("HELMSMAN__LLM__PROVIDER", "ollama"),
                ("HELMSMAN__LLM__MODEL", "llama3"),
            ]),
        )
        .expect("load");

        assert_eq!(config.listen_addr, default_listen_addr());
        assert_eq!(config.llm.provider, LlmProvider::Ollama);
        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.llm.base_url, "http://localhost:11434");
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(config.sampling.classifier, LlmCallConfig::default());
        assert_eq!(config.sampling.generator, LlmCallConfig::default());
        assert_eq!(config.conversation_cache.kind, CacheKind::Memory);
        assert_eq!(config.conversation_cache.max_entries, 1000);
        assert_eq!(config.logging.app_log_level, "info");
        assert_eq!(config.logging.library_log_level, "warn");
    }

    #[test]
    fn file_config_is_read() {
        let file = toml_file(
            r#"
listen_addr = "0.0.0.0:9000"

[llm]
provider = "open_ai"
model = "gpt-4o-mini"
api_key = "sk-test"
base_url = "https://api.openai.com"

[sampling.classifier]
temperature = 0.0
max_tokens = 8

[sampling.generator]
max_tokens = 2048

[conversation_cache]
type = "disabled"

[logging]
app_log_level = "debug"
"#,
        );

        let config = ServerConfig::load_from(file.path(), env(&[])).expect("load");

        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.llm.provider, LlmProvider::OpenAi);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(
            config.sampling.classifier,
            LlmCallConfig::default().with_temperature(0.0).with_max_tokens(8)
        );
        assert_eq!(config.sampling.generator.temperature, None);
        assert_eq!(config.sampling.generator.max_tokens, Some(2048));
        assert_eq!(config.sampling.summarizer, LlmCallConfig::default());
        assert_eq!(config.conversation_cache.kind, CacheKind::Disabled);
        assert_eq!(config.logging.app_log_level, "debug");
        assert_eq!(config.logging.library_log_level, "warn");
    }

    #[test]
    fn environment_overrides_file() {
        let file = toml_file(
            r#"
[llm]
provider = "ollama"
model = "llama3"

[conversation_cache]
max_entries = 10
"#,
        );

        let config = ServerConfig::load_from(
            file.path(),
            env(&[
                ("HELMSMAN__LLM__MODEL", "mistral"),
                ("HELMSMAN__CONVERSATION_CACHE__MAX_ENTRIES", "25"),
                ("HELMSMAN__SAMPLING__SUMMARIZER__TEMPERATURE", "0.5"),
            ]),
        )
        .expect("load");

        assert_eq!(config.llm.model, "mistral");
        assert_eq!(config.conversation_cache.max_entries, 25);
        assert_eq!(config.sampling.summarizer.temperature, Some(0.5));
    }

    #[test]
    fn missing_llm_section_is_an_error() {
        let result = ServerConfig::load_from(Path::new("/nonexistent/helmsman.toml"), env(&[]));
        assert!(result.is_err());
    }
}
