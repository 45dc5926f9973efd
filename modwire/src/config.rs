//! Framework configuration. [ApplicationConfig] is created with opinionated default values, which
//! can then be overwritten by a `modwire.json` file and by environment variables prefixed with
//! `MODWIRE_`, in that order.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_ENV_PREFIX: &str = "MODWIRE";

/// Name of the default config file.
pub const CONFIG_FILE: &str = "modwire.json";

/// Framework configuration used by [Application](crate::application::Application).
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApplicationConfig {
    /// Should a default tracing logger be installed when the application gets ready.
    pub install_tracing_logger: bool,
    /// Can private and overriding resources be provided by the application directly.
    pub allow_provider_resources: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            install_tracing_logger: true,
            allow_provider_resources: false,
        }
    }
}

impl From<OptionalApplicationConfig> for ApplicationConfig {
    fn from(value: OptionalApplicationConfig) -> Self {
        let default = Self::default();
        Self {
            install_tracing_logger: value
                .install_tracing_logger
                .unwrap_or(default.install_tracing_logger),
            allow_provider_resources: value
                .allow_provider_resources
                .unwrap_or(default.allow_provider_resources),
        }
    }
}

impl ApplicationConfig {
    /// Loads the config from the default file and the environment.
    pub fn from_environment() -> Result<Self, ConfigError> {
        Self::from_sources(
            Config::builder()
                .add_source(File::with_name(CONFIG_FILE).required(false))
                .add_source(Environment::with_prefix(CONFIG_ENV_PREFIX).try_parsing(true)),
        )
    }

    /// Loads the config from custom sources. Missing values are filled with defaults.
    pub fn from_sources(sources: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        sources
            .build()
            .and_then(|config| config.try_deserialize::<OptionalApplicationConfig>())
            .map(|config| config.into())
    }

    pub fn with_install_tracing_logger(mut self, install_tracing_logger: bool) -> Self {
        self.install_tracing_logger = install_tracing_logger;
        self
    }

    pub fn with_allow_provider_resources(mut self, allow_provider_resources: bool) -> Self {
        self.allow_provider_resources = allow_provider_resources;
        self
    }
}

#[derive(Deserialize)]
struct OptionalApplicationConfig {
    install_tracing_logger: Option<bool>,
    allow_provider_resources: Option<bool>,
}

#[cfg(test)]
mod tests {
    use crate::config::ApplicationConfig;
    use config::{Config, File, FileFormat};

    #[test]
    fn should_use_defaults_for_empty_sources() {
        assert_eq!(
            ApplicationConfig::from_sources(Config::builder()).unwrap(),
            ApplicationConfig::default()
        );
    }

    #[test]
    fn should_override_defaults() {
        let config = ApplicationConfig::from_sources(Config::builder().add_source(
            File::from_str(r#"{ "allow_provider_resources": true }"#, FileFormat::Json),
        ))
        .unwrap();

        assert!(config.install_tracing_logger);
        assert!(config.allow_provider_resources);
    }

    #[test]
    fn should_reject_invalid_values() {
        assert!(ApplicationConfig::from_sources(Config::builder().add_source(
            File::from_str(r#"{ "install_tracing_logger": [1, 2] }"#, FileFormat::Json),
        ))
        .is_err());
    }
}
