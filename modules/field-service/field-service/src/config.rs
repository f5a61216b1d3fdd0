//! Configuration for the field-service module.
//!
//! Layers, lowest precedence first: built-in defaults, an optional YAML file,
//! then `FIELDOPS__`-prefixed environment variables with `__` separating
//! sections (`FIELDOPS__DATABASE__URL`).

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldServiceConfig {
    pub database: DatabaseConfig,
    pub documents: DocumentsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection URL of the counter store.
    pub url: String,

    /// Upper bound for a single counter store call.
    #[serde(with = "humantime_duration")]
    pub store_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_owned(),
            store_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentsConfig {
    pub max_line_items: usize,

    /// Percentage applied when a quote or invoice names no tax rate.
    pub default_tax_rate: Decimal,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            max_line_items: 100,
            default_tax_rate: Decimal::from(20),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, used when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

impl FieldServiceConfig {
    pub const ENV_PREFIX: &'static str = "FIELDOPS__";

    /// Layered figment; `path` must exist when given.
    ///
    /// # Errors
    /// Returns an error if `path` is not a file.
    pub fn figment(path: Option<&Path>) -> anyhow::Result<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            anyhow::ensure!(
                path.is_file(),
                "config file not found: {}",
                path.display()
            );
            figment = figment.merge(Yaml::file(path));
        }
        Ok(figment.merge(Env::prefixed(Self::ENV_PREFIX).split("__")))
    }

    /// # Errors
    /// Returns an error if a layer cannot be read or the result is invalid.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::from_figment(&Self::figment(path)?)
    }

    /// # Errors
    /// Returns an error if extraction or validation fails.
    pub fn from_figment(figment: &Figment) -> anyhow::Result<Self> {
        let config: Self = figment
            .extract()
            .context("invalid field-service configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns an error naming the first out-of-range setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.database.url.is_empty(),
            "database.url must not be empty"
        );
        anyhow::ensure!(
            !self.database.store_timeout.is_zero(),
            "database.store_timeout must be positive"
        );
        anyhow::ensure!(
            self.documents.max_line_items > 0,
            "documents.max_line_items must be positive"
        );
        anyhow::ensure!(
            (Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(&self.documents.default_tax_rate),
            "documents.default_tax_rate must be within 0..=100, got {}",
            self.documents.default_tax_rate
        );
        Ok(())
    }
}

mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
