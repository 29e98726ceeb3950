use std::env;
use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::domain::dataset::DatasetKind;
use crate::domain::error::{AppError, Result};

pub const ENV_PREFIX: &str = "RISKWISE_";
pub const CONFIG_PATH_ENV: &str = "RISKWISE_CONFIG";
pub const READ_ONLY_ENV: &str = "RISKWISE_READ_ONLY";
pub const DEFAULT_CONFIG_FILE: &str = "riskwise.toml";

/// Server settings: defaults, then `riskwise.toml`, then `RISKWISE_*` env vars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub chronic_file: String,
    pub acute_file: String,
    pub mexico_file: String,
    /// Rejects every update with `WriteDisabled`.
    pub read_only: bool,
    pub log_filter: String,
    pub max_payload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            data_dir: PathBuf::from("data"),
            chronic_file: "DietaCronicaOf.xlsx".to_string(),
            acute_file: "DietaAgudaOf.xlsx".to_string(),
            mexico_file: "DietaCronicaMexico.xlsx".to_string(),
            read_only: false,
            log_filter: "info".to_string(),
            max_payload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let figment = Self::defaults()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["CONFIG", "READ_ONLY"]));

        // Any value, even empty, turns writes off.
        Self::from_figment(figment, env::var_os(READ_ONLY_ENV).is_some())
    }

    pub fn defaults() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
    }

    pub fn from_figment(figment: Figment, force_read_only: bool) -> Result<Self> {
        let mut config: AppConfig = figment
            .extract()
            .map_err(|e| AppError::Internal(format!("Invalid configuration: {}", e)))?;
        config.read_only |= force_read_only;
        Ok(config)
    }

    pub fn dataset_path(&self, kind: DatasetKind) -> PathBuf {
        let file = match kind {
            DatasetKind::Chronic => &self.chronic_file,
            DatasetKind::Acute => &self.acute_file,
            DatasetKind::Mexico => &self.mexico_file,
        };
        self.data_dir.join(file)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_figment(AppConfig::defaults(), false).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(
            config.dataset_path(DatasetKind::Acute),
            PathBuf::from("data").join("DietaAgudaOf.xlsx")
        );
        assert_eq!(config.bind_address(), ("127.0.0.1".to_string(), 8000));
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let figment = AppConfig::defaults().merge(Toml::string(
            r#"
            port = 9100
            data_dir = "/srv/riskwise"
            mexico_file = "Mexico.xlsx"
            read_only = true
            "#,
        ));

        let config = AppConfig::from_figment(figment, false).unwrap();

        assert_eq!(config.port, 9100);
        assert!(config.read_only);
        assert_eq!(config.chronic_file, "DietaCronicaOf.xlsx");
        assert_eq!(
            config.dataset_path(DatasetKind::Mexico),
            PathBuf::from("/srv/riskwise/Mexico.xlsx")
        );
    }

    #[test]
    fn test_read_only_flag_wins_over_file() {
        let figment = AppConfig::defaults().merge(Toml::string("read_only = false"));
        let config = AppConfig::from_figment(figment, true).unwrap();
        assert!(config.read_only);
    }

    #[test]
    fn test_bad_value_is_reported() {
        let figment = AppConfig::defaults().merge(Toml::string("port = \"eighty\""));
        let err = AppConfig::from_figment(figment, false).unwrap_err();
        assert!(matches!(err, AppError::Internal(ref m) if m.contains("port")));
    }
}
