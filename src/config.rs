use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Where the reference tables and the output template live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub template: String,
}

impl DataConfig {
    pub fn template_path(&self) -> PathBuf {
        self.dir.join(&self.template)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            data: DataConfig {
                dir: PathBuf::from("Data"),
                template: "template_svdetail9.xlsx".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Defaults, then `upsse.toml` if present, then `UPSSE__SECTION__KEY` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", defaults.server.port as i64)?
            .set_default("data.dir", defaults.data.dir.to_string_lossy().into_owned())?
            .set_default("data.template", defaults.data.template)?
            .add_source(File::with_name("upsse").required(false))
            .add_source(Environment::with_prefix("UPSSE").separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_falls_back_to_defaults() {
        let config = AppConfig::load().unwrap();
        assert_eq!(config.data.template, "template_svdetail9.xlsx");
        assert_eq!(
            config.data.template_path(),
            PathBuf::from("Data").join("template_svdetail9.xlsx")
        );
    }
}
