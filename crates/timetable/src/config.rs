/// Server configuration
use crate::import::RecognizerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable naming the JSON config file.
pub const CONFIG_ENV_VAR: &str = "TIMETABLE_CONFIG";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub address: String,
    pub port: u16,
    /// Path of the SQLite database file
    pub db_path: String,
    pub recognizer: RecognizerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 3000,
            db_path: "timetable.db".to_string(),
            recognizer: RecognizerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the configuration from a JSON file
    ///
    /// Missing keys take their default values.
    ///
    /// # Arguments
    /// * `path` - Path to the JSON file
    ///
    /// # Returns
    /// * `Ok(AppConfig)` - Parsed configuration
    /// * `Err` - If the file can't be read or parsed
    pub fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Loads from the file named by `TIMETABLE_CONFIG`, or uses defaults
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::load_from_file(Path::new(&path)),
            Err(_) => Ok(Self::default()),
        }
    }

    /// `address:port` for binding the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}
