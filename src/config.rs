//! Client configuration loaded from environment variables.

use std::env;

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote gateway endpoint (single POST URL).
    pub gateway_url: String,
    /// Background polling interval in seconds.
    pub poll_interval_secs: u64,
    /// Spot names for the spot-grid assignment engine.
    pub grid_spots: Vec<String>,
    /// Group names for the spot-grid assignment engine.
    pub grid_groups: Vec<String>,
    /// Where the remembered login name is persisted.
    pub remembered_name_file: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            gateway_url: env::var("GATEWAY_URL").map_err(|_| ConfigError::Missing("GATEWAY_URL"))?,
            poll_interval_secs: env::var("POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .unwrap_or(20),
            grid_spots: env::var("GRID_SPOTS")
                .map(|v| parse_list(&v))
                .unwrap_or_else(|_| default_spots()),
            grid_groups: env::var("GRID_GROUPS")
                .map(|v| parse_list(&v))
                .unwrap_or_else(|_| default_groups()),
            remembered_name_file: env::var("REMEMBERED_NAME_FILE")
                .unwrap_or_else(|_| ".service-roster-name".to_string()),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            gateway_url: "http://localhost:0/exec".to_string(),
            poll_interval_secs: 20,
            grid_spots: default_spots(),
            grid_groups: default_groups(),
            remembered_name_file: ".service-roster-name".to_string(),
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn default_spots() -> Vec<String> {
    ["Spot A", "Spot B", "Spot C", "Spot D"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_groups() -> Vec<String> {
    ["Group 1", "Group 2", "Group 3", "Group 4"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
