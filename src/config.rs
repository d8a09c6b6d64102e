use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, warn};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub search: SearchConfig,
    pub location: LocationConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub rapidapi_host: String,
    pub rapidapi_key: String, // Overridden by SKYSEARCH_API_KEY if set
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SearchConfig {
    pub currency: String,
    pub market: String,
    pub country_code: String,
    pub adults: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LocationConfig {
    pub auto_detect: bool, // Use IP geolocation if true
    pub manual_lat: f64,   // Coordinates used if auto_detect is false
    pub manual_lon: f64,
}

impl Config {
    /// Loads config.toml from the root directory.
    /// If it doesn't exist, creates a default one.
    pub fn load() -> Self {
        let config_path = "config.toml";

        let mut config = match fs::read_to_string(config_path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Failed to parse config.toml: {}. Using defaults.", e);
                    Self::write_defaults(config_path)
                }
            },
            Err(_) => Self::write_defaults(config_path),
        };

        // The key usually comes from the environment rather than a file
        // checked into anyone's dotfiles.
        if let Ok(key) = std::env::var("SKYSEARCH_API_KEY") {
            config.api.rapidapi_key = key;
        }

        config
    }

    fn write_defaults(config_path: &str) -> Self {
        let default_config = Config {
            api: ApiConfig {
                base_url: "https://sky-scrapper.p.rapidapi.com/api/v1".to_string(),
                rapidapi_host: "sky-scrapper.p.rapidapi.com".to_string(),
                rapidapi_key: String::new(),
            },
            search: SearchConfig {
                currency: "AED".to_string(),
                market: "en-AE".to_string(),
                country_code: "AE".to_string(),
                adults: 1,
            },
            location: LocationConfig {
                auto_detect: true,
                manual_lat: 37.7749,
                manual_lon: -122.4194,
            },
        };

        // Save default config to disk for the user to edit later
        match toml::to_string_pretty(&default_config) {
            Ok(toml_string) => {
                if fs::write(config_path, toml_string).is_err() {
                    warn!("Could not write default config.toml to disk.");
                }
            }
            Err(e) => warn!("Could not serialize default config: {}", e),
        }

        info!("Loaded default configuration.");
        default_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_roundtrips_through_toml() {
        let config = Config {
            api: ApiConfig {
                base_url: "https://example.test/api/v1".into(),
                rapidapi_host: "example.test".into(),
                rapidapi_key: "k".into(),
            },
            search: SearchConfig {
                currency: "AED".into(),
                market: "en-AE".into(),
                country_code: "AE".into(),
                adults: 2,
            },
            location: LocationConfig {
                auto_detect: false,
                manual_lat: 25.25,
                manual_lon: 55.36,
            },
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.search.currency, "AED");
        assert_eq!(parsed.search.adults, 2);
        assert!(!parsed.location.auto_detect);
    }
}
