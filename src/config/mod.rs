use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "rookery=debug".to_string(),
        }
    }
}

/// Shape of the demo data written by the `seed` binary.
#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    pub clubs: u32,
    pub applicants_per_club: u32,
    pub members_per_club: u32,
    pub officers_per_club: u32,
    pub default_password: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            clubs: 3,
            applicants_per_club: 8,
            members_per_club: 10,
            officers_per_club: 5,
            default_password: "Password123".to_string(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("database.url", "sqlite://rookery.db?mode=rwc")?
            .set_default("database.max_connections", 5)?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with ROOKERY__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("ROOKERY").separator("__"))

            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://rookery.db?mode=rwc".to_string(),
                max_connections: 5,
            },
            logging: LoggingConfig::default(),
            seed: SeedConfig::default(),
        }
    }
}
