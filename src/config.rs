use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub aotd: AotdConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// AOtD policy knobs. These are the named parameters the selection and
/// eligibility logic runs on; nothing outside this struct hard-codes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AotdConfig {
    /// Days without a review (window ending at the next midnight) before a
    /// user's submissions are blocked from selection.
    #[serde(default = "default_inactivity_window_days")]
    pub inactivity_window_days: i64,
    /// An album picked within this many days cannot be picked again.
    #[serde(default = "default_no_repeat_window_days")]
    pub no_repeat_window_days: i64,
    /// Review scores are accepted and ratings rounded in steps of this size.
    #[serde(default = "default_score_granularity")]
    pub score_granularity: f64,
    /// Minimum lead time for a self-enacted outage's start date.
    #[serde(default = "default_outage_min_lead_days")]
    pub outage_min_lead_days: i64,
}

fn default_inactivity_window_days() -> i64 {
    3
}

fn default_no_repeat_window_days() -> i64 {
    365
}

fn default_score_granularity() -> f64 {
    0.5
}

fn default_outage_min_lead_days() -> i64 {
    3
}

impl Default for AotdConfig {
    fn default() -> Self {
        Self {
            inactivity_window_days: default_inactivity_window_days(),
            no_repeat_window_days: default_no_repeat_window_days(),
            score_granularity: default_score_granularity(),
            outage_min_lead_days: default_outage_min_lead_days(),
        }
    }
}

impl Config {
    pub fn from_toml() -> anyhow::Result<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                toml::from_str(&config_str).context("Failed to parse config file")?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // No config file: build from environment variables and defaults
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                let database_url = get_env("DATABASE_URL")
                    .ok_or_else(|| anyhow!("DATABASE_URL is not set and no config.toml was found"))?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    aotd: AotdConfig::default(),
                }
            }
            Err(e) => {
                return Err(anyhow!("Failed to read config file {config_path}: {e}"));
            }
        };

        // Environment overrides apply even when the file exists
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("AOTD_INACTIVITY_WINDOW_DAYS")
            && let Ok(n) = v.parse()
        {
            config.aotd.inactivity_window_days = n;
        }
        if let Ok(v) = env::var("AOTD_NO_REPEAT_WINDOW_DAYS")
            && let Ok(n) = v.parse()
        {
            config.aotd.no_repeat_window_days = n;
        }
        if let Ok(v) = env::var("AOTD_SCORE_GRANULARITY")
            && let Ok(g) = v.parse()
        {
            config.aotd.score_granularity = g;
        }

        Ok(config)
    }
}
