use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub reminder: ReminderConfig,
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

/// Service-account credential blob for the push gateway. Kept as the raw
/// JSON string; the reminder pipeline parses it per run so a missing or
/// malformed blob fails that run, not startup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GoogleConfig {
    #[serde(default)]
    pub service_account_json: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// When true, reminders are only evaluated inside the 08:00-local
    /// morning window; when false they are evaluated at any hour.
    pub send_window: bool,
    pub dispatch_concurrency: usize,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            send_window: true,
            dispatch_concurrency: 8,
        }
    }
}

impl Config {
    pub fn from_toml() -> anyhow::Result<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // Read the config file if present, otherwise build purely from env.
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => toml::from_str(&config_str)
                .map_err(|e| anyhow::anyhow!("failed to parse {config_path}: {e}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // DATABASE_URL is mandatory when there is no config file
                let database_url = get_env("DATABASE_URL").ok_or_else(|| {
                    anyhow::anyhow!("missing DATABASE_URL env and no config file {config_path}")
                })?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    google: GoogleConfig {
                        service_account_json: get_env("GOOGLE_SERVICE_ACCOUNT_JSON"),
                    },
                    reminder: ReminderConfig {
                        send_window: get_env_parse("REMINDER_SEND_WINDOW", true),
                        dispatch_concurrency: get_env_parse("REMINDER_DISPATCH_CONCURRENCY", 8usize),
                    },
                }
            }
            Err(e) => {
                return Err(anyhow::anyhow!("failed to read config file {config_path}: {e}"));
            }
        };

        // Env overrides apply even when the file exists
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
        if let Ok(v) = env::var("GOOGLE_SERVICE_ACCOUNT_JSON") {
            config.google.service_account_json = Some(v);
        }
        if let Ok(v) = env::var("REMINDER_SEND_WINDOW")
            && let Ok(b) = v.parse()
        {
            config.reminder.send_window = b;
        }
        if let Ok(v) = env::var("REMINDER_DISPATCH_CONCURRENCY")
            && let Ok(n) = v.parse()
        {
            config.reminder.dispatch_concurrency = n;
        }

        Ok(config)
    }
}
