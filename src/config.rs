use std::net::SocketAddr;

use crate::comments::DeletePolicy;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Runtime settings, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub comment_delete_policy: DeletePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:teamboard.db?mode=rwc".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_connections: 5,
            comment_delete_policy: DeletePolicy::AuthorOnly,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr.parse().map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                message: format!("{}", e),
            })?;
        }
        if let Some(max) = lookup("DB_MAX_CONNECTIONS") {
            config.max_connections = match max.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "DB_MAX_CONNECTIONS",
                        message: format!("expected a positive integer, got {:?}", max),
                    })
                }
            };
        }
        if let Some(policy) = lookup("COMMENT_DELETE_POLICY") {
            config.comment_delete_policy = policy.parse().map_err(|message| ConfigError::Invalid {
                key: "COMMENT_DELETE_POLICY",
                message,
            })?;
        }

        Ok(config)
    }
}
