use anyhow::Context;
use axum::http::HeaderValue;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(anyhow::anyhow!("Invalid environment: {}", s)),
        }
    }
}

impl<'de> Deserialize<'de> for Environment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Environment::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub env: Environment,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// CORS origins for the current environment. Development allows the
    /// usual localhost variants; production requires an explicit list.
    pub fn get_allowed_origins(
        &self,
        addr: &std::net::SocketAddr,
    ) -> anyhow::Result<Vec<HeaderValue>> {
        let origin_strings = match self.env {
            Environment::Production => {
                if !self.allowed_origins.is_empty() {
                    self.allowed_origins.clone()
                } else {
                    anyhow::bail!(
                        "Production environment requires explicit ALLOWED_ORIGINS configuration"
                    );
                }
            }
            Environment::Development => {
                let mut origins = vec![
                    format!("http://localhost:{}", addr.port()),
                    format!("http://127.0.0.1:{}", addr.port()),
                    "http://localhost:3000".to_string(),
                    format!("http://{}", addr),
                ];
                origins.extend(self.allowed_origins.clone());
                origins
            }
        };

        let headers: Vec<HeaderValue> = origin_strings
            .into_iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(header_value) => Some(header_value),
                Err(e) => {
                    tracing::warn!("skipping unparseable origin '{}': {}", origin, e);
                    None
                }
            })
            .collect();

        if headers.is_empty() {
            anyhow::bail!("No valid CORS origins configured");
        }

        Ok(headers)
    }
}

impl Config {
    /// Loads configuration from the environment when DATABASE_PATH is
    /// set, from Config.toml when present, and falls back to local
    /// development defaults otherwise.
    pub fn load() -> anyhow::Result<Self> {
        if env::var("DATABASE_PATH").is_ok() {
            return Self::from_env();
        }

        if Path::new("Config.toml").exists() {
            let config_str =
                fs::read_to_string("Config.toml").context("Failed to read Config.toml")?;
            let mut config: Config =
                toml::from_str(&config_str).context("Failed to parse Config.toml")?;

            // Environment variables take precedence over the file.
            if let Ok(level) = env::var("LOG_LEVEL") {
                config.logging.level = level;
            }
            return Ok(config);
        }

        Self::from_env()
    }

    fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            database: DatabaseConfig {
                path: env::var("DATABASE_PATH").unwrap_or_else(|_| "agenda.db".to_string()),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()
                    .unwrap_or(5000),
                env: env::var("ENVIRONMENT")
                    .ok()
                    .and_then(|s| Environment::from_str(&s).ok())
                    .unwrap_or_default(),
                allowed_origins: env::var("ALLOWED_ORIGINS")
                    .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                    .unwrap_or_default(),
            },
            logging: LoggingConfig {
                level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_aliases() {
        assert_eq!(
            Environment::from_str("dev").unwrap(),
            Environment::Development
        );
        assert_eq!(
            Environment::from_str("PROD").unwrap(),
            Environment::Production
        );
        assert!(Environment::from_str("staging").is_err());
    }

    #[test]
    fn production_without_origins_is_rejected() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            env: Environment::Production,
            allowed_origins: Vec::new(),
        };
        let addr = "127.0.0.1:5000".parse().unwrap();
        assert!(server.get_allowed_origins(&addr).is_err());
    }

    #[test]
    fn development_includes_localhost_origins() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            env: Environment::Development,
            allowed_origins: vec!["https://agenda.example.com".to_string()],
        };
        let addr = "127.0.0.1:5000".parse().unwrap();
        let origins = server.get_allowed_origins(&addr).unwrap();
        assert!(origins.contains(&"http://localhost:5000".parse().unwrap()));
        assert!(origins.contains(&"https://agenda.example.com".parse().unwrap()));
    }
}
