use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Signing secret used when nothing else is configured. Refused in production.
pub const DEVELOPMENT_JWT_SECRET: &str = "ticket-desk-development-secret";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub seed_demo_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub default_page_limit: i64,
    pub max_page_limit: i64,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET must not be empty")]
    EmptySecret,

    #[error("JWT_SECRET must be set explicitly in production")]
    DevelopmentSecretInProduction,

    #[error("JWT_ISSUER must not be empty")]
    EmptyIssuer,

    #[error("DATABASE_URL is required for the postgres backend")]
    MissingDatabaseUrl,

    #[error("Invalid page limits: default {default} must be within 1..={max}")]
    InvalidPageLimits { default: i64, max: i64 },
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("DESK_API_HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("DESK_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_BACKEND") {
            match v.to_ascii_lowercase().as_str() {
                "memory" => self.database.backend = StoreBackend::Memory,
                "postgres" | "postgresql" => self.database.backend = StoreBackend::Postgres,
                _ => {}
            }
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_SEED_DEMO_DATA") {
            self.database.seed_demo_data = v.parse().unwrap_or(self.database.seed_demo_data);
        }

        // API overrides
        if let Ok(v) = env::var("API_DEFAULT_PAGE_LIMIT") {
            self.api.default_page_limit = v.parse().unwrap_or(self.api.default_page_limit);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_LIMIT") {
            self.api.max_page_limit = v.parse().unwrap_or(self.api.max_page_limit);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_ISSUER") {
            self.security.jwt_issuer = v;
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    /// Checks the settings the process cannot serve traffic without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if self.environment == Environment::Production
            && self.security.jwt_secret == DEVELOPMENT_JWT_SECRET
        {
            return Err(ConfigError::DevelopmentSecretInProduction);
        }
        if self.security.jwt_issuer.trim().is_empty() {
            return Err(ConfigError::EmptyIssuer);
        }
        if self.database.backend == StoreBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if self.api.max_page_limit < 1
            || self.api.default_page_limit < 1
            || self.api.default_page_limit > self.api.max_page_limit
        {
            return Err(ConfigError::InvalidPageLimits {
                default: self.api.default_page_limit,
                max: self.api.max_page_limit,
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn development() -> Self {
        let local_ports = [3000, 3001, 3002, 3003, 3005];
        let cors_origins = local_ports
            .iter()
            .map(|port| format!("http://localhost:{}", port))
            .chain(local_ports.iter().map(|port| format!("http://127.0.0.1:{}", port)))
            .collect();

        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                seed_demo_data: true,
            },
            api: ApiConfig {
                default_page_limit: 10,
                max_page_limit: 1000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
                jwt_issuer: "ticket-desk".to_string(),
                enable_cors: true,
                cors_origins,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                seed_demo_data: true,
            },
            api: ApiConfig {
                default_page_limit: 10,
                max_page_limit: 500,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
                jwt_issuer: "ticket-desk".to_string(),
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                seed_demo_data: false,
            },
            api: ApiConfig {
                default_page_limit: 10,
                max_page_limit: 100,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
                jwt_issuer: "ticket-desk".to_string(),
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.server.port, 8080);
        assert!(config.database.seed_demo_data);
        assert!(config.security.cors_origins.contains(&"http://localhost:3002".to_string()));
        assert!(config.security.cors_origins.contains(&"http://127.0.0.1:3005".to_string()));
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.database.seed_demo_data);
        assert_eq!(config.api.max_page_limit, 100);
        assert!(!config.api.enable_request_logging);
    }

    #[test]
    fn production_refuses_development_secret() {
        let mut config = AppConfig::production();
        config.database.url = Some("postgres://localhost/desk".to_string());
        assert_eq!(config.validate(), Err(ConfigError::DevelopmentSecretInProduction));

        config.security.jwt_secret = "a-real-secret".to_string();
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn postgres_backend_requires_url() {
        let mut config = AppConfig::development();
        assert_eq!(config.validate(), Err(ConfigError::MissingDatabaseUrl));

        config.database.backend = StoreBackend::Memory;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn empty_secret_is_rejected() {
        let mut config = AppConfig::development();
        config.database.backend = StoreBackend::Memory;
        config.security.jwt_secret.clear();
        assert_eq!(config.validate(), Err(ConfigError::EmptySecret));
    }
}
