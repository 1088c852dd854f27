use jsonwebtoken::Algorithm;
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Startup configuration errors. Any of these aborts the server before it binds.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub filter: FilterConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `postgres://...` or `memory://` for the in-process store
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub max_page_size: Option<u64>,
    pub debug_logging: bool,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub jwt_access_expiry_minutes: i64,
    pub jwt_refresh_enabled: bool,
    pub jwt_refresh_secret: Option<String>,
    pub jwt_refresh_expiry_hours: i64,
    pub public_paths: Vec<String>,
    pub allow_registration: bool,
    pub cors_origins: Vec<String>,
}

impl SecurityConfig {
    /// Prefix match on whole path segments, so `/health` admits `/health/db`
    /// but not `/healthcheck`.
    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_paths.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches('/');
            if prefix.is_empty() {
                return path == "/";
            }
            path == prefix || path.starts_with(&format!("{}/", prefix))
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(&lookup)?;

        config.validate()?;
        Ok(config)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("PORT") {
            self.server.port = parse_value("PORT", &v)?;
        }
        if let Some(v) = lookup("SERVER_MAX_REQUEST_SIZE_BYTES") {
            self.server.max_request_size_bytes = parse_value("SERVER_MAX_REQUEST_SIZE_BYTES", &v)?;
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = v.trim().to_string();
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_value("DATABASE_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = parse_value("DATABASE_CONNECTION_TIMEOUT", &v)?;
        }

        // Filter overrides
        if let Some(v) = lookup("FILTER_MAX_PAGE_SIZE") {
            self.filter.max_page_size = match v.trim() {
                "" | "none" | "0" => None,
                other => Some(parse_value("FILTER_MAX_PAGE_SIZE", other)?),
            };
        }
        if let Some(v) = lookup("FILTER_DEBUG_LOGGING") {
            self.filter.debug_logging = parse_value("FILTER_DEBUG_LOGGING", &v)?;
        }

        // Security overrides
        if let Some(v) = lookup("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = lookup("JWT_ALGORITHM") {
            self.security.jwt_algorithm = parse_algorithm(&v)?;
        }
        if let Some(v) = lookup("JWT_ACCESS_EXPIRY_MINUTES") {
            self.security.jwt_access_expiry_minutes = parse_value("JWT_ACCESS_EXPIRY_MINUTES", &v)?;
        }
        if let Some(v) = lookup("JWT_REFRESH_ENABLED") {
            self.security.jwt_refresh_enabled = parse_value("JWT_REFRESH_ENABLED", &v)?;
        }
        if let Some(v) = lookup("JWT_REFRESH_SECRET") {
            self.security.jwt_refresh_secret = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = lookup("JWT_REFRESH_EXPIRY_HOURS") {
            self.security.jwt_refresh_expiry_hours = parse_value("JWT_REFRESH_EXPIRY_HOURS", &v)?;
        }
        if let Some(v) = lookup("AUTH_PUBLIC_PATHS") {
            self.security.public_paths = split_list(&v);
        }
        if let Some(v) = lookup("AUTH_ALLOW_REGISTRATION") {
            self.security.allow_registration = parse_value("AUTH_ALLOW_REGISTRATION", &v)?;
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }

        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.is_empty() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        let url = url::Url::parse(&self.database.url).map_err(|_| ConfigError::Invalid {
            key: "DATABASE_URL",
            value: "not a valid URL".to_string(),
        })?;
        if !matches!(url.scheme(), "postgres" | "postgresql" | "memory") {
            return Err(ConfigError::Invalid {
                key: "DATABASE_URL",
                value: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        if self.security.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if self.security.jwt_access_expiry_minutes <= 0 {
            return Err(ConfigError::Invalid {
                key: "JWT_ACCESS_EXPIRY_MINUTES",
                value: self.security.jwt_access_expiry_minutes.to_string(),
            });
        }
        if self.security.jwt_refresh_enabled {
            if self.security.jwt_refresh_secret.is_none() {
                return Err(ConfigError::Missing("JWT_REFRESH_SECRET"));
            }
            if self.security.jwt_refresh_expiry_hours <= 0 {
                return Err(ConfigError::Invalid {
                    key: "JWT_REFRESH_EXPIRY_HOURS",
                    value: self.security.jwt_refresh_expiry_hours.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database.url.starts_with("memory:")
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 10,
                connection_timeout: 30,
            },
            filter: FilterConfig {
                max_page_size: Some(1000),
                debug_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_algorithm: Algorithm::HS256,
                jwt_access_expiry_minutes: 24 * 60,
                jwt_refresh_enabled: false,
                jwt_refresh_secret: None,
                jwt_refresh_expiry_hours: 24 * 7,
                public_paths: default_public_paths(),
                allow_registration: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 20,
                connection_timeout: 10,
            },
            filter: FilterConfig {
                max_page_size: Some(500),
                debug_logging: false,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_algorithm: Algorithm::HS256,
                jwt_access_expiry_minutes: 60,
                jwt_refresh_enabled: false,
                jwt_refresh_secret: None,
                jwt_refresh_expiry_hours: 24,
                public_paths: default_public_paths(),
                allow_registration: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 50,
                connection_timeout: 5,
            },
            filter: FilterConfig {
                max_page_size: Some(100),
                debug_logging: false,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_algorithm: Algorithm::HS256,
                jwt_access_expiry_minutes: 15,
                jwt_refresh_enabled: false,
                jwt_refresh_secret: None,
                jwt_refresh_expiry_hours: 24,
                public_paths: default_public_paths(),
                allow_registration: false,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

fn default_public_paths() -> Vec<String> {
    ["/", "/health", "/auth/login", "/auth/register"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

fn parse_algorithm(value: &str) -> Result<Algorithm, ConfigError> {
    match value.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        _ => Err(ConfigError::Invalid {
            key: "JWT_ALGORITHM",
            value: value.to_string(),
        }),
    }
}
