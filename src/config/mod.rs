use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub pagination: PaginationConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub images: ImageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
    pub slow_query_threshold_ms: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_page_size: i64,
    pub max_page_size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub jwt_issuer: String,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    pub upload_url: Option<String>,
    pub destroy_url: Option<String>,
    pub api_key: Option<String>,
    #[serde(skip_serializing)]
    pub api_secret: Option<String>,
    pub folder: String,
    pub timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Profile defaults first, individual variables win
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging = v.parse().unwrap_or(self.database.enable_query_logging);
        }
        if let Ok(v) = env::var("DATABASE_SLOW_QUERY_THRESHOLD_MS") {
            self.database.slow_query_threshold_ms = v.parse().unwrap_or(self.database.slow_query_threshold_ms);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // Pagination overrides
        if let Ok(v) = env::var("PAGINATION_DEFAULT_PAGE_SIZE") {
            self.pagination.default_page_size = v.parse().unwrap_or(self.pagination.default_page_size);
        }
        if let Ok(v) = env::var("PAGINATION_MAX_PAGE_SIZE") {
            self.pagination.max_page_size = v.parse().unwrap_or(self.pagination.max_page_size);
        }

        // API overrides
        if let Some(port) = env::var("API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_JWT_ISSUER") {
            self.security.jwt_issuer = v;
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Image host overrides
        if let Ok(v) = env::var("IMAGES_UPLOAD_URL") {
            self.images.upload_url = Some(v);
        }
        if let Ok(v) = env::var("IMAGES_DESTROY_URL") {
            self.images.destroy_url = Some(v);
        }
        if let Ok(v) = env::var("IMAGES_API_KEY") {
            self.images.api_key = Some(v);
        }
        if let Ok(v) = env::var("IMAGES_API_SECRET") {
            self.images.api_secret = Some(v);
        }
        if let Ok(v) = env::var("IMAGES_FOLDER") {
            self.images.folder = v;
        }
        if let Ok(v) = env::var("IMAGES_TIMEOUT_SECS") {
            self.images.timeout_secs = v.parse().unwrap_or(self.images.timeout_secs);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                enable_query_logging: true,
                slow_query_threshold_ms: 100,
                run_migrations: true,
            },
            pagination: PaginationConfig {
                default_page_size: 10,
                max_page_size: 1000,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: "development-only-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                jwt_issuer: "storefront-api".to_string(),
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            images: ImageConfig::unconfigured(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                enable_query_logging: true,
                slow_query_threshold_ms: 500,
                run_migrations: true,
            },
            pagination: PaginationConfig {
                default_page_size: 10,
                max_page_size: 500,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                jwt_issuer: "storefront-api".to_string(),
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            images: ImageConfig::unconfigured(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                enable_query_logging: false,
                slow_query_threshold_ms: 1000,
                run_migrations: false,
            },
            pagination: PaginationConfig {
                default_page_size: 10,
                max_page_size: 100,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                jwt_issuer: "storefront-api".to_string(),
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            images: ImageConfig::unconfigured(),
        }
    }
}

impl ImageConfig {
    fn unconfigured() -> Self {
        Self {
            upload_url: None,
            destroy_url: None,
            api_key: None,
            api_secret: None,
            folder: "products".to_string(),
            timeout_secs: 30,
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.pagination.max_page_size, 1000);
        assert!(config.database.run_migrations);
        assert!(!config.security.jwt_secret.is_empty());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.pagination.max_page_size, 100);
        assert!(!config.database.enable_query_logging);
        // Production must be given a secret explicitly
        assert!(config.security.jwt_secret.is_empty());
    }

    #[test]
    fn secrets_are_not_serialized() {
        let mut config = AppConfig::development();
        config.images.api_secret = Some("cdn-secret".to_string());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("development-only-secret"));
        assert!(!json.contains("cdn-secret"));
    }
}
