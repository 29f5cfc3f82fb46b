/// Configuration management for inkpost
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub email: Option<EmailConfig>,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
}

/// Authentication configuration
///
/// Access and refresh tokens are signed with distinct secrets so that a
/// leaked access secret cannot forge refresh tokens (and vice versa).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub access_token_secret: String,
    pub refresh_token_secret: String,
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_url: String,
    pub from_address: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ApiResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("INKPOST_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("INKPOST_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ApiError::Validation("Invalid port number".to_string()))?;

        let data_directory: PathBuf = env::var("INKPOST_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("INKPOST_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("inkpost.sqlite"));

        let access_token_secret = env::var("INKPOST_ACCESS_TOKEN_SECRET")
            .map_err(|_| ApiError::Validation("Access token secret required".to_string()))?;
        let refresh_token_secret = env::var("INKPOST_REFRESH_TOKEN_SECRET")
            .map_err(|_| ApiError::Validation("Refresh token secret required".to_string()))?;

        let email = if let Ok(smtp_url) = env::var("INKPOST_SMTP_URL") {
            Some(EmailConfig {
                smtp_url,
                from_address: env::var("INKPOST_EMAIL_FROM_ADDRESS")
                    .unwrap_or_else(|_| format!("noreply@{}", hostname)),
            })
        } else {
            None
        };

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig { hostname, port },
            storage: StorageConfig {
                data_directory,
                database,
            },
            auth: AuthConfig {
                access_token_secret,
                refresh_token_secret,
            },
            email,
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.service.hostname.is_empty() {
            return Err(ApiError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.auth.access_token_secret.len() < 32 {
            return Err(ApiError::Validation(
                "Access token secret must be at least 32 characters".to_string(),
            ));
        }

        if self.auth.refresh_token_secret.len() < 32 {
            return Err(ApiError::Validation(
                "Refresh token secret must be at least 32 characters".to_string(),
            ));
        }

        if self.auth.access_token_secret == self.auth.refresh_token_secret {
            return Err(ApiError::Validation(
                "Access and refresh token secrets must differ".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ServerConfig {
        ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 8080,
            },
            storage: StorageConfig {
                data_directory: PathBuf::from("./data"),
                database: PathBuf::from(":memory:"),
            },
            auth: AuthConfig {
                access_token_secret: "access-secret-for-testing-0123456789".to_string(),
                refresh_token_secret: "refresh-secret-for-testing-0123456789".to_string(),
            },
            email: None,
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn short_secret_rejected() {
        let mut config = test_config();
        config.auth.access_token_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn identical_secrets_rejected() {
        let mut config = test_config();
        config.auth.refresh_token_secret = config.auth.access_token_secret.clone();
        assert!(config.validate().is_err());
    }
}
