use std::path::PathBuf;
use std::time::Duration;

use crate::auth::jwt::JwtConfig;

/// Default minimum password length for registration.
const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Accounts and data created once at startup, before serving.
#[derive(Debug, Clone, Default)]
pub struct BootstrapConfig {
    /// Username of the bootstrap administrator (default: `admin`).
    pub admin_username: String,
    /// Password of the bootstrap administrator. `None` skips admin creation.
    pub admin_password: Option<String>,
    /// Insert the demo lots when the lots table is empty.
    pub seed_demo_lots: bool,
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on each Enter/Exit/update transaction in seconds (default: `5`).
    pub transaction_timeout_secs: u64,
    /// Maximum pool connections (default: `20`).
    pub db_max_connections: u32,
    /// Minimum accepted password length at registration (default: `8`).
    pub min_password_length: usize,
    /// Directory served for any path no API route matched.
    pub static_dir: Option<PathBuf>,
    pub log_format: LogFormat,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    pub bootstrap: BootstrapConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                    |
    /// |----------------------------|----------------------------|
    /// | `HOST`                     | `0.0.0.0`                  |
    /// | `PORT`                     | `3000`                     |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                       |
    /// | `TRANSACTION_TIMEOUT_SECS` | `5`                        |
    /// | `DB_MAX_CONNECTIONS`       | `20`                       |
    /// | `MIN_PASSWORD_LENGTH`      | `8`                        |
    /// | `STATIC_DIR`               | unset                      |
    /// | `LOG_FORMAT`               | `text`                     |
    /// | `ADMIN_USERNAME`           | `admin`                    |
    /// | `ADMIN_PASSWORD`           | unset                      |
    /// | `SEED_DEMO_LOTS`           | `false`                    |
    ///
    /// # Panics
    ///
    /// Panics on malformed numeric values and when `JWT_SECRET` is missing.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let transaction_timeout_secs: u64 = std::env::var("TRANSACTION_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("TRANSACTION_TIMEOUT_SECS must be a valid u64");

        let db_max_connections: u32 = std::env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| parkwise_db::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse()
            .expect("DB_MAX_CONNECTIONS must be a valid u32");

        let min_password_length: usize = std::env::var("MIN_PASSWORD_LENGTH")
            .unwrap_or_else(|_| DEFAULT_MIN_PASSWORD_LENGTH.to_string())
            .parse()
            .expect("MIN_PASSWORD_LENGTH must be a valid usize");

        let static_dir = std::env::var("STATIC_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let log_format = std::env::var("LOG_FORMAT")
            .map(|raw| LogFormat::parse(&raw))
            .unwrap_or_default();

        let bootstrap = BootstrapConfig {
            admin_username: std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".into()),
            admin_password: std::env::var("ADMIN_PASSWORD")
                .ok()
                .filter(|s| !s.is_empty()),
            seed_demo_lots: std::env::var("SEED_DEMO_LOTS")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        };

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            transaction_timeout_secs,
            db_max_connections,
            min_password_length,
            static_dir,
            log_format,
            jwt,
            bootstrap,
        }
    }

    /// Deadline applied to each ledger transaction.
    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_secs(self.transaction_timeout_secs)
    }
}
