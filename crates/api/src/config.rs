use std::time::Duration;

use crate::auth::jwt::JwtConfig;

/// Default service name of the student directory in discovery.
pub const DEFAULT_STUDENT_SERVICE_NAME: &str = "DMS.SMS.v1.service.student";

/// Time the outer timeout layer grants past the orchestration deadline, so
/// an expired operation can still roll back and answer 504 itself.
pub const TIMEOUT_LAYER_GRACE: Duration = Duration::from_secs(5);

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development except the JWT
/// secret. `DATABASE_URL` is read separately at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// Orchestration deadline in seconds when the caller sends none, and the
    /// most a caller may ask for (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Maximum pool size (default: `20`).
    pub db_max_connections: u32,
    /// Discovery name of the student directory.
    pub student_service_name: String,
    /// Per-call timeout of outbound HTTP requests, in seconds (default: `5`).
    pub remote_timeout_secs: u64,
    /// JWT token configuration.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                      |
    /// |-------------------------|------------------------------|
    /// | `HOST`                  | `0.0.0.0`                    |
    /// | `PORT`                  | `3000`                       |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`      |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                         |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                         |
    /// | `DB_MAX_CONNECTIONS`    | `20`                         |
    /// | `STUDENT_SERVICE_NAME`  | `DMS.SMS.v1.service.student` |
    /// | `REMOTE_TIMEOUT_SECS`   | `5`                          |
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

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let db_max_connections: u32 = std::env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "20".into())
            .parse()
            .expect("DB_MAX_CONNECTIONS must be a valid u32");

        let student_service_name = std::env::var("STUDENT_SERVICE_NAME")
            .unwrap_or_else(|_| DEFAULT_STUDENT_SERVICE_NAME.into());

        let remote_timeout_secs: u64 = std::env::var("REMOTE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("REMOTE_TIMEOUT_SECS must be a valid u64");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            db_max_connections,
            student_service_name,
            remote_timeout_secs,
            jwt,
        }
    }

    /// Default orchestration budget of one request.
    pub fn request_budget(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Hard limit of the HTTP timeout layer. Always later than any
    /// orchestration deadline.
    pub fn timeout_layer_limit(&self) -> Duration {
        self.request_budget() + TIMEOUT_LAYER_GRACE
    }
}
