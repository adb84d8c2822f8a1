/// Configuration for the API server
///
/// Loaded from environment variables (and a `.env` file in development).
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `JWT_SECRET`: token signing secret, at least 32 characters (required)
/// - `CLIENT_URL`: allowed CORS origin and reset link base (default: http://localhost:3000)
/// - `API_HOST`: host to bind to (default: 0.0.0.0)
/// - `PORT`: port to bind to (default: 5000)
/// - `APP_ENVIRONMENT`: `production`/`prod` enables secure cookies and HSTS
/// - `SENDGRID_API_KEY`: enables password reset mail (optional)
/// - `MAIL_FROM_EMAIL`, `MAIL_FROM_NAME`: sender identity
/// - `LOG_FORMAT`: `json` for JSON lines, anything else for human-readable logs
///
/// # Example
///
/// ```no_run
/// use taskie_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use taskie_shared::mail::{Sender, DEFAULT_FROM_EMAIL, DEFAULT_FROM_NAME};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_CLIENT_URL: &str = "http://localhost:3000";
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Frontend origin; also the base of password reset links
    pub client_url: String,

    /// Production mode: `Secure` cookies and HSTS
    pub production: bool,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Without a key the forgot-password route answers 403
    pub sendgrid_api_key: Option<String>,
    pub from_email: String,
    pub from_name: String,
}

const REDACTED: &str = "[redacted]";

// The database URL usually carries credentials
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &REDACTED)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig").field("secret", &REDACTED).finish()
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field(
                "sendgrid_api_key",
                &self.sendgrid_api_key.as_ref().map(|_| REDACTED),
            )
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .finish()
    }
}

impl MailConfig {
    pub fn sender(&self) -> Sender {
        Sender {
            email: self.from_email.clone(),
            name: self.from_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does not
    /// parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(var("PORT"), "PORT", DEFAULT_PORT)?;
        let client_url = var("CLIENT_URL").unwrap_or_else(|| DEFAULT_CLIENT_URL.to_string());
        let production = var("APP_ENVIRONMENT")
            .map(|value| matches!(value.to_ascii_lowercase().as_str(), "production" | "prod"))
            .unwrap_or(false);

        let database_url = var("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = parse_or(var("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", 10)?;

        let jwt_secret = var("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let log_format = match var("LOG_FORMAT").as_deref().map(str::to_ascii_lowercase) {
            Some(format) if format == "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                client_url,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            mail: MailConfig {
                sendgrid_api_key: var("SENDGRID_API_KEY"),
                from_email: var("MAIL_FROM_EMAIL").unwrap_or_else(|| DEFAULT_FROM_EMAIL.to_string()),
                from_name: var("MAIL_FROM_NAME").unwrap_or_else(|| DEFAULT_FROM_NAME.to_string()),
            },
            log_format,
        })
    }

    /// Builds the configuration from a fixed set of pairs
    pub fn from_pairs(pairs: &[(&str, &str)]) -> anyhow::Result<Self> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Self::from_vars(|key| vars.get(key).cloned())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value {raw:?}: {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DATABASE_URL", "postgresql://localhost/taskie_test"),
            ("JWT_SECRET", SECRET),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_pairs(&required()).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.api.client_url, "http://localhost:3000");
        assert!(!config.api.production);
        assert_eq!(config.database.max_connections, 10);
        assert!(config.mail.sendgrid_api_key.is_none());
        assert_eq!(config.mail.sender(), Sender::default());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides() {
        let mut pairs = required();
        pairs.extend([
            ("API_HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("CLIENT_URL", "https://taskie.app"),
            ("APP_ENVIRONMENT", "prod"),
            ("SENDGRID_API_KEY", "SG.key"),
            ("MAIL_FROM_NAME", "Taskie Support"),
            ("LOG_FORMAT", "JSON"),
        ]);
        let config = Config::from_pairs(&pairs).unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.api.client_url, "https://taskie.app");
        assert!(config.api.production);
        assert_eq!(config.mail.sendgrid_api_key.as_deref(), Some("SG.key"));
        assert_eq!(config.mail.sender().to_string(), "Taskie Support <recovery.taskie@gmail.com>");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_missing_database_url() {
        let err = Config::from_pairs(&[("JWT_SECRET", SECRET)]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_short_jwt_secret() {
        let err = Config::from_pairs(&[
            ("DATABASE_URL", "postgresql://localhost/taskie_test"),
            ("JWT_SECRET", "too-short"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("at least 32"));
    }

    #[test]
    fn test_invalid_port() {
        let mut pairs = required();
        pairs.push(("PORT", "eighty"));
        let err = Config::from_pairs(&pairs).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let mut pairs = required();
        pairs.extend([("PORT", "  "), ("SENDGRID_API_KEY", "")]);
        let config = Config::from_pairs(&pairs).unwrap();

        assert_eq!(config.api.port, DEFAULT_PORT);
        assert!(config.mail.sendgrid_api_key.is_none());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let mut pairs = required();
        pairs.push(("SENDGRID_API_KEY", "SG.very-private-key"));
        let config = Config::from_pairs(&pairs).unwrap();
        let printed = format!("{config:?}");

        assert!(!printed.contains(&config.jwt.secret));
        assert!(!printed.contains("SG.very-private-key"));
        assert!(!printed.contains(&config.database.url));
        assert!(printed.contains("[redacted]"));
        assert!(printed.contains(&config.mail.from_email));
    }
}
