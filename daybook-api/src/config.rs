/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: *)
/// - `STORE_BACKEND`: `elastic` or `memory` (default: elastic)
/// - `STORE_URL`: Document store URL (default: http://localhost:9200)
/// - `STORE_INDEX_PREFIX`: Index name prefix (default: daybook)
/// - `MAIL_API_URL`: Mail provider endpoint (default: SendGrid v3)
/// - `MAIL_API_KEY`: Mail provider key; without it mail is only logged
/// - `MAIL_FROM`: Sender address (default: no-reply@daybook.app)
/// - `SITE_URL`: Base URL used in mailed links (default: http://localhost:3000)
/// - `RESET_TOKEN_TTL_HOURS`: Reset link lifetime (default: 24)
/// - `JWT_SECRET`: Secret key for session token signing (required)
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use daybook_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use daybook_shared::config::{ServiceConfig, MAX_RESET_TOKEN_TTL_HOURS};
use std::env;

/// Default mail provider endpoint
pub const DEFAULT_MAIL_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Document store configuration
    pub store: StoreConfig,

    /// Mail provider configuration
    pub mail: MailConfig,

    /// Session token configuration
    pub jwt: JwtConfig,

    /// Settings handed to the service layer
    pub service: ServiceConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

/// Which document store to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Elastic,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "elastic" | "elasticsearch" => Ok(StoreBackend::Elastic),
            "memory" => Ok(StoreBackend::Memory),
            other => anyhow::bail!("Unknown STORE_BACKEND '{}' (expected elastic or memory)", other),
        }
    }
}

/// Document store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub url: String,
    pub index_prefix: String,
}

/// Mail provider configuration
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,

    /// Without a key, mail goes to the logging outbox
    pub api_key: Option<String>,
}

/// Session token configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `JWT_SECRET` is missing or shorter than 32 characters
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;
        let cors_origins = parse_origins(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let backend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "elastic".to_string())
            .parse::<StoreBackend>()?;
        let store_url = env::var("STORE_URL").unwrap_or_else(|_| "http://localhost:9200".to_string());
        let index_prefix = env::var("STORE_INDEX_PREFIX").unwrap_or_else(|_| "daybook".to_string());

        let mail_api_url = env::var("MAIL_API_URL").unwrap_or_else(|_| DEFAULT_MAIL_API_URL.to_string());
        let mail_api_key = env::var("MAIL_API_KEY").ok().filter(|key| !key.trim().is_empty());

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let defaults = ServiceConfig::default();
        let reset_token_ttl_hours = match env::var("RESET_TOKEN_TTL_HOURS") {
            Ok(raw) => parse_reset_ttl(&raw)?,
            Err(_) => defaults.reset_token_ttl_hours,
        };

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
            },
            store: StoreConfig {
                backend,
                url: store_url,
                index_prefix,
            },
            mail: MailConfig {
                api_url: mail_api_url,
                api_key: mail_api_key,
            },
            jwt: JwtConfig { secret: jwt_secret },
            service: ServiceConfig {
                reset_token_ttl_hours,
                site_url: env::var("SITE_URL").unwrap_or(defaults.site_url),
                product_name: defaults.product_name,
                mail_from: env::var("MAIL_FROM").unwrap_or(defaults.mail_from),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses `RESET_TOKEN_TTL_HOURS`, bounded to 1..=[`MAX_RESET_TOKEN_TTL_HOURS`]
fn parse_reset_ttl(raw: &str) -> anyhow::Result<i64> {
    let hours: i64 = raw.trim().parse()?;
    if !(1..=MAX_RESET_TOKEN_TTL_HOURS).contains(&hours) {
        anyhow::bail!(
            "RESET_TOKEN_TTL_HOURS must be between 1 and {}",
            MAX_RESET_TOKEN_TTL_HOURS
        );
    }
    Ok(hours)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                url: "http://localhost:9200".to_string(),
                index_prefix: "daybook".to_string(),
            },
            mail: MailConfig {
                api_url: DEFAULT_MAIL_API_URL.to_string(),
                api_key: None,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            },
            service: ServiceConfig::default(),
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_store_backend_parsing() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!(" Elastic ".parse::<StoreBackend>().unwrap(), StoreBackend::Elastic);
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_parse_reset_ttl_bounds() {
        assert_eq!(parse_reset_ttl("12").unwrap(), 12);
        assert_eq!(parse_reset_ttl(" 1 ").unwrap(), 1);
        assert_eq!(
            parse_reset_ttl(&MAX_RESET_TOKEN_TTL_HOURS.to_string()).unwrap(),
            MAX_RESET_TOKEN_TTL_HOURS
        );

        assert!(parse_reset_ttl("0").is_err());
        assert!(parse_reset_ttl("-3").is_err());
        assert!(parse_reset_ttl("8785").is_err());
        assert!(parse_reset_ttl("9223372036854775807").is_err());
        assert!(parse_reset_ttl("a day").is_err());
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("https://a.test, https://b.test,,"),
            vec!["https://a.test", "https://b.test"]
        );
        assert_eq!(parse_origins("*"), vec!["*"]);
    }
}
