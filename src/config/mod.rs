//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

use crate::util::rate_limit::DEFAULT_SCORE_RATE_LIMIT;

/// Hour (UTC) at which the daily digest goes out when not configured
pub const DEFAULT_DIGEST_HOUR_UTC: u32 = 6;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Supabase backend; the in-memory store is used when absent
    pub supabase: Option<SupabaseConfig>,
    /// Supabase JWT secret for token verification
    pub jwt_secret: String,

    /// Allowed client origins for CORS (comma-separated)
    pub client_origin: String,
    /// Score submissions accepted per second per match
    pub score_rate_limit: u32,

    /// Daily summary email; disabled when absent
    pub digest: Option<DigestConfig>,
}

#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    pub url: String,
    /// Service role key (bypasses RLS - server only!)
    pub service_role_key: String,
}

#[derive(Clone, Debug)]
pub struct DigestConfig {
    pub recipient: String,
    pub mailgun_domain: String,
    pub mailgun_api_key: String,
    pub hour_utc: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration from any variable source
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        // Render provides PORT env var, fall back to SERVER_ADDR or default
        let server_addr = match var("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => var("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        };

        let supabase = match var("SUPABASE_URL") {
            Some(url) => Some(SupabaseConfig {
                url,
                service_role_key: require("SUPABASE_SERVICE_ROLE_KEY")?,
            }),
            None => None,
        };

        let score_rate_limit = match var("SCORE_RATE_LIMIT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("SCORE_RATE_LIMIT"))?,
            None => DEFAULT_SCORE_RATE_LIMIT,
        };

        let digest = match var("SUMMARY_RECIPIENT_EMAIL") {
            Some(recipient) => {
                if !is_valid_email(&recipient) {
                    return Err(ConfigError::InvalidEmail(recipient));
                }
                let hour_utc = match var("DIGEST_HOUR_UTC") {
                    Some(raw) => raw
                        .parse::<u32>()
                        .ok()
                        .filter(|h| *h < 24)
                        .ok_or(ConfigError::InvalidNumber("DIGEST_HOUR_UTC"))?,
                    None => DEFAULT_DIGEST_HOUR_UTC,
                };
                Some(DigestConfig {
                    recipient,
                    mailgun_domain: require("MAILGUN_DOMAIN")?,
                    mailgun_api_key: require("MAILGUN_API_KEY")?,
                    hour_utc,
                })
            }
            None => None,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            supabase,
            jwt_secret: require("SUPABASE_JWT_SECRET")?,
            client_origin: var("CLIENT_ORIGIN").unwrap_or_default(),
            score_rate_limit,
            digest,
        })
    }
}

/// Loose address check: one `@`, non-empty local part, dotted domain, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .map(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
            .unwrap_or(false)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Invalid number in environment variable: {0}")]
    InvalidNumber(&'static str),

    #[error("Invalid email format in SUMMARY_RECIPIENT_EMAIL: {0}")]
    InvalidEmail(String),
}
