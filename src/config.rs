// Configuration lue depuis l'environnement (.env chargé par dotenv dans main)

use std::env;
use std::str::FromStr;

use thiserror::Error;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";
const DEFAULT_BCRYPT_COST: u32 = 12;
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_RATE_LIMIT_CAPACITY: usize = 10_000;
const DEFAULT_GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const DEFAULT_FACEBOOK_GRAPH_URL: &str = "https://graph.facebook.com";
const INSECURE_JWT_SECRET: &str = "default-insecure-key-change-this";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in .env file")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Paramètres SMTP, absents en développement (les emails sont alors journalisés)
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    pub jwt_secret: String,
    pub bcrypt_cost: u32,
    pub google_client_id: Option<String>,
    pub google_tokeninfo_url: String,
    pub facebook_graph_url: String,
    pub smtp: Option<SmtpConfig>,
    pub mail_from: String,
    pub frontend_url: String,
    pub trust_proxy_headers: bool,
    pub rate_limit_capacity: usize,
    pub auto_create_schema: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("DATABASE_URL")?;

        let jwt_secret = match optional("JWT_SECRET") {
            Some(secret) => secret,
            None if cfg!(debug_assertions) => {
                log::warn!("⚠️  JWT_SECRET not found in .env, using default (INSECURE)");
                INSECURE_JWT_SECRET.to_string()
            }
            None => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        let bcrypt_cost = parsed("BCRYPT_COST", DEFAULT_BCRYPT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        let smtp = match optional("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: parsed("SMTP_PORT", DEFAULT_SMTP_PORT)?,
                username: optional("SMTP_USERNAME"),
                password: optional("SMTP_PASSWORD"),
            }),
            None => None,
        };

        Ok(Self {
            database_url,
            bind_address: optional("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            jwt_secret,
            bcrypt_cost,
            google_client_id: optional("GOOGLE_CLIENT_ID"),
            google_tokeninfo_url: optional("GOOGLE_TOKENINFO_URL")
                .unwrap_or_else(|| DEFAULT_GOOGLE_TOKENINFO_URL.to_string()),
            facebook_graph_url: optional("FACEBOOK_GRAPH_URL")
                .unwrap_or_else(|| DEFAULT_FACEBOOK_GRAPH_URL.to_string()),
            smtp,
            mail_from: optional("MAIL_FROM").unwrap_or_else(|| "Le Blog <no-reply@localhost>".to_string()),
            frontend_url: optional("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            trust_proxy_headers: parsed("TRUST_PROXY_HEADERS", false)?,
            rate_limit_capacity: parsed("RATE_LIMIT_CAPACITY", DEFAULT_RATE_LIMIT_CAPACITY)?,
            auto_create_schema: parsed("AUTO_CREATE_SCHEMA", false)?,
        })
    }

    /// Configuration minimale pour les tests (coût bcrypt au plancher)
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            jwt_secret: "test-secret".to_string(),
            bcrypt_cost: 4,
            google_client_id: Some("blog-client-id".to_string()),
            google_tokeninfo_url: DEFAULT_GOOGLE_TOKENINFO_URL.to_string(),
            facebook_graph_url: DEFAULT_FACEBOOK_GRAPH_URL.to_string(),
            smtp: None,
            mail_from: "Le Blog <no-reply@localhost>".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            trust_proxy_headers: false,
            rate_limit_capacity: 1_000,
            auto_create_schema: true,
        }
    }
}

fn optional(key: &'static str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

fn parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
