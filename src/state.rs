use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::services::mailer::{EmailDispatcher, Mailer};
use crate::services::oauth_service::OAuthBridge;
use crate::services::rate_limiter::{InMemoryRateLimiter, RateLimiter};
use crate::utils::jwt::TokenIssuer;
use crate::utils::password::PasswordHasher;

/// Dépendances partagées par les routes (web::Data<AppState>)
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub tokens: TokenIssuer,
    pub passwords: PasswordHasher,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub emails: EmailDispatcher,
    pub oauth: OAuthBridge,
}

impl AppState {
    /// Doit être appelé dans le runtime (démarre la tâche d'envoi des emails)
    pub fn new(
        config: AppConfig,
        db: DatabaseConnection,
        mailer: Arc<dyn Mailer>,
        oauth: OAuthBridge,
    ) -> Result<Self, String> {
        Ok(Self {
            tokens: TokenIssuer::new(&config.jwt_secret),
            passwords: PasswordHasher::new(config.bcrypt_cost)?,
            rate_limiter: Arc::new(InMemoryRateLimiter::new(config.rate_limit_capacity)),
            emails: EmailDispatcher::start(mailer),
            oauth,
            db,
            config,
        })
    }
}
