// Outils partagés par les tests: base SQLite en mémoire, jeux de données,
// état applicatif avec un mailer qui enregistre et des fournisseurs OAuth factices.

use std::collections::HashMap;
use std::sync::Arc;

use actix_web::web;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::*;

use crate::config::AppConfig;
use crate::db::{create_schema, establish_connection};
use crate::models::oauth_accounts::OAuthProvider;
use crate::models::{articles, members};
use crate::services::mailer::testing::RecordingMailer;
use crate::services::oauth_service::{IdentityProvider, OAuthBridge, ProviderIdentity};
use crate::state::AppState;

pub async fn test_db() -> DatabaseConnection {
    let db = establish_connection(&AppConfig::for_tests())
        .await
        .expect("sqlite in-memory connection");
    create_schema(&db).await.expect("schema creation");
    db
}

pub async fn insert_member(db: &DatabaseConnection, email: &str, password_hash: Option<&str>) -> members::Model {
    let now = Utc::now();
    members::ActiveModel {
        email: Set(email.to_string()),
        password_hash: Set(password_hash.map(str::to_string)),
        name: Set("Ana Lectrice".to_string()),
        avatar_url: Set(None),
        bio: Set(None),
        preferred_language: Set(members::Language::Fr),
        is_email_verified: Set(false),
        is_subscriber: Set(false),
        login_count: Set(0),
        last_login_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert member")
}

pub async fn insert_article(db: &DatabaseConnection, slug: &str, published: bool) -> articles::Model {
    articles::ActiveModel {
        slug: Set(slug.to_string()),
        title_fr: Set(slug.replace('-', " ")),
        title_en: Set(None),
        published: Set(published),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert article")
}

/// Fournisseur factice: chaque token connu correspond à une identité
#[derive(Default)]
pub struct StubProvider {
    identities: HashMap<String, ProviderIdentity>,
}

impl StubProvider {
    pub fn with_identity(mut self, token: &str, identity: ProviderIdentity) -> Self {
        self.identities.insert(token.to_string(), identity);
        self
    }
}

#[async_trait]
impl IdentityProvider for StubProvider {
    async fn verify(&self, token: &str) -> Result<ProviderIdentity, String> {
        self.identities
            .get(token)
            .cloned()
            .ok_or_else(|| "unknown token".to_string())
    }
}

pub fn identity(provider_id: &str, email: &str) -> ProviderIdentity {
    ProviderIdentity {
        provider_id: provider_id.to_string(),
        email: email.to_string(),
        name: Some("Ana Lectrice".to_string()),
        avatar_url: None,
    }
}

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub mailer: Arc<RecordingMailer>,
}

/// Google répond à "google-token" (id g-123), Facebook à "facebook-token" (id fb-456)
pub async fn test_context() -> TestContext {
    test_context_with_mailer(RecordingMailer::default()).await
}

pub async fn test_context_with_mailer(mailer: RecordingMailer) -> TestContext {
    let google = StubProvider::default().with_identity("google-token", identity("g-123", "ana@example.com"));
    let facebook = StubProvider::default().with_identity("facebook-token", identity("fb-456", "ana@example.com"));
    let oauth = OAuthBridge::default()
        .with_provider(OAuthProvider::Google, Arc::new(google))
        .with_provider(OAuthProvider::Facebook, Arc::new(facebook));

    let mailer = Arc::new(mailer);
    let state = AppState::new(AppConfig::for_tests(), test_db().await, mailer.clone(), oauth).expect("app state");

    TestContext {
        state: web::Data::new(state),
        mailer,
    }
}
