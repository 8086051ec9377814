//! Connexion Google / Facebook.
//!
//! Le frontend obtient un token auprès du fournisseur et nous le transmet.
//! On vérifie ce token auprès du fournisseur (tokeninfo pour Google, Graph API
//! pour Facebook) puis on retrouve, rattache ou crée le membre correspondant.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use sea_orm::*;
use serde::Deserialize;
use serde_json::Value;

use crate::config::AppConfig;
use crate::models::members::{self, Language};
use crate::models::oauth_accounts::{self, OAuthProvider};

/// Identité confirmée par le fournisseur
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderIdentity {
    pub provider_id: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Erreur en texte libre: journalisée, jamais renvoyée au client
    async fn verify(&self, token: &str) -> Result<ProviderIdentity, String>;
}

fn http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|_| Client::new())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// ----------------------------------------------------------------------------
// Google
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GoogleTokenInfo {
    sub: Option<String>,
    email: Option<String>,
    email_verified: Option<Value>, // "true" (tokeninfo) ou true selon l'endpoint
    aud: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

pub struct GoogleProvider {
    http: Client,
    tokeninfo_url: String,
    client_id: Option<String>,
}

impl GoogleProvider {
    pub fn new(tokeninfo_url: &str, client_id: Option<String>) -> Self {
        Self {
            http: http_client(),
            tokeninfo_url: tokeninfo_url.to_string(),
            client_id,
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    async fn verify(&self, token: &str) -> Result<ProviderIdentity, String> {
        let response = self
            .http
            .get(&self.tokeninfo_url)
            .query(&[("id_token", token)])
            .send()
            .await
            .map_err(|e| format!("tokeninfo request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("tokeninfo returned {}", response.status()));
        }

        let info: GoogleTokenInfo = response
            .json()
            .await
            .map_err(|e| format!("invalid tokeninfo payload: {}", e))?;

        // Audience vérifiée seulement si un client id est configuré
        if let Some(expected) = &self.client_id {
            if info.aud.as_deref() != Some(expected.as_str()) {
                return Err(format!("audience mismatch: {:?}", info.aud));
            }
        }

        let unverified = matches!(&info.email_verified, Some(Value::Bool(false)))
            || matches!(&info.email_verified, Some(Value::String(s)) if s == "false");
        if unverified {
            return Err("email not verified by Google".to_string());
        }

        Ok(ProviderIdentity {
            provider_id: non_empty(info.sub).ok_or("missing subject")?,
            email: non_empty(info.email).ok_or("missing email")?.to_lowercase(),
            name: non_empty(info.name),
            avatar_url: non_empty(info.picture),
        })
    }
}

// ----------------------------------------------------------------------------
// Facebook
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FacebookPictureData {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FacebookPicture {
    data: Option<FacebookPictureData>,
}

#[derive(Debug, Deserialize)]
struct FacebookProfile {
    id: Option<String>,
    name: Option<String>,
    email: Option<String>,
    picture: Option<FacebookPicture>,
}

pub struct FacebookProvider {
    http: Client,
    graph_url: String,
}

impl FacebookProvider {
    pub fn new(graph_url: &str) -> Self {
        Self {
            http: http_client(),
            graph_url: graph_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for FacebookProvider {
    async fn verify(&self, token: &str) -> Result<ProviderIdentity, String> {
        let response = self
            .http
            .get(format!("{}/me", self.graph_url))
            .query(&[("fields", "id,name,email,picture"), ("access_token", token)])
            .send()
            .await
            .map_err(|e| format!("graph request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("graph returned {}", response.status()));
        }

        let profile: FacebookProfile = response
            .json()
            .await
            .map_err(|e| format!("invalid graph payload: {}", e))?;

        Ok(ProviderIdentity {
            provider_id: non_empty(profile.id).ok_or("missing id")?,
            email: non_empty(profile.email).ok_or("missing email")?.to_lowercase(),
            name: non_empty(profile.name),
            avatar_url: non_empty(profile.picture.and_then(|p| p.data).and_then(|d| d.url)),
        })
    }
}

// ----------------------------------------------------------------------------
// Pont OAuth
// ----------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct OAuthBridge {
    providers: HashMap<OAuthProvider, Arc<dyn IdentityProvider>>,
}

impl OAuthBridge {
    pub fn from_config(config: &AppConfig) -> Self {
        Self::default()
            .with_provider(
                OAuthProvider::Google,
                Arc::new(GoogleProvider::new(&config.google_tokeninfo_url, config.google_client_id.clone())),
            )
            .with_provider(
                OAuthProvider::Facebook,
                Arc::new(FacebookProvider::new(&config.facebook_graph_url)),
            )
    }

    pub fn with_provider(mut self, provider: OAuthProvider, implementation: Arc<dyn IdentityProvider>) -> Self {
        self.providers.insert(provider, implementation);
        self
    }

    pub async fn verify(&self, provider: OAuthProvider, token: &str) -> Result<ProviderIdentity, String> {
        match self.providers.get(&provider) {
            Some(implementation) => implementation.verify(token).await,
            None => Err(format!("provider {} is not configured", provider)),
        }
    }
}

/// Comment le membre a été résolu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    ExistingLink,
    LinkedByEmail,
    Created,
}

pub struct OAuthService;

impl OAuthService {
    /// 1. Compte OAuth déjà lié: même membre, access token rafraîchi
    /// 2. Membre existant avec cet email: nouveau lien
    /// 3. Sinon: nouveau membre (email déjà vérifié) + lien
    pub async fn resolve_member(
        db: &DatabaseConnection,
        provider: OAuthProvider,
        identity: &ProviderIdentity,
        access_token: &str,
        language: Language,
    ) -> Result<(members::Model, Resolution), DbErr> {
        match Self::resolve_once(db, provider, identity, access_token, language).await {
            // Première connexion simultanée pour la même identité: l'autre requête a créé le membre
            Err(e) if is_unique_violation(&e) => {
                log::warn!("Concurrent {} sign-in for {}, resolving again", provider, identity.provider_id);
                Self::resolve_once(db, provider, identity, access_token, language).await
            }
            result => result,
        }
    }

    async fn resolve_once(
        db: &DatabaseConnection,
        provider: OAuthProvider,
        identity: &ProviderIdentity,
        access_token: &str,
        language: Language,
    ) -> Result<(members::Model, Resolution), DbErr> {
        let now = Utc::now();
        let txn = db.begin().await?;

        let linked = oauth_accounts::Entity::find()
            .filter(oauth_accounts::Column::Provider.eq(provider))
            .filter(oauth_accounts::Column::ProviderId.eq(identity.provider_id.as_str()))
            .one(&txn)
            .await?;

        if let Some(account) = linked {
            let member_id = account.member_id;
            let mut active: oauth_accounts::ActiveModel = account.into();
            active.access_token = Set(Some(access_token.to_string()));
            active.updated_at = Set(now);
            active.update(&txn).await?;

            let member = members::Entity::find_by_id(member_id)
                .one(&txn)
                .await?
                .ok_or_else(|| DbErr::RecordNotFound(format!("member {} of oauth account", member_id)))?;

            txn.commit().await?;
            return Ok((member, Resolution::ExistingLink));
        }

        let existing = members::Entity::find()
            .filter(members::Column::Email.eq(identity.email.as_str()))
            .one(&txn)
            .await?;

        let (member, resolution) = match existing {
            Some(member) => {
                // Le fournisseur a vérifié l'adresse
                let member = if member.is_email_verified {
                    member
                } else {
                    let mut active: members::ActiveModel = member.into();
                    active.is_email_verified = Set(true);
                    active.updated_at = Set(now);
                    active.update(&txn).await?
                };
                (member, Resolution::LinkedByEmail)
            }
            None => (Self::create_member(&txn, identity, language).await?, Resolution::Created),
        };

        oauth_accounts::ActiveModel {
            member_id: Set(member.id),
            provider: Set(provider),
            provider_id: Set(identity.provider_id.clone()),
            access_token: Set(Some(access_token.to_string())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok((member, resolution))
    }

    async fn create_member<C: ConnectionTrait>(
        db: &C,
        identity: &ProviderIdentity,
        language: Language,
    ) -> Result<members::Model, DbErr> {
        let now = Utc::now();
        members::ActiveModel {
            email: Set(identity.email.clone()),
            password_hash: Set(None),
            name: Set(display_name(identity)),
            avatar_url: Set(identity.avatar_url.clone()),
            bio: Set(None),
            preferred_language: Set(language),
            is_email_verified: Set(true),
            is_subscriber: Set(false),
            login_count: Set(0),
            last_login_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }
}

fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Nom affiché: celui du fournisseur, sinon la partie locale de l'email (2 à 100 caractères)
fn display_name(identity: &ProviderIdentity) -> String {
    let base = identity
        .name
        .clone()
        .unwrap_or_else(|| identity.email.split('@').next().unwrap_or_default().to_string());

    let mut name: String = base.trim().chars().take(100).collect();
    while name.chars().count() < 2 {
        name.push('_');
    }
    name
}
