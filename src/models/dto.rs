// Requêtes et réponses JSON de l'API membres (camelCase côté client)
use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateUrl, ValidationError};

use crate::models::members::{self, Language};
use crate::models::oauth_accounts::OAuthProvider;
use crate::utils::password::BCRYPT_MAX_BYTES;

const PASSWORD_TOO_LONG_MESSAGE: &str = "Le mot de passe ne doit pas dépasser 72 octets";

const PASSWORD_MESSAGE: &str =
    "Le mot de passe doit contenir au moins 8 caractères, dont une majuscule, une minuscule et un chiffre";

/// Règle de complexité: majuscule, minuscule et chiffre, 72 octets au plus
pub fn password_strength(password: &str) -> Result<(), ValidationError> {
    // `length` compte les caractères, bcrypt compte les octets
    if password.len() > BCRYPT_MAX_BYTES {
        let mut error = ValidationError::new("password_too_long");
        error.message = Some(Cow::Borrowed(PASSWORD_TOO_LONG_MESSAGE));
        return Err(error);
    }

    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if has_upper && has_lower && has_digit {
        Ok(())
    } else {
        let mut error = ValidationError::new("password_strength");
        error.message = Some(Cow::Borrowed(PASSWORD_MESSAGE));
        Err(error)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// ----------------------------------------------------------------------------
// Requêtes
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(
        email(message = "Email invalide"),
        length(max = 255, message = "Email trop long")
    )]
    pub email: String,
    #[validate(
        length(min = 8, message = "Le mot de passe doit contenir au moins 8 caractères"),
        custom(function = "password_strength")
    )]
    pub password: String,
    #[validate(length(min = 2, max = 100, message = "Le nom doit contenir entre 2 et 100 caractères"))]
    pub name: String,
    pub preferred_language: Option<Language>,
}

impl RegisterRequest {
    pub fn normalize(&mut self) {
        self.email = normalize_email(&self.email);
        self.name = self.name.trim().to_string();
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email requis"))]
    pub email: String,
    #[validate(length(min = 1, message = "Mot de passe requis"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyEmailRequest {
    #[validate(length(min = 1, max = 128, message = "Token requis"))]
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(
        email(message = "Email invalide"),
        length(max = 255, message = "Email trop long")
    )]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, max = 128, message = "Token requis"))]
    pub token: String,
    #[validate(
        length(min = 8, message = "Le mot de passe doit contenir au moins 8 caractères"),
        custom(function = "password_strength")
    )]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OAuthLoginRequest {
    #[validate(length(min = 1, message = "Fournisseur requis"))]
    pub provider: String,
    #[validate(length(min = 1, message = "Token requis"))]
    pub token: String,
    pub preferred_language: Option<Language>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 100, message = "Le nom doit contenir entre 2 et 100 caractères"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "La bio ne doit pas dépasser 500 caractères"))]
    pub bio: Option<String>,
    #[validate(length(max = 500, message = "URL trop longue"))]
    pub avatar_url: Option<String>,
    pub preferred_language: Option<Language>,
    pub is_subscriber: Option<bool>,
}

impl UpdateProfileRequest {
    pub fn normalize(&mut self) {
        self.name = self.name.take().map(|name| name.trim().to_string());
        self.bio = self.bio.take().map(|bio| bio.trim().to_string());
        self.avatar_url = self.avatar_url.take().map(|url| url.trim().to_string());
    }

    /// Une chaîne vide efface l'avatar, sinon l'URL doit être valide
    pub fn validate_all(&self) -> Result<(), crate::error::AppError> {
        self.validate()?;
        if let Some(url) = self.avatar_url.as_deref().filter(|url| !url.is_empty()) {
            if !url.validate_url() {
                return Err(crate::error::AppError::validation("avatarUrl", "URL invalide"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Mot de passe actuel requis"))]
    pub current_password: String,
    #[validate(
        length(min = 8, message = "Le mot de passe doit contenir au moins 8 caractères"),
        custom(function = "password_strength")
    )]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReadingProgressRequest {
    #[validate(range(min = 1, message = "Article invalide"))]
    pub article_id: i32,
    #[validate(range(min = 0, max = 100, message = "La progression doit être entre 0 et 100"))]
    pub progress: Option<i32>,
}

// ----------------------------------------------------------------------------
// Réponses
// ----------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Projection partielle renvoyée à l'inscription
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub is_email_verified: bool,
}

impl From<&members::Model> for MemberSummary {
    fn from(member: &members::Model) -> Self {
        Self {
            id: member.id,
            email: member.email.clone(),
            name: member.name.clone(),
            is_email_verified: member.is_email_verified,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub preferred_language: Language,
    pub is_email_verified: bool,
    pub is_subscriber: bool,
    pub login_count: i32,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub has_password: bool,
    pub oauth_providers: Vec<OAuthProvider>,
}

impl MemberProfile {
    pub fn new(member: &members::Model, oauth_providers: Vec<OAuthProvider>) -> Self {
        Self {
            id: member.id,
            email: member.email.clone(),
            name: member.name.clone(),
            avatar_url: member.avatar_url.clone(),
            bio: member.bio.clone(),
            preferred_language: member.preferred_language,
            is_email_verified: member.is_email_verified,
            is_subscriber: member.is_subscriber,
            login_count: member.login_count,
            last_login_at: member.last_login_at,
            created_at: member.created_at,
            has_password: member.password_hash.is_some(),
            oauth_providers,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub token: String,
    pub member: MemberSummary,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub member: MemberProfile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: i32,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub current: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    pub article_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingHistoryResponse {
    pub article_id: i32,
    pub progress: i32,
    pub last_read_at: DateTime<Utc>,
}
