// ============================================================================
// ERREURS API
// ============================================================================
//
// Chaque variante correspond à un statut HTTP, un code stable lisible par
// le frontend et un message en français.
//
// Format de la réponse:
//   { "error": "...", "code": "...", "details": [{ "field": "...", "message": "..." }] }
//
// Points d'attention:
//   - Les erreurs d'authentification ne disent jamais quel facteur a échoué
//   - Les erreurs de base de données sont journalisées, jamais renvoyées telles quelles
//
// ============================================================================

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::models::oauth_accounts::OAuthProvider;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Données invalides")]
    Validation(Vec<FieldError>),

    #[error("Authentification requise")]
    AuthenticationRequired,

    #[error("Session invalide ou expirée")]
    InvalidToken,

    #[error("Email ou mot de passe incorrect")]
    InvalidCredentials,

    #[error("Lien invalide ou expiré")]
    InvalidLink,

    #[error("Token {0} invalide")]
    OAuthInvalidToken(OAuthProvider),

    #[error("Un compte existe déjà avec cet email")]
    AccountExists,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Trop de tentatives, veuillez réessayer plus tard")]
    RateLimited,

    #[error("Erreur de base de données: {0}")]
    Database(#[from] DbErr),

    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a [FieldError]>,
}

impl AppError {
    pub fn validation(field: &str, message: &str) -> Self {
        AppError::Validation(vec![FieldError {
            field: field.to_string(),
            message: message.to_string(),
        }])
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_failed",
            AppError::AuthenticationRequired => "authentication_required",
            AppError::InvalidToken => "invalid_token",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidLink => "invalid_link",
            AppError::OAuthInvalidToken(_) => "oauth_invalid_token",
            AppError::AccountExists => "account_exists",
            AppError::NotFound(_) => "not_found",
            AppError::RateLimited => "rate_limited",
            AppError::Database(_) | AppError::Internal(_) => "internal_error",
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| format!("Valeur invalide ({})", error.code)),
                })
            })
            .collect();
        // HashMap: ordre stable pour des réponses reproductibles
        details.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::Validation(details)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidLink => StatusCode::BAD_REQUEST,
            AppError::AuthenticationRequired
            | AppError::InvalidToken
            | AppError::InvalidCredentials
            | AppError::OAuthInvalidToken(_) => StatusCode::UNAUTHORIZED,
            AppError::AccountExists => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::Database(e) => {
                log::error!("Database error: {}", e);
                "Erreur interne du serveur".to_string()
            }
            AppError::Internal(e) => {
                log::error!("Internal error: {}", e);
                "Erreur interne du serveur".to_string()
            }
            other => other.to_string(),
        };

        let details = match self {
            AppError::Validation(details) => Some(details.as_slice()),
            _ => None,
        };

        HttpResponse::build(self.status_code()).json(ErrorBody {
            error,
            code: self.code(),
            details,
        })
    }
}
