use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;

use crate::error::AppError;
use crate::models::members;
use crate::services::auth_service::AuthService;
use crate::state::AppState;

/// Membre authentifié par le header Authorization: Bearer <token>
/// Utilisé comme extracteur dans les routes protégées
#[derive(Debug, Clone)]
pub struct AuthMember {
    pub member: members::Model,
    pub token: String,
}

/// Extrait le token du header, sans le vérifier
pub fn bearer_token(req: &HttpRequest) -> Result<String, AppError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AppError::AuthenticationRequired)?
        .to_str()
        .map_err(|_| AppError::AuthenticationRequired)?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(AppError::AuthenticationRequired),
    }
}

/// Implémentation de FromRequest pour AuthMember
/// Vérifie le JWT puis la session et recharge le membre depuis la base
impl FromRequest for AuthMember {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let token = token?;
            let state = state.ok_or_else(|| AppError::Internal("AppState is not registered".to_string()))?;

            match AuthService::authenticate(&state, &token).await? {
                Some(member) => Ok(AuthMember { member, token }),
                None => Err(AppError::InvalidToken),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_token_parsing() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc.def.ghi"))
            .to_http_request();
        assert_eq!(bearer_token(&req).unwrap(), "abc.def.ghi");

        let missing = TestRequest::default().to_http_request();
        assert!(matches!(bearer_token(&missing), Err(AppError::AuthenticationRequired)));

        let basic = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic dXNlcjpwYXNz"))
            .to_http_request();
        assert!(matches!(bearer_token(&basic), Err(AppError::AuthenticationRequired)));

        let empty = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer "))
            .to_http_request();
        assert!(matches!(bearer_token(&empty), Err(AppError::AuthenticationRequired)));
    }
}
