use actix_web::{delete, get, post, web, HttpResponse};

use crate::error::AppError;
use crate::middleware::{AuthMember, ClientInfo};
use crate::models::dto::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, MessageResponse, OAuthLoginRequest, RegisterRequest,
    RegisterResponse, ResetPasswordRequest, VerifyEmailRequest,
};
use crate::services::auth_service::AuthService;
use crate::state::AppState;

/// Réponse identique que l'email existe ou non
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "Si un compte existe avec cet email, un lien de réinitialisation vient d'être envoyé";

/// POST /api/members/register - Créer un compte (PUBLIC)
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    client: ClientInfo,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let (token, member) = AuthService::register(&state, &client, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(RegisterResponse { token, member }))
}

/// POST /api/members/login - Se connecter (PUBLIC)
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    client: ClientInfo,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let response = AuthService::login(&state, &client, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/members/verify-email - Consommer le lien de vérification (PUBLIC)
#[post("/verify-email")]
pub async fn verify_email(
    state: web::Data<AppState>,
    body: web::Json<VerifyEmailRequest>,
) -> Result<HttpResponse, AppError> {
    AuthService::verify_email(&state, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Adresse email vérifiée",
    }))
}

/// POST /api/members/forgot-password - Demander un lien de reset (PUBLIC)
#[post("/forgot-password")]
pub async fn forgot_password(
    state: web::Data<AppState>,
    client: ClientInfo,
    body: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    AuthService::forgot_password(&state, &client, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: FORGOT_PASSWORD_MESSAGE,
    }))
}

/// POST /api/members/reset-password - Choisir un nouveau mot de passe (PUBLIC)
#[post("/reset-password")]
pub async fn reset_password(
    state: web::Data<AppState>,
    body: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    AuthService::reset_password(&state, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Mot de passe modifié, veuillez vous reconnecter",
    }))
}

/// POST /api/members/oauth - Connexion Google / Facebook (PUBLIC)
#[post("/oauth")]
pub async fn oauth_login(
    state: web::Data<AppState>,
    client: ClientInfo,
    body: web::Json<OAuthLoginRequest>,
) -> Result<HttpResponse, AppError> {
    let response = AuthService::oauth_login(&state, &client, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/members/me - Profil du membre connecté (PROTÉGÉE)
#[get("/me")]
pub async fn me(state: web::Data<AppState>, auth: AuthMember) -> Result<HttpResponse, AppError> {
    let profile = AuthService::profile(&state, &auth.member).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// POST /api/members/logout - Déconnecter cet appareil (PROTÉGÉE)
#[post("/logout")]
pub async fn logout(state: web::Data<AppState>, auth: AuthMember) -> Result<HttpResponse, AppError> {
    AuthService::logout(&state, &auth).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Déconnexion réussie",
    }))
}

/// POST /api/members/logout-all - Déconnecter tous les appareils (PROTÉGÉE)
#[post("/logout-all")]
pub async fn logout_all(state: web::Data<AppState>, auth: AuthMember) -> Result<HttpResponse, AppError> {
    AuthService::logout_all(&state, &auth).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Tous les appareils ont été déconnectés",
    }))
}

/// GET /api/members/sessions - Appareils connectés (PROTÉGÉE)
#[get("/sessions")]
pub async fn list_sessions(state: web::Data<AppState>, auth: AuthMember) -> Result<HttpResponse, AppError> {
    let sessions = AuthService::sessions(&state, &auth).await?;
    Ok(HttpResponse::Ok().json(sessions))
}

/// DELETE /api/members/sessions/{id} - Déconnecter un appareil (PROTÉGÉE)
#[delete("/sessions/{id}")]
pub async fn revoke_session(
    state: web::Data<AppState>,
    auth: AuthMember,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    AuthService::revoke_session(&state, &auth, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/members/change-password - Changer son mot de passe (PROTÉGÉE)
#[post("/change-password")]
pub async fn change_password(
    state: web::Data<AppState>,
    auth: AuthMember,
    body: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, AppError> {
    AuthService::change_password(&state, &auth, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Mot de passe modifié",
    }))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(verify_email)
        .service(forgot_password)
        .service(reset_password)
        .service(oauth_login)
        .service(me)
        .service(logout)
        .service(logout_all)
        .service(list_sessions)
        .service(revoke_session)
        .service(change_password);
}
