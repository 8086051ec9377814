// ============================================================================
// SERVICE : AUTHENTIFICATION MEMBRES
// ============================================================================
//
// Flux:
//   - register : crée le membre (non vérifié), envoie le lien de vérification
//   - login : vérifie le mot de passe, ouvre une session
//   - verify_email / reset_password : consomment un token à usage unique
//   - forgot_password : réponse identique que l'email existe ou non
//   - oauth_login : Google / Facebook, même contrat token + session que login
//   - logout / logout_all / revoke_session : suppression de sessions
//   - authenticate : JWT valide + session existante + membre existant
//
// Points d'attention:
//   - Le limiteur de débit passe avant toute écriture
//   - Les échecs de login renvoient tous le même corps, après le même délai
//   - Les emails partent en tâche de fond, un échec ne bloque jamais le flux
//
// ============================================================================

use std::time::Duration;

use chrono::Utc;
use sea_orm::*;
use validator::Validate;

use crate::error::AppError;
use crate::middleware::{AuthMember, ClientInfo};
use crate::models::dto::{
    normalize_email, AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, MemberProfile,
    MemberSummary, OAuthLoginRequest, RegisterRequest, ResetPasswordRequest, SessionResponse, VerifyEmailRequest,
};
use crate::models::members;
use crate::models::oauth_accounts::{self, OAuthProvider};
use crate::models::one_time_tokens::TokenPurpose;
use crate::services::emails;
use crate::services::oauth_service::{OAuthService, Resolution};
use crate::services::one_time_token_service::OneTimeTokenService;
use crate::services::rate_limiter::{RateLimitPolicy, FORGOT_PASSWORD_POLICY, LOGIN_POLICY, REGISTER_POLICY};
use crate::services::session_service::SessionService;
use crate::state::AppState;
use crate::utils::jwt::TokenCheck;
use crate::utils::password::{is_legacy_hash, BCRYPT_MAX_BYTES};

/// Délai appliqué à tout échec de login
const FAILED_LOGIN_DELAY: Duration = Duration::from_millis(100);

pub struct AuthService;

impl AuthService {
    fn enforce_rate_limit(state: &AppState, policy: RateLimitPolicy, client: &ClientInfo) -> Result<(), AppError> {
        if state
            .rate_limiter
            .check(&policy.key(&client.address), policy.limit, policy.window)
        {
            Ok(())
        } else {
            log::warn!("Rate limit hit for {} from {}", policy.action, client.address);
            Err(AppError::RateLimited)
        }
    }

    /// JWT + session pour le membre
    async fn open_session(state: &AppState, member_id: i32, client: &ClientInfo) -> Result<String, AppError> {
        let issued = state.tokens.issue(member_id).map_err(AppError::Internal)?;
        SessionService::create(&state.db, member_id, &issued.token, issued.expires_at, client).await?;
        Ok(issued.token)
    }

    async fn record_login(state: &AppState, member: members::Model) -> Result<members::Model, DbErr> {
        let now = Utc::now();
        let login_count = member.login_count + 1;
        let mut active: members::ActiveModel = member.into();
        active.login_count = Set(login_count);
        active.last_login_at = Set(Some(now));
        active.updated_at = Set(now);
        active.update(&state.db).await
    }

    pub async fn oauth_providers(state: &AppState, member_id: i32) -> Result<Vec<OAuthProvider>, DbErr> {
        let accounts = oauth_accounts::Entity::find()
            .filter(oauth_accounts::Column::MemberId.eq(member_id))
            .order_by_asc(oauth_accounts::Column::Id)
            .all(&state.db)
            .await?;
        Ok(accounts.into_iter().map(|account| account.provider).collect())
    }

    pub async fn profile(state: &AppState, member: &members::Model) -> Result<MemberProfile, AppError> {
        let providers = Self::oauth_providers(state, member.id).await?;
        Ok(MemberProfile::new(member, providers))
    }

    /// POST /register
    pub async fn register(
        state: &AppState,
        client: &ClientInfo,
        mut request: RegisterRequest,
    ) -> Result<(String, MemberSummary), AppError> {
        // 1. Limiteur: 5 inscriptions par heure et par adresse
        Self::enforce_rate_limit(state, REGISTER_POLICY, client)?;

        request.normalize();
        request.validate()?;

        // 2. Email déjà utilisé (mot de passe ou OAuth)
        let existing = members::Entity::find()
            .filter(members::Column::Email.eq(request.email.as_str()))
            .one(&state.db)
            .await?;
        if existing.is_some() {
            return Err(AppError::AccountExists);
        }

        // 3. Hash bcrypt
        let password_hash = state
            .passwords
            .hash_blocking(&request.password)
            .await
            .map_err(AppError::Internal)?;

        // 4-5. Membre + token de vérification, ensemble ou pas du tout
        let now = Utc::now();
        let txn = state.db.begin().await?;
        let member = members::ActiveModel {
            email: Set(request.email.clone()),
            password_hash: Set(Some(password_hash)),
            name: Set(request.name.clone()),
            avatar_url: Set(None),
            bio: Set(None),
            preferred_language: Set(request.preferred_language.unwrap_or_default()),
            is_email_verified: Set(false),
            is_subscriber: Set(false),
            login_count: Set(0),
            last_login_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            // Inscription concurrente avec le même email
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::AccountExists,
            _ => AppError::Database(e),
        })?;

        let verification_token = OneTimeTokenService::issue(&txn, member.id, TokenPurpose::EmailVerification).await?;
        txn.commit().await?;

        log::info!("✅ Member {} registered", member.id);

        // 6. Email de vérification (best-effort)
        state.emails.dispatch(emails::verification(
            &member,
            &state.config.frontend_url,
            &verification_token,
        ));

        // 7. Token utilisable immédiatement, sans attendre la vérification
        let token = Self::open_session(state, member.id, client).await?;
        Ok((token, MemberSummary::from(&member)))
    }

    /// POST /login
    pub async fn login(state: &AppState, client: &ClientInfo, request: LoginRequest) -> Result<AuthResponse, AppError> {
        // 1. Limiteur: 10 tentatives par minute et par adresse
        Self::enforce_rate_limit(state, LOGIN_POLICY, client)?;
        request.validate()?;

        // 2. Membre inconnu ou sans mot de passe: vérification factice, même coût
        let member = members::Entity::find()
            .filter(members::Column::Email.eq(normalize_email(&request.email)))
            .one(&state.db)
            .await?;

        let stored_hash = member.as_ref().and_then(|m| m.password_hash.as_deref());
        let is_valid = match state.passwords.verify_blocking(&request.password, stored_hash).await {
            Ok(valid) => valid,
            Err(e) => {
                log::error!("Password verification error: {}", e);
                false
            }
        };

        // 3. Même délai et même erreur quelle que soit la cause
        let member = match member {
            Some(member) if is_valid => member,
            _ => {
                tokio::time::sleep(FAILED_LOGIN_DELAY).await;
                return Err(AppError::InvalidCredentials);
            }
        };

        // Ancien hash PBKDF2: remplacé par un hash bcrypt s'il tient dans 72 octets
        let upgradable = request.password.len() <= BCRYPT_MAX_BYTES;
        let member = if upgradable && member.password_hash.as_deref().is_some_and(is_legacy_hash) {
            Self::upgrade_legacy_hash(state, member, &request.password).await?
        } else {
            member
        };

        // 4. Statistiques, token et session
        let member = Self::record_login(state, member).await?;
        let token = Self::open_session(state, member.id, client).await?;
        log::info!("Member {} logged in", member.id);

        Ok(AuthResponse {
            token,
            member: Self::profile(state, &member).await?,
        })
    }

    async fn upgrade_legacy_hash(
        state: &AppState,
        member: members::Model,
        password: &str,
    ) -> Result<members::Model, AppError> {
        let password_hash = state
            .passwords
            .hash_blocking(password)
            .await
            .map_err(AppError::Internal)?;

        let member_id = member.id;
        let mut active: members::ActiveModel = member.into();
        active.password_hash = Set(Some(password_hash));
        let member = active.update(&state.db).await?;
        log::info!("Member {} password hash upgraded to bcrypt", member_id);
        Ok(member)
    }

    /// POST /verify-email
    pub async fn verify_email(state: &AppState, request: VerifyEmailRequest) -> Result<(), AppError> {
        request.validate().map_err(|_| AppError::InvalidLink)?;

        // Flag + token consommé dans la même transaction
        let txn = state.db.begin().await?;
        let member_id = OneTimeTokenService::consume(&txn, &request.token, TokenPurpose::EmailVerification).await?;

        let member = members::Entity::find_by_id(member_id)
            .one(&txn)
            .await?
            .ok_or(AppError::InvalidLink)?;
        let was_verified = member.is_email_verified;

        let mut active: members::ActiveModel = member.into();
        active.is_email_verified = Set(true);
        active.updated_at = Set(Utc::now());
        let member = active.update(&txn).await?;
        txn.commit().await?;

        log::info!("Member {} verified their email", member.id);
        if !was_verified {
            state.emails.dispatch(emails::welcome(&member, &state.config.frontend_url));
        }
        Ok(())
    }

    /// POST /forgot-password
    pub async fn forgot_password(
        state: &AppState,
        client: &ClientInfo,
        request: ForgotPasswordRequest,
    ) -> Result<(), AppError> {
        // 1. Limiteur: 3 demandes par heure et par adresse
        Self::enforce_rate_limit(state, FORGOT_PASSWORD_POLICY, client)?;

        let email = normalize_email(&request.email);
        ForgotPasswordRequest { email: email.clone() }.validate()?;

        let member = members::Entity::find()
            .filter(members::Column::Email.eq(email.as_str()))
            .one(&state.db)
            .await?;

        // 2. Membre inconnu: rien à faire, même réponse
        let Some(member) = member else {
            return Ok(());
        };

        // 3. Nouveau token (les précédents sont invalidés), envoyé par email
        let token = OneTimeTokenService::issue(&state.db, member.id, TokenPurpose::PasswordReset).await?;
        state.emails.dispatch(emails::password_reset(&member, &state.config.frontend_url, &token));
        log::info!("Password reset requested for member {}", member.id);
        Ok(())
    }

    /// POST /reset-password
    pub async fn reset_password(state: &AppState, request: ResetPasswordRequest) -> Result<(), AppError> {
        request.validate()?;

        // Lien inconnu ou périmé: rejeté avant le hash bcrypt
        OneTimeTokenService::find_consumable(&state.db, &request.token, TokenPurpose::PasswordReset).await?;

        let password_hash = state
            .passwords
            .hash_blocking(&request.password)
            .await
            .map_err(AppError::Internal)?;

        // Nouveau hash + token consommé + toutes les sessions supprimées, ou rien
        let txn = state.db.begin().await?;
        let member_id = OneTimeTokenService::consume(&txn, &request.token, TokenPurpose::PasswordReset).await?;

        let member = members::Entity::find_by_id(member_id)
            .one(&txn)
            .await?
            .ok_or(AppError::InvalidLink)?;

        let mut active: members::ActiveModel = member.into();
        active.password_hash = Set(Some(password_hash));
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;

        let revoked = SessionService::delete_all_for_member(&txn, member_id).await?;
        txn.commit().await?;

        log::info!("Member {} reset their password, {} session(s) revoked", member_id, revoked);
        Ok(())
    }

    /// POST /oauth
    pub async fn oauth_login(
        state: &AppState,
        client: &ClientInfo,
        request: OAuthLoginRequest,
    ) -> Result<AuthResponse, AppError> {
        request.validate()?;

        let provider: OAuthProvider = request
            .provider
            .parse()
            .map_err(|_| AppError::validation("provider", "Fournisseur non supporté (google ou facebook)"))?;

        // Identité vérifiée auprès du fournisseur, sinon rien ne se passe
        let identity = state.oauth.verify(provider, &request.token).await.map_err(|e| {
            log::warn!("{} token rejected: {}", provider, e);
            AppError::OAuthInvalidToken(provider)
        })?;

        let (member, resolution) = OAuthService::resolve_member(
            &state.db,
            provider,
            &identity,
            &request.token,
            request.preferred_language.unwrap_or_default(),
        )
        .await?;

        match resolution {
            Resolution::Created => {
                log::info!("✅ Member {} created from {}", member.id, provider);
                state.emails.dispatch(emails::welcome(&member, &state.config.frontend_url));
            }
            Resolution::LinkedByEmail => log::info!("{} account linked to member {}", provider, member.id),
            Resolution::ExistingLink => {}
        }

        // Même contrat que le login par mot de passe
        let member = Self::record_login(state, member).await?;
        let token = Self::open_session(state, member.id, client).await?;

        Ok(AuthResponse {
            token,
            member: Self::profile(state, &member).await?,
        })
    }

    /// Résout le membre d'un token: None pour toute cause d'échec
    pub async fn authenticate(state: &AppState, token: &str) -> Result<Option<members::Model>, DbErr> {
        let claims = match state.tokens.inspect(token) {
            TokenCheck::Valid(claims) => claims,
            rejected => {
                log::warn!("Member token rejected: {:?}", rejected);
                return Ok(None);
            }
        };

        // Session supprimée (logout, reset) ou expirée: token révoqué
        let Some(session) = SessionService::find_active(&state.db, token).await? else {
            log::warn!("Member token rejected: no active session");
            return Ok(None);
        };
        if session.member_id != claims.sub {
            log::warn!("Member token rejected: session belongs to another member");
            return Ok(None);
        }

        members::Entity::find_by_id(claims.sub).one(&state.db).await
    }

    /// POST /logout: seulement la session courante
    pub async fn logout(state: &AppState, auth: &AuthMember) -> Result<(), AppError> {
        SessionService::delete_by_token(&state.db, &auth.token).await?;
        Ok(())
    }

    /// POST /logout-all
    pub async fn logout_all(state: &AppState, auth: &AuthMember) -> Result<u64, AppError> {
        let revoked = SessionService::delete_all_for_member(&state.db, auth.member.id).await?;
        log::info!("Member {} logged out everywhere ({} session(s))", auth.member.id, revoked);
        Ok(revoked)
    }

    /// GET /sessions
    pub async fn sessions(state: &AppState, auth: &AuthMember) -> Result<Vec<SessionResponse>, AppError> {
        let sessions = SessionService::list_active(&state.db, auth.member.id).await?;
        Ok(sessions
            .into_iter()
            .map(|session| SessionResponse {
                current: session.token == auth.token,
                id: session.id,
                user_agent: session.user_agent,
                ip_address: session.ip_address,
                created_at: session.created_at,
                expires_at: session.expires_at,
            })
            .collect())
    }

    /// DELETE /sessions/{id}
    pub async fn revoke_session(state: &AppState, auth: &AuthMember, session_id: i32) -> Result<(), AppError> {
        if SessionService::delete_owned(&state.db, auth.member.id, session_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Session introuvable"))
        }
    }

    /// POST /change-password: les autres appareils sont déconnectés
    pub async fn change_password(
        state: &AppState,
        auth: &AuthMember,
        request: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        request.validate()?;

        let Some(current_hash) = auth.member.password_hash.as_deref() else {
            return Err(AppError::InvalidCredentials);
        };

        let is_valid = state
            .passwords
            .verify_blocking(&request.current_password, Some(current_hash))
            .await
            .map_err(AppError::Internal)?;
        if !is_valid {
            tokio::time::sleep(FAILED_LOGIN_DELAY).await;
            return Err(AppError::InvalidCredentials);
        }

        let password_hash = state
            .passwords
            .hash_blocking(&request.new_password)
            .await
            .map_err(AppError::Internal)?;

        let txn = state.db.begin().await?;
        let mut active: members::ActiveModel = auth.member.clone().into();
        active.password_hash = Set(Some(password_hash));
        active.updated_at = Set(Utc::now());
        let member = active.update(&txn).await?;
        let revoked = SessionService::delete_others(&txn, member.id, &auth.token).await?;
        txn.commit().await?;

        log::info!("Member {} changed their password, {} other session(s) revoked", member.id, revoked);
        state.emails.dispatch(emails::password_changed(&member));
        Ok(())
    }
}
