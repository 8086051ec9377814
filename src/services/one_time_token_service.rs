use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;

use crate::error::AppError;
use crate::models::one_time_tokens::{self, TokenPurpose};
use crate::utils::secure_token;

/// Cycle de vie commun des tokens email: émission puis consommation unique
pub struct OneTimeTokenService;

impl OneTimeTokenService {
    /// Crée un token pour le membre et retourne sa valeur brute (à envoyer par email)
    pub async fn issue<C: ConnectionTrait>(
        db: &C,
        member_id: i32,
        purpose: TokenPurpose,
    ) -> Result<String, DbErr> {
        let now = Utc::now();

        // 1. Au plus un token actif: les précédents sont marqués utilisés
        if purpose.single_active() {
            one_time_tokens::Entity::update_many()
                .col_expr(one_time_tokens::Column::UsedAt, Expr::value(now))
                .filter(one_time_tokens::Column::MemberId.eq(member_id))
                .filter(one_time_tokens::Column::Purpose.eq(purpose))
                .filter(one_time_tokens::Column::UsedAt.is_null())
                .exec(db)
                .await?;
        }

        // 2. Nouveau token, seule l'empreinte est stockée
        let token = secure_token::generate();
        one_time_tokens::ActiveModel {
            member_id: Set(member_id),
            purpose: Set(purpose),
            token_hash: Set(secure_token::fingerprint(&token)),
            expires_at: Set(now + purpose.lifetime()),
            used_at: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        Ok(token)
    }

    /// Token encore utilisable, sans le consommer
    /// Inconnu, déjà utilisé, expiré ou d'un autre usage: même erreur
    pub async fn find_consumable<C: ConnectionTrait>(
        db: &C,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<one_time_tokens::Model, AppError> {
        let now = Utc::now();

        one_time_tokens::Entity::find()
            .filter(one_time_tokens::Column::TokenHash.eq(secure_token::fingerprint(token)))
            .filter(one_time_tokens::Column::Purpose.eq(purpose))
            .one(db)
            .await?
            .filter(|row| row.is_consumable(now))
            .ok_or(AppError::InvalidLink)
    }

    /// Consomme le token (dans la transaction de l'appelant) et retourne l'id du membre
    pub async fn consume<C: ConnectionTrait>(
        db: &C,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<i32, AppError> {
        let now = Utc::now();
        let row = Self::find_consumable(db, token, purpose).await?;

        // Le filtre used_at IS NULL garde la consommation unique entre deux requêtes concurrentes
        let result = one_time_tokens::Entity::update_many()
            .col_expr(one_time_tokens::Column::UsedAt, Expr::value(now))
            .filter(one_time_tokens::Column::Id.eq(row.id))
            .filter(one_time_tokens::Column::UsedAt.is_null())
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::InvalidLink);
        }

        Ok(row.member_id)
    }
}
