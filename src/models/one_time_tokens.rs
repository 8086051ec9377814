// ============================================================================
// MODÈLE : ONE TIME TOKENS
// ============================================================================
//
// Description:
//   Tokens à usage unique envoyés par email: vérification d'adresse (24h)
//   et réinitialisation de mot de passe (1h). Une seule table, la colonne
//   purpose distingue les deux usages.
//
// Colonnes de la table one_time_tokens:
//   - id (INTEGER, PRIMARY KEY, SERIAL)
//   - member_id (INTEGER, NOT NULL, FK vers members)
//   - purpose ('email_verification' | 'password_reset')
//   - token_hash (VARCHAR(64), UNIQUE) - SHA-256 hex du token envoyé
//   - expires_at (TIMESTAMPTZ, NOT NULL)
//   - used_at (TIMESTAMPTZ, NULL) - renseigné à la consommation ou à l'invalidation
//   - created_at (TIMESTAMPTZ)
//
// Workflow (vérification email):
//   1. POST /register crée le membre avec is_email_verified = false
//   2. Un token est généré, seule son empreinte est stockée ici
//   3. Le lien de l'email contient le token brut
//   4. POST /verify-email: empreinte trouvée, non utilisée, non expirée
//   5. Dans une transaction: is_email_verified = true et used_at = now
//
// Points d'attention:
//   - Un token ne peut être consommé qu'une fois (used_at non NULL)
//   - Un nouveau token de reset invalide les précédents du même membre
//   - ON DELETE CASCADE: si le membre est supprimé, ses tokens aussi
//
// ============================================================================

use chrono::Duration;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    #[sea_orm(string_value = "email_verification")]
    EmailVerification,
    #[sea_orm(string_value = "password_reset")]
    PasswordReset,
}

impl TokenPurpose {
    pub fn lifetime(&self) -> Duration {
        match self {
            TokenPurpose::EmailVerification => Duration::hours(24),
            TokenPurpose::PasswordReset => Duration::hours(1),
        }
    }

    /// Au plus un token actif par membre pour cet usage
    pub fn single_active(&self) -> bool {
        matches!(self, TokenPurpose::PasswordReset)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "one_time_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub member_id: i32,

    pub purpose: TokenPurpose,

    #[sea_orm(unique)]
    #[serde(skip_serializing)]
    pub token_hash: String,

    pub expires_at: DateTimeUtc,

    pub used_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
}

impl Model {
    pub fn is_consumable(&self, now: DateTimeUtc) -> bool {
        self.used_at.is_none() && self.expires_at > now
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::members::Entity",
        from = "Column::MemberId",
        to = "super::members::Column::Id",
        on_delete = "Cascade"
    )]
    Member,
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
