// ============================================================================
// MODÈLE : MEMBERS
// ============================================================================
//
// Description:
//   Comptes membres du site public (distincts des comptes éditoriaux).
//   Racine de l'agrégat: tokens à usage unique, sessions, comptes OAuth,
//   favoris et historique de lecture y font référence.
//
// Colonnes de la table members:
//   - id (INTEGER, PRIMARY KEY, SERIAL)
//   - email (VARCHAR, UNIQUE, NOT NULL) - toujours en minuscules
//   - password_hash (VARCHAR, NULL) - NULL pour un compte 100% OAuth
//   - name (VARCHAR(100), NOT NULL)
//   - avatar_url, bio (NULL)
//   - preferred_language ('fr' | 'en')
//   - is_email_verified, is_subscriber (BOOLEAN)
//   - login_count (INTEGER), last_login_at (TIMESTAMPTZ, NULL)
//   - created_at, updated_at (TIMESTAMPTZ)
//
// Points d'attention:
//   - Un membre sans password_hash doit avoir au moins un compte OAuth lié
//   - Le hash n'est jamais sérialisé
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(2))")]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    #[sea_orm(string_value = "fr")]
    Fr,
    #[sea_orm(string_value = "en")]
    En,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Fr => "fr",
            Language::En => "en",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "members")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub name: String,
    pub avatar_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,
    pub preferred_language: Language,
    pub is_email_verified: bool,
    pub is_subscriber: bool,
    pub login_count: i32,
    pub last_login_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::one_time_tokens::Entity")]
    OneTimeTokens,

    #[sea_orm(has_many = "super::member_sessions::Entity")]
    Sessions,

    #[sea_orm(has_many = "super::oauth_accounts::Entity")]
    OAuthAccounts,

    #[sea_orm(has_many = "super::member_favorites::Entity")]
    Favorites,

    #[sea_orm(has_many = "super::reading_history::Entity")]
    ReadingHistory,
}

impl Related<super::one_time_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OneTimeTokens.def()
    }
}

impl Related<super::member_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl Related<super::oauth_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OAuthAccounts.def()
    }
}

impl Related<super::member_favorites::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favorites.def()
    }
}

impl Related<super::reading_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReadingHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
