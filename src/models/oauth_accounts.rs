// ============================================================================
// MODÈLE : OAUTH ACCOUNTS
// ============================================================================
//
// Description:
//   Lien entre un membre et une identité Google ou Facebook.
//   Un membre peut avoir un compte par fournisseur en plus d'un mot de passe.
//
// Colonnes de la table oauth_accounts:
//   - id (INTEGER, PRIMARY KEY, SERIAL)
//   - member_id (INTEGER, NOT NULL, FK vers members)
//   - provider ('google' | 'facebook')
//   - provider_id (VARCHAR) - identifiant attribué par le fournisseur
//   - access_token (TEXT, NULL) - dernier token reçu
//   - created_at, updated_at (TIMESTAMPTZ)
//
// Points d'attention:
//   - (provider, provider_id) est unique (index créé dans db.rs)
//
// ============================================================================

use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    #[sea_orm(string_value = "google")]
    Google,
    #[sea_orm(string_value = "facebook")]
    Facebook,
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OAuthProvider::Google => write!(f, "Google"),
            OAuthProvider::Facebook => write!(f, "Facebook"),
        }
    }
}

impl FromStr for OAuthProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(OAuthProvider::Google),
            "facebook" => Ok(OAuthProvider::Facebook),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "oauth_accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub member_id: i32,

    pub provider: OAuthProvider,

    pub provider_id: String,

    #[sea_orm(column_type = "Text", nullable)]
    #[serde(skip_serializing)]
    pub access_token: Option<String>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
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
