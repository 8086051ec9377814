// ============================================================================
// MODÈLE : MEMBER SESSIONS
// ============================================================================
//
// Description:
//   Une ligne par connexion (inscription, login, OAuth). Le JWT n'est
//   accepté que si sa session existe encore: supprimer la ligne révoque
//   le token sur l'appareil concerné.
//
// Colonnes de la table member_sessions:
//   - id (INTEGER, PRIMARY KEY, SERIAL)
//   - member_id (INTEGER, NOT NULL, FK vers members)
//   - token (TEXT, UNIQUE) - le JWT présenté en Authorization: Bearer
//   - user_agent, ip_address (NULL)
//   - expires_at (TIMESTAMPTZ) - 7 jours, comme le JWT
//   - created_at (TIMESTAMPTZ)
//
// Suppression:
//   - POST /logout: la session du token courant
//   - POST /logout-all, reset du mot de passe: toutes les sessions du membre
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "member_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub member_id: i32,

    #[sea_orm(unique, column_type = "Text")]
    #[serde(skip_serializing)]
    pub token: String,

    pub user_agent: Option<String>,

    pub ip_address: Option<String>,

    pub expires_at: DateTimeUtc,

    pub created_at: DateTimeUtc,
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
