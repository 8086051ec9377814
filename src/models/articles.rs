use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

// Lecture seule: les articles sont gérés par le back-office éditorial.
// Seules les colonnes utiles aux favoris et à l'historique sont mappées.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub slug: String,
    pub title_fr: String,
    pub title_en: Option<String>,
    pub published: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
