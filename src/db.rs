// connexion BD

use std::time::Duration;

use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema};

use crate::config::AppConfig;
use crate::models::{articles, member_favorites, member_sessions, members, oauth_accounts, one_time_tokens, reading_history};

pub async fn establish_connection(config: &AppConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging_level(log::LevelFilter::Debug);

    // Une base SQLite en mémoire n'existe que pour sa connexion
    if config.database_url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }

    Database::connect(options).await
}

/// Crée les tables manquantes à partir des entités (tests, environnement de dev)
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, members::Entity).await?;
    create_table(db, articles::Entity).await?;
    create_table(db, one_time_tokens::Entity).await?;
    create_table(db, member_sessions::Entity).await?;
    create_table(db, oauth_accounts::Entity).await?;
    create_table(db, member_favorites::Entity).await?;
    create_table(db, reading_history::Entity).await?;

    let backend = db.get_database_backend();

    let oauth_identity = Index::create()
        .name("idx_oauth_accounts_provider_identity")
        .table(oauth_accounts::Entity)
        .col(oauth_accounts::Column::Provider)
        .col(oauth_accounts::Column::ProviderId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&oauth_identity)).await?;

    let favorite = Index::create()
        .name("idx_member_favorites_member_article")
        .table(member_favorites::Entity)
        .col(member_favorites::Column::MemberId)
        .col(member_favorites::Column::ArticleId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&favorite)).await?;

    let history = Index::create()
        .name("idx_reading_history_member_article")
        .table(reading_history::Entity)
        .col(reading_history::Column::MemberId)
        .col(reading_history::Column::ArticleId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&history)).await?;

    let sessions = Index::create()
        .name("idx_member_sessions_member")
        .table(member_sessions::Entity)
        .col(member_sessions::Column::MemberId)
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&sessions)).await?;

    Ok(())
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut statement = schema.create_table_from_entity(entity);
    db.execute(backend.build(statement.if_not_exists())).await?;
    Ok(())
}
