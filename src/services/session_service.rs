use chrono::{DateTime, Utc};
use sea_orm::*;

use crate::middleware::ClientInfo;
use crate::models::member_sessions;

pub struct SessionService;

impl SessionService {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        member_id: i32,
        token: &str,
        expires_at: DateTime<Utc>,
        client: &ClientInfo,
    ) -> Result<member_sessions::Model, DbErr> {
        member_sessions::ActiveModel {
            member_id: Set(member_id),
            token: Set(token.to_string()),
            user_agent: Set(client.user_agent.clone()),
            ip_address: Set(Some(client.address.clone())),
            expires_at: Set(expires_at),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Session non expirée correspondant au token présenté
    pub async fn find_active<C: ConnectionTrait>(
        db: &C,
        token: &str,
    ) -> Result<Option<member_sessions::Model>, DbErr> {
        let now = Utc::now();
        let session = member_sessions::Entity::find()
            .filter(member_sessions::Column::Token.eq(token))
            .one(db)
            .await?;

        Ok(session.filter(|session| session.expires_at > now))
    }

    /// Sessions actives du membre, la plus récente d'abord
    pub async fn list_active<C: ConnectionTrait>(
        db: &C,
        member_id: i32,
    ) -> Result<Vec<member_sessions::Model>, DbErr> {
        let now = Utc::now();
        let sessions = member_sessions::Entity::find()
            .filter(member_sessions::Column::MemberId.eq(member_id))
            .order_by_desc(member_sessions::Column::CreatedAt)
            .order_by_desc(member_sessions::Column::Id)
            .all(db)
            .await?;

        Ok(sessions.into_iter().filter(|session| session.expires_at > now).collect())
    }

    pub async fn delete_by_token<C: ConnectionTrait>(db: &C, token: &str) -> Result<u64, DbErr> {
        let result = member_sessions::Entity::delete_many()
            .filter(member_sessions::Column::Token.eq(token))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Supprime une session seulement si elle appartient au membre
    pub async fn delete_owned<C: ConnectionTrait>(db: &C, member_id: i32, session_id: i32) -> Result<bool, DbErr> {
        let result = member_sessions::Entity::delete_many()
            .filter(member_sessions::Column::Id.eq(session_id))
            .filter(member_sessions::Column::MemberId.eq(member_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn delete_all_for_member<C: ConnectionTrait>(db: &C, member_id: i32) -> Result<u64, DbErr> {
        let result = member_sessions::Entity::delete_many()
            .filter(member_sessions::Column::MemberId.eq(member_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Toutes les sessions du membre sauf celle du token courant
    pub async fn delete_others<C: ConnectionTrait>(db: &C, member_id: i32, current_token: &str) -> Result<u64, DbErr> {
        let result = member_sessions::Entity::delete_many()
            .filter(member_sessions::Column::MemberId.eq(member_id))
            .filter(member_sessions::Column::Token.ne(current_token))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::test_support::{insert_member, test_db};

    fn client() -> ClientInfo {
        ClientInfo {
            address: "10.0.0.1".to_string(),
            user_agent: Some("Firefox".to_string()),
        }
    }

    #[actix_web::test]
    async fn test_expired_session_is_not_active() {
        let db = test_db().await;
        let member = insert_member(&db, "ana@example.com", None).await;

        SessionService::create(&db, member.id, "live", Utc::now() + Duration::days(7), &client())
            .await
            .unwrap();
        SessionService::create(&db, member.id, "old", Utc::now() - Duration::seconds(1), &client())
            .await
            .unwrap();

        assert!(SessionService::find_active(&db, "live").await.unwrap().is_some());
        assert!(SessionService::find_active(&db, "old").await.unwrap().is_none());
        assert_eq!(SessionService::list_active(&db, member.id).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_delete_scopes() {
        let db = test_db().await;
        let ana = insert_member(&db, "ana@example.com", None).await;
        let bob = insert_member(&db, "bob@example.com", None).await;
        let expires = Utc::now() + Duration::days(7);

        SessionService::create(&db, ana.id, "a1", expires, &client()).await.unwrap();
        SessionService::create(&db, ana.id, "a2", expires, &client()).await.unwrap();
        SessionService::create(&db, ana.id, "a3", expires, &client()).await.unwrap();
        let bob_session = SessionService::create(&db, bob.id, "b1", expires, &client()).await.unwrap();

        assert_eq!(SessionService::delete_by_token(&db, "a1").await.unwrap(), 1);
        assert_eq!(SessionService::delete_others(&db, ana.id, "a2").await.unwrap(), 1);
        assert!(SessionService::find_active(&db, "a2").await.unwrap().is_some());

        // Ana ne peut pas supprimer la session de Bob
        assert!(!SessionService::delete_owned(&db, ana.id, bob_session.id).await.unwrap());
        assert_eq!(SessionService::delete_all_for_member(&db, ana.id).await.unwrap(), 1);
        assert!(SessionService::find_active(&db, "b1").await.unwrap().is_some());
    }
}
