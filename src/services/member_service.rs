use chrono::Utc;
use sea_orm::*;
use validator::Validate;

use crate::error::AppError;
use crate::models::dto::{FavoriteResponse, ReadingHistoryResponse, ReadingProgressRequest, UpdateProfileRequest};
use crate::models::{articles, member_favorites, members, reading_history};

const READING_HISTORY_LIMIT: u64 = 50;

pub struct MemberService;

impl MemberService {
    /// Article publié, sinon 404
    async fn ensure_article(db: &DatabaseConnection, article_id: i32) -> Result<(), AppError> {
        let article = articles::Entity::find_by_id(article_id).one(db).await?;
        match article {
            Some(article) if article.published => Ok(()),
            _ => Err(AppError::NotFound("Article introuvable")),
        }
    }

    /// Mise à jour partielle: les champs absents ne sont pas modifiés
    pub async fn update_profile(
        db: &DatabaseConnection,
        member: members::Model,
        mut request: UpdateProfileRequest,
    ) -> Result<members::Model, AppError> {
        request.normalize();
        request.validate_all()?;

        let mut active: members::ActiveModel = member.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(bio) = request.bio {
            active.bio = Set(Some(bio).filter(|bio| !bio.is_empty()));
        }
        if let Some(avatar_url) = request.avatar_url {
            active.avatar_url = Set(Some(avatar_url).filter(|url| !url.is_empty()));
        }
        if let Some(language) = request.preferred_language {
            active.preferred_language = Set(language);
        }
        if let Some(is_subscriber) = request.is_subscriber {
            active.is_subscriber = Set(is_subscriber);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(db).await?)
    }

    pub async fn list_favorites(db: &DatabaseConnection, member_id: i32) -> Result<Vec<FavoriteResponse>, DbErr> {
        let favorites = member_favorites::Entity::find()
            .filter(member_favorites::Column::MemberId.eq(member_id))
            .order_by_desc(member_favorites::Column::CreatedAt)
            .order_by_desc(member_favorites::Column::Id)
            .all(db)
            .await?;

        Ok(favorites
            .into_iter()
            .map(|f| FavoriteResponse {
                article_id: f.article_id,
                created_at: f.created_at,
            })
            .collect())
    }

    /// Retourne (favori, créé): l'ajout d'un favori existant ne fait rien
    pub async fn add_favorite(
        db: &DatabaseConnection,
        member_id: i32,
        article_id: i32,
    ) -> Result<(FavoriteResponse, bool), AppError> {
        Self::ensure_article(db, article_id).await?;

        let existing = member_favorites::Entity::find()
            .filter(member_favorites::Column::MemberId.eq(member_id))
            .filter(member_favorites::Column::ArticleId.eq(article_id))
            .one(db)
            .await?;

        if let Some(favorite) = existing {
            return Ok((
                FavoriteResponse {
                    article_id: favorite.article_id,
                    created_at: favorite.created_at,
                },
                false,
            ));
        }

        let favorite = member_favorites::ActiveModel {
            member_id: Set(member_id),
            article_id: Set(article_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        Ok((
            FavoriteResponse {
                article_id: favorite.article_id,
                created_at: favorite.created_at,
            },
            true,
        ))
    }

    pub async fn remove_favorite(db: &DatabaseConnection, member_id: i32, article_id: i32) -> Result<(), AppError> {
        let result = member_favorites::Entity::delete_many()
            .filter(member_favorites::Column::MemberId.eq(member_id))
            .filter(member_favorites::Column::ArticleId.eq(article_id))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Favori introuvable"));
        }
        Ok(())
    }

    pub async fn reading_history(
        db: &DatabaseConnection,
        member_id: i32,
    ) -> Result<Vec<ReadingHistoryResponse>, DbErr> {
        let entries = reading_history::Entity::find()
            .filter(reading_history::Column::MemberId.eq(member_id))
            .order_by_desc(reading_history::Column::LastReadAt)
            .order_by_desc(reading_history::Column::Id)
            .limit(READING_HISTORY_LIMIT)
            .all(db)
            .await?;

        Ok(entries
            .into_iter()
            .map(|entry| ReadingHistoryResponse {
                article_id: entry.article_id,
                progress: entry.progress,
                last_read_at: entry.last_read_at,
            })
            .collect())
    }

    /// Une ligne par article: on garde la progression maximale vue
    pub async fn record_reading(
        db: &DatabaseConnection,
        member_id: i32,
        request: ReadingProgressRequest,
    ) -> Result<ReadingHistoryResponse, AppError> {
        request.validate()?;
        Self::ensure_article(db, request.article_id).await?;

        let now = Utc::now();
        let progress = request.progress.unwrap_or(0);

        let existing = reading_history::Entity::find()
            .filter(reading_history::Column::MemberId.eq(member_id))
            .filter(reading_history::Column::ArticleId.eq(request.article_id))
            .one(db)
            .await?;

        let entry = match existing {
            Some(entry) => {
                let best = entry.progress.max(progress);
                let mut active: reading_history::ActiveModel = entry.into();
                active.progress = Set(best);
                active.last_read_at = Set(now);
                active.update(db).await?
            }
            None => {
                reading_history::ActiveModel {
                    member_id: Set(member_id),
                    article_id: Set(request.article_id),
                    progress: Set(progress),
                    last_read_at: Set(now),
                    ..Default::default()
                }
                .insert(db)
                .await?
            }
        };

        Ok(ReadingHistoryResponse {
            article_id: entry.article_id,
            progress: entry.progress,
            last_read_at: entry.last_read_at,
        })
    }
}
