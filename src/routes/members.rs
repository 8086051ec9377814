use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::error::AppError;
use crate::middleware::AuthMember;
use crate::models::dto::{ReadingProgressRequest, UpdateProfileRequest};
use crate::services::auth_service::AuthService;
use crate::services::member_service::MemberService;
use crate::state::AppState;

/// PUT /api/members/profile - Mise à jour partielle du profil
#[put("/profile")]
pub async fn update_profile(
    state: web::Data<AppState>,
    auth: AuthMember,
    body: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    let member = MemberService::update_profile(&state.db, auth.member, body.into_inner()).await?;
    let profile = AuthService::profile(&state, &member).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// GET /api/members/favorites
#[get("/favorites")]
pub async fn list_favorites(state: web::Data<AppState>, auth: AuthMember) -> Result<HttpResponse, AppError> {
    let favorites = MemberService::list_favorites(&state.db, auth.member.id).await?;
    Ok(HttpResponse::Ok().json(favorites))
}

/// POST /api/members/favorites/{articleId} - 201 si ajouté, 200 si déjà présent
#[post("/favorites/{article_id}")]
pub async fn add_favorite(
    state: web::Data<AppState>,
    auth: AuthMember,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let (favorite, created) = MemberService::add_favorite(&state.db, auth.member.id, path.into_inner()).await?;
    if created {
        Ok(HttpResponse::Created().json(favorite))
    } else {
        Ok(HttpResponse::Ok().json(favorite))
    }
}

/// DELETE /api/members/favorites/{articleId}
#[delete("/favorites/{article_id}")]
pub async fn remove_favorite(
    state: web::Data<AppState>,
    auth: AuthMember,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    MemberService::remove_favorite(&state.db, auth.member.id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/members/reading-history - 50 dernières lectures
#[get("/reading-history")]
pub async fn reading_history(state: web::Data<AppState>, auth: AuthMember) -> Result<HttpResponse, AppError> {
    let history = MemberService::reading_history(&state.db, auth.member.id).await?;
    Ok(HttpResponse::Ok().json(history))
}

/// POST /api/members/reading-history - Enregistrer la progression
#[post("/reading-history")]
pub async fn record_reading(
    state: web::Data<AppState>,
    auth: AuthMember,
    body: web::Json<ReadingProgressRequest>,
) -> Result<HttpResponse, AppError> {
    let entry = MemberService::record_reading(&state.db, auth.member.id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(entry))
}

pub fn member_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(update_profile)
        .service(list_favorites)
        .service(add_favorite)
        .service(remove_favorite)
        .service(reading_history)
        .service(record_reading);
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    use crate::routes::configure_routes;
    use crate::test_support::{insert_article, test_context};

    #[actix_web::test]
    async fn test_member_area_flow() {
        let ctx = test_context().await;
        let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(configure_routes)).await;
        let article = insert_article(&ctx.state.db, "une-semaine-a-lisbonne", true).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/members/register")
                .set_json(json!({ "email": "ana@example.com", "password": "Secret123", "name": "Ana" }))
                .to_request(),
        )
        .await;
        let body: Value = test::read_body_json(resp).await;
        let auth = ("Authorization", format!("Bearer {}", body["token"].as_str().unwrap()));

        // Profil
        let resp = test::call_service(
            &app,
            test::TestRequest::put()
                .uri("/api/members/profile")
                .insert_header(auth.clone())
                .set_json(json!({ "bio": "Voyageuse", "preferredLanguage": "en", "isSubscriber": true }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["bio"], "Voyageuse");
        assert_eq!(body["preferredLanguage"], "en");
        assert_eq!(body["isSubscriber"], true);
        assert_eq!(body["name"], "Ana");

        // Favoris: 201 puis 200
        let favorite_uri = format!("/api/members/favorites/{}", article.id);
        let resp = test::call_service(
            &app,
            test::TestRequest::post().uri(&favorite_uri).insert_header(auth.clone()).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let resp = test::call_service(
            &app,
            test::TestRequest::post().uri(&favorite_uri).insert_header(auth.clone()).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/members/favorites").insert_header(auth.clone()).to_request(),
        )
        .await;
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body[0]["articleId"], article.id);

        let resp = test::call_service(
            &app,
            test::TestRequest::post().uri("/api/members/favorites/9999").insert_header(auth.clone()).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = test::call_service(
            &app,
            test::TestRequest::delete().uri(&favorite_uri).insert_header(auth.clone()).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        // Historique de lecture
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/members/reading-history")
                .insert_header(auth.clone())
                .set_json(json!({ "articleId": article.id, "progress": 40 }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/members/reading-history").insert_header(auth).to_request(),
        )
        .await;
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["progress"], 40);
    }

    #[actix_web::test]
    async fn test_member_area_requires_authentication() {
        let ctx = test_context().await;
        let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(configure_routes)).await;

        for req in [
            test::TestRequest::get().uri("/api/members/favorites"),
            test::TestRequest::get().uri("/api/members/reading-history"),
            test::TestRequest::put().uri("/api/members/profile").set_json(json!({})),
        ] {
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        }
    }
}
