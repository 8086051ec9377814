pub mod health;
pub mod auth;
pub mod members;

use actix_web::web;

use crate::error::AppError;

/// Corps JSON illisible: même format que les autres erreurs de validation
fn json_error_handler(err: actix_web::error::JsonPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    log::debug!("Rejected JSON body: {}", err);
    AppError::validation("body", "Corps de requête JSON invalide").into()
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(64 * 1024).error_handler(json_error_handler))
        .service(
            web::scope("/api")
                .service(health::health_check)
                .service(
                    web::scope("/members")
                        .configure(auth::auth_routes)
                        .configure(members::member_routes),
                ),
        );
}
