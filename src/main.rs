mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod state;
mod utils;
#[cfg(test)]
mod test_support;

use std::io;

use actix_web::{middleware::Logger, web, App, HttpServer};

use crate::config::AppConfig;
use crate::services::mailer::mailer_from_config;
use crate::services::oauth_service::OAuthBridge;
use crate::state::AppState;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().map_err(io::Error::other)?;

    log::info!("Connecting to database...");
    let db = db::establish_connection(&config).await.map_err(io::Error::other)?;
    log::info!("Database connected");

    if config.auto_create_schema {
        db::create_schema(&db).await.map_err(io::Error::other)?;
        log::info!("Schema created");
    }

    let mailer = mailer_from_config(&config).map_err(io::Error::other)?;
    let oauth = OAuthBridge::from_config(&config);
    let bind_address = config.bind_address.clone();
    let state = web::Data::new(AppState::new(config, db, mailer, oauth).map_err(io::Error::other)?);

    log::info!("Starting server on http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(routes::configure_routes)
    })
    .bind(bind_address)?
    .run()
    .await
}
