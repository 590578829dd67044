use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use social_relay::{
    api,
    config::{AppConfig, StorageBackend},
    database::{MemoryUserStore, MongoDB, MongoUserStore, UserStore},
    middleware::{SecurityHeaders, TokenVerifier},
    relay::RelayHub,
    seeds,
    services::FollowService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("❌ Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!("🚀 Starting Social Relay...");

    let store: Arc<dyn UserStore> = match (config.storage, config.database_url.as_deref()) {
        (StorageBackend::Mongo, Some(url)) => {
            let db = MongoDB::new(url).await.map_err(|e| {
                log::error!("❌ Failed to connect to MongoDB: {}", e);
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string())
            })?;
            log::info!(
                "✅ MongoDB connected successfully (transactions: {})",
                config.mongo_transactions
            );
            Arc::new(MongoUserStore::new(&db, config.mongo_transactions))
        }
        _ => {
            log::warn!("⚠️  Using in-memory user store, data is lost on restart");
            Arc::new(MemoryUserStore::new())
        }
    };

    // 🌱 Seed users
    if let Some(path) = &config.seed_users_file {
        seeds::users_seed::seed_users(store.as_ref(), path).await;
    }

    let hub = RelayHub::new(config.relay_buffer);
    let follows = web::Data::new(FollowService::new(store.clone(), Arc::new(hub.clone())));
    let store_data: web::Data<dyn UserStore> = web::Data::from(store);
    let hub_data = web::Data::new(hub);
    let verifier = web::Data::new(TokenVerifier::new(&config.jwt_secret));

    let bind_address = config.bind_address();
    log::info!("🌐 Server starting on {}", bind_address);
    log::info!("📚 Swagger UI available at: http://{}/swagger-ui/", bind_address);
    log::info!("🔌 Relay WebSocket at: ws://{}/ws", bind_address);

    let cors_origins = config.cors_origins.clone();

    HttpServer::new(move || {
        let cors = cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .supports_credentials()
            .max_age(3600);

        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(store_data.clone())
            .app_data(follows.clone())
            .app_data(hub_data.clone())
            .app_data(verifier.clone())
            .wrap(cors)
            .wrap(SecurityHeaders)
            .wrap(Logger::default())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi))
            .configure(api::routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
