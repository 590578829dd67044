pub mod follow;
pub mod health;
pub mod metrics;
pub mod relay;
pub mod swagger;
pub mod users;

use actix_web::web;

use crate::middleware::AuthMiddleware;

/// Registers every HTTP and WebSocket route of the service.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health & metrics
        .route("/health", web::get().to(health::health_check))
        .route("/metrics", web::get().to(metrics::get_metrics))
        // Relay
        .route("/ws", web::get().to(relay::connect))
        // Follow graph (autenticado)
        .service(
            web::resource("/follow/{targetUserId}")
                .wrap(AuthMiddleware)
                .route(web::post().to(follow::follow_user)),
        )
        .service(
            web::resource("/unfollow/{targetUserId}")
                .wrap(AuthMiddleware)
                .route(web::post().to(follow::unfollow_user)),
        )
        // Users
        .route("/users", web::get().to(users::get_users))
        .route("/user/{id}", web::get().to(users::get_user))
        .service(
            web::resource("/userprofile")
                .wrap(AuthMiddleware)
                .route(web::get().to(users::get_own_profile)),
        )
        .service(
            web::resource("/users/{userId}/followers")
                .wrap(AuthMiddleware)
                .route(web::get().to(users::get_followers)),
        )
        .service(
            web::resource("/users/{userId}/following")
                .wrap(AuthMiddleware)
                .route(web::get().to(users::get_following)),
        )
        .service(
            web::resource("/updateUser")
                .wrap(AuthMiddleware)
                .route(web::put().to(users::update_user)),
        );
}
