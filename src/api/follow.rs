use actix_web::{web, HttpResponse};

use crate::middleware::auth::Claims;
use crate::models::FollowResponse;
use crate::services::FollowService;
use crate::utils::AppError;

/// POST /follow/{targetUserId} - Segue outro usuário
#[utoipa::path(
    post,
    path = "/follow/{targetUserId}",
    tag = "Follow",
    params(("targetUserId" = String, Path, description = "User to follow")),
    responses(
        (status = 200, description = "Followed", body = FollowResponse),
        (status = 400, description = "Self-follow or already following"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn follow_user(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    follows: web::Data<FollowService>,
) -> Result<HttpResponse, AppError> {
    let target = path.into_inner();
    log::info!("👥 Follow request: {} -> {}", user.sub, target);

    let response = follows.follow(&user.sub, &target).await.map_err(|e| {
        log::warn!("⚠️  Follow {} -> {} rejected: {}", user.sub, target, e);
        e
    })?;

    Ok(render(response))
}

/// POST /unfollow/{targetUserId} - Deixa de seguir
#[utoipa::path(
    post,
    path = "/unfollow/{targetUserId}",
    tag = "Follow",
    params(("targetUserId" = String, Path, description = "User to unfollow")),
    responses(
        (status = 200, description = "Unfollowed", body = FollowResponse),
        (status = 400, description = "Self-unfollow or not following"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn unfollow_user(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    follows: web::Data<FollowService>,
) -> Result<HttpResponse, AppError> {
    let target = path.into_inner();
    log::info!("👥 Unfollow request: {} -> {}", user.sub, target);

    let response = follows.unfollow(&user.sub, &target).await.map_err(|e| {
        log::warn!("⚠️  Unfollow {} -> {} rejected: {}", user.sub, target, e);
        e
    })?;

    Ok(render(response))
}

fn render(response: FollowResponse) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": response.message,
        "following": response.following,
        "followers": response.followers
    }))
}
