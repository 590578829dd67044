use actix_web::{web, HttpResponse};

use crate::database::UserStore;
use crate::middleware::auth::Claims;
use crate::models::{UpdateUserRequest, UserProfile, UserSummary};
use crate::services::user_service;
use crate::utils::AppError;

/// GET /users - Lista todos os perfis
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses((status = 200, description = "All user profiles", body = [UserProfile]))
)]
pub async fn get_users(store: web::Data<dyn UserStore>) -> Result<HttpResponse, AppError> {
    let users = user_service::list_users(store.get_ref()).await?;
    log::info!("📋 Listed {} users", users.len());

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": users,
        "message": "Users fetched successfully"
    })))
}

/// GET /user/{id}
#[utoipa::path(
    get,
    path = "/user/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(store: web::Data<dyn UserStore>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let profile = user_service::get_user(store.get_ref(), &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": profile,
        "message": "User fetched successfully"
    })))
}

/// GET /userprofile - Perfil do usuário autenticado
#[utoipa::path(
    get,
    path = "/userprofile",
    tag = "Users",
    responses(
        (status = 200, description = "Caller profile", body = UserProfile),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_own_profile(
    user: web::ReqData<Claims>,
    store: web::Data<dyn UserStore>,
) -> Result<HttpResponse, AppError> {
    let profile = user_service::get_user(store.get_ref(), &user.sub).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": profile,
        "message": "User profile fetched successfully"
    })))
}

/// GET /users/{userId}/followers
#[utoipa::path(
    get,
    path = "/users/{userId}/followers",
    tag = "Users",
    params(("userId" = String, Path, description = "User whose followers are listed")),
    responses(
        (status = 200, description = "Followers", body = [UserSummary]),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_followers(
    _user: web::ReqData<Claims>,
    store: web::Data<dyn UserStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let followers = user_service::followers(store.get_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(followers))
}

/// GET /users/{userId}/following
#[utoipa::path(
    get,
    path = "/users/{userId}/following",
    tag = "Users",
    params(("userId" = String, Path, description = "User whose followed accounts are listed")),
    responses(
        (status = 200, description = "Followed users", body = [UserSummary]),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_following(
    _user: web::ReqData<Claims>,
    store: web::Data<dyn UserStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let following = user_service::following(store.get_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(following))
}

/// PUT /updateUser - Edita nome, email, bio e interesses
#[utoipa::path(
    put,
    path = "/updateUser",
    tag = "Users",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 400, description = "Invalid or empty update"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    user: web::ReqData<Claims>,
    store: web::Data<dyn UserStore>,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let profile = user_service::update_profile(store.get_ref(), &user.sub, body.into_inner())
        .await
        .map_err(|e| {
            log::warn!("⚠️  Profile update for {} rejected: {}", user.sub, e);
            e
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": profile,
        "message": "User details updated successfully"
    })))
}
