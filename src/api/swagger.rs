use utoipa::OpenApi;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Social Relay API",
        version = "1.0.0",
        description = "Follow graph and real-time relay for the social network.\n\n**Authentication:** mutations and follower lists require a JWT Bearer token issued by the auth service.\n\n**Real-time:** connect to `/ws?token=<jwt>` to receive `follow`, `unfollow`, `updateFollowCounts` and `commentAdded` events."
    ),
    paths(
        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,

        // Follow graph
        crate::api::follow::follow_user,
        crate::api::follow::unfollow_user,

        // Users
        crate::api::users::get_users,
        crate::api::users::get_user,
        crate::api::users::get_own_profile,
        crate::api::users::get_followers,
        crate::api::users::get_following,
        crate::api::users::update_user,
    ),
    components(
        schemas(
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
            crate::models::FollowResponse,
            crate::models::UserProfile,
            crate::models::UserSummary,
            crate::models::UpdateUserRequest,
            crate::models::Role,
        )
    ),
    tags(
        (name = "Health", description = "Health check and metrics endpoints."),
        (name = "Follow", description = "Follow and unfollow other users. Successful changes are broadcast on the relay."),
        (name = "Users", description = "Public profiles, follower lists and profile editing."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token issued by the auth service"))
                        .build()
                ),
            );
        }
    }
}
