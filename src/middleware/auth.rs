use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, HttpMessage, ResponseError,
};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

use crate::utils::AppError;

/// Claims of the tokens minted by the auth service.
///
/// Older tokens carry the user id as `user_id` instead of `sub`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    #[serde(alias = "user_id")]
    pub sub: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<usize>,
}

/// HS256 verifier shared through `web::Data`.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        TokenVerifier {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                log::warn!("❌ Token verification failed: {}", e);
                AppError::Unauthorized("Invalid or expired token.".to_string())
            })
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
/// The scheme is matched case-insensitively.
pub fn bearer_token(header: &str) -> Option<&str> {
    let header = header.trim();
    let (scheme, rest) = header.split_at(header.find(char::is_whitespace)?);
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    (!token.is_empty()).then_some(token)
}

pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .map(str::to_owned);

        let claims = match (req.app_data::<web::Data<TokenVerifier>>(), token) {
            (_, None) => Err(AppError::Unauthorized("No token provided. Please log in.".to_string())),
            (None, Some(_)) => {
                log::error!("❌ TokenVerifier missing from app data");
                Err(AppError::ServerError("Authentication is not configured".to_string()))
            }
            (Some(verifier), Some(token)) => verifier.verify(&token),
        };

        match claims {
            Ok(claims) => {
                log::debug!("🔑 Authenticated user {}", claims.sub);
                req.extensions_mut().insert(claims);
                let fut = self.service.call(req);
                Box::pin(async move {
                    let res = fut.await?;
                    Ok(res.map_into_left_body())
                })
            }
            Err(e) => {
                let response = e.error_response();
                Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{expired_token_for, token_for, TEST_SECRET};

    #[test]
    fn parses_bearer_header() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer   abc.def  "), Some("abc.def"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer    "), None);
        assert_eq!(bearer_token(""), None);
    }

    #[test]
    fn verifies_tokens_signed_with_the_shared_secret() {
        let verifier = TokenVerifier::new(TEST_SECRET);
        let claims = verifier.verify(&token_for("64b000000000000000000001")).unwrap();
        assert_eq!(claims.sub, "64b000000000000000000001");
    }

    #[test]
    fn rejects_expired_and_foreign_tokens() {
        let verifier = TokenVerifier::new(TEST_SECRET);
        assert!(matches!(
            verifier.verify(&expired_token_for("64b000000000000000000001")),
            Err(AppError::Unauthorized(_))
        ));

        let other = TokenVerifier::new("another-secret");
        assert!(other.verify(&token_for("64b000000000000000000001")).is_err());
        assert!(verifier.verify("not-a-jwt").is_err());
    }

    #[test]
    fn accepts_legacy_user_id_claim() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "user_id": "64b000000000000000000002",
            "exp": 4102444800usize
        }))
        .unwrap();
        assert_eq!(claims.sub, "64b000000000000000000002");
    }
}
