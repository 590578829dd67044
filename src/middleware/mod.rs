pub mod auth;
pub mod security_headers;

pub use auth::{AuthMiddleware, Claims, TokenVerifier};
pub use security_headers::SecurityHeaders;
