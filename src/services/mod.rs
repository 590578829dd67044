pub mod follow_service;
pub mod user_service;

pub use follow_service::*;
