//! Shared fixtures for unit tests.

use jsonwebtoken::{encode, EncodingKey, Header};
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;

use crate::database::{MemoryUserStore, UserStore};
use crate::middleware::auth::Claims;
use crate::models::User;

pub const TEST_SECRET: &str = "test-secret";

fn sign(user_id: &str, exp: i64) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: exp as usize,
        iat: Some(chrono::Utc::now().timestamp() as usize),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_SECRET.as_bytes())).unwrap()
}

pub fn token_for(user_id: &str) -> String {
    sign(user_id, (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp())
}

pub fn expired_token_for(user_id: &str) -> String {
    sign(user_id, (chrono::Utc::now() - chrono::Duration::hours(1)).timestamp())
}

/// Memory store holding one user per name, ids returned in the same order.
pub async fn store_with(names: &[&str]) -> (Arc<MemoryUserStore>, Vec<ObjectId>) {
    let store = Arc::new(MemoryUserStore::new());
    let mut ids = Vec::new();
    for name in names {
        let user = store
            .insert(User::new(*name, format!("{}@example.com", name), 21))
            .await
            .unwrap();
        ids.push(user.id.unwrap());
    }
    (store, ids)
}
