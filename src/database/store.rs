use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::fmt;

use crate::models::{ProfileChanges, User};

#[derive(Debug)]
pub enum StoreError {
    Database(String),
    Serialization(String),
    Transaction(String),
    Poisoned,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(msg) => write!(f, "Database error: {}", msg),
            StoreError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            StoreError::Transaction(msg) => write!(f, "Transaction error: {}", msg),
            StoreError::Poisoned => write!(f, "Store lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for StoreError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<mongodb::bson::de::Error> for StoreError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Direction of a follow edge change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeChange {
    Follow,
    Unfollow,
}

/// Reference lists after an edge change was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeSnapshot {
    pub actor_following: Vec<ObjectId>,
    pub target_followers: Vec<ObjectId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeOutcome {
    Applied(EdgeSnapshot),
    /// Neither record needed the change; nothing was written.
    Unchanged,
}

/// Persistence boundary for user records.
///
/// `apply_edge` must update both records as one unit: when it returns an
/// error neither `actor.following` nor `target.followers` may carry a
/// half-applied change.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &ObjectId) -> StoreResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Missing ids are skipped.
    async fn find_many(&self, ids: &[ObjectId]) -> StoreResult<Vec<User>>;

    async fn list(&self) -> StoreResult<Vec<User>>;

    async fn insert(&self, user: User) -> StoreResult<User>;

    /// Returns `None` when the user does not exist.
    async fn update_profile(&self, id: &ObjectId, changes: &ProfileChanges) -> StoreResult<Option<User>>;

    async fn apply_edge(&self, actor: &ObjectId, target: &ObjectId, change: EdgeChange) -> StoreResult<EdgeOutcome>;

    async fn ping(&self) -> StoreResult<()>;
}
