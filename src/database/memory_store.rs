use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use std::collections::BTreeMap;
use std::sync::RwLock;

use super::store::{EdgeChange, EdgeOutcome, EdgeSnapshot, StoreError, StoreResult, UserStore};
use crate::models::{ProfileChanges, User};

/// Process-local store used with `STORAGE=memory` and in tests.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<BTreeMap<ObjectId, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a record as-is, bypassing the edge rules.
    #[cfg(test)]
    pub(crate) fn overwrite(&self, user: User) {
        if let (Some(id), Ok(mut users)) = (user.id, self.users.write()) {
            users.insert(id, user);
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: &ObjectId) -> StoreResult<Option<User>> {
        let users = self.users.read().map_err(|_| StoreError::Poisoned)?;
        Ok(users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().map_err(|_| StoreError::Poisoned)?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_many(&self, ids: &[ObjectId]) -> StoreResult<Vec<User>> {
        let users = self.users.read().map_err(|_| StoreError::Poisoned)?;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let users = self.users.read().map_err(|_| StoreError::Poisoned)?;
        Ok(users.values().cloned().collect())
    }

    async fn insert(&self, mut user: User) -> StoreResult<User> {
        let mut users = self.users.write().map_err(|_| StoreError::Poisoned)?;
        let id = user.id.unwrap_or_else(ObjectId::new);
        if users.contains_key(&id) {
            return Err(StoreError::Database(format!("Duplicate key: {}", id)));
        }
        // Mesmo contrato do índice único em users.email
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Database(format!("Duplicate email: {}", user.email)));
        }
        let now = BsonDateTime::now();
        user.id = Some(id);
        user.created_at.get_or_insert(now);
        user.updated_at.get_or_insert(now);
        users.insert(id, user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: &ObjectId, changes: &ProfileChanges) -> StoreResult<Option<User>> {
        let mut users = self.users.write().map_err(|_| StoreError::Poisoned)?;
        let Some(user) = users.get_mut(id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(bio) = &changes.bio {
            user.bio = bio.clone();
        }
        if let Some(interests) = &changes.interests {
            user.interests = interests.clone();
        }
        user.updated_at = Some(BsonDateTime::now());
        Ok(Some(user.clone()))
    }

    async fn apply_edge(&self, actor: &ObjectId, target: &ObjectId, change: EdgeChange) -> StoreResult<EdgeOutcome> {
        // Um único write lock cobre os dois documentos
        let mut users = self.users.write().map_err(|_| StoreError::Poisoned)?;
        let (actor_has, target_has) = match (users.get(actor), users.get(target)) {
            (Some(a), Some(t)) => (a.is_following(target), t.has_follower(actor)),
            _ => return Err(StoreError::Database("User vanished during edge update".to_string())),
        };

        let needs_change = match change {
            // Aresta parcial conta como existente
            EdgeChange::Follow => !actor_has && !target_has,
            EdgeChange::Unfollow => actor_has || target_has,
        };
        if !needs_change {
            return Ok(EdgeOutcome::Unchanged);
        }

        let now = BsonDateTime::now();
        if let Some(a) = users.get_mut(actor) {
            match change {
                EdgeChange::Follow => a.following.push(*target),
                EdgeChange::Unfollow => a.following.retain(|id| id != target),
                _ => {}
            }
            a.updated_at = Some(now);
        }
        if let Some(t) = users.get_mut(target) {
            match change {
                EdgeChange::Follow => t.followers.push(*actor),
                EdgeChange::Unfollow => t.followers.retain(|id| id != actor),
                _ => {}
            }
            t.updated_at = Some(now);
        }

        let actor_following = users.get(actor).map(|u| u.following.clone()).unwrap_or_default();
        let target_followers = users.get(target).map(|u| u.followers.clone()).unwrap_or_default();
        Ok(EdgeOutcome::Applied(EdgeSnapshot { actor_following, target_followers }))
    }

    async fn ping(&self) -> StoreResult<()> {
        self.users.read().map(|_| ()).map_err(|_| StoreError::Poisoned)
    }
}
