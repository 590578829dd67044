use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection, Database};
use std::collections::HashMap;

use super::store::{EdgeChange, EdgeOutcome, EdgeSnapshot, StoreError, StoreResult, UserStore};
use super::MongoDB;
use crate::models::{ProfileChanges, User};

pub const USERS_COLLECTION: &str = "users";

/// MongoDB-backed [`UserStore`].
///
/// Edge changes run inside a multi-document transaction when `transactions`
/// is enabled (replica set or mongos required). Without transactions the two
/// writes run in sequence and the actor write is reverted if the target
/// write fails.
pub struct MongoUserStore {
    client: Client,
    database: Database,
    users: Collection<User>,
    transactions: bool,
}

/// The four documents that describe one edge change.
struct EdgePlan {
    actor_filter: Document,
    actor_update: Document,
    actor_undo: Document,
    target_filter: Document,
    target_update: Document,
    /// Follow só vale se os dois lados ainda não tinham a aresta
    both_sides: bool,
}

impl EdgePlan {
    fn new(actor: &ObjectId, target: &ObjectId, change: EdgeChange) -> Self {
        let now = BsonDateTime::now();
        match change {
            EdgeChange::Follow => EdgePlan {
                actor_filter: doc! { "_id": *actor, "following": { "$ne": *target } },
                actor_update: doc! {
                    "$addToSet": { "following": *target },
                    "$set": { "updatedAt": now },
                },
                actor_undo: doc! { "$pull": { "following": *target } },
                target_filter: doc! { "_id": *target, "followers": { "$ne": *actor } },
                target_update: doc! {
                    "$addToSet": { "followers": *actor },
                    "$set": { "updatedAt": now },
                },
                both_sides: true,
            },
            EdgeChange::Unfollow => EdgePlan {
                actor_filter: doc! { "_id": *actor, "following": *target },
                actor_update: doc! {
                    "$pull": { "following": *target },
                    "$set": { "updatedAt": now },
                },
                actor_undo: doc! { "$addToSet": { "following": *target } },
                target_filter: doc! { "_id": *target, "followers": *actor },
                target_update: doc! {
                    "$pull": { "followers": *actor },
                    "$set": { "updatedAt": now },
                },
                both_sides: false,
            },
        }
    }

    fn applied(&self, actor_matched: u64, target_matched: u64) -> bool {
        if self.both_sides {
            actor_matched > 0 && target_matched > 0
        } else {
            actor_matched + target_matched > 0
        }
    }
}

impl MongoUserStore {
    pub fn new(db: &MongoDB, transactions: bool) -> Self {
        MongoUserStore {
            client: db.client().clone(),
            database: db.database().clone(),
            users: db.collection::<User>(USERS_COLLECTION),
            transactions,
        }
    }

    async fn apply_in_transaction(&self, plan: EdgePlan) -> StoreResult<bool> {
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        let both_sides = plan.both_sides;
        let result = async {
            let actor = self
                .users
                .update_one(plan.actor_filter.clone(), plan.actor_update.clone())
                .session(&mut session)
                .await?;
            // Follow condicional: aresta parcial aborta antes do segundo write
            if both_sides && actor.matched_count == 0 {
                return Ok::<_, mongodb::error::Error>(false);
            }
            let target = self
                .users
                .update_one(plan.target_filter.clone(), plan.target_update.clone())
                .session(&mut session)
                .await?;
            Ok(plan.applied(actor.matched_count, target.matched_count))
        }
        .await;

        match result {
            Ok(false) => {
                session.abort_transaction().await?;
                Ok(false)
            }
            Ok(true) => {
                session
                    .commit_transaction()
                    .await
                    .map_err(|e| StoreError::Transaction(e.to_string()))?;
                Ok(true)
            }
            Err(e) => {
                if let Err(abort_err) = session.abort_transaction().await {
                    log::warn!("⚠️ Failed to abort edge transaction: {}", abort_err);
                }
                Err(StoreError::Transaction(e.to_string()))
            }
        }
    }

    async fn apply_with_compensation(&self, actor: &ObjectId, target: &ObjectId, plan: EdgePlan) -> StoreResult<bool> {
        let actor_result = self
            .users
            .update_one(plan.actor_filter.clone(), plan.actor_update.clone())
            .await?;
        if plan.both_sides && actor_result.matched_count == 0 {
            return Ok(false);
        }

        match self.users.update_one(plan.target_filter.clone(), plan.target_update.clone()).await {
            Ok(target_result) => {
                let applied = plan.applied(actor_result.matched_count, target_result.matched_count);
                if !applied && actor_result.matched_count > 0 {
                    // O alvo já tinha a aresta: desfaz o lado do ator
                    self.revert_actor(actor, target, &plan).await;
                }
                Ok(applied)
            }
            Err(e) => {
                if actor_result.matched_count > 0 {
                    self.revert_actor(actor, target, &plan).await;
                }
                Err(e.into())
            }
        }
    }

    async fn revert_actor(&self, actor: &ObjectId, target: &ObjectId, plan: &EdgePlan) {
        match self.users.update_one(doc! { "_id": *actor }, plan.actor_undo.clone()).await {
            Ok(_) => log::warn!("↩️  Reverted actor write {} -> {}", actor, target),
            Err(undo_err) => log::error!(
                "❌ Compensation failed, edge {} -> {} is one-sided: {}",
                actor,
                target,
                undo_err
            ),
        }
    }

    async fn snapshot(&self, actor: &ObjectId, target: &ObjectId) -> StoreResult<EdgeSnapshot> {
        let actor_following = self
            .users
            .find_one(doc! { "_id": *actor })
            .await?
            .map(|u| u.following)
            .unwrap_or_default();
        let target_followers = self
            .users
            .find_one(doc! { "_id": *target })
            .await?
            .map(|u| u.followers)
            .unwrap_or_default();
        Ok(EdgeSnapshot { actor_following, target_followers })
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_id(&self, id: &ObjectId) -> StoreResult<Option<User>> {
        Ok(self.users.find_one(doc! { "_id": *id }).await?)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users.find_one(doc! { "email": email }).await?)
    }

    async fn find_many(&self, ids: &[ObjectId]) -> StoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self.users.find(doc! { "_id": { "$in": ids.to_vec() } }).await?;
        let found: Vec<User> = cursor.try_collect().await?;

        // Mantém a ordem da lista de referências
        let mut by_id: HashMap<ObjectId, User> = found
            .into_iter()
            .filter_map(|u| u.id.map(|id| (id, u)))
            .collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let cursor = self.users.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert(&self, mut user: User) -> StoreResult<User> {
        let now = BsonDateTime::now();
        user.id = Some(user.id.unwrap_or_else(ObjectId::new));
        user.created_at.get_or_insert(now);
        user.updated_at.get_or_insert(now);
        self.users.insert_one(&user).await?;
        Ok(user)
    }

    async fn update_profile(&self, id: &ObjectId, changes: &ProfileChanges) -> StoreResult<Option<User>> {
        let mut set = Document::new();
        if let Some(name) = &changes.name {
            set.insert("name", name.clone());
        }
        if let Some(email) = &changes.email {
            set.insert("email", email.clone());
        }
        if let Some(bio) = &changes.bio {
            set.insert("bio", bio.clone());
        }
        if let Some(interests) = &changes.interests {
            set.insert("interests", interests.clone());
        }
        set.insert("updatedAt", BsonDateTime::now());

        Ok(self
            .users
            .find_one_and_update(doc! { "_id": *id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn apply_edge(&self, actor: &ObjectId, target: &ObjectId, change: EdgeChange) -> StoreResult<EdgeOutcome> {
        let plan = EdgePlan::new(actor, target, change);
        let applied = if self.transactions {
            self.apply_in_transaction(plan).await?
        } else {
            self.apply_with_compensation(actor, target, plan).await?
        };

        if !applied {
            return Ok(EdgeOutcome::Unchanged);
        }
        Ok(EdgeOutcome::Applied(self.snapshot(actor, target).await?))
    }

    async fn ping(&self) -> StoreResult<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
