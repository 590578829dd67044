use mongodb::bson::oid::ObjectId;
use std::sync::Arc;

use crate::{
    api::metrics,
    database::{EdgeChange, EdgeOutcome, UserStore},
    models::{ids_to_hex, EdgePayload, FollowCounts, FollowResponse, RelayEvent, User},
    relay::EventPublisher,
    utils::AppError,
};

/// Applies follow/unfollow edges between two users and announces them on the relay.
pub struct FollowService {
    store: Arc<dyn UserStore>,
    publisher: Arc<dyn EventPublisher>,
}

/// Unknown and malformed ids are both "not found"
pub fn parse_user_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| AppError::NotFound("User not found.".to_string()))
}

impl FollowService {
    pub fn new(store: Arc<dyn UserStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        FollowService { store, publisher }
    }

    pub async fn follow(&self, actor_id: &str, target_id: &str) -> Result<FollowResponse, AppError> {
        if actor_id == target_id {
            return Err(AppError::InvalidOperation("You cannot follow yourself.".to_string()));
        }

        let (actor, target) = self.load_pair(actor_id, target_id, "following").await?;
        let (actor_oid, target_oid) = (object_id(&actor)?, object_id(&target)?);

        if actor.is_following(&target_oid) || target.has_follower(&actor_oid) {
            return Err(AppError::AlreadyExists("Already following this user.".to_string()));
        }

        let outcome = self
            .store
            .apply_edge(&actor_oid, &target_oid, EdgeChange::Follow)
            .await
            .map_err(|e| server_error("following", e))?;

        let snapshot = match outcome {
            EdgeOutcome::Applied(snapshot) => snapshot,
            // Outra requisição criou a aresta entre a leitura e a escrita
            EdgeOutcome::Unchanged => {
                return Err(AppError::AlreadyExists("Already following this user.".to_string()));
            }
        };

        log::info!("✅ User {} followed {}", actor_oid, target_oid);
        metrics::increment_follows();

        self.announce(
            RelayEvent::Follow(EdgePayload {
                user_id: target_oid.to_hex(),
                follower_id: actor_oid.to_hex(),
            }),
            &actor_oid,
            &target_oid,
            snapshot.target_followers.len(),
            snapshot.actor_following.len(),
        );

        Ok(FollowResponse {
            message: "Successfully followed the user.".to_string(),
            following: ids_to_hex(&snapshot.actor_following),
            followers: ids_to_hex(&snapshot.target_followers),
        })
    }

    pub async fn unfollow(&self, actor_id: &str, target_id: &str) -> Result<FollowResponse, AppError> {
        if actor_id == target_id {
            return Err(AppError::InvalidOperation("You cannot unfollow yourself.".to_string()));
        }

        let (actor, target) = self.load_pair(actor_id, target_id, "unfollowing").await?;
        let (actor_oid, target_oid) = (object_id(&actor)?, object_id(&target)?);

        if !actor.is_following(&target_oid) && !target.has_follower(&actor_oid) {
            return Err(AppError::NotFollowing("Not following this user.".to_string()));
        }

        let outcome = self
            .store
            .apply_edge(&actor_oid, &target_oid, EdgeChange::Unfollow)
            .await
            .map_err(|e| server_error("unfollowing", e))?;

        let snapshot = match outcome {
            EdgeOutcome::Applied(snapshot) => snapshot,
            EdgeOutcome::Unchanged => {
                return Err(AppError::NotFollowing("Not following this user.".to_string()));
            }
        };

        log::info!("✅ User {} unfollowed {}", actor_oid, target_oid);
        metrics::increment_unfollows();

        self.announce(
            RelayEvent::Unfollow(EdgePayload {
                user_id: target_oid.to_hex(),
                follower_id: actor_oid.to_hex(),
            }),
            &actor_oid,
            &target_oid,
            snapshot.target_followers.len(),
            snapshot.actor_following.len(),
        );

        Ok(FollowResponse {
            message: "Successfully unfollowed the user.".to_string(),
            following: ids_to_hex(&snapshot.actor_following),
            followers: ids_to_hex(&snapshot.target_followers),
        })
    }

    async fn load_pair(&self, actor_id: &str, target_id: &str, verb: &str) -> Result<(User, User), AppError> {
        let actor_oid = parse_user_id(actor_id)?;
        let target_oid = parse_user_id(target_id)?;
        // "ab" vs " ab" parse to the same id
        if actor_oid == target_oid {
            return Err(AppError::InvalidOperation(format!(
                "You cannot {} yourself.",
                if verb == "following" { "follow" } else { "unfollow" }
            )));
        }

        let actor = self
            .store
            .find_by_id(&actor_oid)
            .await
            .map_err(|e| server_error(verb, e))?;
        let target = self
            .store
            .find_by_id(&target_oid)
            .await
            .map_err(|e| server_error(verb, e))?;

        match (actor, target) {
            (Some(actor), Some(target)) => Ok((actor, target)),
            _ => Err(AppError::NotFound("User not found.".to_string())),
        }
    }

    /// Counts first, then the edge event
    fn announce(
        &self,
        event: RelayEvent,
        actor: &ObjectId,
        target: &ObjectId,
        follower_count: usize,
        following_count: usize,
    ) {
        self.publisher.publish(RelayEvent::UpdateFollowCounts(FollowCounts {
            follower_id: actor.to_hex(),
            followed_id: target.to_hex(),
            follower_count,
            following_count,
        }));
        self.publisher.publish(event);
    }
}

fn object_id(user: &User) -> Result<ObjectId, AppError> {
    user.id
        .ok_or_else(|| AppError::ServerError("Stored user has no id".to_string()))
}

fn server_error(verb: &str, err: crate::database::StoreError) -> AppError {
    log::error!("❌ Error {} user: {}", verb, err);
    AppError::ServerError(format!("An error occurred while {} the user.", verb))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{StoreError, StoreResult};
    use crate::models::ProfileChanges;
    use crate::relay::RelayHub;
    use crate::testing::store_with;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<RelayEvent>>,
    }

    impl RecordingPublisher {
        fn take(&self) -> Vec<RelayEvent> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }
    }

    impl EventPublisher for RecordingPublisher {
        fn publish(&self, event: RelayEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    async fn setup(names: &[&str]) -> (FollowService, Arc<dyn UserStore>, Arc<RecordingPublisher>, Vec<String>) {
        let (store, ids) = store_with(names).await;
        let store: Arc<dyn UserStore> = store;
        let publisher = Arc::new(RecordingPublisher::default());
        let service = FollowService::new(store.clone(), publisher.clone());
        (service, store, publisher, ids.iter().map(|id| id.to_hex()).collect())
    }

    async fn lists(store: &Arc<dyn UserStore>, id: &str) -> (Vec<String>, Vec<String>) {
        let user = store.find_by_id(&parse_user_id(id).unwrap()).await.unwrap().unwrap();
        (ids_to_hex(&user.following), ids_to_hex(&user.followers))
    }

    #[tokio::test]
    async fn follow_adds_mirrored_references() {
        let (service, store, publisher, ids) = setup(&["alice", "bob"]).await;
        let (alice, bob) = (&ids[0], &ids[1]);

        let response = service.follow(alice, bob).await.unwrap();
        assert_eq!(response.message, "Successfully followed the user.");
        assert_eq!(response.following, vec![bob.clone()]);
        assert_eq!(response.followers, vec![alice.clone()]);

        assert_eq!(lists(&store, alice).await.0, vec![bob.clone()]);
        assert_eq!(lists(&store, bob).await.1, vec![alice.clone()]);

        let events = publisher.take();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            RelayEvent::UpdateFollowCounts(FollowCounts {
                follower_id: alice.clone(),
                followed_id: bob.clone(),
                follower_count: 1,
                following_count: 1,
            })
        );
        assert_eq!(
            events[1],
            RelayEvent::Follow(EdgePayload { user_id: bob.clone(), follower_id: alice.clone() })
        );
    }

    #[tokio::test]
    async fn follow_then_unfollow_restores_previous_state() {
        let (service, store, publisher, ids) = setup(&["alice", "bob", "carol"]).await;
        let (alice, bob, carol) = (&ids[0], &ids[1], &ids[2]);
        service.follow(carol, bob).await.unwrap();
        service.follow(alice, carol).await.unwrap();
        let before = (lists(&store, alice).await.0, lists(&store, bob).await.1);

        service.follow(alice, bob).await.unwrap();
        let response = service.unfollow(alice, bob).await.unwrap();
        assert_eq!(response.message, "Successfully unfollowed the user.");

        let after = (lists(&store, alice).await.0, lists(&store, bob).await.1);
        assert_eq!(before, after);

        let last = publisher.take().pop().unwrap();
        assert_eq!(last, RelayEvent::Unfollow(EdgePayload { user_id: bob.clone(), follower_id: alice.clone() }));
    }

    #[tokio::test]
    async fn self_follow_is_always_rejected() {
        let (service, store, publisher, ids) = setup(&["alice", "bob"]).await;
        let alice = &ids[0];

        let err = service.follow(alice, alice).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidOperation(ref m) if m == "You cannot follow yourself."));

        service.follow(alice, &ids[1]).await.unwrap();
        assert!(matches!(service.follow(alice, alice).await, Err(AppError::InvalidOperation(_))));
        assert!(matches!(service.unfollow(alice, alice).await, Err(AppError::InvalidOperation(_))));
        assert!(matches!(service.follow("nonsense", "nonsense").await, Err(AppError::InvalidOperation(_))));

        assert_eq!(lists(&store, alice).await.0, vec![ids[1].clone()]);
        assert_eq!(publisher.take().len(), 2);
    }

    #[tokio::test]
    async fn second_follow_reports_already_exists() {
        let (service, store, publisher, ids) = setup(&["alice", "bob"]).await;
        let (alice, bob) = (&ids[0], &ids[1]);

        service.follow(alice, bob).await.unwrap();
        publisher.take();

        let err = service.follow(alice, bob).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(ref m) if m == "Already following this user."));
        assert_eq!(lists(&store, alice).await.0, vec![bob.clone()]);
        assert_eq!(lists(&store, bob).await.1, vec![alice.clone()]);
        assert!(publisher.take().is_empty());
    }

    #[tokio::test]
    async fn follow_with_one_sided_edge_is_already_exists() {
        let (store, ids) = store_with(&["alice", "bob"]).await;
        let (alice, bob) = (ids[0], ids[1]);
        let mut partial = store.find_by_id(&alice).await.unwrap().unwrap();
        partial.following.push(bob);
        store.overwrite(partial);
        let store: Arc<dyn UserStore> = store;
        let publisher = Arc::new(RecordingPublisher::default());
        let service = FollowService::new(store.clone(), publisher.clone());

        let err = service.follow(&alice.to_hex(), &bob.to_hex()).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(ref m) if m == "Already following this user."));
        assert!(publisher.take().is_empty());

        let bob_doc = store.find_by_id(&bob).await.unwrap().unwrap();
        assert!(bob_doc.followers.is_empty());
    }

    #[tokio::test]
    async fn unfollow_without_edge_changes_nothing() {
        let (service, store, publisher, ids) = setup(&["alice", "bob"]).await;
        let (alice, bob) = (&ids[0], &ids[1]);
        let before = store.find_by_id(&parse_user_id(alice).unwrap()).await.unwrap().unwrap();

        let err = service.unfollow(alice, bob).await.unwrap_err();
        assert!(matches!(err, AppError::NotFollowing(ref m) if m == "Not following this user."));

        let after = store.find_by_id(&parse_user_id(alice).unwrap()).await.unwrap().unwrap();
        assert_eq!(before.updated_at, after.updated_at);
        assert!(publisher.take().is_empty());
    }

    #[tokio::test]
    async fn missing_or_malformed_users_are_not_found() {
        let (service, _store, _publisher, ids) = setup(&["alice"]).await;
        let ghost = ObjectId::new().to_hex();

        assert!(matches!(service.follow(&ids[0], &ghost).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.follow(&ghost, &ids[0]).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.unfollow(&ids[0], "not-an-id").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn follow_events_reach_relay_subscribers() {
        let (store, ids) = store_with(&["alice", "bob"]).await;
        let hub = RelayHub::new(16);
        let mut listener = hub.subscribe();
        let service = FollowService::new(store, Arc::new(hub.clone()));

        service.follow(&ids[0].to_hex(), &ids[1].to_hex()).await.unwrap();

        assert!(matches!(listener.recv().await.unwrap(), RelayEvent::UpdateFollowCounts(_)));
        assert_eq!(
            listener.recv().await.unwrap(),
            RelayEvent::Follow(EdgePayload { user_id: ids[1].to_hex(), follower_id: ids[0].to_hex() })
        );
    }

    /// Store whose edge writes always fail.
    struct FailingEdges(Arc<dyn UserStore>);

    #[async_trait]
    impl UserStore for FailingEdges {
        async fn find_by_id(&self, id: &ObjectId) -> StoreResult<Option<User>> {
            self.0.find_by_id(id).await
        }
        async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
            self.0.find_by_email(email).await
        }
        async fn find_many(&self, ids: &[ObjectId]) -> StoreResult<Vec<User>> {
            self.0.find_many(ids).await
        }
        async fn list(&self) -> StoreResult<Vec<User>> {
            self.0.list().await
        }
        async fn insert(&self, user: User) -> StoreResult<User> {
            self.0.insert(user).await
        }
        async fn update_profile(&self, id: &ObjectId, changes: &ProfileChanges) -> StoreResult<Option<User>> {
            self.0.update_profile(id, changes).await
        }
        async fn apply_edge(&self, _: &ObjectId, _: &ObjectId, _: EdgeChange) -> StoreResult<EdgeOutcome> {
            Err(StoreError::Transaction("write conflict".to_string()))
        }
        async fn ping(&self) -> StoreResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn persistence_failure_is_a_server_error_without_events() {
        let (store, ids) = store_with(&["alice", "bob"]).await;
        let publisher = Arc::new(RecordingPublisher::default());
        let service = FollowService::new(Arc::new(FailingEdges(store)), publisher.clone());

        let err = service.follow(&ids[0].to_hex(), &ids[1].to_hex()).await.unwrap_err();
        assert!(matches!(err, AppError::ServerError(ref m) if m == "An error occurred while following the user."));
        assert!(publisher.take().is_empty());
    }
}
