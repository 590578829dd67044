use super::{CachedFollow, FollowApi, FollowCache, WidgetError};
use crate::models::RelayEvent;

/// Where the current widget state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateSource {
    Default,
    Cache,
    Server,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetState {
    pub is_following: bool,
    pub followers_count: usize,
    pub source: StateSource,
}

impl WidgetState {
    fn cached(&self) -> CachedFollow {
        CachedFollow { is_following: self.is_following, followers_count: self.followers_count }
    }
}

/// Follow button for one (viewer, target) pair.
///
/// The follower counter only moves with relay events, so a local toggle is
/// counted once, when its own echo comes back.
pub struct FollowWidget<A, C> {
    api: A,
    cache: C,
    viewer_id: String,
    target_id: String,
    state: WidgetState,
}

impl<A: FollowApi, C: FollowCache> FollowWidget<A, C> {
    pub fn new(api: A, cache: C, viewer_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        FollowWidget {
            api,
            cache,
            viewer_id: viewer_id.into(),
            target_id: target_id.into(),
            state: WidgetState { is_following: false, followers_count: 0, source: StateSource::Default },
        }
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Shows the cached state, then replaces it with the server's.
    ///
    /// On a fetch error the cached (or default) state stays in place and the
    /// error is returned.
    pub async fn mount(&mut self) -> Result<WidgetState, WidgetError> {
        match self.cache.load(&self.target_id) {
            Ok(Some(cached)) => {
                self.state = WidgetState {
                    is_following: cached.is_following,
                    followers_count: cached.followers_count,
                    source: StateSource::Cache,
                };
            }
            Ok(None) => {}
            Err(e) => log::warn!("⚠️  Follow cache unreadable, ignoring: {}", e),
        }

        let profile = self.api.profile(&self.target_id).await.map_err(|e| {
            log::warn!("⚠️  Could not fetch profile {}: {}", self.target_id, e);
            e
        })?;

        self.state = WidgetState {
            is_following: profile.followers.iter().any(|id| *id == self.viewer_id),
            followers_count: profile.followers.len(),
            source: StateSource::Server,
        };
        self.persist();
        Ok(self.state)
    }

    /// Follows or unfollows depending on the current flag.
    pub async fn toggle(&mut self) -> Result<WidgetState, WidgetError> {
        let result = if self.state.is_following {
            self.api.unfollow(&self.target_id).await
        } else {
            self.api.follow(&self.target_id).await
        };

        match result {
            Ok(response) => {
                log::info!("✅ {}", response.message);
                self.state.is_following = !self.state.is_following;
                self.persist();
                Ok(self.state)
            }
            Err(e) => {
                log::warn!("⚠️  Toggle on {} failed: {}", self.target_id, e);
                Err(e)
            }
        }
    }

    /// Applies a relay event; returns whether the state changed.
    pub fn apply_event(&mut self, event: &RelayEvent) -> bool {
        let (payload, following) = match event {
            RelayEvent::Follow(payload) => (payload, true),
            RelayEvent::Unfollow(payload) => (payload, false),
            _ => return false,
        };
        if payload.user_id != self.target_id {
            return false;
        }

        let before = self.state;
        self.state.followers_count = if following {
            self.state.followers_count + 1
        } else {
            self.state.followers_count.saturating_sub(1)
        };
        if payload.follower_id == self.viewer_id {
            self.state.is_following = following;
        }

        let changed = before != self.state;
        if changed {
            self.persist();
        }
        changed
    }

    fn persist(&self) {
        if let Err(e) = self.cache.store(&self.target_id, self.state.cached()) {
            log::warn!("⚠️  Could not write follow cache: {}", e);
        }
    }
}
