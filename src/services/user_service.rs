use crate::{
    database::UserStore,
    models::{ProfileChanges, UpdateUserRequest, UserProfile, UserSummary},
    services::parse_user_id,
    utils::AppError,
};

pub async fn list_users(store: &dyn UserStore) -> Result<Vec<UserProfile>, AppError> {
    let users = store.list().await?;
    Ok(users.into_iter().map(UserProfile::from).collect())
}

pub async fn get_user(store: &dyn UserStore, user_id: &str) -> Result<UserProfile, AppError> {
    let id = parse_user_id(user_id)?;
    store
        .find_by_id(&id)
        .await?
        .map(UserProfile::from)
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))
}

/// Followers of `user_id`, as `{_id, name, profilePicture}`
pub async fn followers(store: &dyn UserStore, user_id: &str) -> Result<Vec<UserSummary>, AppError> {
    let id = parse_user_id(user_id)?;
    let user = store
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    let users = store.find_many(&user.followers).await?;
    Ok(users.iter().map(|u| UserSummary::from_user(u, false)).collect())
}

/// Users followed by `user_id`, with their email
pub async fn following(store: &dyn UserStore, user_id: &str) -> Result<Vec<UserSummary>, AppError> {
    let id = parse_user_id(user_id)?;
    let user = store
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    let users = store.find_many(&user.following).await?;
    Ok(users.iter().map(|u| UserSummary::from_user(u, true)).collect())
}

pub async fn update_profile(
    store: &dyn UserStore,
    user_id: &str,
    request: UpdateUserRequest,
) -> Result<UserProfile, AppError> {
    let id = parse_user_id(user_id)?;
    let mut changes = ProfileChanges::default();

    // Campos vazios são ignorados, como campos ausentes
    if let Some(name) = request.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
        if !is_valid_name(&name) {
            return Err(AppError::InvalidRequest("Invalid name format".to_string()));
        }
        changes.name = Some(name);
    }

    if let Some(email) = request.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()) {
        if !is_valid_email(&email) {
            return Err(AppError::InvalidRequest("Invalid email format".to_string()));
        }
        if let Some(owner) = store.find_by_email(&email).await? {
            if owner.id != Some(id) {
                return Err(AppError::InvalidRequest("Email is already in use".to_string()));
            }
        }
        changes.email = Some(email);
    }

    changes.bio = request.bio.map(|b| b.trim().to_string());
    changes.interests = request.interests.map(|list| {
        list.into_iter()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect()
    });

    if changes.is_empty() {
        return Err(AppError::InvalidRequest("No valid fields provided to update".to_string()));
    }

    let updated = store
        .update_profile(&id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    log::info!("✅ Profile of {} updated", id);
    Ok(UserProfile::from(updated))
}

/// ASCII letters, words joined by a single space, apostrophe or hyphen.
pub fn is_valid_name(name: &str) -> bool {
    let mut previous_separator = true;
    for c in name.chars() {
        if c.is_ascii_alphabetic() {
            previous_separator = false;
        } else if matches!(c, ' ' | '\'' | '-') {
            if previous_separator {
                return false;
            }
            previous_separator = true;
        } else {
            return false;
        }
    }
    !previous_separator
}

/// `local@domain.tld` with a letters-only tld of two or more characters.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local.chars().all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));

    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    let host_ok = !host.is_empty() && host.chars().all(|c| c.is_ascii_alphanumeric() || ".-".contains(c));
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());

    local_ok && host_ok && tld_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::FollowService;
    use crate::testing::store_with;
    use std::sync::Arc;

    #[test]
    fn name_rules() {
        assert!(is_valid_name("Alice"));
        assert!(is_valid_name("Mary Jane"));
        assert!(is_valid_name("O'Neil-Smith"));
        assert!(!is_valid_name("Alice  Smith"));
        assert!(!is_valid_name("Alice-"));
        assert!(!is_valid_name("-Alice"));
        assert!(!is_valid_name("R2D2"));
        assert!(!is_valid_name(""));
    }

    #[test]
    fn email_rules() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("a.b+tag@mail.example.org"));
        assert!(!is_valid_email("alice@example"));
        assert!(!is_valid_email("alice@example.c"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("alice example.com"));
    }

    #[tokio::test]
    async fn follower_lists_are_summaries() {
        let (store, ids) = store_with(&["alice", "bob", "carol"]).await;
        let publisher = Arc::new(crate::relay::RelayHub::new(4));
        let follows = FollowService::new(store.clone(), publisher);
        let (alice, bob, carol) = (ids[0].to_hex(), ids[1].to_hex(), ids[2].to_hex());
        follows.follow(&alice, &bob).await.unwrap();
        follows.follow(&carol, &bob).await.unwrap();

        let list = followers(store.as_ref(), &bob).await.unwrap();
        assert_eq!(list.iter().map(|s| s.id.clone()).collect::<Vec<_>>(), vec![alice.clone(), carol]);
        assert!(list.iter().all(|s| s.email.is_none()));

        let list = following(store.as_ref(), &alice).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "bob");
        assert_eq!(list[0].email.as_deref(), Some("bob@example.com"));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (store, _ids) = store_with(&[]).await;
        let ghost = mongodb::bson::oid::ObjectId::new().to_hex();
        assert!(matches!(get_user(store.as_ref(), &ghost).await, Err(AppError::NotFound(_))));
        assert!(matches!(followers(store.as_ref(), "xyz").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_profile_validates_input() {
        let (store, ids) = store_with(&["alice", "bob"]).await;
        let alice = ids[0].to_hex();

        let err = update_profile(store.as_ref(), &alice, UpdateUserRequest::default()).await.unwrap_err();
        assert_eq!(err.message(), "No valid fields provided to update");

        let taken = UpdateUserRequest { email: Some("bob@example.com".into()), ..Default::default() };
        let err = update_profile(store.as_ref(), &alice, taken).await.unwrap_err();
        assert_eq!(err.message(), "Email is already in use");

        let bad_name = UpdateUserRequest { name: Some("al1ce".into()), ..Default::default() };
        let err = update_profile(store.as_ref(), &alice, bad_name).await.unwrap_err();
        assert_eq!(err.message(), "Invalid name format");

        let own_email = UpdateUserRequest {
            email: Some("alice@example.com".into()),
            bio: Some("  hello  ".into()),
            ..Default::default()
        };
        let profile = update_profile(store.as_ref(), &alice, own_email).await.unwrap();
        assert_eq!(profile.bio, "hello");
        assert_eq!(profile.email, "alice@example.com");
    }
}
