use serde::Deserialize;
use std::path::Path;

use crate::database::UserStore;
use crate::models::{Role, User};

/// Entrada do arquivo de seed (`SEED_USERS_FILE`)
#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    pub email: String,
    #[serde(default)]
    pub age: i32,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default, rename = "profilePicture")]
    pub profile_picture: Option<String>,
    /// "admin" or "user"
    #[serde(default)]
    pub role: Option<String>,
}

impl From<SeedUser> for User {
    fn from(seed: SeedUser) -> Self {
        let mut user = User::new(seed.name, seed.email, seed.age);
        user.username = seed.username;
        user.bio = seed.bio.unwrap_or_default();
        user.interests = seed.interests;
        user.profile_picture = seed.profile_picture.unwrap_or_default();
        if seed.role.as_deref().map(str::to_ascii_lowercase).as_deref() == Some("admin") {
            user.user_type = Role::Admin.type_id();
        }
        user
    }
}

/// Carrega usuários de um arquivo JSON.
/// Usuários cujo email já existe são ignorados; falhas só são logadas.
pub async fn seed_users(store: &dyn UserStore, path: &Path) -> usize {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            log::error!("   ❌ Could not read seed file {}: {}", path.display(), e);
            return 0;
        }
    };

    let seeds: Vec<SeedUser> = match serde_json::from_str(&raw) {
        Ok(seeds) => seeds,
        Err(e) => {
            log::error!("   ❌ Invalid seed file {}: {}", path.display(), e);
            return 0;
        }
    };

    log::info!("🌱 Users seed: {} entries in {}", seeds.len(), path.display());

    let mut inserted = 0;
    for seed in seeds {
        match store.find_by_email(&seed.email).await {
            Ok(Some(_)) => {
                log::debug!("   ⏭️  {} already present", seed.email);
                continue;
            }
            Ok(None) => {}
            Err(e) => {
                log::error!("   ❌ Seed lookup for {} failed: {}", seed.email, e);
                continue;
            }
        }

        let email = seed.email.clone();
        match store.insert(User::from(seed)).await {
            Ok(_) => inserted += 1,
            Err(e) => log::error!("   ❌ Failed to seed {}: {}", email, e),
        }
    }

    log::info!("   ✅ Inserted {} seed users", inserted);
    inserted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::store_with;
    use std::io::Write;

    #[tokio::test]
    async fn inserts_only_missing_users() {
        let (store, _ids) = store_with(&["alice"]).await;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"name": "alice", "email": "alice@example.com", "age": 30}},
                {{"name": "Root", "email": "root@example.com", "role": "Admin", "interests": ["ops"]}}
            ]"#
        )
        .unwrap();

        assert_eq!(seed_users(store.as_ref(), file.path()).await, 1);
        assert_eq!(store.list().await.unwrap().len(), 2);

        let root = store.find_by_email("root@example.com").await.unwrap().unwrap();
        assert_eq!(root.role(), Role::Admin);
        assert_eq!(root.interests, vec!["ops".to_string()]);

        // Segunda execução não duplica
        assert_eq!(seed_users(store.as_ref(), file.path()).await, 0);
    }

    #[tokio::test]
    async fn unreadable_file_inserts_nothing() {
        let (store, _ids) = store_with(&[]).await;
        assert_eq!(seed_users(store.as_ref(), Path::new("/nonexistent/seed.json")).await, 0);
        assert!(store.list().await.unwrap().is_empty());
    }
}
