use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

/// `user_types` ids seeded alongside the users collection
pub const ADMIN_TYPE_ID: &str = "676ba1a1fd30e9f16f59769a";
pub const USER_TYPE_ID: &str = "676ba1c1fd30e9f16f59769b";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Resolves the `user_type` reference. Unknown or missing references are plain users.
    pub fn from_type_id(type_id: Option<&ObjectId>) -> Self {
        match type_id {
            Some(id) if id.to_hex() == ADMIN_TYPE_ID => Role::Admin,
            _ => Role::User,
        }
    }

    pub fn type_id(self) -> Option<ObjectId> {
        let raw = match self {
            Role::Admin => ADMIN_TYPE_ID,
            Role::User => USER_TYPE_ID,
        };
        ObjectId::parse_str(raw).ok()
    }
}

/// Usuário (armazenado no MongoDB, coleção `users`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    pub email: String,

    /// Hash written by the auth service. Never leaves the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default)]
    pub age: i32,

    #[serde(default)]
    pub bio: String,

    #[serde(default)]
    pub interests: Vec<String>,

    #[serde(default, rename = "profilePicture")]
    pub profile_picture: String,

    #[serde(default)]
    pub followers: Vec<ObjectId>,

    #[serde(default)]
    pub following: Vec<ObjectId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<ObjectId>,

    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<BsonDateTime>,

    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<BsonDateTime>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: i32) -> Self {
        User {
            id: None,
            name: name.into(),
            username: None,
            email: email.into(),
            password: None,
            age,
            bio: String::new(),
            interests: Vec::new(),
            profile_picture: String::new(),
            followers: Vec::new(),
            following: Vec::new(),
            user_type: Role::User.type_id(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }

    pub fn role(&self) -> Role {
        Role::from_type_id(self.user_type.as_ref())
    }

    pub fn is_following(&self, other: &ObjectId) -> bool {
        self.following.contains(other)
    }

    pub fn has_follower(&self, other: &ObjectId) -> bool {
        self.followers.contains(other)
    }
}

pub fn ids_to_hex(ids: &[ObjectId]) -> Vec<String> {
    ids.iter().map(|id| id.to_hex()).collect()
}

/// Perfil público (sem credenciais)
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub email: String,
    pub age: i32,
    pub bio: String,
    pub interests: Vec<String>,
    #[serde(rename = "profilePicture")]
    pub profile_picture: String,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub role: Role,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        UserProfile {
            id: user.id_hex(),
            role: user.role(),
            followers: ids_to_hex(&user.followers),
            following: ids_to_hex(&user.following),
            name: user.name,
            username: user.username,
            email: user.email,
            age: user.age,
            bio: user.bio,
            interests: user.interests,
            profile_picture: user.profile_picture,
            created_at: user.created_at.map(|d| d.timestamp_millis()),
            updated_at: user.updated_at.map(|d| d.timestamp_millis()),
        }
    }
}

/// Entrada resumida para listas de followers/following
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "profilePicture")]
    pub profile_picture: String,
}

impl UserSummary {
    pub fn from_user(user: &User, with_email: bool) -> Self {
        UserSummary {
            id: user.id_hex(),
            name: user.name.clone(),
            email: with_email.then(|| user.email.clone()),
            profile_picture: user.profile_picture.clone(),
        }
    }
}

/// Request para atualizar o perfil do usuário logado
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub interests: Option<Vec<String>>,
}

/// Validated subset of an [`UpdateUserRequest`], ready for the store.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub interests: Option<Vec<String>>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.bio.is_none() && self.interests.is_none()
    }
}

/// Response de follow/unfollow
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FollowResponse {
    pub message: String,
    /// Following list of the acting user
    pub following: Vec<String>,
    /// Followers list of the target user
    pub followers: Vec<String>,
}
