use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::WidgetError;
use crate::models::{FollowResponse, UserProfile};

/// HTTP surface the widget needs.
#[async_trait]
pub trait FollowApi: Send + Sync {
    async fn profile(&self, user_id: &str) -> Result<UserProfile, WidgetError>;
    async fn follow(&self, user_id: &str) -> Result<FollowResponse, WidgetError>;
    async fn unfollow(&self, user_id: &str) -> Result<FollowResponse, WidgetError>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

pub struct HttpFollowApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpFollowApi {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, WidgetError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(HttpFollowApi {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn url(&self, prefix: &str, user_id: &str) -> String {
        format!("{}/{}/{}", self.base_url, prefix, urlencoding::encode(user_id))
    }

    async fn mutate(&self, prefix: &str, user_id: &str) -> Result<FollowResponse, WidgetError> {
        let response = self
            .client
            .post(self.url(prefix, user_id))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(read_json(response).await?)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, WidgetError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());
    Err(WidgetError::Rejected { status: status.as_u16(), message })
}

#[async_trait]
impl FollowApi for HttpFollowApi {
    async fn profile(&self, user_id: &str) -> Result<UserProfile, WidgetError> {
        let response = self.client.get(self.url("user", user_id)).send().await?;
        let envelope: Envelope<UserProfile> = read_json(response).await?;
        Ok(envelope.data)
    }

    async fn follow(&self, user_id: &str) -> Result<FollowResponse, WidgetError> {
        self.mutate("follow", user_id).await
    }

    async fn unfollow(&self, user_id: &str) -> Result<FollowResponse, WidgetError> {
        self.mutate("unfollow", user_id).await
    }
}
