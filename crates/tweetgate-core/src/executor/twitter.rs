//! ============================================================================
//! Twitter Executor - Posting via X API v2
//! ============================================================================
//! Sends a single `POST /2/tweets` with an OAuth 2.0 Bearer token.
//! ============================================================================

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::TweetPublisher;
use crate::types::{CreatePostRequest, CreatedPost, TweetResult};

const TWITTER_API_BASE: &str = "https://api.twitter.com";

/// Executor for Twitter posting operations
pub struct TwitterExecutor {
    client: reqwest::Client,
    access_token: String,
    api_base: String,
}

impl TwitterExecutor {
    /// Create a new TwitterExecutor with OAuth 2.0 access token
    pub fn new(access_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token,
            api_base: TWITTER_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[async_trait]
impl TweetPublisher for TwitterExecutor {
    async fn create_post(&self, request: &CreatePostRequest) -> Result<TweetResult> {
        let preview: String = request.text.chars().take(50).collect();
        info!("Posting tweet: {}...", preview);

        let response = self
            .client
            .post(format!("{}/2/tweets", self.api_base))
            .bearer_auth(&self.access_token)
            .json(request)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to post tweet: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Twitter API error {}: {}", status, body));
        }

        let tweet_response: TwitterTweetResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse tweet response: {}", e))?;

        let data = tweet_response.data;
        let url = format!("https://twitter.com/i/status/{}", data.id);

        info!("Tweet posted: {}", url);

        Ok(TweetResult {
            tweet_id: data.id.clone(),
            url,
            data,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TwitterTweetResponse {
    data: CreatedPost,
}
