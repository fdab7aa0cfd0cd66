//! ============================================================================
//! Executor Module - Outbound actions against the X API
//! ============================================================================
//! - TwitterExecutor: single post creation via Twitter API v2
//! ============================================================================

mod twitter;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{CreatePostRequest, TweetResult};

pub use twitter::TwitterExecutor;

/// Anything that can publish a post on behalf of an authenticated user
#[async_trait]
pub trait TweetPublisher: Send + Sync {
    async fn create_post(&self, request: &CreatePostRequest) -> Result<TweetResult>;
}
