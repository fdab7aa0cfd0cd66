//! ============================================================================
//! Poster - Load stored credentials and publish one post
//! ============================================================================
//! No retries and no expiry check: an expired token is sent as-is and the
//! API's rejection is reported back.
//! ============================================================================

use tracing::{error, info};

use crate::executor::TweetPublisher;
use crate::store::CredentialStore;
use crate::types::{CredentialBundle, PostDraft, TweetResult, TweetgateError};

/// Text posted when none is given
pub const DEFAULT_POST_TEXT: &str = "My tweet text from api";

/// Maximum post length in characters
pub const MAX_POST_CHARS: usize = 280;

/// Read the credential bundle written by the auth server
pub fn load_credentials(store: &dyn CredentialStore) -> Result<CredentialBundle, TweetgateError> {
    match store.load() {
        Ok(Some(bundle)) if bundle.access_token.trim().is_empty() => {
            error!("Credential file has an empty access token");
            Err(TweetgateError::CredentialLoad(
                "Access token not found. Please authenticate first.".to_string(),
            ))
        }
        Ok(Some(bundle)) => {
            info!("Loaded credentials for @{}", bundle.user.username);
            Ok(bundle)
        }
        Ok(None) => Err(TweetgateError::CredentialLoad(
            "Access token not found. Please authenticate first.".to_string(),
        )),
        Err(e) => {
            error!("Error reading access token: {}", e);
            Err(TweetgateError::CredentialLoad(e.to_string()))
        }
    }
}

/// Publish a single post. Exactly one API call unless the draft is rejected locally.
pub async fn publish(
    publisher: &dyn TweetPublisher,
    draft: &PostDraft,
) -> Result<TweetResult, TweetgateError> {
    let length = draft.text.chars().count();
    if length > MAX_POST_CHARS {
        return Err(TweetgateError::Publish(format!(
            "Tweet exceeds {} characters ({})",
            MAX_POST_CHARS, length
        )));
    }

    let request = draft.to_request();
    publisher.create_post(&request).await.map_err(|e| {
        error!("Error posting tweet: {}", e);
        TweetgateError::Publish(e.to_string())
    })
}

/// Load the stored credentials, build a publisher from them and publish one post.
///
/// A load failure returns before `connect` runs, so nothing touches the network.
pub async fn post_with_stored_credentials<P, F>(
    store: &dyn CredentialStore,
    connect: F,
    draft: &PostDraft,
) -> Result<TweetResult, TweetgateError>
where
    P: TweetPublisher,
    F: FnOnce(&CredentialBundle) -> P,
{
    let credentials = load_credentials(store)?;
    let publisher = connect(&credentials);
    publish(&publisher, draft).await
}
