//! ============================================================================
//! Twitter OAuth 2.0 + PKCE Client
//! ============================================================================
//! Builds the authorization URL, exchanges the authorization code for tokens
//! and fetches the authenticated user. Confidential clients send their
//! secret via HTTP Basic auth on the token request.
//! ============================================================================

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::config::AuthServerConfig;
use crate::types::{TokenGrant, TwitterUser};

const TWITTER_AUTH_URL: &str = "https://twitter.com/i/oauth2/authorize";
const TWITTER_TOKEN_URL: &str = "https://api.twitter.com/2/oauth2/token";
const TWITTER_API_BASE: &str = "https://api.twitter.com";

/// Read profile, read posts, write posts, offline access
pub const SCOPES: &str = "tweet.read users.read tweet.write offline.access";

/// Identity provider operations used by the auth flow
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Authorization URL the browser is redirected to
    fn authorize_url(&self, state: &str, code_challenge: &str) -> String;

    /// Exchange an authorization code plus PKCE verifier for tokens
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<TokenGrant>;

    /// Fetch the user the access token belongs to
    async fn current_user(&self, access_token: &str) -> Result<TwitterUser>;
}

/// Twitter OAuth 2.0 client
pub struct TwitterOAuth {
    client_id: String,
    client_secret: Option<String>,
    redirect_uri: String,
    auth_url: String,
    token_url: String,
    api_base: String,
    client: Client,
}

impl TwitterOAuth {
    /// Create a new Twitter OAuth client
    pub fn new(client_id: String, client_secret: Option<String>, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            auth_url: TWITTER_AUTH_URL.to_string(),
            token_url: TWITTER_TOKEN_URL.to_string(),
            api_base: TWITTER_API_BASE.to_string(),
            client: Client::new(),
        }
    }

    pub fn from_config(config: &AuthServerConfig) -> Self {
        Self::new(
            config.client_id.clone(),
            config.client_secret.clone(),
            config.callback_url.clone(),
        )
    }

    /// Point the client at different endpoints (e.g. a local mock)
    pub fn with_endpoints(
        mut self,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        self.auth_url = auth_url.into();
        self.token_url = token_url.into();
        self.api_base = api_base.into();
        self
    }
}

#[async_trait]
impl OAuthProvider for TwitterOAuth {
    fn authorize_url(&self, state: &str, code_challenge: &str) -> String {
        let url = format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&code_challenge={}&code_challenge_method=S256",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state),
            urlencoding::encode(code_challenge)
        );

        debug!("Generated auth URL with state: {}", state);
        url
    }

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<TokenGrant> {
        info!("Exchanging authorization code for tokens");

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("code_verifier", code_verifier),
        ];

        let mut request = self.client.post(&self.token_url).form(&params);
        if let Some(secret) = &self.client_secret {
            request = request.basic_auth(&self.client_id, Some(secret));
        }

        let response = request
            .send()
            .await
            .map_err(|e| anyhow!("Token request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Token exchange failed: {} - {}", status, error_text);
            return Err(anyhow!("Token exchange failed ({}): {}", status, error_text));
        }

        let grant: TokenGrant = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse token response: {}", e))?;

        info!(
            "Successfully obtained tokens, expires in {} seconds",
            grant.expires_in
        );

        Ok(grant)
    }

    async fn current_user(&self, access_token: &str) -> Result<TwitterUser> {
        let url = format!("{}/2/users/me", self.api_base);

        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| anyhow!("Profile request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Twitter API error {}: {}", status, body));
        }

        let me: UserResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse profile response: {}", e))?;

        info!("Authenticated as @{} ({})", me.data.username, me.data.id);
        Ok(me.data)
    }
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    data: TwitterUser,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;

    fn oauth_for(mock: &MockApi, secret: Option<&str>) -> TwitterOAuth {
        TwitterOAuth::new(
            "test_client_id".to_string(),
            secret.map(str::to_string),
            "http://localhost:3000/callback".to_string(),
        )
        .with_endpoints(
            "https://twitter.com/i/oauth2/authorize",
            format!("{}/2/oauth2/token", mock.base_url()),
            mock.base_url(),
        )
    }

    #[test]
    fn test_auth_url_generation() {
        let oauth = TwitterOAuth::new(
            "test_client_id".to_string(),
            None,
            "http://localhost:3000/callback".to_string(),
        );
        let url = oauth.authorize_url("abc123", "challenge");

        let parsed = url::Url::parse(&url).unwrap();
        let params: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();

        assert_eq!(parsed.host_str(), Some("twitter.com"));
        assert_eq!(params["client_id"], "test_client_id");
        assert_eq!(params["redirect_uri"], "http://localhost:3000/callback");
        assert_eq!(params["scope"], SCOPES);
        assert_eq!(params["state"], "abc123");
        assert_eq!(params["code_challenge"], "challenge");
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(params["response_type"], "code");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_exchange_code_sends_verifier_and_basic_auth() {
        let mock = MockApi::start(vec![(
            200,
            r#"{"token_type":"bearer","access_token":"at","refresh_token":"rt","expires_in":7200,"scope":"tweet.read"}"#
                .to_string(),
        )]);
        let oauth = oauth_for(&mock, Some("shh"));

        let grant = oauth.exchange_code("the-code", "the-verifier").await.unwrap();
        assert_eq!(grant.access_token, "at");
        assert_eq!(grant.refresh_token.as_deref(), Some("rt"));
        assert_eq!(grant.expires_in, 7200);

        let requests = mock.finish();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.method, "POST");
        assert_eq!(req.path, "/2/oauth2/token");
        assert!(req.body.contains("code=the-code"));
        assert!(req.body.contains("code_verifier=the-verifier"));
        assert!(req.body.contains("grant_type=authorization_code"));
        assert!(req
            .authorization
            .as_deref()
            .is_some_and(|v| v.starts_with("Basic ")));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_exchange_code_provider_error() {
        let mock = MockApi::start(vec![(
            400,
            r#"{"error":"invalid_request","error_description":"Value passed for the authorization code was invalid."}"#
                .to_string(),
        )]);
        let oauth = oauth_for(&mock, None);

        let err = oauth.exchange_code("stale", "verifier").await.unwrap_err();
        assert!(err.to_string().contains("400"));

        let requests = mock.finish();
        assert!(requests[0].authorization.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_current_user() {
        let mock = MockApi::start(vec![(
            200,
            r#"{"data":{"id":"2244994945","name":"Developers","username":"XDevelopers"}}"#
                .to_string(),
        )]);
        let oauth = oauth_for(&mock, None);

        let user = oauth.current_user("at").await.unwrap();
        assert_eq!(user.username, "XDevelopers");

        let requests = mock.finish();
        assert_eq!(requests[0].path, "/2/users/me");
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer at"));
    }
}
