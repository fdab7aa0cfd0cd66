// Test doubles shared by the unit tests in this crate.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::io::Read;
use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

use crate::auth::OAuthProvider;
use crate::executor::TweetPublisher;
use crate::types::{
    CreatePostRequest, CreatedPost, CredentialBundle, TokenGrant, TweetResult, TwitterUser,
};

pub fn sample_bundle() -> CredentialBundle {
    CredentialBundle {
        user: TwitterUser {
            id: "42".to_string(),
            name: "Ada".to_string(),
            username: "ada".to_string(),
        },
        access_token: "access".to_string(),
        refresh_token: Some("refresh".to_string()),
        expires_in: 7200,
    }
}

#[derive(Clone, Copy)]
enum Failure {
    None,
    Exchange,
    Profile,
}

/// Provider that never leaves the process
pub struct FakeProvider {
    failure: Failure,
    exchanges: Mutex<Vec<(String, String)>>,
}

impl FakeProvider {
    fn with(failure: Failure) -> Self {
        Self {
            failure,
            exchanges: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::with(Failure::None)
    }

    pub fn failing_exchange() -> Self {
        Self::with(Failure::Exchange)
    }

    pub fn failing_profile() -> Self {
        Self::with(Failure::Profile)
    }

    /// `(code, verifier)` pairs seen by `exchange_code`
    pub fn exchanges(&self) -> Vec<(String, String)> {
        self.exchanges.lock().unwrap().clone()
    }
}

#[async_trait]
impl OAuthProvider for FakeProvider {
    fn authorize_url(&self, state: &str, code_challenge: &str) -> String {
        format!(
            "https://provider.test/authorize?state={}&code_challenge={}",
            urlencoding::encode(state),
            urlencoding::encode(code_challenge)
        )
    }

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<TokenGrant> {
        self.exchanges
            .lock()
            .unwrap()
            .push((code.to_string(), code_verifier.to_string()));

        if let Failure::Exchange = self.failure {
            return Err(anyhow!("Token exchange failed (400): invalid_grant"));
        }

        let bundle = sample_bundle();
        Ok(TokenGrant {
            access_token: bundle.access_token,
            refresh_token: bundle.refresh_token,
            expires_in: bundle.expires_in,
            scope: crate::auth::SCOPES.to_string(),
        })
    }

    async fn current_user(&self, _access_token: &str) -> Result<TwitterUser> {
        if let Failure::Profile = self.failure {
            return Err(anyhow!("Twitter API error 401 Unauthorized"));
        }
        Ok(sample_bundle().user)
    }
}

/// Publisher that records every request it receives
pub struct RecordingPublisher {
    fail: bool,
    calls: Mutex<Vec<CreatePostRequest>>,
}

impl RecordingPublisher {
    pub fn succeeding() -> Self {
        Self {
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<CreatePostRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TweetPublisher for RecordingPublisher {
    async fn create_post(&self, request: &CreatePostRequest) -> Result<TweetResult> {
        self.calls.lock().unwrap().push(request.clone());

        if self.fail {
            return Err(anyhow!("Twitter API error 401 Unauthorized"));
        }

        Ok(TweetResult {
            tweet_id: "1".to_string(),
            url: "https://twitter.com/i/status/1".to_string(),
            data: CreatedPost {
                id: "1".to_string(),
                text: request.text.clone(),
            },
        })
    }
}

/// Request captured by [`MockApi`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

/// Local HTTP server answering with canned `(status, json)` responses in order
pub struct MockApi {
    base_url: String,
    handle: JoinHandle<Vec<RecordedRequest>>,
}

impl MockApi {
    pub fn start(responses: Vec<(u16, String)>) -> Self {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();

        let handle = std::thread::spawn(move || {
            let mut recorded = Vec::new();
            for (status, body) in responses {
                let mut request = match server.recv_timeout(Duration::from_secs(10)) {
                    Ok(Some(request)) => request,
                    _ => break,
                };

                let mut request_body = String::new();
                let _ = request.as_reader().read_to_string(&mut request_body);
                let authorization = request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("Authorization"))
                    .map(|h| h.value.as_str().to_string());

                recorded.push(RecordedRequest {
                    method: request.method().as_str().to_string(),
                    path: request.url().to_string(),
                    authorization,
                    body: request_body,
                });

                let response = Response::from_string(body)
                    .with_status_code(status)
                    .with_header(
                        Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                            .unwrap(),
                    );
                let _ = request.respond(response);
            }
            recorded
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        self.base_url.clone()
    }

    /// Wait for the canned responses to be served and return what was received
    pub fn finish(self) -> Vec<RecordedRequest> {
        self.handle.join().unwrap()
    }
}
