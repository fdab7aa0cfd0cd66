//! ============================================================================
//! Session Store - Per-browser authorization attempts
//! ============================================================================
//! Holds `{state, code_verifier}` between the start redirect and the
//! callback, keyed by a session id carried in a signed `sessionId` cookie.
//! Cookie value: `<uuid>.<base64url(HMAC-SHA256(secret, uuid))>`.
//! ============================================================================

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "sessionId";

/// Pending attempts kept before the oldest is evicted
pub const MAX_PENDING_ATTEMPTS: usize = 1024;

/// State stored while waiting for the provider to call back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthAttempt {
    pub state: String,
    pub code_verifier: String,
    pub created_at: DateTime<Utc>,
}

impl AuthAttempt {
    pub fn new(state: String, code_verifier: String) -> Self {
        Self {
            state,
            code_verifier,
            created_at: Utc::now(),
        }
    }
}

pub struct SessionStore {
    mac: HmacSha256,
    attempts: Mutex<HashMap<String, AuthAttempt>>,
    max_attempts: usize,
}

impl SessionStore {
    pub fn new(secret: &str) -> Result<Self> {
        Self::with_capacity(secret, MAX_PENDING_ATTEMPTS)
    }

    pub fn with_capacity(secret: &str, max_attempts: usize) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| anyhow!("Invalid session secret: {}", e))?;

        Ok(Self {
            mac,
            attempts: Mutex::new(HashMap::new()),
            max_attempts: max_attempts.max(1),
        })
    }

    /// Mint a fresh session id
    pub fn new_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn signature(&self, session_id: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(session_id.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    /// Signed cookie value for a session id
    pub fn sign(&self, session_id: &str) -> String {
        format!("{}.{}", session_id, self.signature(session_id))
    }

    /// Session id from a signed cookie value, if the signature checks out
    pub fn verify(&self, cookie_value: &str) -> Option<String> {
        let (session_id, signature) = cookie_value.rsplit_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        let mut mac = self.mac.clone();
        mac.update(session_id.as_bytes());
        mac.verify_slice(&signature).ok()?;

        Some(session_id.to_string())
    }

    /// Extract and verify the session id from a raw `Cookie` header
    pub fn session_from_cookie_header(&self, header: Option<&str>) -> Option<String> {
        let value = header?
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, value)| value.trim_matches('"'))?;

        let verified = self.verify(value);
        if verified.is_none() {
            debug!("Ignoring session cookie with a bad signature");
        }
        verified
    }

    /// `Set-Cookie` header value for a session id
    pub fn set_cookie_header(&self, session_id: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE,
            self.sign(session_id)
        )
    }

    fn attempts(&self) -> MutexGuard<'_, HashMap<String, AuthAttempt>> {
        self.attempts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store an attempt, replacing any previous one for the session.
    /// At capacity the oldest pending attempt is dropped first.
    pub fn insert(&self, session_id: &str, attempt: AuthAttempt) {
        let mut attempts = self.attempts();
        while !attempts.contains_key(session_id) && attempts.len() >= self.max_attempts {
            let oldest = attempts
                .iter()
                .min_by_key(|(_, pending)| pending.created_at)
                .map(|(id, _)| id.clone());
            let Some(oldest) = oldest else { break };
            if let Some(evicted) = attempts.remove(&oldest) {
                debug!(
                    "Evicted authorization attempt started at {}",
                    evicted.created_at
                );
            }
        }
        attempts.insert(session_id.to_string(), attempt);
    }

    /// Remove and return the attempt for a session
    pub fn take(&self, session_id: &str) -> Option<AuthAttempt> {
        self.attempts().remove(session_id)
    }

    pub fn get(&self, session_id: &str) -> Option<AuthAttempt> {
        self.attempts().get(session_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.attempts().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
