//! PKCE verifier/challenge pairs and CSRF state nonces.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use sha2::{Digest, Sha256};

/// Unreserved characters allowed in a code verifier (RFC 7636 section 4.1)
const VERIFIER_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";
const VERIFIER_LEN: usize = 64;
const STATE_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub struct PkceCodes {
    pub code_verifier: String,
    pub code_challenge: String,
}

/// Generate a random verifier and its S256 challenge
pub fn generate_pkce() -> PkceCodes {
    let mut rng = rand::thread_rng();
    let code_verifier: String = (0..VERIFIER_LEN)
        .map(|_| VERIFIER_CHARSET[rng.gen_range(0..VERIFIER_CHARSET.len())] as char)
        .collect();

    let code_challenge = s256_challenge(&code_verifier);

    PkceCodes {
        code_verifier,
        code_challenge,
    }
}

/// BASE64URL(SHA256(verifier)) without padding
pub fn s256_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Random state parameter for CSRF protection
pub fn generate_state() -> String {
    (0..STATE_BYTES)
        .map(|_| format!("{:02x}", rand::random::<u8>()))
        .collect()
}
