use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Source of the signed-in user's stable identifier.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Identifier every record is owned by.
    async fn user_id(&self) -> Result<String>;

    /// Bearer token for the record store, if the backend needs one.
    async fn bearer_token(&self) -> Result<Option<String>>;
}

/// Identity taken from a session JWT issued by the backend.
///
/// The token is trusted as-is; its signature is checked by the backend on
/// every request, so only the payload is decoded here.
#[derive(Clone)]
pub struct TokenIdentity {
    token: String,
    user_id: Arc<Mutex<Option<String>>>,
}

impl TokenIdentity {
    pub fn new(token: String) -> Self {
        Self {
            token,
            user_id: Arc::new(Mutex::new(None)),
        }
    }
}

#[async_trait]
impl IdentityProvider for TokenIdentity {
    async fn user_id(&self) -> Result<String> {
        let mut cached = self.user_id.lock().await;
        if let Some(ref uid) = *cached {
            return Ok(uid.clone());
        }
        let uid = user_id_from_jwt(&self.token)?;
        *cached = Some(uid.clone());
        Ok(uid)
    }

    async fn bearer_token(&self) -> Result<Option<String>> {
        Ok(Some(self.token.clone()))
    }
}

/// A fixed user with no credentials, for trusted callers and tests.
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub String);

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn user_id(&self) -> Result<String> {
        Ok(self.0.clone())
    }

    async fn bearer_token(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Records are keyed by email; fall back to `sub` for tokens without one.
fn user_id_from_jwt(token: &str) -> Result<String> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(anyhow!("Invalid JWT format"));
    }

    let decoded = base64url_decode(parts[1])?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded)?;
    claims["email"]
        .as_str()
        .or_else(|| claims["sub"].as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow!("No email or sub claim in token"))
}

/// Decode unpadded URL-safe base64, as used in JWT segments.
fn base64url_decode(input: &str) -> Result<Vec<u8>> {
    let sextet = |c: u8| -> Result<u32> {
        match c {
            b'A'..=b'Z' => Ok(u32::from(c - b'A')),
            b'a'..=b'z' => Ok(u32::from(c - b'a') + 26),
            b'0'..=b'9' => Ok(u32::from(c - b'0') + 52),
            b'-' | b'+' => Ok(62),
            b'_' | b'/' => Ok(63),
            _ => Err(anyhow!("Invalid base64 character: {}", c as char)),
        }
    };

    let bytes: Vec<u8> = input.bytes().filter(|b| *b != b'=').collect();
    if bytes.len() % 4 == 1 {
        return Err(anyhow!("Truncated base64 input"));
    }

    let mut out = Vec::with_capacity(bytes.len() * 3 / 4);
    for chunk in bytes.chunks(4) {
        let mut acc = 0u32;
        for (i, c) in chunk.iter().enumerate() {
            acc |= sextet(*c)? << (18 - 6 * i);
        }
        out.push((acc >> 16) as u8);
        if chunk.len() > 2 {
            out.push((acc >> 8) as u8);
        }
        if chunk.len() > 3 {
            out.push(acc as u8);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    // {"alg":"none"} . {"email":"athlete@example.com","sub":"42"} . sig
    const TOKEN: &str =
        "eyJhbGciOiJub25lIn0.eyJlbWFpbCI6ImF0aGxldGVAZXhhbXBsZS5jb20iLCJzdWIiOiI0MiJ9.c2ln";

    #[test]
    fn decodes_unpadded_segments() {
        assert_eq!(base64url_decode("aGk").unwrap(), b"hi");
        assert_eq!(base64url_decode("aGk=").unwrap(), b"hi");
        assert_eq!(base64url_decode("aGV5").unwrap(), b"hey");
        assert!(base64url_decode("a").is_err());
        assert!(base64url_decode("a*bc").is_err());
    }

    #[tokio::test]
    async fn token_identity_reads_email_claim() {
        let identity = TokenIdentity::new(TOKEN.to_string());
        assert_eq!(identity.user_id().await.unwrap(), "athlete@example.com");
        assert_eq!(identity.bearer_token().await.unwrap().as_deref(), Some(TOKEN));
    }

    #[tokio::test]
    async fn malformed_token_is_an_error() {
        let identity = TokenIdentity::new("not-a-jwt".to_string());
        assert!(identity.user_id().await.is_err());
    }
}
