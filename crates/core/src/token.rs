//! Signed bearer tokens.
//!
//! A token is `hex(msgpack(claims)) "." hex(ed25519 signature)`.

use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::{SiteId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: UserId,
    pub site_id: SiteId,
    pub issued_at_ms: u64,
    pub expires_at_ms: u64,
}

pub struct TokenSigner {
    signing_key: ed25519_dalek::SigningKey,
}

impl TokenSigner {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut rng),
        }
    }

    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(bytes),
        }
    }

    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    pub fn issue(&self, claims: &Claims) -> Result<String, CoreError> {
        let payload =
            rmp_serde::to_vec(claims).map_err(|e| CoreError::Serialization(e.to_string()))?;
        let sig = self.signing_key.sign(&payload);
        Ok(format!("{}.{}", hex::encode(&payload), hex::encode(sig.to_bytes())))
    }

    /// Check signature and expiry against `now_ms`.
    pub fn verify(&self, token: &str, now_ms: u64) -> Result<Claims, CoreError> {
        let (payload_hex, sig_hex) = token
            .split_once('.')
            .ok_or_else(|| CoreError::InvalidToken("malformed token".into()))?;
        let payload =
            hex::decode(payload_hex).map_err(|_| CoreError::InvalidToken("bad payload".into()))?;
        let sig_bytes: [u8; 64] = hex::decode(sig_hex)
            .ok()
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| CoreError::InvalidToken("bad signature encoding".into()))?;

        let sig = ed25519_dalek::Signature::from_bytes(&sig_bytes);
        self.signing_key
            .verifying_key()
            .verify(&payload, &sig)
            .map_err(|_| CoreError::InvalidToken("signature mismatch".into()))?;

        let claims: Claims = rmp_serde::from_slice(&payload)
            .map_err(|e| CoreError::InvalidToken(format!("bad claims: {e}")))?;
        if claims.expires_at_ms <= now_ms {
            return Err(CoreError::InvalidToken("token expired".into()));
        }
        Ok(claims)
    }
}
