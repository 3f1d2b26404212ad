//! Signed session tokens.
//!
//! ARCHITECTURE
//! ============
//! The backend issues HS256 JWTs carrying `{username, isAdmin, iat}` signed
//! with the process secret. The client never holds the secret: it only
//! reads the payload to learn which user to fetch, and the API re-checks the
//! signature on every authenticated request.
//!
//! Tokens carry no `exp`. They live until the client discards them.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::IssuerConfig;

/// Payload of every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    /// Copy of the admin flag at issue time. Display hint only; the fetched
    /// user record is authoritative.
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
    /// Issued-at, unix seconds.
    #[serde(default)]
    pub iat: i64,
}

/// The user fields the issuer reads. `is_admin: None` means the caller
/// passed a record without the flag at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub username: String,
    pub is_admin: Option<bool>,
}

impl TokenSubject {
    #[must_use]
    pub fn new(username: impl Into<String>, is_admin: Option<bool>) -> Self {
        Self { username: username.into(), is_admin }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token encode failed: {0}")]
    Encode(String),
    #[error("token decode failed: {0}")]
    Decode(String),
    #[error("token signature is invalid")]
    InvalidSignature,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            _ => Self::Decode(e.to_string()),
        }
    }
}

/// Signs and verifies tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    #[must_use]
    pub fn from_config(config: &IssuerConfig) -> Self {
        Self::new(&config.secret_key)
    }

    /// Sign a token for `subject`. A missing admin flag is encoded as `false`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Encode`] if the claims cannot be serialized or signed.
    pub fn create_token(&self, subject: &TokenSubject) -> Result<String, TokenError> {
        if subject.is_admin.is_none() {
            tracing::warn!(username = %subject.username, "created token for user without isAdmin");
        }

        let claims = Claims {
            username: subject.username.clone(),
            is_admin: subject.is_admin.unwrap_or(false),
            iat: time::OffsetDateTime::now_utc().unix_timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Check the signature and return the claims.
    ///
    /// # Errors
    ///
    /// [`TokenError::InvalidSignature`] when signed with another secret,
    /// [`TokenError::Decode`] when the token is malformed.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &claims_validation())?;
        Ok(data.claims)
    }
}

/// Read the claims without checking the signature.
///
/// This is what the client does with a stored token: it has no secret, and
/// the API rejects forged tokens on the follow-up request anyway.
///
/// # Errors
///
/// Returns [`TokenError::Decode`] if the token is not a well-formed JWT with
/// the expected payload.
pub fn decode_claims(token: &str) -> Result<Claims, TokenError> {
    let mut validation = claims_validation();
    validation.insecure_disable_signature_validation();
    let data = jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

fn claims_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation
}

#[cfg(test)]
#[path = "token_test.rs"]
mod tests;
