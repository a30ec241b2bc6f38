//! Signed token encoding and verification
//!
//! Implements the token codec with HMAC signing via `jsonwebtoken`. The codec
//! is kind-agnostic: access tokens (short TTL, carry a role) and refresh
//! tokens (long TTL, subject only) share it, with callers choosing TTL and
//! payload shape.

use authgate_core::{Role, SecurityConfig};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Claims carried by a signed token
///
/// Immutable once minted; exists only as an encoded string held by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user id
    pub sub: String,
    /// Role, present on access tokens, absent on refresh tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Expiration timestamp (Unix epoch seconds)
    pub exp: u64,
}

/// Token encoding and verification errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Token structure or signature is invalid")]
    MalformedToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Failed to encode token: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),
}

/// Token codec
///
/// Holds the signing key material and validation rules, built once from
/// configuration at startup and passed by reference to the service layer.
/// Never mutated afterwards.
pub struct TokenCodec {
    header: Header,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Build a codec from the signing configuration
    ///
    /// # Errors
    ///
    /// Fails if the configured algorithm is unknown or not an HMAC variant.
    /// This is a startup-time fault, not a request-path outcome.
    pub fn new(config: &SecurityConfig) -> Result<Self, JwtError> {
        let algorithm: Algorithm = config
            .algorithm
            .parse()
            .map_err(|_| JwtError::UnsupportedAlgorithm(config.algorithm.clone()))?;

        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(JwtError::UnsupportedAlgorithm(config.algorithm.clone()));
        }

        let mut validation = Validation::new(algorithm);
        // Expiry is evaluated against wall-clock time at verification with no
        // grace window
        validation.leeway = 0;

        Ok(Self {
            header: Header::new(algorithm),
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            validation,
        })
    }

    /// Issue a signed token for a subject
    ///
    /// # Arguments
    ///
    /// * `subject` - User id carried as the `sub` claim
    /// * `role` - Role embedded in access tokens; `None` for refresh tokens
    /// * `ttl` - Lifetime from now
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Encoded, signed token
    /// * `Err(JwtError)` - If encoding fails
    pub fn issue(
        &self,
        subject: &str,
        role: Option<Role>,
        ttl: Duration,
    ) -> Result<String, JwtError> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

        let claims = Claims {
            sub: subject.to_string(),
            role: role.map(|r| r.as_str().to_string()),
            exp: now + ttl.as_secs(),
        };

        let token = encode(&self.header, &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Verify a token's signature and expiry and extract its claims
    ///
    /// Side-effect free; safe to run with unlimited parallelism.
    ///
    /// # Returns
    ///
    /// * `Ok(Claims)` - Decoded and validated claims
    /// * `Err(JwtError::ExpiredToken)` - Valid signature but `exp` in the past
    /// * `Err(JwtError::MalformedToken)` - Any structural or signature failure
    pub fn decode_and_verify(&self, token: &str) -> Result<Claims, JwtError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                    _ => JwtError::MalformedToken,
                }
            })?;

        Ok(token_data.claims)
    }
}
