use crate::config;

use base64::{URL_SAFE_NO_PAD, encode_config};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

/// Shared-secret bearer token check for the protected API routes.
#[derive(Debug, Clone)]
pub(crate) struct AuthState {
    token: String,
}

#[derive(Debug)]
pub enum AuthError {
    EmptyToken,
    MissingToken,
    InvalidToken,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::EmptyToken => f.write_str("auth token cannot be empty"),
            AuthError::MissingToken => f.write_str("missing bearer token"),
            AuthError::InvalidToken => f.write_str("invalid bearer token"),
        }
    }
}

impl AuthState {
    pub(crate) fn from_config(config: &config::AppConfig) -> Result<Option<Self>, AuthError> {
        let Some(auth) = config.auth.as_ref() else {
            return Ok(None);
        };

        let token = auth.token.trim();
        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }

        Ok(Some(Self {
            token: token.to_string(),
        }))
    }

    /// Checks an `Authorization` header value of the form `Bearer <token>`.
    pub(crate) fn verify_header(&self, header: Option<&str>) -> Result<(), AuthError> {
        let header = header.ok_or(AuthError::MissingToken)?;
        let presented = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MissingToken)?
            .trim();
        if constant_time_eq(presented.as_bytes(), self.token.as_bytes()) {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

pub fn generate_auth_token() -> Result<String, AuthError> {
    let mut rng = OsRng;
    generate_auth_token_with_rng(&mut rng)
}

pub(crate) fn generate_auth_token_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<String, AuthError> {
    let mut bytes = [0u8; 32];
    rng.fill_bytes(&mut bytes);
    let encoded = encode_config(bytes, URL_SAFE_NO_PAD);
    if encoded.is_empty() {
        return Err(AuthError::EmptyToken);
    }
    Ok(encoded)
}
