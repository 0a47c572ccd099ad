//! Authentication middleware for JWT token validation
//!
//! Tokens are issued by the authentication service; this service only
//! verifies them and turns the `sub` claim into the caller's identity.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// User roles
    #[serde(default)]
    pub roles: Vec<String>,
    /// User permissions
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// Authenticated user information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
}

#[derive(Debug, Error)]
pub enum JwtConfigError {
    #[error("Neither JWT_PUBLIC_KEY nor JWT_SECRET is set")]
    MissingKey,

    #[error("Failed to read public key file: {0}")]
    KeyFile(#[from] std::io::Error),

    #[error("Invalid verification key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),
}

/// Key material used to verify incoming tokens
#[derive(Debug, Clone)]
pub enum JwtConfig {
    /// RS256 public key in PEM format
    Rsa { public_key: String },
    /// HS256 shared secret
    Hmac { secret: String },
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_PUBLIC_KEY`: RS256 public key (PEM) or path to a PEM file
    /// - `JWT_SECRET`: HS256 secret, used when no public key is configured
    pub fn from_env() -> Result<Self, JwtConfigError> {
        if let Ok(public_key) = env::var("JWT_PUBLIC_KEY") {
            // Anything that is not inline PEM is treated as a file path
            let public_key = if public_key.starts_with("-----BEGIN") {
                public_key
            } else {
                std::fs::read_to_string(&public_key)?.trim().to_string()
            };
            return Ok(JwtConfig::Rsa { public_key });
        }

        env::var("JWT_SECRET")
            .map(|secret| JwtConfig::Hmac { secret })
            .map_err(|_| JwtConfigError::MissingKey)
    }
}

/// Validates bearer tokens; built once at startup
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(config: &JwtConfig) -> Result<Self, JwtConfigError> {
        let (decoding_key, algorithm) = match config {
            JwtConfig::Rsa { public_key } => (
                DecodingKey::from_rsa_pem(public_key.as_bytes())?,
                Algorithm::RS256,
            ),
            JwtConfig::Hmac { secret } => {
                (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
            }
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Decode and validate an access token
    pub fn verify(&self, token: &str) -> Result<AuthUser, ApiError> {
        let token_data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
                |e| {
                    warn!("Failed to validate token: {}", e);
                    ApiError::Unauthorized
                },
            )?;

        if token_data.claims.token_type != TokenType::Access {
            warn!("Rejected non-access token for {}", token_data.claims.sub);
            return Err(ApiError::Unauthorized);
        }

        Ok(AuthUser {
            id: token_data.claims.sub,
        })
    }
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract the Authorization header
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    // Check if it's a Bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let user = state.jwt_verifier.verify(token)?;

    // Insert the user into the request extensions
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
