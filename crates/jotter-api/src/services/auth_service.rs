//! Accounts and access tokens.
//!
//! Passwords are hashed with Argon2id (PHC string format). Tokens are HS256
//! JWTs carrying [`Claims`]; they are stateless, so logout has nothing to
//! revoke server-side.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use jotter_core::validation::{validate_display_name, validate_email, validate_password};
use jotter_core::{Authenticator, Claims, Error, Result, Store, User};

const INVALID_CREDENTIALS: &str = "invalid credentials";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by register and login.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

// =============================================================================
// TOKENS
// =============================================================================

/// HS256 token issuer and validator.
pub struct JwtAuthenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtAuthenticator {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_nbf = true;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Sign a token for `user` valid from now for the configured lifetime.
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: user.id,
            email: user.email.clone(),
            exp: now + self.ttl.num_seconds(),
            iat: now,
            nbf: now,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Internal(format!("failed to sign token: {e}")))
    }
}

impl Authenticator for JwtAuthenticator {
    fn validate_token(&self, token: &str) -> Result<Claims> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(subsystem = "auth", error = %e, "Token rejected");
                Error::Unauthorized("invalid or expired token".to_string())
            })
    }
}

// =============================================================================
// ACCOUNTS
// =============================================================================

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    tokens: Arc<JwtAuthenticator>,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, tokens: Arc<JwtAuthenticator>) -> Self {
        Self { store, tokens }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse> {
        validate_email(&req.email)?;
        validate_password(&req.password)?;
        validate_display_name(&req.name)?;

        if self.store.get_user_by_email(&req.email).await?.is_some() {
            return Err(Error::Conflict("user already exists".to_string()));
        }

        let hash = hash_password(req.password).await?;
        let user = User::new_local(req.email, req.name.trim(), hash);
        self.store.insert_user(&user).await?;
        let token = self.tokens.issue(&user)?;

        info!(subsystem = "auth", op = "register", user_id = %user.id, "User registered");
        Ok(AuthResponse { user, token })
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse> {
        let user = self
            .store
            .get_user_by_email(&req.email)
            .await?
            .ok_or_else(|| Error::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(req.password, user.password_hash.clone()).await? {
            return Err(Error::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.tokens.issue(&user)?;
        info!(subsystem = "auth", op = "login", user_id = %user.id, "User logged in");
        Ok(AuthResponse { user, token })
    }

    pub async fn me(&self, user_id: Uuid) -> Result<User> {
        self.store.get_user(user_id).await
    }
}

/// Argon2 is CPU-bound; keep it off the async workers.
async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| Error::Internal(format!("failed to hash password: {e}")))
    })
    .await
    .map_err(|e| Error::Internal(format!("hashing task failed: {e}")))?
}

async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || {
        // An unparseable stored hash can never match
        let Ok(parsed) = PasswordHash::new(&hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
    .await
    .map_err(|e| Error::Internal(format!("verification task failed: {e}")))
}
