// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration, login and session tokens.
//!
//! Passwords are stored as Argon2id PHC strings. Sessions are stateless
//! HS256 JWTs carrying the member id and role; nothing is tracked server
//! side, so a token stays valid until it expires.

use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm as Argon2Algorithm, Argon2, Params, Version};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::config::{BootstrapAdmin, PasswordHashing};
use crate::db::Database;
use crate::error::AppError;
use crate::models::{normalize_email, Member, MemberResponse, Profile, Role};

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (member ID)
    pub sub: String,
    /// Role at the time the token was issued
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Identity resolved from a valid session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthMember {
    pub member_id: Uuid,
    pub role: Role,
}

impl AuthMember {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Issues and verifies session tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(signing_key: &[u8], ttl_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(signing_key),
            decoding: DecodingKey::from_secret(signing_key),
            ttl: Duration::days(ttl_days),
        }
    }

    /// Sign a token for `member_id` issued at `now`.
    pub fn issue(&self, member_id: Uuid, role: Role, now: DateTime<Utc>) -> Result<String, AppError> {
        let claims = Claims {
            sub: member_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to sign session token: {}", e)))
    }

    /// Check signature and expiry and resolve the identity.
    pub fn verify(&self, token: &str) -> Result<AuthMember, AppError> {
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected session token");
            AppError::Unauthenticated
        })?;

        let member_id = token_data
            .claims
            .sub
            .parse::<Uuid>()
            .map_err(|_| AppError::Unauthenticated)?;

        Ok(AuthMember {
            member_id,
            role: token_data.claims.role,
        })
    }
}

/// Argon2id hasher with configurable cost.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    /// Hash of a throwaway password at the current cost. Verified against
    /// on unknown emails so both login failures take the same time.
    dummy_hash: Arc<str>,
    #[cfg(test)]
    verifications: Arc<std::sync::atomic::AtomicUsize>,
}

impl PasswordHasher {
    pub fn new(cost: PasswordHashing) -> Result<Self, AppError> {
        let params = Params::new(cost.memory_cost, cost.iterations, cost.parallelism, None)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid Argon2 parameters: {}", e)))?;
        let mut hasher = Self {
            params,
            dummy_hash: Arc::from(""),
            #[cfg(test)]
            verifications: Arc::default(),
        };
        hasher.dummy_hash = Arc::from(hasher.hash("unused-login-placeholder")?);
        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Argon2Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password into a PHC string.
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))
    }

    /// Verify a password against a stored PHC string.
    ///
    /// The stored string carries its own parameters, so hashes made with an
    /// older cost setting still verify.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        #[cfg(test)]
        self.verifications
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        match PasswordHash::new(stored) {
            Ok(parsed) => self
                .argon2()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                false
            }
        }
    }

    /// Hash on the blocking pool; Argon2 is deliberately slow.
    async fn hash_blocking(&self, password: String) -> Result<String, AppError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Hashing task failed: {}", e)))?
    }

    async fn verify_blocking(&self, password: String, stored: String) -> Result<bool, AppError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Verification task failed: {}", e)))
    }

    /// Spend one verification's worth of work against the dummy hash.
    async fn verify_dummy_blocking(&self, password: String) -> Result<(), AppError> {
        let stored = self.dummy_hash.to_string();
        self.verify_blocking(password, stored).await.map(|_| ())
    }
}

/// Self-service registration body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,
}

/// Login body. Credentials are checked, not validated.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful register/login result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub member: MemberResponse,
    pub token: String,
}

/// Registration, login and token verification.
#[derive(Clone)]
pub struct AuthService {
    db: Arc<dyn Database>,
    tokens: TokenService,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(db: Arc<dyn Database>, tokens: TokenService, hasher: PasswordHasher) -> Self {
        Self { db, tokens, hasher }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Create a member account and start a session.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AppError> {
        let request = RegisterRequest {
            name: request.name.trim().to_string(),
            email: normalize_email(&request.email),
            password: request.password,
        };
        request.validate()?;

        let member = self
            .create_member(request.name, request.email, &request.password, Role::Member)
            .await?;

        tracing::info!(member_id = %member.id, "Member registered");
        self.start_session(&member)
    }

    /// Verify credentials and start a session.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let email = normalize_email(&request.email);

        let Some(member) = self.db.find_member_by_email(&email).await? else {
            self.hasher.verify_dummy_blocking(request.password).await?;
            tracing::warn!("Login failed: unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !self
            .hasher
            .verify_blocking(request.password, member.password_hash.clone())
            .await?
        {
            tracing::warn!(member_id = %member.id, "Login failed: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(member_id = %member.id, "Member logged in");
        self.start_session(&member)
    }

    /// Resolve a bearer token to an identity.
    pub fn authenticate(&self, token: &str) -> Result<AuthMember, AppError> {
        self.tokens.verify(token)
    }

    /// Make sure the configured admin account exists.
    ///
    /// An existing member with that email is promoted. Returns true if
    /// anything was written.
    pub async fn ensure_admin(&self, admin: &BootstrapAdmin) -> Result<bool, AppError> {
        let email = normalize_email(&admin.email);

        if let Some(mut existing) = self.db.find_member_by_email(&email).await? {
            if existing.is_admin() {
                return Ok(false);
            }
            existing.role = Role::Admin;
            self.db.update_member(&existing).await?;
            tracing::warn!(member_id = %existing.id, "Promoted existing member to admin");
            return Ok(true);
        }

        let name = admin.name.trim().to_string();
        match self
            .create_member(name, email, &admin.password, Role::Admin)
            .await
        {
            Ok(member) => {
                tracing::info!(member_id = %member.id, "Created bootstrap admin");
                Ok(true)
            }
            // Another instance won the race.
            Err(AppError::DuplicateEmail) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_member(
        &self,
        name: String,
        email: String,
        password: &str,
        role: Role,
    ) -> Result<Member, AppError> {
        let password_hash = self.hasher.hash_blocking(password.to_string()).await?;

        let member = Member {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            role,
            profile: Profile::default(),
            subscription: None,
            created_at: Utc::now(),
        };

        self.db.create_member(&member).await?;
        Ok(member)
    }

    fn start_session(&self, member: &Member) -> Result<AuthResponse, AppError> {
        let now = Utc::now();
        Ok(AuthResponse {
            token: self.tokens.issue(member.id, member.role, now)?,
            member: MemberResponse::from_member(member, now.date_naive()),
        })
    }
}
