//! Admin credentials.
//!
//! An [`AuthSession`] is passed explicitly into every lifecycle and catalog
//! operation. Nothing reads a token from ambient state.
//!
//! On the HTTP surface the role comes from the [`SessionRegistry`], which
//! remembers every token the console login obtained and the role the order
//! service reported for it.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConsoleError, Result};

/// Role reported by the order service at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Unknown => "unknown",
        }
    }
}

/// Bearer credential plus the role it was issued for.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSession {
    token: String,
    role: Role,
}

impl AuthSession {
    pub fn new(token: impl Into<String>, role: Role) -> Self {
        Self {
            token: token.into(),
            role,
        }
    }

    pub fn admin(token: impl Into<String>) -> Self {
        Self::new(token, Role::Admin)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Fails with `Unauthorized` unless this is a non-empty admin credential.
    pub fn require_admin(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(ConsoleError::Unauthorized("missing bearer token".into()));
        }
        if self.role != Role::Admin {
            return Err(ConsoleError::Unauthorized(
                "Access Denied: Not an administrator account.".into(),
            ));
        }
        Ok(())
    }
}

// Keep tokens out of logs.
impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Tokens issued through the console login, keyed to their reported role.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, Role>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, session: &AuthSession) {
        self.sessions.insert(session.token.clone(), session.role);
    }

    /// The session for `token`, if the console issued it.
    pub fn resolve(&self, token: &str) -> Option<AuthSession> {
        self.sessions
            .get(token)
            .map(|entry| AuthSession::new(token, *entry.value()))
    }

    /// Forget `token`. Returns whether it was known.
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

/// Extracts the session from `Authorization: Bearer <token>`.
///
/// The token must be one the registry knows. A non-admin token still
/// extracts, carrying its real role, and fails at `require_admin`.
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = ConsoleError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ConsoleError::Unauthorized("missing Authorization header".into()))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ConsoleError::Unauthorized("expected a bearer token".into()))?;

        let registry = parts
            .extensions
            .get::<SessionRegistry>()
            .ok_or_else(|| ConsoleError::Config("session registry is not installed".into()))?;

        registry.resolve(token).ok_or_else(|| {
            debug!("Bearer token not issued by this console");
            ConsoleError::Unauthorized("unknown or expired session".into())
        })
    }
}
