//! Authentication extractors.
//!
//! Token issuance, password hashing, and session management are external
//! collaborators: this module only *verifies* bearer tokens through an
//! injected [`Authenticator`] capability and exposes the result to handlers
//! as Axum extractors.
//!
//! # Usage
//!
//! ```rust,ignore
//! use decant_web::auth::{CurrentUser, RequireAdmin};
//!
//! // Require authentication
//! async fn my_orders(user: CurrentUser) -> Result<Json<Response>, AppError> {
//!     // user.actor() is guaranteed valid
//! }
//!
//! // Require admin role
//! async fn all_orders(admin: RequireAdmin) -> Result<Json<Response>, AppError> {
//!     // admin.0.actor() is guaranteed to be an admin
//! }
//! ```

use crate::error::AppError;
use crate::server::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use decant_core::{Actor, Role, UserId};
use std::collections::HashMap;
use uuid::Uuid;

/// A verified caller identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    /// The caller's user id
    pub user_id: UserId,
    /// The caller's role
    pub role: Role,
}

impl AuthUser {
    /// The domain actor for this caller.
    #[must_use]
    pub const fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id,
            role: self.role,
        }
    }
}

/// Token verification capability.
///
/// The real system issues JWTs elsewhere; the server only needs to map a
/// presented token to an identity.
pub trait Authenticator: Send + Sync {
    /// Verifies a bearer token. `None` means the token is unknown or
    /// expired.
    fn verify(&self, token: &str) -> Option<AuthUser>;
}

/// Token-table authenticator.
///
/// Tokens are loaded from configuration as `token:user-uuid:role` entries
/// separated by commas, e.g.
/// `admin-tok:0189...:admin,cliente-tok:0189...:cliente`.
#[derive(Clone, Debug, Default)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, AuthUser>,
}

impl StaticTokenAuthenticator {
    /// Creates an empty authenticator (every request is rejected).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration spec. Malformed entries are skipped with a
    /// warning rather than failing startup.
    #[must_use]
    pub fn from_spec(spec: &str) -> Self {
        let mut tokens = HashMap::new();
        for entry in spec.split(',').filter(|e| !e.trim().is_empty()) {
            let mut parts = entry.trim().splitn(3, ':');
            let (Some(token), Some(user), role) = (parts.next(), parts.next(), parts.next())
            else {
                tracing::warn!(entry, "skipping malformed auth token entry");
                continue;
            };
            let Ok(uuid) = Uuid::parse_str(user) else {
                tracing::warn!(entry, "skipping auth token entry with invalid user id");
                continue;
            };
            let role = match role {
                Some("admin") => Role::Admin,
                _ => Role::Customer,
            };
            tokens.insert(
                token.to_string(),
                AuthUser {
                    user_id: UserId::from_uuid(uuid),
                    role,
                },
            );
        }
        Self { tokens }
    }

    /// Registers a token (used by tests and local seeding).
    pub fn insert(&mut self, token: impl Into<String>, user: AuthUser) {
        self.tokens.insert(token.into(), user);
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn verify(&self, token: &str) -> Option<AuthUser> {
        self.tokens.get(token).copied()
    }
}

/// Bearer token extracted from the `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Falta el encabezado de autorización"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| {
                AppError::unauthorized("Formato de autorización inválido. Se espera 'Bearer <token>'")
            })?
            .to_string();

        if token.is_empty() {
            return Err(AppError::unauthorized("Token vacío"));
        }

        Ok(Self(token))
    }
}

/// Authenticated caller. Use as a handler parameter to require a valid
/// session token.
#[derive(Clone, Copy, Debug)]
pub struct CurrentUser(pub AuthUser);

impl CurrentUser {
    /// The domain actor for this caller.
    #[must_use]
    pub const fn actor(&self) -> Actor {
        self.0.actor()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = BearerToken::from_request_parts(parts, state).await?;
        let user = state
            .authenticator
            .verify(&bearer.0)
            .ok_or_else(|| AppError::unauthorized("Token inválido o expirado"))?;
        Ok(Self(user))
    }
}

/// Authenticated admin. Returns 403 for valid non-admin callers.
#[derive(Clone, Copy, Debug)]
pub struct RequireAdmin(pub AuthUser);

impl RequireAdmin {
    /// The domain actor for this caller.
    #[must_use]
    pub const fn actor(&self) -> Actor {
        self.0.actor()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(AppError::forbidden(
                "Se requieren permisos de administrador",
            ));
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_parsing_skips_malformed_entries() {
        let uuid = Uuid::new_v4();
        let spec = format!("admin-tok:{uuid}:admin, cliente-tok:{uuid}:cliente, broken, bad:not-a-uuid:admin");
        let auth = StaticTokenAuthenticator::from_spec(&spec);

        assert_eq!(auth.verify("admin-tok").map(|u| u.role), Some(Role::Admin));
        assert_eq!(
            auth.verify("cliente-tok").map(|u| u.role),
            Some(Role::Customer)
        );
        assert!(auth.verify("broken").is_none());
        assert!(auth.verify("bad").is_none());
    }

    #[test]
    fn unknown_tokens_are_rejected() {
        let auth = StaticTokenAuthenticator::new();
        assert!(auth.verify("whatever").is_none());
    }
}
