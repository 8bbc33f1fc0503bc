use actix_identity::Identity;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    db,
    errors::ApiError,
    models::{Role, User},
    AppState,
};

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
        .map_err(|e| {
            log::error!("Failed to hash password: {}", e);
            ApiError::Password(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::warn!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

/// Minimal syntactic email check: one `@` with a non-empty local part and a
/// dotted domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain.split('.').count() >= 2 && domain.split('.').all(|part| !part.is_empty())
}

/// Resolves the session identity to a user, if any. A stale identity whose
/// user no longer exists resolves to anonymous.
pub async fn maybe_user(
    state: &AppState,
    identity: Option<Identity>,
) -> Result<Option<User>, ApiError> {
    let Some(identity) = identity else {
        return Ok(None);
    };
    let id = identity
        .id()
        .map_err(|e| ApiError::Session(e.to_string()))?
        .parse::<i64>()
        .map_err(|_| ApiError::Session("malformed identity".to_owned()))?;
    db::get_user_by_id(state, id).await
}

pub async fn require_user(
    state: &AppState,
    identity: Option<Identity>,
) -> Result<User, ApiError> {
    maybe_user(state, identity)
        .await?
        .ok_or(ApiError::Unauthenticated)
}

/// Exact-match role check against the endpoint's allow-list.
pub fn require_role(user: &User, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Ownership rule shared by the owner-scoped endpoints: the owner or an
/// admin may touch the entity, nobody else.
pub fn owns_or_admin(user: &User, owner_id: i64) -> bool {
    user.id == owner_id || user.is_admin()
}
