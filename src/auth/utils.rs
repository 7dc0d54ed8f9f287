use async_graphql::Context;
use sha2::{Digest, Sha256};

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Principal, UserRole},
};

pub fn require_authenticated(caller: Option<&Principal>) -> AppResult<&Principal> {
    caller.ok_or_else(|| AppError::NotAuthenticated("Authentication required".to_string()))
}

pub fn require_admin(role: UserRole) -> AppResult<()> {
    if role != UserRole::Admin {
        return Err(AppError::NotAuthorized(
            "Only admins can perform this action".to_string(),
        ));
    }
    Ok(())
}

pub fn require_owner_or_admin(
    caller: &Principal,
    role: UserRole,
    resource_owner: &Principal,
) -> AppResult<()> {
    if role != UserRole::Admin && caller != resource_owner {
        return Err(AppError::NotAuthorized(
            "You can only access your own resources".to_string(),
        ));
    }
    Ok(())
}

/// Hex SHA-256 of a secret token; only hashes are stored or compared.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Caller principal placed in the GraphQL context by the HTTP layer, if any.
pub fn extract_caller_from_context(ctx: &Context<'_>) -> Option<Principal> {
    ctx.data_opt::<Principal>().cloned()
}
