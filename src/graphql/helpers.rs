use async_graphql::{Context, ErrorExtensions};

use crate::{app_state::AppState, auth::extract_caller_from_context, errors::AppResult, models::domain::Principal};

/// Shared state and the caller principal (if any) for a resolver.
pub fn request_scope<'a>(ctx: &'a Context<'_>) -> async_graphql::Result<(&'a AppState, Option<Principal>)> {
    let state = ctx.data::<AppState>()?;
    Ok((state, extract_caller_from_context(ctx)))
}

/// Attaches the error code extension clients dispatch on.
pub fn with_code<T>(result: AppResult<T>) -> async_graphql::Result<T> {
    result.map_err(|e| {
        if matches!(e.error_code(), "DATABASE_ERROR" | "INTERNAL_ERROR") {
            log::error!("GraphQL resolver failed: {}", e);
        }
        e.extend()
    })
}
