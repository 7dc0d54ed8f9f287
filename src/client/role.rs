use std::sync::Arc;

use crate::{
    client::{
        cache::{QueryCache, QueryKey},
        remote::RemoteDataService,
    },
    errors::AppResult,
    models::domain::{Principal, UserRole},
};

/// Role as the client acts on it. Anything not positively resolved is `Guest`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Student,
    Guest,
}

impl From<UserRole> for Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Admin => Role::Admin,
            UserRole::User => Role::Student,
            UserRole::Guest => Role::Guest,
        }
    }
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Student => "Student",
            Role::Guest => "Guest",
        }
    }
}

/// Resolves and caches the caller's role and whether any admin exists.
#[derive(Clone)]
pub struct RoleResolver {
    remote: Arc<dyn RemoteDataService>,
    cache: QueryCache,
    principal: Option<Principal>,
}

impl RoleResolver {
    pub fn new(remote: Arc<dyn RemoteDataService>, cache: QueryCache, principal: Option<Principal>) -> Self {
        Self {
            remote,
            cache,
            principal,
        }
    }

    /// Caller role, or the remote error. Only successes are cached.
    pub async fn try_resolve(&self) -> AppResult<Role> {
        let Some(principal) = &self.principal else {
            return Ok(Role::Guest);
        };

        let key = QueryKey::CallerRole(principal.clone());
        if let Some(role) = self.cache.get::<Role>(&key) {
            return Ok(role);
        }

        let role = Role::from(self.remote.get_caller_user_role().await?);
        self.cache.insert(key, role);
        Ok(role)
    }

    /// Caller role; a failed lookup counts as `Guest`.
    pub async fn resolve(&self) -> Role {
        match self.try_resolve().await {
            Ok(role) => role,
            Err(err) => {
                log::warn!("Role lookup failed, treating caller as guest: {}", err);
                Role::Guest
            }
        }
    }

    /// Whether an administrator exists. A failed probe reads as `false`.
    pub async fn admin_exists(&self) -> bool {
        if let Some(exists) = self.cache.get::<bool>(&QueryKey::AdminExists) {
            return exists;
        }

        match self.remote.is_admin_initialized().await {
            Ok(exists) => {
                self.cache.insert(QueryKey::AdminExists, exists);
                exists
            }
            Err(err) => {
                log::warn!("Admin existence probe failed: {}", err);
                false
            }
        }
    }

    /// Drops the cached role and admin flag after a role-changing action.
    pub fn invalidate(&self) {
        if let Some(principal) = &self.principal {
            self.cache.invalidate(&QueryKey::CallerRole(principal.clone()));
        }
        self.cache.invalidate(&QueryKey::AdminExists);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::remote::MockRemoteDataService;
    use crate::errors::AppError;

    fn resolver(remote: MockRemoteDataService, principal: Option<&str>) -> (RoleResolver, QueryCache) {
        let cache = QueryCache::new();
        let resolver = RoleResolver::new(Arc::new(remote), cache.clone(), principal.map(Principal::new));
        (resolver, cache)
    }

    #[tokio::test]
    async fn test_anonymous_is_guest_without_remote_call() {
        let mut remote = MockRemoteDataService::new();
        remote.expect_get_caller_user_role().never();

        let (resolver, _) = resolver(remote, None);
        assert_eq!(resolver.resolve().await, Role::Guest);
    }

    #[tokio::test]
    async fn test_role_is_cached() {
        let mut remote = MockRemoteDataService::new();
        remote
            .expect_get_caller_user_role()
            .times(1)
            .returning(|| Ok(UserRole::Admin));

        let (resolver, _) = resolver(remote, Some("admin"));
        assert_eq!(resolver.resolve().await, Role::Admin);
        assert_eq!(resolver.resolve().await, Role::Admin);
    }

    #[tokio::test]
    async fn test_failure_is_guest_and_not_cached() {
        let mut remote = MockRemoteDataService::new();
        let mut calls = 0;
        remote.expect_get_caller_user_role().times(2).returning(move || {
            calls += 1;
            if calls == 1 {
                Err(AppError::RemoteUnavailable("timeout".to_string()))
            } else {
                Ok(UserRole::User)
            }
        });

        let (resolver, cache) = resolver(remote, Some("student"));
        assert_eq!(resolver.resolve().await, Role::Guest);
        assert!(cache.is_empty());
        assert_eq!(resolver.resolve().await, Role::Student);
    }

    #[tokio::test]
    async fn test_admin_probe_fails_open() {
        let mut remote = MockRemoteDataService::new();
        remote
            .expect_is_admin_initialized()
            .returning(|| Err(AppError::RemoteUnavailable("down".to_string())));

        let (resolver, cache) = resolver(remote, Some("p"));
        assert!(!resolver.admin_exists().await);
        assert!(!cache.contains(&QueryKey::AdminExists));
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let mut remote = MockRemoteDataService::new();
        remote
            .expect_get_caller_user_role()
            .times(2)
            .returning(|| Ok(UserRole::User));

        let (resolver, _) = resolver(remote, Some("student"));
        resolver.resolve().await;
        resolver.invalidate();
        resolver.resolve().await;
    }

    #[test]
    fn test_labels() {
        assert_eq!(Role::Admin.label(), "Administrator");
        assert_eq!(Role::from(UserRole::User), Role::Student);
        assert_eq!(Role::Guest.label(), "Guest");
    }
}
