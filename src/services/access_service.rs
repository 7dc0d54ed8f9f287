use std::sync::Arc;

use crate::{
    auth::{hash_token, require_admin, require_authenticated},
    errors::{AppError, AppResult},
    models::domain::{Principal, UserRole},
    repositories::UserRepository,
};

/// Role resolution, role assignment and the one-time admin bootstrap.
pub struct AccessService {
    users: Arc<dyn UserRepository>,
    bootstrap_token_hash: Option<String>,
}

impl AccessService {
    /// `bootstrap_token` pins the admin token a claim must present; `None`
    /// accepts any matching pair.
    pub fn new(users: Arc<dyn UserRepository>, bootstrap_token: Option<&str>) -> Self {
        Self {
            users,
            bootstrap_token_hash: bootstrap_token.map(|t| hash_token(t.trim())),
        }
    }

    /// Anonymous callers are guests; a known principal without a stored
    /// record is a regular user.
    pub async fn role_of(&self, caller: Option<&Principal>) -> AppResult<UserRole> {
        let Some(principal) = caller else {
            return Ok(UserRole::Guest);
        };

        let role = self
            .users
            .find_by_principal(principal)
            .await?
            .map(|record| record.role)
            .unwrap_or_default();
        Ok(role)
    }

    pub async fn require_admin(&self, caller: Option<&Principal>) -> AppResult<Principal> {
        let principal = require_authenticated(caller)?;
        let role = self.role_of(Some(principal)).await?;
        if let Err(err) = require_admin(role) {
            log::warn!("Rejected admin-only call from '{}' with role {:?}", principal, role);
            return Err(err);
        }
        Ok(principal.clone())
    }

    /// Authenticated and not a guest.
    pub async fn require_member(&self, caller: Option<&Principal>) -> AppResult<(Principal, UserRole)> {
        let principal = require_authenticated(caller)?;
        let role = self.role_of(Some(principal)).await?;
        if role == UserRole::Guest {
            log::warn!("Rejected member-only call from guest '{}'", principal);
            return Err(AppError::NotAuthorized(
                "Guests cannot perform this action".to_string(),
            ));
        }
        Ok((principal.clone(), role))
    }

    pub async fn is_caller_admin(&self, caller: Option<&Principal>) -> AppResult<bool> {
        Ok(self.role_of(caller).await? == UserRole::Admin)
    }

    pub async fn is_admin_initialized(&self) -> AppResult<bool> {
        self.users.admin_exists().await
    }

    pub async fn assign_role(
        &self,
        caller: Option<&Principal>,
        user: &Principal,
        role: UserRole,
    ) -> AppResult<()> {
        let admin = self.require_admin(caller).await?;
        self.users.set_role(user, role).await?;
        log::info!("Admin '{}' assigned role {:?} to '{}'", admin, role, user);
        Ok(())
    }

    /// Claims the first administrator. Once any admin exists every call,
    /// whatever its tokens, fails with `AlreadyInitialized`.
    pub async fn bootstrap_admin(
        &self,
        caller: Option<&Principal>,
        admin_token: &str,
        user_provided_token: &str,
    ) -> AppResult<()> {
        let principal = require_authenticated(caller)?;

        if self.users.admin_exists().await? {
            return Err(AppError::AlreadyInitialized(
                "an administrator has already been claimed".to_string(),
            ));
        }

        let admin_token = admin_token.trim();
        let user_provided_token = user_provided_token.trim();
        if admin_token.is_empty() || user_provided_token.is_empty() {
            return Err(AppError::InvalidToken("both tokens are required".to_string()));
        }

        let token_hash = hash_token(admin_token);
        if token_hash != hash_token(user_provided_token) {
            return Err(AppError::InvalidToken("tokens do not match".to_string()));
        }
        if let Some(expected) = &self.bootstrap_token_hash {
            if &token_hash != expected {
                log::warn!("Bootstrap claim from '{}' presented the wrong token", principal);
                return Err(AppError::InvalidToken("admin token is not valid".to_string()));
            }
        }

        self.users.claim_initial_admin(principal, &token_hash).await?;
        log::info!("Principal '{}' claimed the initial administrator role", principal);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::UserRecord;
    use crate::repositories::user_repository::MockUserRepository;
    use crate::repositories::InMemoryUserRepository;

    fn service(bootstrap_token: Option<&str>) -> (AccessService, Arc<InMemoryUserRepository>) {
        let users = Arc::new(InMemoryUserRepository::new());
        (AccessService::new(users.clone(), bootstrap_token), users)
    }

    #[tokio::test]
    async fn test_anonymous_is_guest() {
        let (access, _) = service(None);
        assert_eq!(access.role_of(None).await.unwrap(), UserRole::Guest);
    }

    #[tokio::test]
    async fn test_unknown_principal_is_user() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_principal().returning(|_| Ok(None));
        let access = AccessService::new(Arc::new(users), None);

        let role = access.role_of(Some(&Principal::new("new"))).await.unwrap();
        assert_eq!(role, UserRole::User);
    }

    #[tokio::test]
    async fn test_stored_role_wins() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_principal().returning(|p| {
            let mut record = UserRecord::new(p.clone());
            record.role = UserRole::Guest;
            Ok(Some(record))
        });
        let access = AccessService::new(Arc::new(users), None);

        let role = access.role_of(Some(&Principal::new("demoted"))).await.unwrap();
        assert_eq!(role, UserRole::Guest);
    }

    #[tokio::test]
    async fn test_repository_failure_propagates() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_principal()
            .returning(|_| Err(AppError::DatabaseError("down".to_string())));
        let access = AccessService::new(Arc::new(users), None);

        assert!(access.is_caller_admin(Some(&Principal::new("p"))).await.is_err());
    }

    #[tokio::test]
    async fn test_bootstrap_requires_authentication() {
        let (access, _) = service(None);
        let result = access.bootstrap_admin(None, "secret", "secret").await;
        assert!(matches!(result, Err(AppError::NotAuthenticated(_))));
    }

    #[tokio::test]
    async fn test_bootstrap_rejects_mismatched_tokens() {
        let (access, users) = service(None);
        let result = access
            .bootstrap_admin(Some(&Principal::new("p")), "secret", "secreT")
            .await;

        assert!(matches!(result, Err(AppError::InvalidToken(_))));
        assert!(!users.admin_exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_bootstrap_checks_configured_token() {
        let (access, _) = service(Some("expected"));
        let wrong = access
            .bootstrap_admin(Some(&Principal::new("p")), "guess", "guess")
            .await;
        assert!(matches!(wrong, Err(AppError::InvalidToken(_))));

        access
            .bootstrap_admin(Some(&Principal::new("p")), "expected", "expected")
            .await
            .unwrap();
        assert!(access.is_caller_admin(Some(&Principal::new("p"))).await.unwrap());
    }

    #[tokio::test]
    async fn test_padded_configured_token_still_matches() {
        let (access, _) = service(Some(" expected\n"));

        access
            .bootstrap_admin(Some(&Principal::new("p")), " expected", "expected ")
            .await
            .unwrap();
        assert!(access.is_admin_initialized().await.unwrap());
    }

    #[tokio::test]
    async fn test_second_bootstrap_is_already_initialized_even_with_bad_tokens() {
        let (access, _) = service(None);
        access
            .bootstrap_admin(Some(&Principal::new("first")), "t", "t")
            .await
            .unwrap();

        let again = access
            .bootstrap_admin(Some(&Principal::new("first")), "t", "t")
            .await;
        let other = access
            .bootstrap_admin(Some(&Principal::new("second")), "x", "y")
            .await;

        assert!(matches!(again, Err(AppError::AlreadyInitialized(_))));
        assert!(matches!(other, Err(AppError::AlreadyInitialized(_))));
    }

    #[tokio::test]
    async fn test_assign_role_is_admin_only() {
        let (access, _) = service(None);
        let admin = Principal::new("admin");
        let student = Principal::new("student");
        access.bootstrap_admin(Some(&admin), "t", "t").await.unwrap();

        let denied = access
            .assign_role(Some(&student), &student, UserRole::Admin)
            .await;
        assert!(matches!(denied, Err(AppError::NotAuthorized(_))));

        access
            .assign_role(Some(&admin), &student, UserRole::Guest)
            .await
            .unwrap();
        assert_eq!(access.role_of(Some(&student)).await.unwrap(), UserRole::Guest);
    }

    #[tokio::test]
    async fn test_guest_is_not_a_member() {
        let (access, users) = service(None);
        let guest = Principal::new("guest");
        users.set_role(&guest, UserRole::Guest).await.unwrap();

        let result = access.require_member(Some(&guest)).await;
        assert!(matches!(result, Err(AppError::NotAuthorized(_))));
    }
}
