use std::sync::Arc;

use crate::{
    auth::{require_authenticated, require_owner_or_admin},
    errors::AppResult,
    models::{
        domain::{Principal, UserProfile},
        dto::SaveProfileRequest,
    },
    repositories::UserRepository,
    services::access_service::AccessService,
};

/// Per-principal profiles. Missing profiles read as `None`.
pub struct UserService {
    users: Arc<dyn UserRepository>,
    access: Arc<AccessService>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, access: Arc<AccessService>) -> Self {
        Self { users, access }
    }

    pub async fn get_caller_profile(&self, caller: Option<&Principal>) -> AppResult<Option<UserProfile>> {
        let principal = require_authenticated(caller)?;
        Ok(self
            .users
            .find_by_principal(principal)
            .await?
            .and_then(|record| record.profile))
    }

    pub async fn save_caller_profile(
        &self,
        caller: Option<&Principal>,
        profile: UserProfile,
    ) -> AppResult<UserProfile> {
        let principal = require_authenticated(caller)?;
        let profile = SaveProfileRequest::check(&profile)?;

        let record = self.users.save_profile(principal, profile.clone()).await?;
        log::debug!("Saved profile for '{}'", record.principal);
        Ok(profile)
    }

    pub async fn get_user_profile(
        &self,
        caller: Option<&Principal>,
        user: &Principal,
    ) -> AppResult<Option<UserProfile>> {
        let principal = require_authenticated(caller)?;
        let role = self.access.role_of(Some(principal)).await?;
        require_owner_or_admin(principal, role, user)?;

        Ok(self
            .users
            .find_by_principal(user)
            .await?
            .and_then(|record| record.profile))
    }
}
