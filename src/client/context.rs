use std::sync::Arc;

use crate::{
    client::{
        bootstrap::BootstrapFlow,
        cache::{QueryCache, QueryKey},
        catalog::QuestionCatalogClient,
        guard::{decide, navigation_links, GuardDecision, NavLink},
        remote::RemoteDataService,
        results::SubmissionHistoryClient,
        role::{Role, RoleResolver},
        session::QuizSession,
    },
    errors::AppResult,
    models::{
        domain::{Principal, UserProfile, UserRole},
        dto::SaveProfileRequest,
    },
};

/// Everything one signed-in (or anonymous) user session shares: identity,
/// the remote bound to it, and the query cache.
#[derive(Clone)]
pub struct SessionContext {
    principal: Option<Principal>,
    remote: Arc<dyn RemoteDataService>,
    cache: QueryCache,
}

impl SessionContext {
    pub fn new(remote: Arc<dyn RemoteDataService>, principal: Option<Principal>) -> Self {
        Self {
            principal,
            remote,
            cache: QueryCache::new(),
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn remote(&self) -> Arc<dyn RemoteDataService> {
        self.remote.clone()
    }

    pub fn roles(&self) -> RoleResolver {
        RoleResolver::new(self.remote.clone(), self.cache.clone(), self.principal.clone())
    }

    pub fn catalog(&self) -> QuestionCatalogClient {
        QuestionCatalogClient::new(self.remote.clone(), self.cache.clone())
    }

    pub fn history(&self) -> SubmissionHistoryClient {
        SubmissionHistoryClient::new(self.remote.clone(), self.cache.clone())
    }

    pub fn bootstrap(&self) -> BootstrapFlow {
        BootstrapFlow::new(self.remote.clone(), self.roles(), self.is_authenticated())
    }

    pub async fn start_quiz(&self) -> AppResult<QuizSession> {
        QuizSession::start(&self.catalog(), self.remote.clone(), self.cache.clone()).await
    }

    pub async fn guard(&self, path: &str) -> GuardDecision {
        let role = self.roles().resolve().await;
        decide(self.is_authenticated(), role, path)
    }

    pub async fn navigation(&self) -> (Role, &'static [NavLink]) {
        let role = self.roles().resolve().await;
        (role, navigation_links(role))
    }

    /// Admin only. Drops the cached role so the next lookup sees the change.
    pub async fn assign_role(&self, user: &Principal, role: UserRole) -> AppResult<()> {
        self.remote.assign_caller_user_role(user, role).await?;
        self.cache.invalidate(&QueryKey::CallerRole(user.clone()));
        self.cache.invalidate(&QueryKey::AdminExists);
        Ok(())
    }

    pub async fn caller_profile(&self) -> AppResult<Option<UserProfile>> {
        if let Some(profile) = self.cache.get::<Option<UserProfile>>(&QueryKey::CallerProfile) {
            return Ok(profile);
        }
        let profile = self.remote.get_caller_user_profile().await?;
        self.cache.insert(QueryKey::CallerProfile, profile.clone());
        Ok(profile)
    }

    pub async fn save_profile(&self, name: &str) -> AppResult<()> {
        let profile = SaveProfileRequest::check(&UserProfile {
            name: name.to_string(),
        })?;
        self.remote.save_caller_user_profile(profile).await?;
        self.cache.invalidate(&QueryKey::CallerProfile);
        Ok(())
    }

    /// Switches identity; `remote` must be bound to `principal`.
    pub fn login(&mut self, principal: Principal, remote: Arc<dyn RemoteDataService>) {
        self.cache.clear();
        self.principal = Some(principal);
        self.remote = remote;
    }

    /// Drops the identity and every cached query.
    pub fn logout(&mut self, anonymous_remote: Arc<dyn RemoteDataService>) {
        self.cache.clear();
        self.principal = None;
        self.remote = anonymous_remote;
    }
}
