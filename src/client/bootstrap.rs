//! One-time admin claim flow.
//!
//! ```text
//! NoAdminChecked -> Hidden
//!                -> TokenEntry -> Confirming -> Claimed
//!                                            -> Failed -> TokenEntry (with error)
//!                                            -> Unavailable
//! ```

use std::sync::Arc;

use crate::{
    client::{guard::ADMIN_HOME, remote::RemoteDataService, role::Role, role::RoleResolver},
    errors::{AppError, AppResult},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BootstrapError {
    AlreadyInitialized,
    InvalidToken,
    NotAuthenticated,
    Other(String),
}

impl From<&AppError> for BootstrapError {
    fn from(err: &AppError) -> Self {
        match err {
            AppError::AlreadyInitialized(_) => BootstrapError::AlreadyInitialized,
            AppError::InvalidToken(_) => BootstrapError::InvalidToken,
            AppError::NotAuthenticated(_) => BootstrapError::NotAuthenticated,
            other => BootstrapError::Other(other.user_message()),
        }
    }
}

impl BootstrapError {
    pub fn user_message(&self) -> String {
        match self {
            BootstrapError::AlreadyInitialized => {
                AppError::AlreadyInitialized(String::new()).user_message()
            }
            BootstrapError::InvalidToken => AppError::InvalidToken(String::new()).user_message(),
            BootstrapError::NotAuthenticated => {
                "You must be logged in to initialize admin access.".to_string()
            }
            BootstrapError::Other(msg) => msg.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BootstrapState {
    NoAdminChecked,
    /// Entry condition not met: anonymous caller, an admin exists, or caller is admin.
    Hidden,
    TokenEntry { error: Option<BootstrapError> },
    Confirming,
    Claimed,
    /// Tokens have been cleared; the next edit returns to `TokenEntry`.
    Failed(BootstrapError),
    /// The server reported the system already initialized.
    Unavailable,
}

pub struct BootstrapFlow {
    remote: Arc<dyn RemoteDataService>,
    roles: RoleResolver,
    authenticated: bool,
    state: BootstrapState,
    admin_token: String,
    user_provided_token: String,
}

impl BootstrapFlow {
    pub fn new(remote: Arc<dyn RemoteDataService>, roles: RoleResolver, authenticated: bool) -> Self {
        Self {
            remote,
            roles,
            authenticated,
            state: BootstrapState::NoAdminChecked,
            admin_token: String::new(),
            user_provided_token: String::new(),
        }
    }

    pub fn state(&self) -> &BootstrapState {
        &self.state
    }

    pub fn is_offered(&self) -> bool {
        matches!(
            self.state,
            BootstrapState::TokenEntry { .. } | BootstrapState::Confirming | BootstrapState::Failed(_)
        )
    }

    /// Evaluates the entry condition. Only acts in `NoAdminChecked`.
    pub async fn check_entry(&mut self) -> &BootstrapState {
        if self.state != BootstrapState::NoAdminChecked {
            return &self.state;
        }

        self.state = if !self.authenticated
            || self.roles.admin_exists().await
            || self.roles.resolve().await == Role::Admin
        {
            BootstrapState::Hidden
        } else {
            BootstrapState::TokenEntry { error: None }
        };
        &self.state
    }

    pub fn set_admin_token(&mut self, token: &str) {
        self.resume();
        self.admin_token = token.to_string();
    }

    pub fn set_user_provided_token(&mut self, token: &str) {
        self.resume();
        self.user_provided_token = token.to_string();
    }

    /// Leaves `Failed`, carrying its error back into `TokenEntry`.
    pub fn resume(&mut self) {
        if let BootstrapState::Failed(err) = &self.state {
            self.state = BootstrapState::TokenEntry {
                error: Some(err.clone()),
            };
        }
    }

    /// `TokenEntry -> Confirming` once both tokens are non-empty.
    pub fn begin_confirm(&mut self) -> AppResult<()> {
        self.resume();
        if !matches!(self.state, BootstrapState::TokenEntry { .. }) {
            return Err(AppError::ValidationError(format!(
                "cannot confirm from {:?}",
                self.state
            )));
        }
        if self.admin_token.trim().is_empty() || self.user_provided_token.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Please enter both tokens".to_string(),
            ));
        }

        self.state = BootstrapState::Confirming;
        Ok(())
    }

    /// Sends the claim. On success the cached role and admin flag are
    /// invalidated before the admin home path is returned.
    pub async fn confirm(&mut self) -> AppResult<&'static str> {
        if self.state != BootstrapState::Confirming {
            return Err(AppError::ValidationError(format!(
                "cannot claim from {:?}",
                self.state
            )));
        }

        let result = self
            .remote
            .bootstrap_admin_role(self.admin_token.trim(), self.user_provided_token.trim())
            .await;

        match result {
            Ok(()) => {
                self.clear_tokens();
                self.roles.invalidate();
                self.state = BootstrapState::Claimed;
                log::info!("Admin access initialized");
                Ok(ADMIN_HOME)
            }
            Err(err) => {
                self.clear_tokens();
                let kind = BootstrapError::from(&err);
                log::warn!("Admin claim failed: {}", err);
                self.state = if kind == BootstrapError::AlreadyInitialized {
                    self.roles.invalidate();
                    BootstrapState::Unavailable
                } else {
                    BootstrapState::Failed(kind)
                };
                Err(err)
            }
        }
    }

    /// Abandons token entry, e.g. when the dialog is closed.
    pub fn cancel(&mut self) {
        self.clear_tokens();
        if self.is_offered() {
            self.state = BootstrapState::TokenEntry { error: None };
        }
    }

    fn clear_tokens(&mut self) {
        self.admin_token.clear();
        self.user_provided_token.clear();
    }
}
