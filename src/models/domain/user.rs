use std::fmt;

use async_graphql::{Enum, InputObject, SimpleObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier of an authenticated caller, as issued by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Principal(String);

async_graphql::scalar!(Principal);

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Principal(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(value: &str) -> Self {
        Principal::new(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, Enum, Default)]
#[serde(rename_all = "lowercase")]
#[graphql(rename_items = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    User,
    Guest,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject, InputObject)]
#[graphql(input_name = "UserProfileInput")]
pub struct UserProfile {
    pub name: String,
}

/// Stored per-principal state: role and optional profile.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub principal: Principal,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            role: UserRole::default(),
            profile: None,
            modified_at: Some(Utc::now()),
        }
    }
}
