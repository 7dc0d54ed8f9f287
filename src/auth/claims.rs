use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::Principal;

/// Token claims issued by the identity provider. Role is deliberately absent:
/// it is owned by the data service and looked up per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // principal
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn new(principal: &Principal, expiration_hours: i64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(expiration_hours);

        Self {
            sub: principal.to_string(),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        }
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.sub.clone())
    }
}
