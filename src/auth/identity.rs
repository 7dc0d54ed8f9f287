use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::Header, web, FromRequest, HttpRequest};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};

use crate::{app_state::AppState, errors::AppError, models::domain::Principal};

/// Who is calling. A request without an `Authorization` header is anonymous;
/// a request with a bad bearer token is rejected outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub Option<Principal>);

impl Identity {
    pub fn anonymous() -> Self {
        Identity(None)
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}

fn identify(req: &HttpRequest) -> Result<Identity, AppError> {
    if !req.headers().contains_key(actix_web::http::header::AUTHORIZATION) {
        return Ok(Identity::anonymous());
    }

    let bearer = Authorization::<Bearer>::parse(req)
        .map_err(|_| AppError::NotAuthenticated("Invalid authorization header format".to_string()))?
        .into_scheme();

    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::InternalError("JWT service not configured".to_string()))?;

    let claims = state.jwt_service.validate_token(bearer.token())?;
    Ok(Identity(Some(claims.principal())))
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let identity = identify(req);
        if let Err(err) = &identity {
            log::warn!("Rejected request credentials: {}", err);
        }
        ready(identity)
    }
}
