use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, Error, FromRequest, HttpMessage, HttpRequest};
use uuid::Uuid;

use crate::errors::AppError;
use crate::middleware::auth::{bearer_token, decode_token, Claims};
use crate::models::account::UserRole;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: UserRole,
}

impl TryFrom<&Claims> for AuthenticatedUser {
    type Error = AppError;

    fn try_from(claims: &Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))?;
        Ok(Self {
            user_id,
            email: claims.email.clone(),
            role: UserRole::from_claim(claims.app_role()),
        })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = match req.extensions().get::<Claims>() {
            Some(claims) => AuthenticatedUser::try_from(claims),
            None => Err(AppError::Unauthorized("User not authenticated".to_string())),
        };
        ready(user.map_err(Error::from))
    }
}

/// Caller identity on routes open to guests. A malformed token is still rejected.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<AuthenticatedUser>);

impl OptionalUser {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|user| user.user_id)
    }
}

impl FromRequest for OptionalUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let Some(token) = bearer_token(req) else {
            return ready(Ok(OptionalUser(None)));
        };
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            return ready(Err(AppError::Internal("application state missing".to_string()).into()));
        };

        let user = decode_token(token, &state.jwt_secret)
            .and_then(|claims| AuthenticatedUser::try_from(&claims));
        ready(user.map(|u| OptionalUser(Some(u))).map_err(Error::from))
    }
}
