use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::Role;
use crate::models::Claims;
use actix_web::{dev::Payload, web::Data, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, DecodingKey, Validation};

/// The authenticated caller. Decoded once by the auth middleware and made
/// available to handlers as an extractor; all capability checks live here
/// rather than inline in handlers.
#[derive(Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<String>,
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // The middleware already verified the token for protected routes.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ApiError::Authentication("Missing token".into()))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(ApiError::Dependency("Config missing".into()))),
        };

        let data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(d) => d,
            Err(_) => return ready(Err(ApiError::Authentication("Invalid token".into()))),
        };

        let role = match Role::from_id(data.claims.role) {
            Some(r) => r,
            None => return ready(Err(ApiError::Authentication("Invalid role".into()))),
        };

        ready(Ok(AuthUser {
            user_id: data.claims.user_id,
            email: data.claims.sub,
            role,
            employee_id: data.claims.employee_id,
        }))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::Authorization("Admin only".into()))
        }
    }

    /// Admin may touch any employee; an Employee only their own record.
    pub fn require_self_or_admin(&self, employee_id: &str) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            return Ok(());
        }
        if self.employee_id.as_deref() == Some(employee_id) {
            return Ok(());
        }
        Err(ApiError::Authorization(
            "Not allowed to access another employee's records".into(),
        ))
    }

    /// The caller's own employee ID, for operations that act on "self".
    pub fn employee_profile(&self) -> Result<&str, ApiError> {
        self.employee_id
            .as_deref()
            .ok_or_else(|| ApiError::Authorization("No employee profile linked".into()))
    }
}
