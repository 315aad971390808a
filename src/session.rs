use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::{Ready, ready};

use crate::error::AppError;
use crate::model::role::Role;

/// Header carrying the role picked in the client's role toggle.
pub const ROLE_HEADER: &str = "X-Role";

/// Request-scoped caller state. There is no login: the role toggle is trusted,
/// and a request without the header acts as an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub role: Role,
}

impl FromRequest for Session {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let role = match req.headers().get(ROLE_HEADER) {
            None => Ok(Role::default()),
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|v| v.trim().parse::<Role>().ok())
                .ok_or_else(|| {
                    AppError::Validation(format!("{ROLE_HEADER} must be 'admin' or 'employee'"))
                }),
        };

        ready(role.map(|role| Session { role }))
    }
}

impl Session {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin only".into()))
        }
    }
}
