use crate::{auth::jwt::verify_token, config::Config, error::AppError, model::role::Role, models::TokenType};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    /// Resolves the caller from a raw `Authorization` header value.
    pub fn from_bearer(header: Option<&str>, secret: &str) -> Result<Self, AppError> {
        let token = header
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Authorization header must start with Bearer".into()))?;

        let claims = verify_token(token, secret)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

        if claims.token_type != TokenType::Access {
            return Err(AppError::Unauthorized("Access token required".into()));
        }

        Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.sub,
            role: claims.role,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admins only".into()))
        }
    }
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by auth_middleware
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let Some(config) = req.app_data::<Data<Config>>() else {
            return ready(Err(AppError::Internal("Config missing".into())));
        };

        let header = req.headers().get("Authorization").and_then(|h| h.to_str().ok());

        ready(AuthUser::from_bearer(header, &config.jwt_secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{generate_access_token, generate_refresh_token};

    #[test]
    fn bearer_access_token_resolves_user() {
        let token = generate_access_token(3, "e@x.io", Role::Employee, "s", 60).unwrap();
        let header = format!("Bearer {token}");
        let user = AuthUser::from_bearer(Some(&header), "s").unwrap();
        assert_eq!(user.user_id, 3);
        assert!(!user.is_admin());
        assert!(matches!(user.require_admin(), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let (token, _) = generate_refresh_token(3, "e@x.io", Role::Admin, "s", 60).unwrap();
        let header = format!("Bearer {token}");
        assert!(matches!(
            AuthUser::from_bearer(Some(&header), "s"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn missing_or_malformed_header() {
        assert!(AuthUser::from_bearer(None, "s").is_err());
        assert!(AuthUser::from_bearer(Some("Token abc"), "s").is_err());
    }
}
