use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::{TokenError, TokenService};
use crate::error::ApiError;

/// Extracts and validates the bearer token, returning the user ID.
///
/// A missing header, or one without a token part, is 401. Anything else that
/// was presented and fails verification (including a non-Bearer scheme) is 403.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<TokenService>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(ApiError::AuthTokenMissing)?
            .to_str()
            .map_err(|_| ApiError::AuthTokenInvalid(TokenError::Malformed))?;

        let (scheme, token) = split_authorization(header).ok_or(ApiError::AuthTokenMissing)?;
        if !scheme.eq_ignore_ascii_case("Bearer") {
            warn!(scheme, "unsupported authorization scheme");
            return Err(ApiError::AuthTokenInvalid(TokenError::Malformed));
        }

        let tokens = Arc::<TokenService>::from_ref(state);
        match tokens.verify(token) {
            Ok(user_id) => Ok(AuthUser(user_id)),
            Err(kind) => {
                warn!(reason = %kind, "token verification failed");
                Err(ApiError::AuthTokenInvalid(kind))
            }
        }
    }
}

/// Splits `"<scheme> <token>"`; `None` when there is no token part.
fn split_authorization(header: &str) -> Option<(&str, &str)> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (!token.is_empty()).then_some((scheme, token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_header_parsing() {
        assert_eq!(
            split_authorization("Bearer abc.def.ghi"),
            Some(("Bearer", "abc.def.ghi"))
        );
        assert_eq!(split_authorization("bearer abc"), Some(("bearer", "abc")));
        assert_eq!(
            split_authorization("Basic dXNlcjpwYXNz"),
            Some(("Basic", "dXNlcjpwYXNz"))
        );
        assert_eq!(split_authorization("Bearer "), None);
        assert_eq!(split_authorization("Bearer    "), None);
        assert_eq!(split_authorization("abc"), None);
    }
}
