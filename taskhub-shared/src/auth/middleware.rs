/// Request authentication
///
/// Extracts the bearer token from the `Authorization` header, validates it
/// and checks that its subject still exists. The API crate wraps
/// [`authenticate`] in an axum middleware that inserts the resulting
/// [`AuthContext`] into request extensions.
///
/// # Outcomes
///
/// | Request                                 | Result                       |
/// |-----------------------------------------|------------------------------|
/// | no `Authorization` header               | [`AuthError::MissingCredentials`] |
/// | header present but not `Bearer <token>` | [`AuthError::InvalidFormat`] |
/// | bad signature, issuer or expiry         | [`AuthError::InvalidToken`]  |
/// | token subject has no account            | [`AuthError::UnknownUser`]   |
///
/// # Example
///
/// ```no_run
/// use axum::http::HeaderMap;
/// use taskhub_shared::auth::middleware::authenticate;
/// use taskhub_shared::store::Stores;
///
/// # async fn example(stores: Stores, headers: HeaderMap) -> Result<(), Box<dyn std::error::Error>> {
/// let auth = authenticate(&stores, "jwt-secret", &headers).await?;
/// println!("Request from user {}", auth.user_id);
/// # Ok(())
/// # }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};
use crate::store::{StoreError, Stores};

/// Authentication context added to request extensions
///
/// Handlers extract it with `Extension<AuthContext>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("{0}")]
    InvalidFormat(String),

    #[error("{0}")]
    InvalidToken(String),

    /// Token is valid but its user no longer exists
    #[error("User no longer exists")]
    UnknownUser,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Returns the token of an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| {
            AuthError::InvalidFormat("Authorization header is not valid text".to_string())
        })?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Authenticates a request from its headers
pub async fn authenticate(
    stores: &Stores,
    secret: &str,
    headers: &HeaderMap,
) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;

    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    if stores.users.find_by_id(claims.sub).await?.is_none() {
        tracing::debug!(user_id = %claims.sub, "Token subject no longer exists");
        return Err(AuthError::UnknownUser);
    }

    Ok(AuthContext { user_id: claims.sub })
}
