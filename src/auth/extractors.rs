use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::warn;

use crate::auth::password;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::User;

/// Authenticated caller, resolved from the `Authorization: Basic` header.
///
/// There is no server-side session: every request re-authenticates by
/// loading the user row and verifying the password hash. Any failure along
/// the way yields 401 with a `WWW-Authenticate: Basic` challenge.
pub struct AuthUser(pub User);

fn decode_basic_credentials(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value
        .strip_prefix("Basic ")
        .or_else(|| header_value.strip_prefix("basic "))?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (email, password) = text.split_once(':')?;
    Some((email.to_string(), password.to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let (email, plain) =
            decode_basic_credentials(header_value).ok_or(ApiError::Unauthorized)?;

        let user = User::find_by_email(&state.db, &email)
            .await?
            .ok_or_else(|| {
                warn!(email = %email, "basic auth unknown email");
                ApiError::Unauthorized
            })?;

        let ok = password::verify_password(&plain, &user.password_hash)
            .map_err(ApiError::Internal)?;
        if !ok {
            warn!(user_id = user.id, "basic auth invalid password");
            return Err(ApiError::Unauthorized);
        }

        Ok(AuthUser(user))
    }
}
