use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{extractors::AuthUser, password},
    error::{ApiError, ApiResult},
    state::AppState,
    users::{
        dto::{
            AdminPasswordChangeRequest, CreateUserRequest, Envelope, PasswordChangeRequest,
            ProfileUpdateRequest,
        },
        repo::User,
        validate,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", get(get_user).delete(delete_user))
        .route("/users/:id/change-password", post(admin_change_password))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/api/user/profile", put(update_profile))
        .route("/api/user/password", put(change_password))
}

#[instrument(skip(state, _current))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(_current): AuthUser,
) -> ApiResult<Json<Envelope>> {
    let users = User::list_all(&state.db).await?;
    Ok(Json(Envelope::ok_users(
        users.iter().map(User::to_public).collect(),
    )))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<Envelope>)> {
    validate::validate_create(&payload)?;

    // The unique index is the real guard; this pre-check only gives the
    // common case a clean 409 without a constraint round-trip.
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "create_user email taken");
        return Err(ApiError::EmailTaken);
    }

    let hash = password::hash_password(&payload.password)?;
    let user = User::create(
        &state.db,
        &payload.name,
        &payload.email,
        &hash,
        payload.phone.as_deref(),
    )
    .await?;

    info!(user_id = user.id, email = %user.email, "user created");
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok_user(user.to_public())),
    ))
}

#[instrument(skip(state, _current))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_current): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Envelope>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(Envelope::ok_user(user.to_public())))
}

/// Self-delete only. Ownership is checked before existence, so deleting a
/// foreign id fails with 403 even when that id does not exist.
#[instrument(skip(state, current))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Envelope>> {
    if current.id != id {
        warn!(user_id = current.id, target = id, "delete_user forbidden");
        return Err(ApiError::Forbidden);
    }
    if !User::delete(&state.db, id).await? {
        return Err(ApiError::NotFound);
    }
    info!(user_id = id, "user deleted");
    Ok(Json(Envelope::ok_message("Пользователь успешно удален")))
}

#[instrument(skip(state, current, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Json(payload): Json<ProfileUpdateRequest>,
) -> ApiResult<Json<Envelope>> {
    validate::validate_profile_update(&payload)?;

    if let Some(email) = payload.email.as_deref() {
        if email != current.email && User::find_by_email(&state.db, email).await?.is_some() {
            warn!(user_id = current.id, "update_profile email taken");
            return Err(ApiError::EmailTaken);
        }
    }

    let user = User::update_profile(
        &state.db,
        current.id,
        payload.name.as_deref(),
        payload.email.as_deref(),
        payload.phone.as_deref(),
    )
    .await?;

    info!(user_id = user.id, "profile updated");
    Ok(Json(Envelope::ok_user(user.to_public())))
}

#[instrument(skip(state, current, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Json(payload): Json<PasswordChangeRequest>,
) -> ApiResult<Json<Envelope>> {
    validate::validate_password_change(&payload)?;

    let hash = password::hash_password(&payload.new_password)?;
    User::set_password_hash(&state.db, current.id, &hash).await?;

    info!(user_id = current.id, "password changed");
    Ok(Json(Envelope::ok_message("Пароль успешно изменён")))
}

/// Administrative password reset. Only the configured admin account may call
/// this; the original service accepted any authenticated caller.
#[instrument(skip(state, current, payload))]
pub async fn admin_change_password(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<AdminPasswordChangeRequest>,
) -> ApiResult<Json<Envelope>> {
    validate::validate_admin_password_change(&payload)?;

    if current.email != state.config.admin_email {
        warn!(user_id = current.id, target = id, "admin_change_password forbidden");
        return Err(ApiError::Forbidden);
    }

    let target = User::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let hash = password::hash_password(&payload.new_password)?;
    User::set_password_hash(&state.db, target.id, &hash).await?;

    info!(admin_id = current.id, target = target.id, "password reset by admin");
    Ok(Json(Envelope::ok_message("Пароль пользователя успешно изменён")))
}
