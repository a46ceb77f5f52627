use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::{hash_password, issue_token, verify_password},
    error::ApiError,
    models::{LoginRequest, LoginResponse, NewUser, RegisterRequest, User},
    repository::UserRepository,
};

/// register_user
///
/// [Public Route] Creates an account. The password is stored only as an Argon2id hash.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = User),
        (status = 400, description = "Missing fields, or username/email already taken")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let username = payload.username.trim();
    let email = payload.email.trim();
    if username.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Missing required fields: username, email, password".to_string(),
        ));
    }

    let new_user = NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password_hash: hash_password(&payload.password)?,
    };

    let user = state.repo.create_user(new_user).await.map_err(|err| {
        if err.is_unique_violation() {
            ApiError::AlreadyExists("Username or email already exists".to_string())
        } else {
            ApiError::Store(err)
        }
    })?;

    tracing::info!(user_id = user.id, username = %user.username, "user registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// login_user
///
/// [Public Route] Exchanges a username (or email) and password for a bearer token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    // A blank username falls through to the email.
    let login = non_blank(payload.username.as_deref())
        .or_else(|| non_blank(payload.email.as_deref()))
        .ok_or_else(|| ApiError::Validation("Missing username or email".to_string()))?;

    let user = state
        .repo
        .find_user_by_login(login)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&payload.password, &user.password) {
        tracing::debug!(user_id = user.id, "password mismatch");
        return Err(invalid());
    }

    let token = issue_token(&user, &state.config)?;
    Ok(Json(LoginResponse { token, user }))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
