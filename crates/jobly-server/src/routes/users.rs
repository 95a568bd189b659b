//! `/users` and job applications.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use jobly::UpdatePayload;
use jobly::models::user::{self, NewUser};
use serde_json::{Value, json};

use crate::app::AppState;
use crate::auth::Auth;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApplicationPath, JsonBody};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(register))
        .route("/{username}", get(show).patch(update).delete(remove))
        .route("/{username}/token", post(refresh_token))
        .route("/{username}/jobs", get(applications).delete(withdraw_all))
        .route(
            "/{username}/jobs/{id}",
            get(application).post(apply).delete(withdraw),
        )
}

/// Admin-only registration; the response carries a token for the new user.
async fn register(
    State(state): State<AppState>,
    auth: Auth,
    JsonBody(new): JsonBody<NewUser>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    auth.require_admin()?;
    new.validate()?;
    let client = state.client().await?;
    let user = user::register(&client, &new).await?;
    let token = state.keys.issue(&user.username, user.is_admin)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": user, "token": token })),
    ))
}

/// Re-issue a token for a still-authenticated caller. Admin status is read
/// from the database, so a revoked admin loses it on refresh.
async fn refresh_token(
    State(state): State<AppState>,
    auth: Auth,
    Path(username): Path<String>,
) -> ApiResult<Json<Value>> {
    auth.require_self_or_admin(&username)?;
    let client = state.client().await?;
    let user = user::get(&client, &username).await?.user;
    let token = state.keys.issue(&user.username, user.is_admin)?;
    Ok(Json(json!({ "token": token })))
}

async fn list(State(state): State<AppState>, auth: Auth) -> ApiResult<Json<Value>> {
    auth.require_admin()?;
    let client = state.client().await?;
    let users = user::find_all(&client).await?;
    let applications = user::all_applications(&client).await?;
    Ok(Json(json!({ "users": users, "applications": applications })))
}

async fn show(
    State(state): State<AppState>,
    auth: Auth,
    Path(username): Path<String>,
) -> ApiResult<Json<Value>> {
    auth.require_self_or_admin(&username)?;
    let client = state.client().await?;
    let user = user::get(&client, &username).await?;
    Ok(Json(json!({ "user": user })))
}

async fn update(
    State(state): State<AppState>,
    auth: Auth,
    Path(username): Path<String>,
    JsonBody(payload): JsonBody<UpdatePayload>,
) -> ApiResult<Json<Value>> {
    let claims = auth.require_self_or_admin(&username)?;
    if payload.contains_key("isAdmin") && !claims.is_admin {
        return Err(ApiError::unauthorized());
    }
    let set = user::compile_update(&payload)?;
    let client = state.client().await?;
    let user = user::update_with(&client, &username, &set).await?;
    Ok(Json(json!({ "user": user })))
}

async fn remove(
    State(state): State<AppState>,
    auth: Auth,
    Path(username): Path<String>,
) -> ApiResult<Json<Value>> {
    auth.require_self_or_admin(&username)?;
    let client = state.client().await?;
    user::remove(&client, &username).await?;
    Ok(Json(json!({ "deleted": username })))
}

async fn applications(
    State(state): State<AppState>,
    auth: Auth,
    Path(username): Path<String>,
) -> ApiResult<Json<Value>> {
    auth.require_self_or_admin(&username)?;
    let client = state.client().await?;
    let jobs: Vec<i32> = user::get(&client, &username).await?.jobs;
    Ok(Json(json!({ "jobs": jobs })))
}

async fn withdraw_all(
    State(state): State<AppState>,
    auth: Auth,
    Path(username): Path<String>,
) -> ApiResult<Json<Value>> {
    auth.require_self_or_admin(&username)?;
    let client = state.client().await?;
    let deleted = user::unapply_all(&client, &username).await?;
    Ok(Json(json!({ "deleted": deleted })))
}

async fn application(
    State(state): State<AppState>,
    auth: Auth,
    path: ApplicationPath,
) -> ApiResult<Json<Value>> {
    auth.require_self_or_admin(&path.username)?;
    let client = state.client().await?;
    let application = user::get_application(&client, &path.username, path.job_id).await?;
    Ok(Json(json!({ "applied": application.job_id })))
}

async fn apply(
    State(state): State<AppState>,
    auth: Auth,
    path: ApplicationPath,
) -> ApiResult<Json<Value>> {
    auth.require_self_or_admin(&path.username)?;
    let client = state.client().await?;
    let application = user::apply(&client, &path.username, path.job_id).await?;
    Ok(Json(json!({ "applied": application.job_id })))
}

async fn withdraw(
    State(state): State<AppState>,
    auth: Auth,
    path: ApplicationPath,
) -> ApiResult<Json<Value>> {
    auth.require_self_or_admin(&path.username)?;
    let client = state.client().await?;
    user::unapply(&client, &path.username, path.job_id).await?;
    Ok(Json(json!({ "deleted": path.job_id })))
}
