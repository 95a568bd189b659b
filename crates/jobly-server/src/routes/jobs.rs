//! `/jobs`

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use jobly::UpdatePayload;
use jobly::models::job::{self, NewJob};
use serde_json::{Value, json};

use crate::app::AppState;
use crate::auth::Auth;
use crate::error::ApiResult;
use crate::extract::{FilterQuery, JobPath, JsonBody};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).patch(update).delete(remove))
}

async fn create(
    State(state): State<AppState>,
    auth: Auth,
    JsonBody(new): JsonBody<NewJob>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    auth.require_admin()?;
    new.validate()?;
    let client = state.client().await?;
    let job = job::create(&client, &new).await?;
    Ok((StatusCode::CREATED, Json(json!({ "job": job }))))
}

async fn list(
    State(state): State<AppState>,
    FilterQuery(request): FilterQuery,
) -> ApiResult<Json<Value>> {
    let filter = job::compile_search(&request)?;
    let client = state.client().await?;
    let jobs = job::search_with(&client, &filter).await?;
    Ok(Json(json!({ "jobs": jobs })))
}

async fn show(State(state): State<AppState>, JobPath(id): JobPath) -> ApiResult<Json<Value>> {
    let client = state.client().await?;
    let job = job::get(&client, id).await?;
    Ok(Json(json!({ "job": job })))
}

async fn update(
    State(state): State<AppState>,
    auth: Auth,
    JobPath(id): JobPath,
    JsonBody(payload): JsonBody<UpdatePayload>,
) -> ApiResult<Json<Value>> {
    auth.require_admin()?;
    let set = job::compile_update(&payload)?;
    let client = state.client().await?;
    let job = job::update_with(&client, id, &set).await?;
    Ok(Json(json!({ "job": job })))
}

async fn remove(
    State(state): State<AppState>,
    auth: Auth,
    JobPath(id): JobPath,
) -> ApiResult<Json<Value>> {
    auth.require_admin()?;
    let client = state.client().await?;
    job::remove(&client, id).await?;
    Ok(Json(json!({ "deleted": id })))
}
