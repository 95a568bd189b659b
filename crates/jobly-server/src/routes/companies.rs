//! `/companies`

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use jobly::UpdatePayload;
use jobly::models::company::{self, NewCompany};
use serde_json::{Value, json};

use crate::app::AppState;
use crate::auth::Auth;
use crate::error::ApiResult;
use crate::extract::{FilterQuery, JsonBody};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{handle}", get(show).patch(update).delete(remove))
}

async fn create(
    State(state): State<AppState>,
    auth: Auth,
    JsonBody(new): JsonBody<NewCompany>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    auth.require_login()?;
    new.validate()?;
    let client = state.client().await?;
    let company = company::create(&client, &new).await?;
    Ok((StatusCode::CREATED, Json(json!({ "company": company }))))
}

async fn list(
    State(state): State<AppState>,
    FilterQuery(request): FilterQuery,
) -> ApiResult<Json<Value>> {
    let filter = company::compile_search(&request)?;
    let client = state.client().await?;
    let companies = company::search_with(&client, &filter).await?;
    Ok(Json(json!({ "companies": companies })))
}

async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> ApiResult<Json<Value>> {
    let client = state.client().await?;
    let company = company::get(&client, &handle).await?;
    Ok(Json(json!({ "company": company })))
}

async fn update(
    State(state): State<AppState>,
    auth: Auth,
    Path(handle): Path<String>,
    JsonBody(payload): JsonBody<UpdatePayload>,
) -> ApiResult<Json<Value>> {
    auth.require_login()?;
    let set = company::compile_update(&payload)?;
    let client = state.client().await?;
    let company = company::update_with(&client, &handle, &set).await?;
    Ok(Json(json!({ "company": company })))
}

async fn remove(
    State(state): State<AppState>,
    auth: Auth,
    Path(handle): Path<String>,
) -> ApiResult<Json<Value>> {
    auth.require_login()?;
    let client = state.client().await?;
    company::remove(&client, &handle).await?;
    Ok(Json(json!({ "deleted": handle })))
}
