//! Request extractors that reject with [`ApiError`] instead of axum's
//! plain-text rejections.

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use jobly::FilterRequest;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body; malformed JSON or a shape mismatch is a 400.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Query-string filters, every value kept as text for the filter builder.
#[derive(Debug, Default)]
pub struct FilterQuery(pub FilterRequest);

impl<S> FromRequestParts<S> for FilterQuery
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Self(FilterRequest::from_pairs(pairs)))
    }
}

fn parse_job_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid job id: {raw}")))
}

/// `/{id}` for jobs.
#[derive(Debug, Clone, Copy)]
pub struct JobPath(pub i32);

impl<S> FromRequestParts<S> for JobPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Self(parse_job_id(&raw)?))
    }
}

#[derive(Debug, Deserialize)]
struct ApplicationPathRaw {
    username: String,
    id: String,
}

/// `/{username}/jobs/{id}`
#[derive(Debug, Clone)]
pub struct ApplicationPath {
    pub username: String,
    pub job_id: i32,
}

impl<S> FromRequestParts<S> for ApplicationPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<ApplicationPathRaw>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Self {
            job_id: parse_job_id(&raw.id)?,
            username: raw.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_ids_must_be_integers() {
        assert_eq!(parse_job_id("42").unwrap(), 42);
        assert!(matches!(parse_job_id("abc"), Err(ApiError::BadRequest(_))));
        assert!(parse_job_id("99999999999").is_err());
    }
}
