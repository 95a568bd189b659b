pub mod companies;
pub mod health;
pub mod jobs;
pub mod users;

use crate::error::ApiError;

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not Found".to_string())
}
