//! HTTP API for jobly.
//!
//! Routes live under [`routes`]; [`app::router`] assembles them with the
//! shared [`app::AppState`].

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

pub use app::{AppState, router, serve};
pub use config::Config;
pub use error::ApiError;
