//! # jobly
//!
//! Companies, jobs and users over PostgreSQL.
//!
//! The interesting part is [`builder`]: two pure compilers that turn caller
//! input into parameterized SQL fragments.
//!
//! ```ignore
//! use jobly::builder::{FilterRequest, UpdatePayload};
//! use jobly::models::company;
//!
//! // WHERE 1=1 AND num_employees <= $1 AND name ILIKE $2
//! let request = FilterRequest::from_pairs([("nameLike", "tech"), ("maxEmployees", "500")]);
//! let companies = company::search(&client, &request).await?;
//!
//! // UPDATE companies SET "num_employees"=$1 WHERE handle = $2
//! let payload: UpdatePayload = serde_json::from_str(r#"{"numEmployees": 12}"#)?;
//! let updated = company::update(&client, "acme", &payload).await?;
//! ```
//!
//! Everything else is plumbing: a [`GenericClient`] over connections,
//! transactions and pooled clients, a small [`query`] builder, row mapping,
//! embedded migrations and the entity repositories in [`models`].

pub mod builder;
pub mod client;
pub mod error;
pub mod ident;
pub mod models;
pub mod query;
pub mod row;
pub mod validate;
pub mod value;

pub use builder::{
    Aliases, CompiledClause, FieldSpec, FilterRequest, UpdatePayload, UpdateSpec, build_filter,
    compile_partial_update,
};
pub use client::GenericClient;
pub use error::{JoblyError, JoblyResult};
pub use ident::Ident;
pub use query::query;
pub use row::{FromRow, RowExt};
pub use value::SqlValue;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{Pool, PoolClient, create_pool, create_pool_with_config};

#[cfg(feature = "migrate")]
pub mod migrate;
