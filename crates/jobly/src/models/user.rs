//! Users and their job applications.

use super::{check_field, duplicate, non_empty_text};
use crate::builder::{CompiledClause, UpdateField, UpdatePayload, UpdateSpec};
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::query::query;
use crate::row::{FromRow, RowExt};
use crate::validate;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

const COLUMNS: &str = "username, first_name, last_name, email, is_admin";

const UPDATE_FIELDS: &[UpdateField] = &[
    UpdateField::aliased("firstName", "first_name"),
    UpdateField::aliased("lastName", "last_name"),
    UpdateField::same("email"),
    UpdateField::aliased("isAdmin", "is_admin"),
];

/// Updatable fields. The username is immutable.
pub const UPDATES: UpdateSpec = UpdateSpec::new(UPDATE_FIELDS);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
}

impl FromRow for User {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            username: row.try_get_column("username")?,
            first_name: row.try_get_column("first_name")?,
            last_name: row.try_get_column("last_name")?,
            email: row.try_get_column("email")?,
            is_admin: row.try_get_column("is_admin")?,
        })
    }
}

/// A user with the ids of the jobs they applied to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub jobs: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl NewUser {
    pub fn validate(&self) -> JoblyResult<()> {
        if !validate::is_slug(&self.username) {
            return Err(JoblyError::validation(
                "username must be 1-25 lowercase letters, digits, '-' or '_'",
            ));
        }
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(JoblyError::validation("name cannot be empty"));
        }
        if !validate::is_email(&self.email) {
            return Err(JoblyError::validation("email is not a valid address"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub username: String,
    pub job_id: i32,
}

impl FromRow for Application {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            username: row.try_get_column("username")?,
            job_id: row.try_get_column("job_id")?,
        })
    }
}

/// Compile and shape-check an update payload.
pub fn compile_update(payload: &UpdatePayload) -> JoblyResult<CompiledClause> {
    let set = UPDATES.compile(payload)?;
    check_field(payload, "firstName", false, non_empty_text)?;
    check_field(payload, "lastName", false, non_empty_text)?;
    check_field(payload, "email", false, |v| match v.as_str() {
        Some(email) if validate::is_email(email) => Ok(()),
        _ => Err("is not a valid address"),
    })?;
    check_field(payload, "isAdmin", false, |v| match v {
        serde_json::Value::Bool(_) => Ok(()),
        _ => Err("must be true or false"),
    })?;
    Ok(set)
}

pub async fn register(conn: &impl GenericClient, new: &NewUser) -> JoblyResult<User> {
    new.validate()?;
    let user = query(format!(
        "INSERT INTO users (username, first_name, last_name, email, is_admin) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
    ))
    .bind(new.username.clone())
    .bind(new.first_name.clone())
    .bind(new.last_name.clone())
    .bind(new.email.clone())
    .bind(new.is_admin)
    .fetch_one_as::<User>(conn)
    .await
    .map_err(|e| duplicate(e, || format!("Duplicate username: {}", new.username)))?;

    tracing::info!(username = %user.username, is_admin = user.is_admin, "registered user");
    Ok(user)
}

pub async fn find_all(conn: &impl GenericClient) -> JoblyResult<Vec<User>> {
    query(format!("SELECT {COLUMNS} FROM users ORDER BY username"))
        .fetch_all_as(conn)
        .await
}

async fn find(conn: &impl GenericClient, username: &str) -> JoblyResult<User> {
    query(format!("SELECT {COLUMNS} FROM users WHERE username = $1"))
        .bind(username.to_string())
        .fetch_opt_as::<User>(conn)
        .await?
        .ok_or_else(|| JoblyError::not_found(format!("No user: {username}")))
}

pub async fn get(conn: &impl GenericClient, username: &str) -> JoblyResult<UserDetail> {
    let user = find(conn, username).await?;
    let jobs = applications_for(conn, username)
        .await?
        .into_iter()
        .map(|a| a.job_id)
        .collect();
    Ok(UserDetail { user, jobs })
}

/// Apply a compiled `SET` list to one user.
pub async fn update_with(
    conn: &impl GenericClient,
    username: &str,
    set: &CompiledClause,
) -> JoblyResult<User> {
    query(format!(
        "UPDATE users SET {} WHERE username = ${} RETURNING {COLUMNS}",
        set.to_sql(),
        set.next_placeholder()
    ))
    .bind_clause(set)
    .bind(username.to_string())
    .fetch_opt_as::<User>(conn)
    .await?
    .ok_or_else(|| JoblyError::not_found(format!("No user: {username}")))
}

pub async fn update(
    conn: &impl GenericClient,
    username: &str,
    payload: &UpdatePayload,
) -> JoblyResult<User> {
    let set = compile_update(payload)?;
    update_with(conn, username, &set).await
}

pub async fn remove(conn: &impl GenericClient, username: &str) -> JoblyResult<()> {
    let deleted = query("DELETE FROM users WHERE username = $1")
        .bind(username.to_string())
        .execute(conn)
        .await?;
    if deleted == 0 {
        return Err(JoblyError::not_found(format!("No user: {username}")));
    }
    tracing::info!(username, "removed user");
    Ok(())
}

// ==================== applications ====================

/// Record that `username` applied to job `job_id`.
pub async fn apply(
    conn: &impl GenericClient,
    username: &str,
    job_id: i32,
) -> JoblyResult<Application> {
    let row = query(
        "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1) AS user_exists, \
                EXISTS (SELECT 1 FROM jobs WHERE id = $2) AS job_exists",
    )
    .bind(username.to_string())
    .bind(job_id)
    .fetch_one(conn)
    .await?;
    if !row.try_get_column::<bool>("user_exists")? {
        return Err(JoblyError::not_found(format!("No user: {username}")));
    }
    if !row.try_get_column::<bool>("job_exists")? {
        return Err(JoblyError::not_found(format!("No job: {job_id}")));
    }

    let application = query(
        "INSERT INTO applications (username, job_id) VALUES ($1, $2) \
         RETURNING username, job_id",
    )
    .bind(username.to_string())
    .bind(job_id)
    .fetch_one_as::<Application>(conn)
    .await
    .map_err(|e| {
        if e.is_foreign_key_violation() {
            // user or job deleted between the check and the insert
            return JoblyError::not_found(format!("No user or job: {username}, {job_id}"));
        }
        duplicate(e, || format!("Already applied: {username}, {job_id}"))
    })?;

    tracing::debug!(username, job_id, "recorded application");
    Ok(application)
}

pub async fn unapply(conn: &impl GenericClient, username: &str, job_id: i32) -> JoblyResult<()> {
    let deleted = query("DELETE FROM applications WHERE username = $1 AND job_id = $2")
        .bind(username.to_string())
        .bind(job_id)
        .execute(conn)
        .await?;
    if deleted == 0 {
        return Err(JoblyError::not_found(format!(
            "No application: {username}, {job_id}"
        )));
    }
    Ok(())
}

/// Withdraw every application of `username`; returns how many were removed.
pub async fn unapply_all(conn: &impl GenericClient, username: &str) -> JoblyResult<u64> {
    find(conn, username).await?;
    query("DELETE FROM applications WHERE username = $1")
        .bind(username.to_string())
        .execute(conn)
        .await
}

pub async fn applications_for(
    conn: &impl GenericClient,
    username: &str,
) -> JoblyResult<Vec<Application>> {
    query("SELECT username, job_id FROM applications WHERE username = $1 ORDER BY job_id")
        .bind(username.to_string())
        .fetch_all_as(conn)
        .await
}

pub async fn get_application(
    conn: &impl GenericClient,
    username: &str,
    job_id: i32,
) -> JoblyResult<Application> {
    query("SELECT username, job_id FROM applications WHERE username = $1 AND job_id = $2")
        .bind(username.to_string())
        .bind(job_id)
        .fetch_opt_as::<Application>(conn)
        .await?
        .ok_or_else(|| JoblyError::not_found(format!("No application: {username}, {job_id}")))
}

pub async fn all_applications(conn: &impl GenericClient) -> JoblyResult<Vec<Application>> {
    query("SELECT username, job_id FROM applications ORDER BY username, job_id")
        .fetch_all_as(conn)
        .await
}
