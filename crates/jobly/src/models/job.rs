//! Job postings.

use super::{check_field, duplicate, non_empty_text, non_negative_int};
use crate::builder::{
    CompiledClause, FieldSpec, FilterRequest, UpdateField, UpdatePayload, UpdateSpec,
    build_filter,
};
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::query::query;
use crate::row::{FromRow, RowExt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

const COLUMNS: &str = "id, title, salary, equity, company_handle";

/// Search filters, in the order their placeholders are numbered.
pub const FILTERS: &[FieldSpec] = &[
    FieldSpec::substring("titleLike", "title"),
    FieldSpec::substring("companyLike", "company_handle"),
    FieldSpec::at_least("minSalary", "salary").non_negative(),
    FieldSpec::flag("hasEquity", "equity"),
];

const UPDATE_FIELDS: &[UpdateField] = &[
    UpdateField::same("title"),
    UpdateField::same("salary"),
    UpdateField::same("equity"),
];

/// Updatable fields. Id and company are fixed at creation.
pub const UPDATES: UpdateSpec = UpdateSpec::new(UPDATE_FIELDS);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

impl FromRow for Job {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            salary: row.try_get_column("salary")?,
            equity: row.try_get_column("equity")?,
            company_handle: row.try_get_column("company_handle")?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    #[serde(default)]
    pub salary: Option<i32>,
    #[serde(default)]
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

fn equity_in_range(equity: Decimal) -> bool {
    equity >= Decimal::ZERO && equity <= Decimal::ONE
}

impl NewJob {
    pub fn validate(&self) -> JoblyResult<()> {
        if self.title.trim().is_empty() {
            return Err(JoblyError::validation("title cannot be empty"));
        }
        if self.salary.is_some_and(|s| s < 0) {
            return Err(JoblyError::validation("salary must not be negative"));
        }
        if self.equity.is_some_and(|e| !equity_in_range(e)) {
            return Err(JoblyError::validation("equity must be between 0 and 1"));
        }
        Ok(())
    }
}

/// Compile a search request into a predicate.
pub fn compile_search(request: &FilterRequest) -> JoblyResult<CompiledClause> {
    build_filter(FILTERS, request)
}

/// Compile and shape-check an update payload.
pub fn compile_update(payload: &UpdatePayload) -> JoblyResult<CompiledClause> {
    let set = UPDATES.compile(payload)?;
    check_field(payload, "title", false, non_empty_text)?;
    check_field(payload, "salary", true, non_negative_int)?;
    check_field(payload, "equity", true, |v| {
        let equity = match v {
            serde_json::Value::String(s) => s.trim().parse::<Decimal>().ok(),
            _ => v.as_f64().and_then(|x| Decimal::try_from(x).ok()),
        };
        match equity {
            Some(e) if equity_in_range(e) => Ok(()),
            Some(_) => Err("must be between 0 and 1"),
            None => Err("must be a number"),
        }
    })?;
    Ok(set)
}

/// Create a job. An unknown company is reported as not found.
pub async fn create(conn: &impl GenericClient, new: &NewJob) -> JoblyResult<Job> {
    new.validate()?;
    let job = query(format!(
        "INSERT INTO jobs (title, salary, equity, company_handle) \
         VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
    ))
    .bind(new.title.clone())
    .bind(new.salary)
    .bind(new.equity)
    .bind(new.company_handle.clone())
    .fetch_one_as::<Job>(conn)
    .await
    .map_err(|e| {
        if e.is_foreign_key_violation() {
            return JoblyError::not_found(format!("No company: {}", new.company_handle));
        }
        duplicate(e, || format!("Duplicate job: {}, {}", new.title, new.company_handle))
    })?;

    tracing::info!(id = job.id, company = %job.company_handle, "created job");
    Ok(job)
}

/// Jobs matching a compiled search predicate, ordered by company then title.
pub async fn search_with(
    conn: &impl GenericClient,
    filter: &CompiledClause,
) -> JoblyResult<Vec<Job>> {
    query(format!(
        "SELECT {COLUMNS} FROM jobs WHERE {} ORDER BY company_handle, title",
        filter.predicate()
    ))
    .bind_clause(filter)
    .fetch_all_as(conn)
    .await
}

pub async fn search(
    conn: &impl GenericClient,
    request: &FilterRequest,
) -> JoblyResult<Vec<Job>> {
    let filter = compile_search(request)?;
    search_with(conn, &filter).await
}

pub(crate) async fn for_company(
    conn: &impl GenericClient,
    handle: &str,
) -> JoblyResult<Vec<Job>> {
    query(format!("SELECT {COLUMNS} FROM jobs WHERE company_handle = $1 ORDER BY id"))
        .bind(handle.to_string())
        .fetch_all_as(conn)
        .await
}

pub async fn get(conn: &impl GenericClient, id: i32) -> JoblyResult<Job> {
    query(format!("SELECT {COLUMNS} FROM jobs WHERE id = $1"))
        .bind(id)
        .fetch_opt_as::<Job>(conn)
        .await?
        .ok_or_else(|| JoblyError::not_found(format!("No job: {id}")))
}

/// Apply a compiled `SET` list to one job.
pub async fn update_with(
    conn: &impl GenericClient,
    id: i32,
    set: &CompiledClause,
) -> JoblyResult<Job> {
    query(format!(
        "UPDATE jobs SET {} WHERE id = ${} RETURNING {COLUMNS}",
        set.to_sql(),
        set.next_placeholder()
    ))
    .bind_clause(set)
    .bind(id)
    .fetch_opt_as::<Job>(conn)
    .await
    .map_err(|e| duplicate(e, || format!("Duplicate job title for job {id}")))?
    .ok_or_else(|| JoblyError::not_found(format!("No job: {id}")))
}

pub async fn update(
    conn: &impl GenericClient,
    id: i32,
    payload: &UpdatePayload,
) -> JoblyResult<Job> {
    let set = compile_update(payload)?;
    update_with(conn, id, &set).await
}

pub async fn remove(conn: &impl GenericClient, id: i32) -> JoblyResult<()> {
    let deleted = query("DELETE FROM jobs WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    if deleted == 0 {
        return Err(JoblyError::not_found(format!("No job: {id}")));
    }
    tracing::info!(id, "removed job");
    Ok(())
}
