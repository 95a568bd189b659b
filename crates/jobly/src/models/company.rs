//! Companies.

use super::job::{self, Job};
use super::{check_field, duplicate, non_empty_text, non_negative_int};
use crate::builder::{
    CompiledClause, FieldSpec, FilterRequest, UpdateField, UpdatePayload, UpdateSpec,
    build_filter,
};
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::query::query;
use crate::row::{FromRow, RowExt};
use crate::validate;
use crate::value::SqlValue;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

const COLUMNS: &str = "handle, name, description, num_employees, logo_url";

const MIN_EMPLOYEES: FieldSpec =
    FieldSpec::at_least("minEmployees", "num_employees").non_negative();
const MAX_EMPLOYEES: FieldSpec =
    FieldSpec::at_most("maxEmployees", "num_employees").non_negative();

/// Search filters, in the order their placeholders are numbered.
pub const FILTERS: &[FieldSpec] = &[
    MIN_EMPLOYEES,
    MAX_EMPLOYEES,
    FieldSpec::substring("nameLike", "name"),
];

const UPDATE_FIELDS: &[UpdateField] = &[
    UpdateField::same("name"),
    UpdateField::same("description"),
    UpdateField::aliased("numEmployees", "num_employees"),
    UpdateField::aliased("logoUrl", "logo_url"),
];

/// Updatable fields. The handle is immutable.
pub const UPDATES: UpdateSpec = UpdateSpec::new(UPDATE_FIELDS);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

impl FromRow for Company {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            handle: row.try_get_column("handle")?,
            name: row.try_get_column("name")?,
            description: row.try_get_column("description")?,
            num_employees: row.try_get_column("num_employees")?,
            logo_url: row.try_get_column("logo_url")?,
        })
    }
}

/// A company with the jobs it posts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub num_employees: Option<i32>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

impl NewCompany {
    pub fn validate(&self) -> JoblyResult<()> {
        if !validate::is_slug(&self.handle) {
            return Err(JoblyError::validation(
                "handle must be 1-25 lowercase letters, digits, '-' or '_'",
            ));
        }
        if self.name.trim().is_empty() {
            return Err(JoblyError::validation("name cannot be empty"));
        }
        if self.num_employees.is_some_and(|n| n < 0) {
            return Err(JoblyError::validation("numEmployees must not be negative"));
        }
        if let Some(url) = &self.logo_url {
            if !validate::is_web_url(url) {
                return Err(JoblyError::validation("logoUrl must be an http(s) URL"));
            }
        }
        Ok(())
    }
}

/// Reject `minEmployees > maxEmployees`.
pub fn check_employee_range(request: &FilterRequest) -> JoblyResult<()> {
    let min = MIN_EMPLOYEES.bound(request)?;
    let max = MAX_EMPLOYEES.bound(request)?;
    if let (Some(SqlValue::Int(min)), Some(SqlValue::Int(max))) = (min, max) {
        if min > max {
            return Err(JoblyError::validation(
                "minEmployees cannot be greater than maxEmployees",
            ));
        }
    }
    Ok(())
}

/// Compile a search request into a predicate.
pub fn compile_search(request: &FilterRequest) -> JoblyResult<CompiledClause> {
    let clause = build_filter(FILTERS, request)?;
    check_employee_range(request)?;
    Ok(clause)
}

/// Compile and shape-check an update payload.
pub fn compile_update(payload: &UpdatePayload) -> JoblyResult<CompiledClause> {
    let set = UPDATES.compile(payload)?;
    check_field(payload, "name", false, non_empty_text)?;
    check_field(payload, "description", false, |v| match v.as_str() {
        Some(_) => Ok(()),
        None => Err("must be a string"),
    })?;
    check_field(payload, "numEmployees", true, non_negative_int)?;
    check_field(payload, "logoUrl", true, |v| match v.as_str() {
        Some(url) if validate::is_web_url(url) => Ok(()),
        _ => Err("must be an http(s) URL"),
    })?;
    Ok(set)
}

pub async fn create(conn: &impl GenericClient, new: &NewCompany) -> JoblyResult<Company> {
    new.validate()?;
    let company = query(format!(
        "INSERT INTO companies (handle, name, description, num_employees, logo_url) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
    ))
    .bind(new.handle.clone())
    .bind(new.name.clone())
    .bind(new.description.clone())
    .bind(new.num_employees)
    .bind(new.logo_url.clone())
    .fetch_one_as::<Company>(conn)
    .await
    .map_err(|e| duplicate(e, || format!("Duplicate company: {}", new.handle)))?;

    tracing::info!(handle = %company.handle, "created company");
    Ok(company)
}

/// Companies matching a compiled search predicate, ordered by name.
pub async fn search_with(
    conn: &impl GenericClient,
    filter: &CompiledClause,
) -> JoblyResult<Vec<Company>> {
    query(format!(
        "SELECT {COLUMNS} FROM companies WHERE {} ORDER BY name",
        filter.predicate()
    ))
    .bind_clause(filter)
    .fetch_all_as(conn)
    .await
}

pub async fn search(
    conn: &impl GenericClient,
    request: &FilterRequest,
) -> JoblyResult<Vec<Company>> {
    let filter = compile_search(request)?;
    search_with(conn, &filter).await
}

pub async fn get(conn: &impl GenericClient, handle: &str) -> JoblyResult<CompanyDetail> {
    let company = query(format!("SELECT {COLUMNS} FROM companies WHERE handle = $1"))
        .bind(handle.to_string())
        .fetch_opt_as::<Company>(conn)
        .await?
        .ok_or_else(|| JoblyError::not_found(format!("No company: {handle}")))?;

    let jobs = job::for_company(conn, handle).await?;
    Ok(CompanyDetail { company, jobs })
}

/// Apply a compiled `SET` list to one company.
pub async fn update_with(
    conn: &impl GenericClient,
    handle: &str,
    set: &CompiledClause,
) -> JoblyResult<Company> {
    query(format!(
        "UPDATE companies SET {} WHERE handle = ${} RETURNING {COLUMNS}",
        set.to_sql(),
        set.next_placeholder()
    ))
    .bind_clause(set)
    .bind(handle.to_string())
    .fetch_opt_as::<Company>(conn)
    .await
    .map_err(|e| duplicate(e, || "Duplicate company name".to_string()))?
    .ok_or_else(|| JoblyError::not_found(format!("No company: {handle}")))
}

pub async fn update(
    conn: &impl GenericClient,
    handle: &str,
    payload: &UpdatePayload,
) -> JoblyResult<Company> {
    let set = compile_update(payload)?;
    update_with(conn, handle, &set).await
}

pub async fn remove(conn: &impl GenericClient, handle: &str) -> JoblyResult<()> {
    let deleted = query("DELETE FROM companies WHERE handle = $1")
        .bind(handle.to_string())
        .execute(conn)
        .await?;
    if deleted == 0 {
        return Err(JoblyError::not_found(format!("No company: {handle}")));
    }
    tracing::info!(handle, "removed company");
    Ok(())
}
