//! Lightweight query builder for hand-written SQL

use crate::builder::CompiledClause;
use crate::client::GenericClient;
use crate::error::JoblyResult;
use crate::row::FromRow;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Hand-written SQL plus its positional parameters.
///
/// ```ignore
/// use jobly::query;
///
/// let set = company::UPDATES.compile(&payload)?;
/// let company: Company = query(format!(
///     "UPDATE companies SET {} WHERE handle = ${} RETURNING *",
///     set.to_sql(),
///     set.next_placeholder(),
/// ))
/// .bind_clause(&set)
/// .bind(handle.to_string())
/// .fetch_one_as(&conn)
/// .await?;
/// ```
pub struct Query {
    sql: String,
    params: Vec<Box<dyn ToSql + Sync + Send>>,
}

/// Create a new query with the given SQL
pub fn query(sql: impl Into<String>) -> Query {
    Query {
        sql: sql.into(),
        params: Vec::new(),
    }
}

impl Query {
    /// Bind a parameter to the query
    pub fn bind<T: ToSql + Sync + Send + 'static>(mut self, value: T) -> Self {
        self.params.push(Box::new(value));
        self
    }

    /// Bind every parameter of a compiled clause, in placeholder order.
    ///
    /// The clause's placeholders must start at `$1`, so bind it before any
    /// trailing parameters.
    pub fn bind_clause(mut self, clause: &CompiledClause) -> Self {
        for value in clause.params() {
            self.params.push(Box::new(value.clone()));
        }
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p.as_ref() as _).collect()
    }

    /// Execute the query and return all rows
    pub async fn fetch_all(&self, conn: &impl GenericClient) -> JoblyResult<Vec<Row>> {
        conn.query(&self.sql, &self.params_ref()).await
    }

    /// Execute the query and return all rows mapped to type T
    pub async fn fetch_all_as<T: FromRow>(
        &self,
        conn: &impl GenericClient,
    ) -> JoblyResult<Vec<T>> {
        let rows = self.fetch_all(conn).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute the query and return exactly one row
    pub async fn fetch_one(&self, conn: &impl GenericClient) -> JoblyResult<Row> {
        conn.query_one(&self.sql, &self.params_ref()).await
    }

    /// Execute the query and return exactly one row mapped to type T
    pub async fn fetch_one_as<T: FromRow>(&self, conn: &impl GenericClient) -> JoblyResult<T> {
        let row = self.fetch_one(conn).await?;
        T::from_row(&row)
    }

    /// Execute the query and return at most one row
    pub async fn fetch_opt(&self, conn: &impl GenericClient) -> JoblyResult<Option<Row>> {
        conn.query_opt(&self.sql, &self.params_ref()).await
    }

    /// Execute the query and return at most one row mapped to type T
    pub async fn fetch_opt_as<T: FromRow>(
        &self,
        conn: &impl GenericClient,
    ) -> JoblyResult<Option<T>> {
        let row = self.fetch_opt(conn).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// Execute the query and return the number of affected rows
    pub async fn execute(&self, conn: &impl GenericClient) -> JoblyResult<u64> {
        conn.execute(&self.sql, &self.params_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{FieldSpec, FilterRequest, build_filter};

    #[test]
    fn clause_params_come_before_trailing_binds() {
        const SPECS: &[FieldSpec] = &[FieldSpec::at_least("minSalary", "salary")];
        let clause =
            build_filter(SPECS, &FilterRequest::from_pairs([("minSalary", "100")])).unwrap();

        let q = query(format!(
            "SELECT id FROM jobs WHERE {} LIMIT ${}",
            clause.predicate(),
            clause.next_placeholder()
        ))
        .bind_clause(&clause)
        .bind(10_i64);

        assert_eq!(q.sql(), "SELECT id FROM jobs WHERE 1=1 AND salary >= $1 LIMIT $2");
        assert_eq!(q.param_count(), 2);
    }
}
