//! Compiled, parameterized SQL fragments.

use crate::value::SqlValue;
use tokio_postgres::types::ToSql;

/// Always-true predicate compiled filters are conjoined onto.
pub const TRUE_PREDICATE: &str = "1=1";

/// How the fragments of a [`CompiledClause`] are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joiner {
    /// `, ` (SET lists)
    Comma,
    /// ` AND ` (predicates)
    And,
}

impl Joiner {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Comma => ", ",
            Self::And => " AND ",
        }
    }
}

/// Ordered SQL fragments plus the parameters their placeholders bind.
///
/// Placeholders are numbered `$1..$n` in fragment order and the `i`-th
/// parameter always binds `$i`. Every fragment carries exactly one
/// placeholder, so `fragments().len() == params().len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledClause {
    joiner: Joiner,
    fragments: Vec<String>,
    params: Vec<SqlValue>,
}

impl CompiledClause {
    pub fn new(joiner: Joiner) -> Self {
        Self {
            joiner,
            fragments: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Append `{head}$n` and bind `value` to `$n`.
    pub(crate) fn push(&mut self, mut head: String, value: SqlValue) {
        let position = self.next_placeholder();
        head.push('$');
        head.push_str(&position.to_string());
        self.fragments.push(head);
        self.params.push(value);
    }

    pub fn joiner(&self) -> Joiner {
        self.joiner
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Number of bound parameters.
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Index of the first placeholder a caller may append after this clause.
    ///
    /// For an update compiled from three fields this is `4`, so the statement
    /// continues with `WHERE handle = $4`.
    pub fn next_placeholder(&self) -> usize {
        self.params.len() + 1
    }

    /// Fragments joined by the clause's joiner.
    pub fn to_sql(&self) -> String {
        self.fragments.join(self.joiner.as_str())
    }

    /// The clause as a complete predicate: [`TRUE_PREDICATE`] followed by
    /// `AND <fragment>` for each fragment.
    pub fn predicate(&self) -> String {
        let mut out = String::from(TRUE_PREDICATE);
        for fragment in &self.fragments {
            out.push_str(" AND ");
            out.push_str(fragment);
        }
        out
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect()
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<SqlValue>) {
        (self.fragments, self.params)
    }
}
