//! Placeholder-safe SQL fragments.
//!
//! The compilers never format values into SQL text. They produce [`Sql`] fragments that
//! keep raw text and bound [`Value`]s side by side, and `$1, $2, ...` placeholders are only
//! numbered when the final statement is rendered. That way a filter compiled on its own
//! can be appended after the `SET` list of an `UPDATE` and still line up with its params.
//!
//! # Example
//!
//! ```ignore
//! use pgbridge::Sql;
//!
//! let mut q = Sql::new("SELECT * FROM users WHERE status = ");
//! q.push_bind("active").push(" AND age > ").push_bind(18);
//! assert_eq!(q.to_sql(), "SELECT * FROM users WHERE status = $1 AND age > $2");
//! ```

use crate::client::GenericClient;
use crate::error::BridgeResult;
use crate::ident::Ident;
use crate::row::{JsonRow, rows_to_json};
use crate::value::Value;
use std::fmt::Write;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

#[derive(Debug, Clone, PartialEq)]
enum SqlPart {
    Raw(String),
    Param,
}

/// A SQL fragment with its bound parameters.
///
/// For fragments built with [`Sql::push_bind`], the i-th placeholder always corresponds
/// to `params[i]`. [`Sql::bind`] is the escape hatch for hand-written `$n` text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sql {
    parts: Vec<SqlPart>,
    params: Vec<Value>,
}

impl Sql {
    /// Create a new fragment with initial SQL text.
    pub fn new(initial_sql: impl Into<String>) -> Self {
        let mut sql = Self::empty();
        sql.push(&initial_sql.into());
        sql
    }

    /// Create an empty fragment.
    pub fn empty() -> Self {
        Self {
            parts: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Whether the fragment renders to an empty string.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }

        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
        self
    }

    /// Append a parameter placeholder and bind its value.
    pub fn push_bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.parts.push(SqlPart::Param);
        self.params.push(value.into());
        self
    }

    /// Chainable bind for SQL text that already contains `$1, $2, ...`.
    ///
    /// Only the value is stored; no placeholder is added.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Append a double-quoted identifier.
    pub fn push_quoted(&mut self, ident: &Ident) -> &mut Self {
        let mut quoted = String::with_capacity(ident.as_str().len() + 2);
        ident.write_quoted(&mut quoted);
        self.push(&quoted)
    }

    /// Append another fragment, consuming it.
    pub fn push_sql(&mut self, mut other: Sql) -> &mut Self {
        for part in other.parts.drain(..) {
            match part {
                SqlPart::Raw(s) => {
                    self.push(&s);
                }
                SqlPart::Param => self.parts.push(SqlPart::Param),
            }
        }
        self.params.append(&mut other.params);
        self
    }

    /// Join fragments with `sep`, skipping empty ones.
    pub fn join(fragments: impl IntoIterator<Item = Sql>, sep: &str) -> Sql {
        let mut out = Sql::empty();
        for fragment in fragments {
            if fragment.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(sep);
            }
            out.push_sql(fragment);
        }
        out
    }

    /// Render SQL with `$1, $2, ...` placeholders.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        let mut idx: usize = 0;

        for part in &self.parts {
            match part {
                SqlPart::Raw(s) => out.push_str(s),
                SqlPart::Param => {
                    idx += 1;
                    let _ = write!(&mut out, "${}", idx);
                }
            }
        }
        out
    }

    /// Bound values in placeholder order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_params(self) -> Vec<Value> {
        self.params
    }

    /// Number of placeholders in the rendered SQL.
    pub fn placeholder_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, SqlPart::Param))
            .count()
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect()
    }

    fn trace(&self, sql: &str) {
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "pgbridge.sql", sql, params = self.params.len(), "executing");
        #[cfg(not(feature = "tracing"))]
        let _ = sql;
    }

    /// Execute the statement and return all rows.
    pub async fn fetch_all(&self, conn: &impl GenericClient) -> BridgeResult<Vec<Row>> {
        let sql = self.to_sql();
        self.trace(&sql);
        let params = self.params_ref();
        conn.query(&sql, &params).await
    }

    /// Execute the statement and decode every returned row into a JSON object.
    pub async fn fetch_json(&self, conn: &impl GenericClient) -> BridgeResult<Vec<JsonRow>> {
        rows_to_json(&self.fetch_all(conn).await?)
    }

    /// Execute the statement and return the affected row count.
    pub async fn execute(&self, conn: &impl GenericClient) -> BridgeResult<u64> {
        let sql = self.to_sql();
        self.trace(&sql);
        let params = self.params_ref();
        conn.execute(&sql, &params).await
    }
}
