//! Request documents and the statements they compile to.
//!
//! Each request type mirrors one JSON body accepted by the HTTP service. `build()` is
//! pure and returns the full statement; `run()` executes it and decodes the result rows.
//!
//! | request | statement |
//! |---|---|
//! | [`SelectRequest`] | `SELECT "a","b" FROM t WHERE (...)` |
//! | [`InsertRequest`] | `INSERT INTO t ("a","b") VALUES ($1,$2),... RETURNING *` |
//! | [`UpdateRequest`] | `UPDATE t SET "a" = $1 WHERE (...) RETURNING *` |
//! | [`DeleteRequest`] | `DELETE FROM t WHERE (...) RETURNING *` |
//! | [`CreateTableRequest`] | `CREATE TABLE t (a int,b text)` |
//! | [`DropTableRequest`] | `DROP TABLE t` |
//! | [`ExecuteRequest`] | caller-supplied SQL with positional binds |
//!
//! Table names are validated with [`TableName::parse`]; a filter that compiles to nothing
//! leaves out the `WHERE` clause entirely.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::client::GenericClient;
use crate::error::{BridgeError, BridgeResult};
use crate::filter;
use crate::ident::{Ident, TableName};
use crate::insert;
use crate::row::JsonRow;
use crate::sql::Sql;
use crate::update;
use crate::value::Value;


fn push_where(sql: &mut Sql, filter: Option<&serde_json::Value>) -> BridgeResult<()> {
    let compiled = filter::build_query(filter)?;
    if !compiled.is_empty() {
        sql.push(" WHERE (");
        sql.push_sql(compiled);
        sql.push(")");
    }
    Ok(())
}

/// `POST /select`
#[derive(Debug, Clone, Deserialize)]
pub struct SelectRequest {
    pub table: String,
    #[serde(rename = "where", default)]
    pub filter: Option<serde_json::Value>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

impl SelectRequest {
    pub fn build(&self) -> BridgeResult<Sql> {
        let table = TableName::parse(&self.table)?;

        let columns = match &self.columns {
            None => "*".to_string(),
            Some(cols) if cols.is_empty() => {
                return Err(BridgeError::invalid_input("columns must not be empty"));
            }
            Some(cols) => cols
                .iter()
                .map(|c| Ident::parse(c).map(|i| i.quoted()))
                .collect::<BridgeResult<Vec<_>>>()?
                .join(","),
        };

        let mut sql = Sql::new(format!("SELECT {columns} FROM {table}"));
        push_where(&mut sql, self.filter.as_ref())?;
        Ok(sql)
    }

    pub async fn run(&self, conn: &impl GenericClient) -> BridgeResult<Vec<JsonRow>> {
        self.build()?.fetch_json(conn).await
    }
}

/// `POST /insert`
#[derive(Debug, Clone, Deserialize)]
pub struct InsertRequest {
    pub table: String,
    pub values: serde_json::Value,
}

/// A compiled insert plus whether the caller sent a single row.
#[derive(Debug, Clone)]
pub struct InsertStatement {
    pub sql: Sql,
    pub single: bool,
}

impl InsertStatement {
    /// Wrap the returned rows to match the shape of the input `values`.
    pub fn shape(&self, rows: Vec<JsonRow>) -> Inserted {
        if self.single {
            Inserted::One(rows.into_iter().next())
        } else {
            Inserted::Many(rows)
        }
    }
}

/// Rows returned by an insert, shaped like the input.
#[derive(Debug, Clone, PartialEq)]
pub enum Inserted {
    One(Option<JsonRow>),
    Many(Vec<JsonRow>),
}

impl Inserted {
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Inserted::One(Some(row)) => serde_json::Value::Object(row),
            Inserted::One(None) => serde_json::Value::Null,
            Inserted::Many(rows) => {
                serde_json::Value::Array(rows.into_iter().map(serde_json::Value::Object).collect())
            }
        }
    }
}

impl InsertRequest {
    pub fn build(&self) -> BridgeResult<InsertStatement> {
        let table = TableName::parse(&self.table)?;
        let compiled = insert::compile(&self.values)?;
        let single = compiled.is_single();

        let mut sql = Sql::new(format!(
            "INSERT INTO {table} ({}) VALUES ",
            compiled.column_names()
        ));
        sql.push_sql(compiled.into_values_clause());
        sql.push(" RETURNING *");

        Ok(InsertStatement { sql, single })
    }

    pub async fn run(&self, conn: &impl GenericClient) -> BridgeResult<Inserted> {
        let stmt = self.build()?;
        let rows = stmt.sql.fetch_json(conn).await?;
        Ok(stmt.shape(rows))
    }
}

/// `POST /update`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRequest {
    pub table: String,
    pub values: serde_json::Value,
    #[serde(rename = "where", default)]
    pub filter: Option<serde_json::Value>,
}

impl UpdateRequest {
    pub fn build(&self) -> BridgeResult<Sql> {
        let table = TableName::parse(&self.table)?;

        let mut sql = Sql::new(format!("UPDATE {table} SET "));
        sql.push_sql(update::compile_assignments(&self.values)?);
        push_where(&mut sql, self.filter.as_ref())?;
        sql.push(" RETURNING *");
        Ok(sql)
    }

    pub async fn run(&self, conn: &impl GenericClient) -> BridgeResult<Vec<JsonRow>> {
        self.build()?.fetch_json(conn).await
    }
}

/// `POST /delete`
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteRequest {
    pub table: String,
    #[serde(rename = "where", default)]
    pub filter: Option<serde_json::Value>,
}

impl DeleteRequest {
    pub fn build(&self) -> BridgeResult<Sql> {
        let table = TableName::parse(&self.table)?;

        let mut sql = Sql::new(format!("DELETE FROM {table}"));
        push_where(&mut sql, self.filter.as_ref())?;
        sql.push(" RETURNING *");
        Ok(sql)
    }

    pub async fn run(&self, conn: &impl GenericClient) -> BridgeResult<Vec<JsonRow>> {
        self.build()?.fetch_json(conn).await
    }
}

/// `POST /tables/create`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTableRequest {
    pub table: String,
    /// Column name to type declaration, e.g. `"id": "serial primary key"`.
    pub columns: BTreeMap<String, String>,
}

fn is_valid_type_decl(decl: &str) -> bool {
    !decl.trim().is_empty()
        && decl.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '(' | ')' | ',' | '[' | ']')
        })
}

impl CreateTableRequest {
    pub fn build(&self) -> BridgeResult<Sql> {
        let table = TableName::parse(&self.table)?;
        if self.columns.is_empty() {
            return Err(BridgeError::invalid_input("columns must not be empty"));
        }

        let mut defs = Vec::with_capacity(self.columns.len());
        for (name, decl) in &self.columns {
            let column = Ident::parse(name)?;
            if !is_valid_type_decl(decl) {
                return Err(BridgeError::invalid_input(format!(
                    "invalid type declaration for column '{column}': '{decl}'"
                )));
            }
            defs.push(format!("{column} {}", decl.trim()));
        }

        Ok(Sql::new(format!("CREATE TABLE {table} ({})", defs.join(","))))
    }

    pub async fn run(&self, conn: &impl GenericClient) -> BridgeResult<()> {
        self.build()?.execute(conn).await?;
        Ok(())
    }
}

/// `POST /tables/drop`
#[derive(Debug, Clone, Deserialize)]
pub struct DropTableRequest {
    pub table: String,
}

impl DropTableRequest {
    pub fn build(&self) -> BridgeResult<Sql> {
        let table = TableName::parse(&self.table)?;
        Ok(Sql::new(format!("DROP TABLE {table}")))
    }

    pub async fn run(&self, conn: &impl GenericClient) -> BridgeResult<()> {
        self.build()?.execute(conn).await?;
        Ok(())
    }
}

/// `POST /execute`: raw SQL with `$1, $2, ...` placeholders and positional `data`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteRequest {
    pub query: String,
    #[serde(default)]
    pub data: Vec<Value>,
}

impl ExecuteRequest {
    pub fn build(&self) -> BridgeResult<Sql> {
        if self.query.trim().is_empty() {
            return Err(BridgeError::invalid_input("query must not be empty"));
        }
        Ok(self
            .data
            .iter()
            .cloned()
            .fold(Sql::new(self.query.clone()), Sql::bind))
    }

    pub async fn run(&self, conn: &impl GenericClient) -> BridgeResult<Vec<JsonRow>> {
        self.build()?.fetch_json(conn).await
    }
}
