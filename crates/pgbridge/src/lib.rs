//! # pgbridge
//!
//! Parameterized CRUD against Postgres from JSON documents instead of raw SQL.
//!
//! ## Features
//!
//! - **Filter DSL**: nested `$and` / `$or` groups, `$gt` / `$gte` / `$lt` / `$lte` / `$eq`
//!   comparisons and implicit equality, compiled to bound `$n` placeholders
//! - **Multi-row inserts**: one or many row objects in a single `INSERT ... VALUES`
//! - **Safe identifiers**: every table and column name that reaches SQL text is validated
//! - **Stateless compilers**: no shared state, safe to call from any number of tasks
//!
//! ## Example
//!
//! ```ignore
//! use pgbridge::SelectRequest;
//! use serde_json::json;
//!
//! let req: SelectRequest = serde_json::from_value(json!({
//!     "table": "users",
//!     "columns": ["id", "name"],
//!     "where": {"age": {"$gte": 18}, "status": "active"}
//! }))?;
//!
//! let sql = req.build()?;
//! assert_eq!(
//!     sql.to_sql(),
//!     r#"SELECT "id","name" FROM users WHERE ("age" >= $1 AND status = $2)"#
//! );
//!
//! let rows = req.run(&client).await?;
//! ```

pub mod client;
pub mod error;
pub mod filter;
pub mod ident;
pub mod insert;
pub mod request;
pub mod row;
pub mod sql;
pub mod update;
pub mod value;

pub use client::GenericClient;
pub use error::{BridgeError, BridgeResult};
pub use filter::CompareOp;
pub use ident::{Ident, TableName, is_valid_identifier};
pub use insert::CompiledInsert;
pub use request::{
    CreateTableRequest, DeleteRequest, DropTableRequest, ExecuteRequest, InsertRequest,
    InsertStatement, Inserted, SelectRequest, UpdateRequest,
};
pub use row::{JsonRow, row_to_json, rows_to_json};
pub use sql::Sql;
pub use value::Value;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_builder, create_pool_with_config};

#[cfg(feature = "pool")]
pub use deadpool_postgres::Pool;
