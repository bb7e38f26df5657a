//! Route handlers.
//!
//! Every handler compiles its statement before checking out a connection, so a bad
//! request never waits on the pool.

use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State};
use pgbridge::{
    CreateTableRequest, DeleteRequest, DropTableRequest, ExecuteRequest, InsertRequest, JsonRow,
    SelectRequest, Sql, UpdateRequest,
};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

fn parse<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::Body(e.to_string()))
}

/// Check out a connection for an already compiled statement and return its rows.
async fn fetch(state: &AppState, sql: &Sql) -> ApiResult<Vec<JsonRow>> {
    let client = state.pool.get().await?;
    Ok(Json(sql.fetch_json(&client).await?))
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn execute(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<Vec<JsonRow>> {
    let req: ExecuteRequest = parse(&body)?;
    fetch(&state, &req.build()?).await
}

pub async fn select(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<Vec<JsonRow>> {
    let req: SelectRequest = parse(&body)?;
    fetch(&state, &req.build()?).await
}

pub async fn insert(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<serde_json::Value> {
    let req: InsertRequest = parse(&body)?;
    let stmt = req.build()?;
    let Json(rows) = fetch(&state, &stmt.sql).await?;
    Ok(Json(stmt.shape(rows).into_json()))
}

pub async fn update(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<Vec<JsonRow>> {
    let req: UpdateRequest = parse(&body)?;
    fetch(&state, &req.build()?).await
}

pub async fn delete(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<Vec<JsonRow>> {
    let req: DeleteRequest = parse(&body)?;
    fetch(&state, &req.build()?).await
}

pub async fn create_table(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<serde_json::Value> {
    let req: CreateTableRequest = parse(&body)?;
    let sql = req.build()?;
    let client = state.pool.get().await?;
    sql.execute(&client).await?;
    tracing::info!(table = %req.table, "table created");
    Ok(Json(json!({})))
}

pub async fn drop_table(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<serde_json::Value> {
    let req: DropTableRequest = parse(&body)?;
    let sql = req.build()?;
    let client = state.pool.get().await?;
    sql.execute(&client).await?;
    tracing::info!(table = %req.table, "table dropped");
    Ok(Json(json!([])))
}
