//! HTTP service exposing pgbridge's request compilers over a Postgres pool.
//!
//! | route | body |
//! |---|---|
//! | `POST /execute` | [`pgbridge::ExecuteRequest`] |
//! | `POST /select` | [`pgbridge::SelectRequest`] |
//! | `POST /insert` | [`pgbridge::InsertRequest`] |
//! | `POST /update` | [`pgbridge::UpdateRequest`] |
//! | `POST /delete` | [`pgbridge::DeleteRequest`] |
//! | `POST /tables/create` | [`pgbridge::CreateTableRequest`] |
//! | `POST /tables/drop` | [`pgbridge::DropTableRequest`] |
//! | `GET /health` | none |

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/execute", post(handlers::execute))
        .route("/select", post(handlers::select))
        .route("/insert", post(handlers::insert))
        .route("/update", post(handlers::update))
        .route("/delete", post(handlers::delete))
        .route("/tables/create", post(handlers::create_table))
        .route("/tables/drop", post(handlers::drop_table))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
