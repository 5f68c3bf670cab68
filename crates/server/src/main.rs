use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use serde_json::Value;
use shared::{
    error::{ApiError, ApiException, DeleteConflictBody, ErrorCode},
    protocol::{ListQuery, ListResponse},
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod store;

use app_state::AppState;
use config::load_settings;
use store::{Row, Store};

const MAX_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let store = if settings.seed_demo_data {
        Store::seeded()
    } else {
        Store::new()
    };
    let app = build_router(Arc::new(AppState::new(store)));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, seeded = settings.seed_demo_data, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/:collection", get(list_records).post(create_record))
        .route(
            "/:collection/:id",
            patch(update_record).delete(delete_record),
        )
        .route("/:collection/:id/status", patch(update_status))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

/// Maps store failures onto the two rejection bodies clients understand.
struct HttpError(ApiException);

impl From<ApiException> for HttpError {
    fn from(err: ApiException) -> Self {
        Self(err)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self.0 {
            ApiException::Rejected { code, message } => {
                let status = match code {
                    ErrorCode::NotFound => StatusCode::NOT_FOUND,
                    ErrorCode::Validation => StatusCode::BAD_REQUEST,
                    ErrorCode::Conflict => StatusCode::CONFLICT,
                    ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
                };
                warn!(%status, %message, "request rejected");
                (status, Json(ApiError::new(code, message))).into_response()
            }
            ApiException::DeleteConflict { error, detail } => {
                warn!(%error, "delete blocked by dependents");
                (
                    StatusCode::CONFLICT,
                    Json(DeleteConflictBody {
                        error,
                        detalhes: detail,
                    }),
                )
                    .into_response()
            }
        }
    }
}

fn parse_id(raw: &str) -> Result<i64, HttpError> {
    raw.parse().map_err(|_| {
        HttpError(ApiException::new(
            ErrorCode::NotFound,
            format!("Registro não encontrado: {raw}"),
        ))
    })
}

fn object(body: Value) -> Result<Row, HttpError> {
    match body {
        Value::Object(row) => Ok(row),
        _ => Err(HttpError(ApiException::new(
            ErrorCode::Validation,
            "O corpo da requisição deve ser um objeto",
        ))),
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_records(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Row>>, HttpError> {
    Ok(Json(state.store().list(&collection, &query)?))
}

async fn create_record(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Row>), HttpError> {
    let created = state.store().create(&collection, object(body)?)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_record(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Row>, HttpError> {
    let id = parse_id(&id)?;
    Ok(Json(state.store().update(&collection, id, object(body)?)?))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Row>, HttpError> {
    let id = parse_id(&id)?;
    let body = object(body)?;
    Ok(Json(state.store().update_status(&collection, id, &body)?))
}

async fn delete_record(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<StatusCode, HttpError> {
    let id = parse_id(&id)?;
    state.store().delete(&collection, id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
