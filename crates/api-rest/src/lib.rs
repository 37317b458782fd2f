//! # API REST
//!
//! Flat-file HTTP service for the knowledge base.
//!
//! Handles:
//! - Reading, replacing, and appending to the stored `bot.json` collection
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status codes, CORS)
//!
//! Uses `api-shared` for wire types and route paths, `kb-core` for solution validation, and
//! `kb_files` for the file itself.

#![warn(rust_2018_idioms)]

use api_shared::{paths, ErrorRes, HealthRes, HealthService, SaveRes};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use kb_core::{load_base_collection, Action, ServerConfig, Solution};
use kb_files::JsonArrayFile;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared by all handlers.
///
/// The lock serialises every access to the file, so an append never interleaves with a replace.
#[derive(Clone)]
pub struct AppState {
    file: Arc<JsonArrayFile>,
    lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(file: JsonArrayFile) -> Self {
        Self {
            file: Arc::new(file),
            lock: Arc::new(Mutex::new(())),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, read_bot, replace_bot, add_bot),
    components(schemas(HealthRes, SaveRes, ErrorRes, Solution, Action))
)]
struct ApiDoc;

type ApiError = (StatusCode, Json<ErrorRes>);

fn api_error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(ErrorRes::new(message)))
}

/// Builds the service router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(paths::HEALTH, get(health))
        .route(paths::BOT, get(read_bot).post(replace_bot))
        .route(paths::BOT_ADD, post(add_bot))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Opens the collection file, seeding it with the shipped base collection if it is absent.
///
/// # Errors
///
/// Returns an error if the path is a directory, the file cannot be created, or the base
/// collection cannot be loaded.
pub fn prepare_bot_file(path: &Path) -> anyhow::Result<JsonArrayFile> {
    let file = JsonArrayFile::new(path);
    if file.ensure_exists()? {
        let base = load_base_collection(None)?;
        let count = file.replace_all(&base)?;
        tracing::info!("seeded {} with {} base solutions", path.display(), count);
    }
    Ok(file)
}

/// Runs the service until the listener fails.
///
/// # Errors
///
/// Returns an error if the collection file cannot be prepared, the address cannot be bound,
/// or the HTTP server fails while running.
pub async fn serve(cfg: &ServerConfig) -> anyhow::Result<()> {
    let file = prepare_bot_file(cfg.bot_file())?;
    tracing::info!("bot.json file location: {}", file.path().display());

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr()).await?;
    tracing::info!("-- Starting knowledge base API on {}", listener.local_addr()?);

    axum::serve(listener, router(AppState::new(file))).await?;
    Ok(())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Liveness probe.
#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/api/bot",
    responses(
        (status = 200, description = "Stored collection", body = [Solution]),
        (status = 500, description = "File could not be read", body = ErrorRes)
    )
)]
/// Returns the stored collection as written, without re-validating entries.
#[axum::debug_handler]
async fn read_bot(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    let _guard = state.lock.lock().await;
    state.file.read_all::<Value>().map(Json).map_err(|e| {
        tracing::error!("Error reading bot.json: {}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read bot.json")
    })
}

#[utoipa::path(
    post,
    path = "/api/bot",
    request_body = [Solution],
    responses(
        (status = 200, description = "Collection replaced", body = SaveRes),
        (status = 400, description = "Body is not an array of valid solutions", body = ErrorRes),
        (status = 500, description = "File could not be written", body = ErrorRes)
    )
)]
/// Replaces the stored collection.
///
/// Every element must be a valid solution; one invalid element rejects the whole request and
/// leaves the file untouched.
#[axum::debug_handler]
async fn replace_bot(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<SaveRes>, ApiError> {
    let Value::Array(items) = body else {
        return Err(api_error(StatusCode::BAD_REQUEST, "Data must be an array"));
    };

    let solutions = items
        .into_iter()
        .map(serde_json::from_value::<Solution>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            tracing::warn!("rejected collection: {}", e);
            api_error(StatusCode::BAD_REQUEST, "Invalid solution structure")
        })?;

    let _guard = state.lock.lock().await;
    let count = state.file.replace_all(&solutions).map_err(|e| {
        tracing::error!("Error writing bot.json: {}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to write bot.json")
    })?;

    tracing::info!("replaced collection with {} solutions", count);
    Ok(Json(SaveRes::ok("bot.json updated successfully", count)))
}

#[utoipa::path(
    post,
    path = "/api/bot/add",
    request_body = Solution,
    responses(
        (status = 200, description = "Solution appended", body = SaveRes),
        (status = 400, description = "Body is not a valid solution", body = ErrorRes),
        (status = 500, description = "File could not be updated", body = ErrorRes)
    )
)]
/// Appends one solution to the stored collection.
#[axum::debug_handler]
async fn add_bot(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<SaveRes>, ApiError> {
    let solution = serde_json::from_value::<Solution>(body).map_err(|e| {
        tracing::warn!("rejected solution: {}", e);
        api_error(StatusCode::BAD_REQUEST, "Invalid solution structure")
    })?;

    let _guard = state.lock.lock().await;
    let count = state.file.append(&solution).map_err(|e| {
        tracing::error!("Error adding solution: {}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to add solution")
    })?;

    tracing::info!("appended {:?}, {} solutions stored", solution.title.as_str(), count);
    Ok(Json(SaveRes::ok("Solution added successfully", count)))
}
