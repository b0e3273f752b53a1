//! The persistence server: a CRUD endpoint over a document store.
//!
//! Two mutually exclusive route shapes exist: the singleton scene document
//! under `/api/scene`, and a per-item collection under `/api/items`. They
//! are different resource shapes and share no handler code; a deployment
//! mounts exactly one, selected by [`StoreMode`].

pub mod store;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use log::{error, info};
use serde_json::{json, Value};

pub use store::{validate_item_id, ItemStore, SceneStore, StoreError};

/// Which persistence shape this deployment serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// One scene document in a fixed slot (the shape the viewer speaks).
    Scene,
    /// A collection of items with id-based delete.
    Items,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// File the scene slot is persisted to; in-memory only when unset.
    pub store_path: Option<PathBuf>,
    pub mode: StoreMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8081".to_string(),
            store_path: None,
            mode: StoreMode::Scene,
        }
    }
}

impl ServerConfig {
    /// Reads `ORRERY_LISTEN_ADDR`, `ORRERY_STORE_PATH` and
    /// `ORRERY_STORE_MODE` (`scene` | `items`) over the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var("ORRERY_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Ok(path) = std::env::var("ORRERY_STORE_PATH") {
            config.store_path = Some(PathBuf::from(path));
        }
        if let Ok(mode) = std::env::var("ORRERY_STORE_MODE") {
            if mode.eq_ignore_ascii_case("items") {
                config.mode = StoreMode::Items;
            }
        }
        config
    }
}

/// Error body shape shared by both route sets: `{"error": message}` with an
/// HTTP status, never a stack trace.
fn error_response(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn internal_error(context: &str, err: impl std::fmt::Display) -> axum::response::Response {
    error!("{context}: {err}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, context)
}

// --- singleton scene document ---

/// Routes for the singleton scene document shape.
pub fn scene_router(store: Arc<SceneStore>) -> Router {
    Router::new()
        .route(
            "/api/scene",
            get(get_scene).put(put_scene).delete(delete_scene),
        )
        .with_state(store)
}

/// GET returns the document-store list form: an array of zero or one scenes.
async fn get_scene(State(store): State<Arc<SceneStore>>) -> impl IntoResponse {
    let stored: Vec<Value> = store.get().into_iter().collect();
    Json(stored)
}

async fn put_scene(
    State(store): State<Arc<SceneStore>>,
    Json(document): Json<Value>,
) -> axum::response::Response {
    match store.replace(document) {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(err) => internal_error("failed to save the scene", err),
    }
}

async fn delete_scene(State(store): State<Arc<SceneStore>>) -> axum::response::Response {
    match store.delete() {
        Ok(_) => StatusCode::OK.into_response(),
        Err(err) => internal_error("failed to delete the saved scene", err),
    }
}

// --- per-item collection variant ---

/// Routes for the per-item collection shape.
pub fn items_router(store: Arc<ItemStore>) -> Router {
    Router::new()
        .route("/api/items", get(list_items).post(create_item))
        .route("/api/items/:id", delete(delete_item))
        .with_state(store)
}

async fn list_items(State(store): State<Arc<ItemStore>>) -> impl IntoResponse {
    Json(store.list())
}

async fn create_item(
    State(store): State<Arc<ItemStore>>,
    Json(item): Json<Value>,
) -> impl IntoResponse {
    let (_, stored) = store.insert(item);
    (StatusCode::CREATED, Json(stored))
}

/// Identifier validation happens before any store access; a malformed id is
/// rejected with 400 and a descriptive message.
async fn delete_item(
    State(store): State<Arc<ItemStore>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(message) = validate_item_id(&id) {
        return error_response(StatusCode::BAD_REQUEST, message);
    }
    if store.delete(&id) {
        StatusCode::OK.into_response()
    } else {
        error_response(StatusCode::NOT_FOUND, format!("no item with id {:?}", id))
    }
}

/// Builds the router for the configured mode and serves it until the process
/// exits.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let router = match config.mode {
        StoreMode::Scene => {
            let store = match &config.store_path {
                Some(path) => SceneStore::open(path.clone())?,
                None => SceneStore::in_memory(),
            };
            scene_router(Arc::new(store))
        }
        StoreMode::Items => items_router(Arc::new(ItemStore::new())),
    };

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    let addr: SocketAddr = listener.local_addr()?;
    info!("persistence server listening on http://{addr} ({:?} mode)", config.mode);

    axum::serve(listener, router).await?;
    Ok(())
}
