//! The request-handling core shared by both hosting adapters.

use std::any::Any;
use std::path::Path as FsPath;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::handler::HandlerWithoutStateExt;
use axum::http::header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, MethodRouter};
use axum::{Json, Router};
use shared::{CreateTaskRequest, MessageResponse, NewTask, Task, UpdateTaskRequest};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::error::ApiError;
use crate::store::TaskStore;

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str = "content-type";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TaskStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }
}

/// Builds the full application: task routes, CORS, tracing, panic capture,
/// and optionally the front-end bundle served from `static_dir`.
pub fn build_router(state: AppState, static_dir: Option<&FsPath>) -> Router {
    // A trailing slash names the same resource.
    let api = Router::new()
        .route("/api/tasks", collection_routes())
        .route("/api/tasks/", collection_routes())
        .route("/api/tasks/:id", item_routes())
        .route("/api/tasks/:id/", item_routes())
        .with_state(state);

    let app = match static_dir {
        Some(dir) => api.fallback_service(
            ServeDir::new(dir)
                .call_fallback_on_method_not_allowed(true)
                .not_found_service(route_not_found.into_service()),
        ),
        None => api.fallback(route_not_found),
    };

    app.layer(CatchPanicLayer::custom(panic_response))
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn collection_routes() -> MethodRouter<AppState> {
    get(list_tasks).post(create_task).fallback(route_not_found)
}

fn item_routes() -> MethodRouter<AppState> {
    get(get_task)
        .put(update_task)
        .delete(delete_task)
        .fallback(route_not_found)
}

/// Answers every `OPTIONS` request itself with an empty 200.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Internal server error".to_string()
    };
    ApiError::Internal(detail).into_response()
}

/// Ids that are not UUIDs cannot name a stored task.
fn parse_task_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state.store.list().await?;
    Ok(Json(tasks))
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_task_id(&id)?;
    state.store.get(id).await?.map(Json).ok_or(ApiError::NotFound)
}

async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(payload) = payload?;
    let new_task = NewTask::try_from(payload)?;

    let task = state.store.create(new_task).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_task_id(&id)?;
    let Json(payload) = payload?;
    let patch = payload.validate()?;

    state
        .store
        .update(id, patch)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_task_id(&id)?;
    if state.store.delete(id).await? {
        Ok(Json(MessageResponse::new("Task deleted successfully")))
    } else {
        Err(ApiError::NotFound)
    }
}
