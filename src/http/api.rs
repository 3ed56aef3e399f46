//! HTTP handlers
//!
//! `/api/*` carries the admin surface for manual overrides. Every other
//! request goes through the route resolver via the fallback handler.

use axum::{
    extract::{Path, State},
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorCategory, SeqlinkErrorTrait};
use crate::models::{Category, CategoryId, Item, ItemId, SaveOutcome, SaveRequest};
use crate::permalink::primary_category_id;
use crate::routing::{RequestContext, RouteError, RouteOutcome};

use super::server::AppState;

// ============================================================================
// API Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Simple error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Manual-override view of an item
#[derive(Debug, Serialize, Deserialize)]
pub struct OverridesResponse {
    pub item_id: ItemId,
    pub item_type: String,
    pub categories: Vec<Category>,
    /// Override as stored, possibly stale
    pub stored_primary: Option<CategoryId>,
    /// Primary category actually in effect
    pub primary: Option<CategoryId>,
    pub sequence: Option<u64>,
    pub permalink: Option<String>,
}

/// Result of a save
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResponse {
    pub item_id: ItemId,
    /// False when the item type does not receive sequences
    pub target: bool,
    #[serde(flatten)]
    pub outcome: SaveOutcome,
}

/// Permalink of one item
#[derive(Debug, Serialize, Deserialize)]
pub struct PermalinkResponse {
    pub item_id: ItemId,
    pub permalink: Option<String>,
}

/// Deletion result
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub id: u64,
    pub deleted: bool,
}

/// One sequence holder
#[derive(Debug, Serialize, Deserialize)]
pub struct SequenceEntry {
    pub item_id: ItemId,
    pub sequence: u64,
}

/// Sequences held within one category
#[derive(Debug, Serialize, Deserialize)]
pub struct SequencesResponse {
    pub category: Category,
    pub sequences: Vec<SequenceEntry>,
}

// ============================================================================
// API Errors
// ============================================================================

/// Handler error rendered as [`ErrorResponse`]
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let category = err.category();
        let status = match category {
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::Storage if err.is_recoverable() => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %err, category = category.as_str(), "Request failed");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}

/// Run a repository-bound closure off the async runtime
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(ApiError::from)
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the router: admin API plus the resolver fallback
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/api/health", get(health_check))
        // Item endpoints
        .route("/api/items/{id}", axum::routing::delete(delete_item))
        .route("/api/items/{id}/overrides", get(get_overrides))
        .route("/api/items/{id}/save", post(save_item))
        .route("/api/items/{id}/permalink", get(get_permalink))
        // Category endpoints
        .route("/api/categories/{id}", axum::routing::delete(delete_category))
        .route("/api/categories/{id}/sequences", get(get_category_sequences))
        // Everything else is a content request
        .fallback(resolve_request)
        .with_state(state)
}

// ============================================================================
// Health Handlers
// ============================================================================

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed().as_secs();

    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: uptime,
    }))
}

// ============================================================================
// Item Handlers
// ============================================================================

/// Categories, primary and sequence of an item
async fn get_overrides(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<OverridesResponse>>, ApiError> {
    let id = ItemId(id);
    let view = blocking(move || {
        let Some(item) = state.repo.get_item(id)? else {
            return Ok(None);
        };
        Ok(Some(overrides_view(&state, item)?))
    })
    .await?;

    match view {
        Some(view) => Ok(Json(ApiResponse::success(view))),
        None => Err(ApiError::not_found(format!("Item not found: {id}"))),
    }
}

fn overrides_view(state: &AppState, item: Item) -> crate::error::Result<OverridesResponse> {
    let key = &state.config.permalink.primary_meta_key;
    let primary = primary_category_id(&item, key);

    let mut categories = Vec::with_capacity(item.categories.len());
    for id in &item.categories {
        if let Some(category) = state.repo.get_category(*id)? {
            categories.push(category);
        }
    }

    let sequence = primary.and_then(|c| item.meta_u64(&state.permalinks.keys().key_for(c)));
    let permalink = state.permalinks.build(&item)?.map(|url| url.to_string());

    Ok(OverridesResponse {
        item_id: item.id,
        stored_primary: item.meta_u64(key).map(CategoryId),
        item_type: item.item_type,
        categories,
        primary,
        sequence,
        permalink,
    })
}

/// Apply manual overrides and run the save handler
async fn save_item(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<ApiResponse<SaveResponse>>, ApiError> {
    let item_id = ItemId(id);
    let outcome = blocking(move || state.lifecycle.on_item_saved(item_id, &request)).await?;

    Ok(Json(ApiResponse::success(SaveResponse {
        item_id,
        target: outcome.is_some(),
        outcome: outcome.unwrap_or_default(),
    })))
}

/// Canonical URL of an item
async fn get_permalink(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<PermalinkResponse>>, ApiError> {
    let item_id = ItemId(id);
    let found = blocking(move || {
        let Some(item) = state.repo.get_item(item_id)? else {
            return Ok(None);
        };
        Ok(Some(state.permalinks.build(&item)?.map(|url| url.to_string())))
    })
    .await?;

    match found {
        Some(permalink) => Ok(Json(ApiResponse::success(PermalinkResponse {
            item_id,
            permalink,
        }))),
        None => Err(ApiError::not_found(format!("Item not found: {item_id}"))),
    }
}

/// Delete an item and release its sequences
async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ApiError> {
    let deleted = blocking(move || state.lifecycle.delete_item(ItemId(id))).await?;
    if !deleted {
        return Err(ApiError::not_found(format!("Item not found: {id}")));
    }
    Ok(Json(ApiResponse::success(DeleteResponse { id, deleted })))
}

// ============================================================================
// Category Handlers
// ============================================================================

/// Delete a category and release every sequence scoped to it
async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ApiError> {
    let deleted = blocking(move || state.lifecycle.delete_category(CategoryId(id))).await?;
    if !deleted {
        return Err(ApiError::not_found(format!("Category not found: {id}")));
    }
    Ok(Json(ApiResponse::success(DeleteResponse { id, deleted })))
}

/// Sequences held by items attached to a category, highest first
async fn get_category_sequences(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<SequencesResponse>>, ApiError> {
    let category_id = CategoryId(id);
    let found = blocking(move || {
        let Some(category) = state.repo.get_category(category_id)? else {
            return Ok(None);
        };
        let key = state.permalinks.keys().key_for(category_id);
        let sequences = state
            .repo
            .get_items_by_category_with_meta_key(category_id, &key)?
            .into_iter()
            .map(|(item_id, sequence)| SequenceEntry { item_id, sequence })
            .collect();
        Ok(Some(SequencesResponse {
            category,
            sequences,
        }))
    })
    .await?;

    match found {
        Some(view) => Ok(Json(ApiResponse::success(view))),
        None => Err(ApiError::not_found(format!("Category not found: {id}"))),
    }
}

// ============================================================================
// Content Resolution
// ============================================================================

/// Fallback: resolve any other GET/HEAD through the route resolver
async fn resolve_request(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(ErrorResponse::new(format!("Method not allowed: {method}"))),
        )
            .into_response();
    }

    let ctx = RequestContext::from_parts(uri.path(), uri.query(), state.base_path());
    let resolver = state.resolver.clone();

    match blocking(move || resolver.resolve(&ctx)).await {
        Ok(outcome) => outcome_response(outcome),
        Err(err) => err.into_response(),
    }
}

/// HTTP response for a routing outcome
pub fn outcome_response(outcome: RouteOutcome) -> Response {
    match outcome {
        RouteOutcome::Serve(item) => (StatusCode::OK, Json(ApiResponse::success(item))).into_response(),
        RouteOutcome::Terminal(RouteError::RetiredPath { message, .. }) => gone_page(&message),
        RouteOutcome::Terminal(err) => match err.location() {
            Some(location) => (
                StatusCode::MOVED_PERMANENTLY,
                [(header::LOCATION, location.to_string())],
            )
                .into_response(),
            None => (err.status(), Json(ErrorResponse::new(err.to_string()))).into_response(),
        },
        RouteOutcome::PassThrough => {
            (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found"))).into_response()
        }
    }
}

/// 410 page with the retirement message
pub fn gone_page(message: &str) -> Response {
    let body = format!(
        "<!DOCTYPE html><html><head><title>410 Gone</title></head><body><h1>410 Gone</h1><p>{}</p></body></html>",
        html_escape::encode_text(message)
    );
    (
        StatusCode::GONE,
        [(header::CONTENT_TYPE, "text/html; charset=UTF-8")],
        body,
    )
        .into_response()
}
