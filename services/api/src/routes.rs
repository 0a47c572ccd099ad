//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    middleware,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::error;
use uuid::Uuid;

use crate::{
    access::ReadCapability,
    error::{ApiError, ApiResult},
    middleware::{AuthUser, auth_middleware},
    models::video::{UploadUrlRequest, UploadUrlResponse, VideoLookupResponse},
    state::AppState,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/videos", get(list_videos).post(create_upload_url))
        .route("/videos/:video_id", get(get_video))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "video-service"
    }))
}

/// List the caller's videos (metadata only)
pub async fn list_videos(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let videos = state
        .mediator
        .list_for_identity(user.id)
        .await
        .map_err(|e| {
            error!("Failed to list videos: {}", e);
            ApiError::from(e)
        })?;

    Ok(Json(videos))
}

/// Fetch one video with a signed read URL, or `{"success": false}`
pub async fn get_video(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(video_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    // An id that cannot name any record is answered like a foreign one
    let Ok(video_id) = Uuid::parse_str(&video_id) else {
        return Ok(Json(VideoLookupResponse::denied()));
    };

    let capability = state
        .mediator
        .issue_read_capability(user.id, video_id)
        .await
        .map_err(|e| {
            error!("Failed to issue read capability: {}", e);
            ApiError::from(e)
        })?;

    let response = match capability {
        ReadCapability::Denied => VideoLookupResponse::denied(),
        ReadCapability::Granted {
            record,
            capability_url,
        } => VideoLookupResponse::granted(record, capability_url),
    };

    Ok(Json(response))
}

/// Reserve a video record and return a signed upload URL for it
pub async fn create_upload_url(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UploadUrlRequest>,
) -> ApiResult<impl IntoResponse> {
    let slot = state
        .mediator
        .issue_upload_capability(user.id, &payload.title)
        .await
        .map_err(|e| {
            error!("Failed to issue upload capability: {}", e);
            ApiError::from(e)
        })?;

    Ok(Json(UploadUrlResponse {
        success: true,
        id: slot.record_id,
        signed_url: slot.capability_url,
    }))
}
