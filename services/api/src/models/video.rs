//! Video models for the API service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Object-store key under which the bytes of video `id` owned by `user_id` live
pub fn storage_ref(user_id: Uuid, id: Uuid) -> String {
    format!("{}/{}", user_id, id)
}

/// Metadata row describing one uploaded (or pending) video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct VideoRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl VideoRecord {
    /// Derived storage key, `{user_id}/{id}`
    pub fn storage_ref(&self) -> String {
        storage_ref(self.user_id, self.id)
    }
}

/// Request for a new upload slot
#[derive(Debug, Clone, Deserialize)]
pub struct UploadUrlRequest {
    /// Display title; older recorder builds send it as `key`
    #[serde(alias = "key")]
    pub title: String,
}

/// Response carrying the new record id and its write capability
#[derive(Debug, Clone, Serialize)]
pub struct UploadUrlResponse {
    pub success: bool,
    pub id: Uuid,
    #[serde(rename = "signedUrl")]
    pub signed_url: String,
}

/// A video as returned to its owner, with a freshly signed read URL
#[derive(Debug, Clone, Serialize)]
pub struct VideoView {
    #[serde(flatten)]
    pub record: VideoRecord,
    pub video_url: String,
}

/// Response for a single video lookup
///
/// A denied lookup serializes as `{"success": false}` and nothing else.
#[derive(Debug, Clone, Serialize)]
pub struct VideoLookupResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoView>,
}

impl VideoLookupResponse {
    pub fn denied() -> Self {
        Self {
            success: false,
            video: None,
        }
    }

    pub fn granted(record: VideoRecord, video_url: String) -> Self {
        Self {
            success: true,
            video: Some(VideoView { record, video_url }),
        }
    }
}
