use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::Identity;
use crate::dto::UploadRequestDto;
use crate::errors::ApiError;
use crate::integrations::storage::UploadTicket;
use crate::integrations::Integrations;

const MIB: u64 = 1024 * 1024;

/// Largest accepted image upload
pub const MAX_IMAGE_BYTES: u64 = 5 * MIB;

/// Largest accepted video upload
pub const MAX_VIDEO_BYTES: u64 = 100 * MIB;

const UPLOAD_KINDS: &[&str] = &["candidate-photo", "content-image", "content-video", "vendor-portfolio"];

const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

const VIDEO_TYPES: &[(&str, &str)] = &[("video/mp4", "mp4"), ("video/webm", "webm")];

/// Checks an upload against its kind's allowed types and size
///
/// ### Returns
///
/// The file extension to store the object under
pub fn check_upload(kind: &str, content_type: &str, size_bytes: u64) -> Result<&'static str, String> {
    if !UPLOAD_KINDS.contains(&kind) {
        return Err(format!("Unknown upload kind: {} (expected one of: {})", kind, UPLOAD_KINDS.join(", ")));
    }

    let content_type = content_type.trim().to_ascii_lowercase();
    let lookup = |types: &[(&str, &'static str)]| types.iter().find(|(t, _)| *t == content_type).map(|(_, ext)| *ext);

    let (extension, limit) = if let Some(ext) = lookup(IMAGE_TYPES) {
        (ext, MAX_IMAGE_BYTES)
    } else if let Some(ext) = lookup(VIDEO_TYPES) {
        if kind != "content-video" {
            return Err(format!("Video files are only accepted for content-video, not {}", kind));
        }
        (ext, MAX_VIDEO_BYTES)
    } else {
        return Err(format!("Unsupported content type: {}", content_type));
    };

    if size_bytes == 0 {
        return Err("size_bytes must be greater than zero".to_string());
    }
    if size_bytes > limit {
        return Err(format!("File is too large: {} bytes (limit {} MiB)", size_bytes, limit / MIB));
    }
    Ok(extension)
}

/// Handler for requesting an upload URL
///
/// This function handles POST requests to `/uploads`. The browser uploads
/// straight to storage with the returned URL.
///
/// ### Arguments
///
/// * `integrations` - The storage client
/// * `identity` - The uploader; part of the object path
/// * `payload` - Kind, content type and size of the file
///
/// ### Returns
///
/// The signed upload URL and where the file will be served from
///
/// ### Errors
///
/// - 400 for an unknown kind, a disallowed type or an oversized file
/// - 503 when storage isn't configured
#[instrument(skip(integrations, identity, payload), fields(user_id = %identity.user_id, kind = %payload.kind))]
pub async fn create_upload_handler(
    // Extract the integration clients from the application state
    State(integrations): State<Arc<Integrations>>,
    identity: Identity,
    // Extract and deserialize the JSON request body
    Json(payload): Json<UploadRequestDto>,
) -> Result<Json<UploadTicket>, ApiError> {
    let extension = check_upload(&payload.kind, &payload.content_type, payload.size_bytes).map_err(ApiError::BadRequest)?;
    let storage = integrations.storage()?;

    let pathname = format!("{}/{}/{}.{}", payload.kind, identity.user_id, Uuid::new_v4(), extension);
    let max_bytes = if extension == "mp4" || extension == "webm" { MAX_VIDEO_BYTES } else { MAX_IMAGE_BYTES };

    let ticket = storage
        .issue_upload_url(&pathname, &payload.content_type.trim().to_ascii_lowercase(), max_bytes)
        .await?;
    info!("Issued upload URL for {}", ticket.pathname);
    Ok(Json(ticket))
}
