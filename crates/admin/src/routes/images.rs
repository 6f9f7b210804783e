//! Image library.
//!
//! Uploads are stored inline as base64 data URLs, so an image can be pasted
//! straight into a product's image URL without any file hosting.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State, multipart::Field},
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::Utc;
use thiserror::Error;
use tracing::instrument;

use gamestore_core::ImageId;
use gamestore_core::purchase::random_base36;
use gamestore_store::db::ImageRepository;
use gamestore_store::models::NewImage;

use super::{Flash, FlashQuery, flash_repository_error, page, redirect_with};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;
use crate::views::{AdminLayout, ImageRow, human_size};

const IMAGES_PATH: &str = "/images";
const NAME_SUFFIX_LEN: usize = 9;

/// Image library template.
#[derive(Template, WebTemplate)]
#[template(path = "images.html")]
pub struct ImagesTemplate {
    pub layout: AdminLayout,
    pub images: Vec<ImageRow>,
    pub max_upload: String,
}

/// Reasons an upload is turned away before it reaches the database.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("Choose an image to upload")]
    MissingFile,
    #[error("Only image files can be uploaded")]
    NotAnImage,
    #[error("Image is larger than {0}")]
    TooLarge(String),
    #[error("The upload could not be read")]
    Unreadable,
}

/// Multipart fields collected from the upload form.
#[derive(Debug, Default)]
struct UploadParts {
    file: Option<(String, String, Vec<u8>)>,
    original_width: Option<i32>,
    original_height: Option<i32>,
    width: Option<i32>,
    height: Option<i32>,
}

/// Image library page handler.
#[instrument(skip(state, admin, flash))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(flash): Query<FlashQuery>,
) -> Result<ImagesTemplate> {
    let (_, layout) = page(&state, Some(&admin), "images", flash).await?;
    let images = ImageRepository::new(state.pool()).list().await?;

    Ok(ImagesTemplate {
        layout,
        images: images.iter().map(ImageRow::from).collect(),
        max_upload: human_size(state.config().max_upload_bytes),
    })
}

/// Accept a multipart upload with a `file` part and optional
/// `original_width`, `original_height`, `width` and `height` parts.
#[instrument(skip(state, admin, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    multipart: Multipart,
) -> Result<Response> {
    let max_bytes = state.config().max_upload_bytes;

    let parts = match read_parts(multipart).await {
        Ok(parts) => parts,
        Err(e) => return Ok(upload_error(&e)),
    };
    let Some((original_name, mime_type, bytes)) = parts.file else {
        return Ok(upload_error(&UploadError::MissingFile));
    };
    if let Err(e) = validate_upload(&mime_type, bytes.len(), max_bytes) {
        return Ok(upload_error(&e));
    }

    let image = NewImage {
        name: storage_name(Utc::now().timestamp_millis(), &random_suffix(), &original_name),
        data_url: data_url(&mime_type, &bytes),
        original_name,
        original_width: parts.original_width,
        original_height: parts.original_height,
        resized_width: parts.width,
        resized_height: parts.height,
        file_size: i32::try_from(bytes.len()).unwrap_or(i32::MAX),
        mime_type,
        created_by: admin.id,
    };

    let stored = ImageRepository::new(state.pool()).create(&image).await?;
    tracing::info!(
        admin_id = %admin.id,
        image_id = %stored.id,
        size = stored.file_size,
        "Image uploaded"
    );

    Ok(redirect_with(
        IMAGES_PATH,
        Flash::Success,
        &format!("Uploaded {}", stored.original_name),
    )
    .into_response())
}

/// Delete an image. Products already using its data URL keep their copy.
#[instrument(skip(state, admin))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    match ImageRepository::new(state.pool())
        .delete(ImageId::new(id))
        .await
    {
        Ok(()) => {
            tracing::info!(admin_id = %admin.id, image_id = id, "Image deleted");
            Ok(redirect_with(IMAGES_PATH, Flash::Success, "Image deleted").into_response())
        }
        Err(e) => flash_repository_error(IMAGES_PATH, e),
    }
}

async fn read_parts(mut multipart: Multipart) -> std::result::Result<UploadParts, UploadError> {
    let mut parts = UploadParts::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| UploadError::Unreadable)?
    {
        match field.name() {
            Some("file") => {
                let original_name = field.file_name().unwrap_or("image").to_owned();
                let mime_type = field.content_type().unwrap_or_default().to_owned();
                let bytes = field.bytes().await.map_err(|_| UploadError::Unreadable)?;
                // Browsers send an empty part when no file was chosen
                if !bytes.is_empty() {
                    parts.file = Some((original_name, mime_type, bytes.to_vec()));
                }
            }
            Some("original_width") => parts.original_width = dimension(field).await?,
            Some("original_height") => parts.original_height = dimension(field).await?,
            Some("width") => parts.width = dimension(field).await?,
            Some("height") => parts.height = dimension(field).await?,
            _ => {}
        }
    }

    Ok(parts)
}

/// A blank or non-numeric dimension is treated as absent.
async fn dimension(field: Field<'_>) -> std::result::Result<Option<i32>, UploadError> {
    let text = field.text().await.map_err(|_| UploadError::Unreadable)?;
    Ok(text.trim().parse::<i32>().ok().filter(|d| *d > 0))
}

fn upload_error(err: &UploadError) -> Response {
    redirect_with(IMAGES_PATH, Flash::Error, &err.to_string()).into_response()
}

/// Only `image/*` content within the configured size limit is accepted.
fn validate_upload(
    mime_type: &str,
    size: usize,
    max_bytes: usize,
) -> std::result::Result<(), UploadError> {
    if !mime_type.starts_with("image/") {
        return Err(UploadError::NotAnImage);
    }
    if size > max_bytes {
        return Err(UploadError::TooLarge(human_size(max_bytes)));
    }
    Ok(())
}

fn random_suffix() -> String {
    random_base36(&mut rand::rng(), NAME_SUFFIX_LEN)
}

/// `<millis>_<suffix>_<original name>`, with path separators stripped from
/// the original name.
fn storage_name(millis: i64, suffix: &str, original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name)
        .trim();
    let base = if base.is_empty() { "image" } else { base };
    format!("{millis}_{suffix}_{base}")
}

fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_upload() {
        assert!(validate_upload("image/png", 1024, 5 * 1024 * 1024).is_ok());
        assert_eq!(
            validate_upload("application/pdf", 1024, 5 * 1024 * 1024),
            Err(UploadError::NotAnImage)
        );
        assert_eq!(validate_upload("", 10, 100), Err(UploadError::NotAnImage));
        assert_eq!(
            validate_upload("image/jpeg", 101, 100),
            Err(UploadError::TooLarge(human_size(100)))
        );
        assert!(validate_upload("image/jpeg", 100, 100).is_ok());
    }

    #[test]
    fn test_storage_name() {
        assert_eq!(
            storage_name(1_700_000_000_000, "ABC123XYZ", "sword.png"),
            "1700000000000_ABC123XYZ_sword.png"
        );
        assert_eq!(
            storage_name(1, "S", "C:\\Users\\me\\gem.jpg"),
            "1_S_gem.jpg"
        );
        assert_eq!(storage_name(1, "S", "../../etc/x.gif"), "1_S_x.gif");
        assert_eq!(storage_name(1, "S", "  "), "1_S_image");
    }

    #[test]
    fn test_random_suffix_shape() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), NAME_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_data_url() {
        assert_eq!(data_url("image/png", b"hi"), "data:image/png;base64,aGk=");
    }
}
