//! Uploaded image types.

use chrono::{DateTime, Utc};

use gamestore_core::{ImageId, UserId};

/// An image stored as a data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub id: ImageId,
    /// Generated unique name, `<millis>_<random>_<original name>`.
    pub name: String,
    pub original_name: String,
    pub data_url: String,
    pub original_width: Option<i32>,
    pub original_height: Option<i32>,
    pub resized_width: Option<i32>,
    pub resized_height: Option<i32>,
    pub file_size: i32,
    pub mime_type: String,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new upload.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub name: String,
    pub original_name: String,
    pub data_url: String,
    pub original_width: Option<i32>,
    pub original_height: Option<i32>,
    pub resized_width: Option<i32>,
    pub resized_height: Option<i32>,
    pub file_size: i32,
    pub mime_type: String,
    pub created_by: UserId,
}
