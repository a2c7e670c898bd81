use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Uploaded image in the media library. Size, type and dimensions are what
/// the uploader declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MediaImage {
	pub id: Uuid,
	pub bucket: String,
	pub file_path: String,
	pub public_url: String,
	pub file_name: String,
	pub file_size: i64,
	pub mime_type: String,
	pub width: Option<i32>,
	pub height: Option<i32>,
	pub alt_text: Option<String>,
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMediaImage {
	pub bucket: String,
	pub file_path: String,
	pub public_url: String,
	pub file_name: String,
	pub file_size: i64,
	pub mime_type: String,
	pub width: Option<i32>,
	pub height: Option<i32>,
	pub alt_text: Option<String>,
}
