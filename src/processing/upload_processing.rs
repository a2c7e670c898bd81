use actix_multipart::{Field, Multipart};
use chrono::Utc;
use futures::StreamExt;
use serde::Serialize;

use crate::error::UploadError;
use crate::services::ObjectStorage;
use crate::utils::Slug;

const MB: u64 = 1024 * 1024;

const IMAGE_TYPES: &[&str] = &[
	"image/jpeg",
	"image/png",
	"image/webp",
	"image/gif",
	"image/svg+xml",
];
const VIDEO_TYPES: &[&str] = &["video/mp4", "video/webm"];
const DOCUMENT_TYPES: &[&str] = &["application/pdf"];

/// Allowed types and byte ceiling for one upload target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UploadPolicy {
	pub label: &'static str,
	pub allowed_mime_types: &'static [&'static str],
	pub max_bytes: u64,
}

impl UploadPolicy {
	pub fn image(max_bytes: u64) -> Self {
		UploadPolicy {
			label: "Image",
			allowed_mime_types: IMAGE_TYPES,
			max_bytes,
		}
	}

	pub fn video(max_bytes: u64) -> Self {
		UploadPolicy {
			label: "Video",
			allowed_mime_types: VIDEO_TYPES,
			max_bytes,
		}
	}

	pub fn document(max_bytes: u64) -> Self {
		UploadPolicy {
			label: "File",
			allowed_mime_types: DOCUMENT_TYPES,
			max_bytes,
		}
	}

	pub fn check_type(&self, content_type: &str) -> Result<(), UploadError> {
		if self
			.allowed_mime_types
			.iter()
			.any(|allowed| *allowed == content_type)
		{
			return Ok(());
		}
		Err(UploadError::InvalidType {
			allowed: self.allowed_mime_types.join(", "),
		})
	}

	pub fn check_size(&self, size: u64) -> Result<(), UploadError> {
		if size == 0 {
			return Err(UploadError::Empty);
		}
		if size > self.max_bytes {
			return Err(self.too_large());
		}
		Ok(())
	}

	fn too_large(&self) -> UploadError {
		UploadError::TooLarge {
			label: self.label.to_string(),
			max_mb: self.max_bytes.div_ceil(MB),
		}
	}
}

/// A file read from a `multipart/form-data` body. `width`, `height` and
/// `alt_text` are what the browser reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileUpload {
	pub file_name: String,
	pub content_type: String,
	pub data: Vec<u8>,
	pub width: Option<i32>,
	pub height: Option<i32>,
	pub alt_text: Option<String>,
}

const FILE_FIELD: &str = "file";
const TEXT_FIELD_MAX_BYTES: usize = 4 * 1024;

/// Reads an upload form: one `file` part plus the optional `width`,
/// `height` and `alt_text` text parts. The file's content type is checked
/// before its body is read, and the body is rejected as soon as it grows
/// past `policy.max_bytes`.
pub async fn read_upload(
	multipart: &mut Multipart,
	policy: &UploadPolicy,
) -> Result<FileUpload, UploadError> {
	let mut upload = FileUpload::default();
	let mut has_file = false;

	while let Some(field) = multipart.next().await {
		let mut field = field.map_err(|e| UploadError::Form(e.to_string()))?;
		let name = field.name().unwrap_or_default().to_string();
		match name.as_str() {
			FILE_FIELD => {
				let content_type = field
					.content_type()
					.map(|m| m.essence_str().to_string())
					.unwrap_or_default();
				policy.check_type(&content_type)?;

				upload.file_name = field
					.content_disposition()
					.and_then(|cd| cd.get_filename())
					.unwrap_or(FILE_FIELD)
					.to_string();
				upload.content_type = content_type;
				upload.data = read_limited(&mut field, policy).await?;
				has_file = true;
			}
			"width" => upload.width = Some(parse_number(&name, &read_text(&mut field).await?)?),
			"height" => upload.height = Some(parse_number(&name, &read_text(&mut field).await?)?),
			"alt_text" => {
				let text = read_text(&mut field).await?;
				upload.alt_text = Some(text).filter(|t| !t.trim().is_empty());
			}
			other => return Err(UploadError::Form(format!("unexpected field `{}`", other))),
		}
	}

	if !has_file {
		return Err(UploadError::MissingFile);
	}
	policy.check_size(upload.data.len() as u64)?;
	Ok(upload)
}

async fn read_limited(field: &mut Field, policy: &UploadPolicy) -> Result<Vec<u8>, UploadError> {
	let mut buf: Vec<u8> = Vec::new();
	while let Some(chunk) = field.next().await {
		let data = chunk.map_err(|e| UploadError::Form(e.to_string()))?;
		if (buf.len() + data.len()) as u64 > policy.max_bytes {
			return Err(policy.too_large());
		}
		buf.extend_from_slice(&data);
	}
	Ok(buf)
}

async fn read_text(field: &mut Field) -> Result<String, UploadError> {
	let mut buf: Vec<u8> = Vec::new();
	while let Some(chunk) = field.next().await {
		let data = chunk.map_err(|e| UploadError::Form(e.to_string()))?;
		if buf.len() + data.len() > TEXT_FIELD_MAX_BYTES {
			return Err(UploadError::Form("text field too long".to_string()));
		}
		buf.extend_from_slice(&data);
	}
	String::from_utf8(buf).map_err(|_| UploadError::Form("text field is not UTF-8".to_string()))
}

fn parse_number(name: &str, value: &str) -> Result<i32, UploadError> {
	value
		.trim()
		.parse()
		.map_err(|_| UploadError::Form(format!("`{}` must be a whole number", name)))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredFile {
	pub path: String,
	pub public_url: String,
	pub file_name: String,
	pub size: i64,
	pub content_type: String,
	pub width: Option<i32>,
	pub height: Option<i32>,
}

/// `<folder>/<millis>-<slug>.<ext>`
pub fn object_path(folder: &str, file_name: &str, millis: i64) -> String {
	let (stem, extension) = match file_name.rsplit_once('.') {
		Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
		_ => (file_name, None),
	};
	let mut name = Slug::generate(stem);
	if name.is_empty() {
		name = String::from("file");
	}
	let extension: String = extension
		.unwrap_or("")
		.chars()
		.filter(|c| c.is_ascii_alphanumeric())
		.collect::<String>()
		.to_lowercase();

	let folder = folder.trim_matches('/');
	let file = if extension.is_empty() {
		format!("{}-{}", millis, name)
	} else {
		format!("{}-{}.{}", millis, name, extension)
	};
	if folder.is_empty() {
		file
	} else {
		format!("{}/{}", folder, file)
	}
}

/// Validates then uploads one file. Type and size are checked before any
/// request reaches storage; a failed upload is not retried.
pub async fn upload_file<O>(
	storage: &O,
	bucket: &str,
	folder: &str,
	policy: &UploadPolicy,
	upload: FileUpload,
) -> Result<StoredFile, UploadError>
where
	O: ObjectStorage + ?Sized,
{
	policy.check_type(&upload.content_type)?;
	policy.check_size(upload.data.len() as u64)?;

	let FileUpload {
		file_name,
		content_type,
		data,
		width,
		height,
		..
	} = upload;
	let path = object_path(folder, &file_name, Utc::now().timestamp_millis());
	let size = data.len() as i64;
	storage.upload(bucket, &path, data, &content_type).await?;

	Ok(StoredFile {
		public_url: storage.public_url(bucket, &path),
		path,
		file_name,
		size,
		content_type,
		width,
		height,
	})
}
