use async_trait::async_trait;
use log::info;
use reqwest::{
	header::{self, HeaderMap, HeaderValue},
	Client,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::StorageError;

pub const SITE_MEDIA_BUCKET: &str = "site-media";
pub const EVENT_IMAGES_BUCKET: &str = "event-images";
pub const DOCUMENTS_BUCKET: &str = "documents";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObject {
	pub name: String,
	#[serde(default)]
	pub id: Option<String>,
}

/// Bucket-scoped object storage.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
	async fn upload(
		&self,
		bucket: &str,
		path: &str,
		bytes: Vec<u8>,
		content_type: &str,
	) -> Result<(), StorageError>;

	fn public_url(&self, bucket: &str, path: &str) -> String;

	async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), StorageError>;

	/// Objects directly under `folder`, named relative to it.
	async fn list(&self, bucket: &str, folder: &str) -> Result<Vec<StoredObject>, StorageError>;
}

/// Client for the hosted storage REST API.
pub struct HttpObjectStorage {
	client: Client,
	base_url: String,
}

impl HttpObjectStorage {
	pub fn new(base_url: &str, service_key: &str) -> Result<Self, StorageError> {
		let mut headers = HeaderMap::new();
		let bearer = HeaderValue::from_str(&format!("Bearer {}", service_key))
			.map_err(|e| StorageError::Request(e.to_string()))?;
		let apikey =
			HeaderValue::from_str(service_key).map_err(|e| StorageError::Request(e.to_string()))?;
		headers.insert(header::AUTHORIZATION, bearer);
		headers.insert("apikey", apikey);

		let client = Client::builder().default_headers(headers).build()?;

		Ok(Self {
			client,
			base_url: base_url.trim_end_matches('/').to_string(),
		})
	}

	fn object_url(&self, scope: &str, bucket: &str, path: &str) -> String {
		format!(
			"{}/storage/v1/object/{}{}/{}",
			self.base_url,
			scope,
			urlencoding::encode(bucket),
			encode_path(path)
		)
	}
}

/// Percent-encodes each segment and keeps the separators.
pub fn encode_path(path: &str) -> String {
	path.split('/')
		.map(|segment| urlencoding::encode(segment).into_owned())
		.collect::<Vec<String>>()
		.join("/")
}

async fn check(path: &str, response: reqwest::Response) -> Result<reqwest::Response, StorageError> {
	let status = response.status();
	if status.is_success() {
		return Ok(response);
	}
	let message = response.text().await.unwrap_or_default();
	Err(StorageError::Rejected {
		path: path.to_string(),
		status: status.as_u16(),
		message,
	})
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
	async fn upload(
		&self,
		bucket: &str,
		path: &str,
		bytes: Vec<u8>,
		content_type: &str,
	) -> Result<(), StorageError> {
		let size = bytes.len();
		let response = self
			.client
			.post(self.object_url("", bucket, path))
			.header(header::CONTENT_TYPE, content_type)
			.header("x-upsert", "false")
			.body(bytes)
			.send()
			.await?;
		check(path, response).await?;

		info!("uploaded {}/{} ({} bytes)", bucket, path, size);
		Ok(())
	}

	fn public_url(&self, bucket: &str, path: &str) -> String {
		self.object_url("public/", bucket, path)
	}

	async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), StorageError> {
		if paths.is_empty() {
			return Ok(());
		}
		let url = format!(
			"{}/storage/v1/object/{}",
			self.base_url,
			urlencoding::encode(bucket)
		);
		let response = self
			.client
			.delete(url)
			.json(&json!({ "prefixes": paths }))
			.send()
			.await?;
		check(&paths.join(","), response).await?;

		info!("removed {} object(s) from {}", paths.len(), bucket);
		Ok(())
	}

	async fn list(&self, bucket: &str, folder: &str) -> Result<Vec<StoredObject>, StorageError> {
		let url = format!(
			"{}/storage/v1/object/list/{}",
			self.base_url,
			urlencoding::encode(bucket)
		);
		let response = self
			.client
			.post(url)
			.json(&json!({ "prefix": folder, "limit": 1000, "offset": 0 }))
			.send()
			.await?;
		let objects = check(folder, response)
			.await?
			.json::<Vec<StoredObject>>()
			.await?;
		// Sub-folders come back as entries without an id.
		Ok(objects.into_iter().filter(|o| o.id.is_some()).collect())
	}
}
