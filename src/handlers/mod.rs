//! HTTP routes. Every handler answers with the JSON envelope
//! `{ "success": bool, "data" | "error": ... }`.

#[cfg(test)]
macro_rules! test_app {
	($h:expr) => {
		actix_web::test::init_service(
			actix_web::App::new()
				.app_data($h.state.clone())
				.app_data(crate::handlers::json_config())
				.app_data(crate::handlers::query_config())
				.configure(crate::handlers::configure),
		)
		.await
	};
}

mod auth;
mod collections;
mod company_profile;
mod events;
mod health;
mod images;
mod sections;
mod sitemap;

pub use self::auth::AdminGuard;

use actix_web::{web, HttpResponse};
use log::warn;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::{ContentStore, ObjectStorage, Revalidator};

/// Shared by every worker.
#[derive(Clone)]
pub struct AppState {
	pub store: Arc<dyn ContentStore>,
	pub storage: Arc<dyn ObjectStorage>,
	pub revalidator: Arc<dyn Revalidator>,
	pub config: Arc<Config>,
}

impl AppState {
	/// Best-effort object removal; failures are only logged.
	pub async fn remove_objects(&self, bucket: &str, paths: Vec<String>) {
		if paths.is_empty() {
			return;
		}
		if let Err(e) = self.storage.remove(bucket, &paths).await {
			warn!("failed to remove {:?} from {}: {}", paths, bucket, e);
		}
	}

	/// Best-effort removal of every object directly under `folder`.
	pub async fn remove_folder(&self, bucket: &str, folder: &str) {
		let folder = folder.trim_matches('/');
		match self.storage.list(bucket, folder).await {
			Ok(objects) => {
				let paths = objects
					.into_iter()
					.map(|o| format!("{}/{}", folder, o.name))
					.collect();
				self.remove_objects(bucket, paths).await;
			}
			Err(e) => warn!("failed to list {}/{}: {}", bucket, folder, e),
		}
	}
}

pub fn configure(cfg: &mut web::ServiceConfig) {
	cfg.route("/sitemap.xml", web::get().to(sitemap::sitemap_xml))
		.service(
			web::scope("/api")
				.route("/health", web::get().to(health::health))
				.service(web::scope(sections::ROUTER_PREFIX).configure(sections::configure_routes))
				.service(
					web::scope(company_profile::ROUTER_PREFIX)
						.configure(company_profile::configure_routes),
				)
				.service(
					web::scope(collections::ROUTER_PREFIX).configure(collections::configure_routes),
				)
				.service(
					web::scope(events::CATEGORIES_ROUTER_PREFIX)
						.configure(events::configure_category_routes),
				)
				.service(web::scope(events::ROUTER_PREFIX).configure(events::configure_routes))
				.service(web::scope(images::ROUTER_PREFIX).configure(images::configure_routes)),
		);
}

const JSON_LIMIT: usize = 256 * 1024;

/// JSON extractor settings. Files travel as multipart, so bodies stay
/// small; malformed ones are answered with the error envelope.
pub fn json_config() -> web::JsonConfig {
	web::JsonConfig::default().limit(JSON_LIMIT).error_handler(|err, _req| {
		AppError::BadRequest(format!("Invalid request body: {}", err)).into()
	})
}

pub fn query_config() -> web::QueryConfig {
	web::QueryConfig::default()
		.error_handler(|err, _req| AppError::BadRequest(format!("Invalid query: {}", err)).into())
}

pub(crate) fn ok<T: Serialize>(data: T) -> HttpResponse {
	HttpResponse::Ok().json(json!({ "success": true, "data": data }))
}

pub(crate) fn ok_with_meta<T: Serialize>(data: T, meta: Value) -> HttpResponse {
	HttpResponse::Ok().json(json!({ "success": true, "data": data, "meta": meta }))
}

pub(crate) fn created<T: Serialize>(data: T) -> HttpResponse {
	HttpResponse::Created().json(json!({ "success": true, "data": data }))
}

pub(crate) fn parse_id(raw: &str, what: &str) -> AppResult<Uuid> {
	Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid {} id.", what)))
}

#[cfg(test)]
pub(crate) mod test_support {
	use super::*;
	use crate::services::memory::{MemoryStorage, MemoryStore, RecordingRevalidator};

	pub const TOKEN: &str = "test-token";
	pub const MB: u64 = 1024 * 1024;

	pub struct Harness {
		pub state: web::Data<AppState>,
		pub store: Arc<MemoryStore>,
		pub storage: Arc<MemoryStorage>,
		pub revalidator: Arc<RecordingRevalidator>,
	}

	pub fn config(auth: bool) -> Config {
		Config {
			database_url: "postgres://localhost/test".into(),
			database_max_connections: 1,
			storage_url: "https://storage.test".into(),
			storage_service_key: "key".into(),
			site_url: "https://stands.example.com".into(),
			revalidate_secret: "secret".into(),
			admin_api_token: TOKEN.into(),
			admin_auth_enabled: auth,
			host: "127.0.0.1".into(),
			port: 0,
			image_max_bytes: 10 * MB,
			document_max_bytes: 50 * MB,
			processing_type: "server".into(),
		}
	}

	pub fn harness(auth: bool) -> Harness {
		let store = Arc::new(MemoryStore::new());
		let storage = Arc::new(MemoryStorage::new());
		let revalidator = Arc::new(RecordingRevalidator::new());
		let state = web::Data::new(AppState {
			store: store.clone(),
			storage: storage.clone(),
			revalidator: revalidator.clone(),
			config: Arc::new(config(auth)),
		});
		Harness {
			state,
			store,
			storage,
			revalidator,
		}
	}

	pub fn bearer() -> (&'static str, String) {
		("Authorization", format!("Bearer {}", TOKEN))
	}

	const BOUNDARY: &str = "stand-content-boundary";

	fn form_header() -> (&'static str, String) {
		(
			"Content-Type",
			format!("multipart/form-data; boundary={}", BOUNDARY),
		)
	}

	fn text_parts(fields: &[(&str, &str)]) -> Vec<u8> {
		let mut body: Vec<u8> = Vec::new();
		for (name, value) in fields {
			body.extend_from_slice(
				format!(
					"--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
					BOUNDARY, name, value
				)
				.as_bytes(),
			);
		}
		body
	}

	/// A `multipart/form-data` body with the text `fields` followed by one
	/// `file` part. Returns the Content-Type header and the body.
	pub fn multipart(
		file_name: &str,
		content_type: &str,
		data: &[u8],
		fields: &[(&str, &str)],
	) -> ((&'static str, String), Vec<u8>) {
		let mut body = text_parts(fields);
		body.extend_from_slice(
			format!(
				"--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
				 Content-Type: {}\r\n\r\n",
				BOUNDARY, file_name, content_type
			)
			.as_bytes(),
		);
		body.extend_from_slice(data);
		body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
		(form_header(), body)
	}

	/// A `multipart/form-data` body carrying only text parts.
	pub fn multipart_fields(fields: &[(&str, &str)]) -> ((&'static str, String), Vec<u8>) {
		let mut body = text_parts(fields);
		body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
		(form_header(), body)
	}
}
