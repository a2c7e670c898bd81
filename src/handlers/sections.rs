use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::handlers::{created, ok, AdminGuard, AppState};
use crate::models::{Content, Section, SectionKind};
use crate::processing::{
	read_upload, upload_file, BinderState, SectionBinder, StoredFile, UploadPolicy,
};
use crate::services::{ContentStore, Revalidator, DOCUMENTS_BUCKET, SITE_MEDIA_BUCKET};
use crate::utils::FieldKind;

pub const ROUTER_PREFIX: &str = "/sections";

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
	cfg.route("", web::get().to(list_sections))
		.route("/{key}", web::get().to(get_section))
		.route("/{key}", web::put().to(save_section))
		.route("/{key}/history", web::get().to(section_history))
		.route("/{key}/seed", web::post().to(seed_section))
		.route("/{key}/media/{field}", web::post().to(upload_section_media));
}

fn section_kind(key: &str) -> AppResult<SectionKind> {
	SectionKind::from_key(key)
		.ok_or_else(|| AppError::NotFound(format!("Unknown section: {}", key)))
}

/// Binder with the active row already loaded.
pub(crate) async fn loaded_binder(
	state: &AppState,
	kind: SectionKind,
) -> AppResult<SectionBinder<'_, dyn ContentStore, dyn Revalidator>> {
	let mut binder = SectionBinder::new(kind, &*state.store, &*state.revalidator);
	if let BinderState::Error(message) = binder.load().await {
		return Err(AppError::Internal(message.clone()));
	}
	Ok(binder)
}

/// The active row, or `data: null` with the form defaults.
pub(crate) async fn read_section(state: &AppState, kind: SectionKind) -> AppResult<HttpResponse> {
	let binder = loaded_binder(state, kind).await?;
	Ok(match binder.row() {
		Some(row) => ok(row),
		None => HttpResponse::Ok().json(json!({
			"success": true,
			"data": null,
			"defaults": kind.schema().defaults(),
		})),
	})
}

pub(crate) async fn write_section(
	state: &AppState,
	kind: SectionKind,
	form: Content,
) -> AppResult<Section> {
	let mut binder = loaded_binder(state, kind).await?;
	binder.save(form).await
}

/// Reads the uploaded file from `payload` and stores its public URL in
/// `field` of the section. The object is removed again when the section
/// cannot be saved.
pub(crate) async fn upload_to_field(
	state: &AppState,
	kind: SectionKind,
	field: &str,
	bucket: &str,
	policy: &UploadPolicy,
	payload: &mut Multipart,
) -> AppResult<(Section, StoredFile)> {
	match kind.schema().field(field) {
		Some(spec) if spec.kind == FieldKind::Url => {}
		_ => {
			return Err(AppError::BadRequest(format!(
				"Field {} does not accept uploads.",
				field
			)))
		}
	}

	let upload = read_upload(payload, policy).await?;
	let file = upload_file(&*state.storage, bucket, kind.key(), policy, upload).await?;
	let mut binder = loaded_binder(state, kind).await?;
	match binder.set_field_url(field, &file.public_url).await {
		Ok(row) => Ok((row, file)),
		Err(e) => {
			state.remove_objects(bucket, vec![file.path]).await;
			Err(e)
		}
	}
}

async fn list_sections() -> HttpResponse {
	let sections: Vec<_> = SectionKind::ALL
		.iter()
		.map(|kind| {
			json!({
				"key": kind.key(),
				"path": kind.public_path(),
				"fields": kind.schema().fields(),
			})
		})
		.collect();
	ok(sections)
}

async fn get_section(
	state: web::Data<AppState>,
	path: web::Path<String>,
) -> AppResult<HttpResponse> {
	let kind = section_kind(&path)?;
	read_section(&state, kind).await
}

async fn section_history(
	_: AdminGuard,
	state: web::Data<AppState>,
	path: web::Path<String>,
) -> AppResult<HttpResponse> {
	let kind = section_kind(&path)?;
	let rows = state.store.section_history(kind).await?;
	Ok(ok(rows))
}

async fn save_section(
	_: AdminGuard,
	state: web::Data<AppState>,
	path: web::Path<String>,
	body: web::Json<Content>,
) -> AppResult<HttpResponse> {
	let kind = section_kind(&path)?;
	let row = write_section(&state, kind, body.into_inner()).await?;
	Ok(ok(row))
}

async fn seed_section(
	_: AdminGuard,
	state: web::Data<AppState>,
	path: web::Path<String>,
) -> AppResult<HttpResponse> {
	let kind = section_kind(&path)?;
	let mut binder = SectionBinder::new(kind, &*state.store, &*state.revalidator);
	let (row, was_created) = binder.seed_default().await?;
	Ok(if was_created { created(row) } else { ok(row) })
}

async fn upload_section_media(
	_: AdminGuard,
	state: web::Data<AppState>,
	path: web::Path<(String, String)>,
	mut payload: Multipart,
) -> AppResult<HttpResponse> {
	let (key, field) = path.into_inner();
	let kind = section_kind(&key)?;
	let config = &state.config;

	let (bucket, policy) = match field.as_str() {
		"video_url" => (SITE_MEDIA_BUCKET, UploadPolicy::video(config.document_max_bytes)),
		"document_url" => (DOCUMENTS_BUCKET, UploadPolicy::document(config.document_max_bytes)),
		_ => (SITE_MEDIA_BUCKET, UploadPolicy::image(config.image_max_bytes)),
	};

	let (row, file) =
		upload_to_field(&state, kind, &field, bucket, &policy, &mut payload).await?;
	Ok(ok(json!({ "section": row, "file": file })))
}
