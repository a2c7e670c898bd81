use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::error::AppResult;
use crate::handlers::sections::{read_section, upload_to_field, write_section};
use crate::handlers::{ok, AdminGuard, AppState};
use crate::models::{Content, SectionKind};
use crate::processing::UploadPolicy;
use crate::services::DOCUMENTS_BUCKET;

pub const ROUTER_PREFIX: &str = "/company-profile";

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
	cfg.route("", web::get().to(get_profile))
		.route("", web::put().to(save_profile))
		.route("/document", web::post().to(upload_document));
}

async fn get_profile(state: web::Data<AppState>) -> AppResult<HttpResponse> {
	read_section(&state, SectionKind::CompanyProfile).await
}

async fn save_profile(
	_: AdminGuard,
	state: web::Data<AppState>,
	body: web::Json<Content>,
) -> AppResult<HttpResponse> {
	let row = write_section(&state, SectionKind::CompanyProfile, body.into_inner()).await?;
	Ok(ok(row))
}

/// PDF only. The new URL replaces `document_url`; the previous file stays in
/// the bucket.
async fn upload_document(
	_: AdminGuard,
	state: web::Data<AppState>,
	mut payload: Multipart,
) -> AppResult<HttpResponse> {
	let policy = UploadPolicy::document(state.config.document_max_bytes);
	let (row, file) = upload_to_field(
		&state,
		SectionKind::CompanyProfile,
		"document_url",
		DOCUMENTS_BUCKET,
		&policy,
		&mut payload,
	)
	.await?;
	Ok(ok(json!({ "section": row, "file": file })))
}
