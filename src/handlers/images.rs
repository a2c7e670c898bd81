use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};

use crate::error::{AppError, AppResult, StoreError};
use crate::handlers::{created, ok, parse_id, AdminGuard, AppState};
use crate::models::NewMediaImage;
use crate::processing::{read_upload, upload_file, UploadPolicy};
use crate::services::SITE_MEDIA_BUCKET;

pub const ROUTER_PREFIX: &str = "/images";

const MEDIA_FOLDER: &str = "media";

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
	cfg.route("", web::get().to(list_images))
		.route("", web::post().to(upload_image))
		.route("/{id}", web::delete().to(delete_image));
}

async fn list_images(state: web::Data<AppState>) -> AppResult<HttpResponse> {
	let images = state.store.list_media().await?;
	Ok(ok(images))
}

async fn upload_image(
	_: AdminGuard,
	state: web::Data<AppState>,
	mut payload: Multipart,
) -> AppResult<HttpResponse> {
	let policy = UploadPolicy::image(state.config.image_max_bytes);
	let mut upload = read_upload(&mut payload, &policy).await?;
	let alt_text = upload.alt_text.take();
	let file =
		upload_file(&*state.storage, SITE_MEDIA_BUCKET, MEDIA_FOLDER, &policy, upload).await?;

	let image = NewMediaImage {
		bucket: SITE_MEDIA_BUCKET.to_string(),
		file_path: file.path.clone(),
		public_url: file.public_url,
		file_name: file.file_name,
		file_size: file.size,
		mime_type: file.content_type,
		width: file.width,
		height: file.height,
		alt_text,
	};
	match state.store.insert_media(image).await {
		Ok(row) => Ok(created(row)),
		Err(e) => {
			state.remove_objects(SITE_MEDIA_BUCKET, vec![file.path]).await;
			Err(e.into())
		}
	}
}

async fn delete_image(
	_: AdminGuard,
	state: web::Data<AppState>,
	path: web::Path<String>,
) -> AppResult<HttpResponse> {
	let id = parse_id(&path, "image")?;
	let image = state.store.delete_media(id).await.map_err(|e| match e {
		StoreError::NotFound => AppError::NotFound("Image not found.".to_string()),
		other => other.into(),
	})?;
	state
		.remove_objects(&image.bucket, vec![image.file_path.clone()])
		.await;
	Ok(ok(image))
}
