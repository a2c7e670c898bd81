use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::{created, ok, parse_id, AdminGuard, AppState};
use crate::models::{Collection, ItemDraft};
use crate::processing::{read_upload, upload_file, ListManager, UploadPolicy};
use crate::services::{ContentStore, ObjectStorage, Revalidator, SITE_MEDIA_BUCKET};

pub const ROUTER_PREFIX: &str = "/collections";

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
	cfg.route("/{collection}", web::get().to(list_items))
		.route("/{collection}", web::post().to(create_item))
		.route("/{collection}/order", web::put().to(reorder_items))
		.route("/{collection}/{id}", web::put().to(update_item))
		.route("/{collection}/{id}", web::patch().to(update_item))
		.route("/{collection}/{id}", web::delete().to(delete_item))
		.route("/{collection}/{id}/image", web::post().to(upload_item_image));
}

#[derive(Debug, Deserialize)]
pub struct OrderBody {
	pub ids: Vec<Uuid>,
}

type Manager<'a> = ListManager<'a, dyn ContentStore, dyn ObjectStorage, dyn Revalidator>;

fn manager<'a>(state: &'a AppState, key: &str) -> AppResult<Manager<'a>> {
	let collection = Collection::from_key(key)
		.ok_or_else(|| AppError::NotFound(format!("Unknown collection: {}", key)))?;
	Ok(ListManager::new(
		collection,
		&*state.store,
		&*state.storage,
		&*state.revalidator,
	))
}

async fn list_items(
	state: web::Data<AppState>,
	path: web::Path<String>,
) -> AppResult<HttpResponse> {
	let items = manager(&state, &path)?.list().await?;
	Ok(ok(items))
}

async fn create_item(
	_: AdminGuard,
	state: web::Data<AppState>,
	path: web::Path<String>,
	body: web::Json<ItemDraft>,
) -> AppResult<HttpResponse> {
	let item = manager(&state, &path)?.create(body.into_inner()).await?;
	Ok(created(item))
}

async fn update_item(
	_: AdminGuard,
	state: web::Data<AppState>,
	path: web::Path<(String, String)>,
	body: web::Json<ItemDraft>,
) -> AppResult<HttpResponse> {
	let (key, id) = path.into_inner();
	let manager = manager(&state, &key)?;
	let item = manager.update(parse_id(&id, "item")?, body.into_inner()).await?;
	Ok(ok(item))
}

async fn delete_item(
	_: AdminGuard,
	state: web::Data<AppState>,
	path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
	let (key, id) = path.into_inner();
	let manager = manager(&state, &key)?;
	let item = manager.delete(parse_id(&id, "item")?).await?;
	Ok(ok(item))
}

async fn reorder_items(
	_: AdminGuard,
	state: web::Data<AppState>,
	path: web::Path<String>,
	body: web::Json<OrderBody>,
) -> AppResult<HttpResponse> {
	let items = manager(&state, &path)?.reorder(&body.ids).await?;
	Ok(ok(items))
}

async fn upload_item_image(
	_: AdminGuard,
	state: web::Data<AppState>,
	path: web::Path<(String, String)>,
	mut payload: Multipart,
) -> AppResult<HttpResponse> {
	let (key, id) = path.into_inner();
	let collection = Collection::from_key(&key)
		.ok_or_else(|| AppError::NotFound(format!("Unknown collection: {}", key)))?;
	let id = parse_id(&id, "item")?;
	if collection.image_field().is_none() {
		return Err(AppError::BadRequest(format!(
			"Items in {} do not have images.",
			collection.key()
		)));
	}

	let policy = UploadPolicy::image(state.config.image_max_bytes);
	let upload = read_upload(&mut payload, &policy).await?;
	let file = upload_file(
		&*state.storage,
		SITE_MEDIA_BUCKET,
		collection.key(),
		&policy,
		upload,
	)
	.await?;

	let manager = manager(&state, &key)?;
	match manager.attach_image(id, &file).await {
		Ok(item) => Ok(ok(item)),
		Err(e) => {
			state.remove_objects(SITE_MEDIA_BUCKET, vec![file.path]).await;
			Err(e)
		}
	}
}
