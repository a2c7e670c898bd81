use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult, StoreError};
use crate::handlers::auth::is_admin;
use crate::handlers::{created, ok, ok_with_meta, parse_id, AdminGuard, AppState};
use crate::models::{
	Event, EventFilter, EventLookup, EventPayload, EventRecord, EventView, NewEventImage,
};
use crate::processing::{read_upload, upload_file, UploadPolicy};
use crate::services::{revalidate_paths, EVENT_IMAGES_BUCKET};
use crate::utils::Slug;

pub const ROUTER_PREFIX: &str = "/events";
pub const CATEGORIES_ROUTER_PREFIX: &str = "/event-categories";

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
	cfg.route("", web::get().to(list_events))
		.route("", web::post().to(create_event))
		.route("/{id}", web::get().to(get_event))
		.route("/{id}", web::put().to(update_event))
		.route("/{id}", web::patch().to(update_event))
		.route("/{id}", web::delete().to(delete_event))
		.route("/{id}/images", web::get().to(list_images))
		.route("/{id}/images", web::post().to(upload_image))
		.route("/{id}/images/{image_id}", web::delete().to(delete_image));
}

pub fn configure_category_routes(cfg: &mut web::ServiceConfig) {
	cfg.route("", web::get().to(list_categories));
}

fn event_error(e: StoreError) -> AppError {
	match e {
		StoreError::ForeignKeyViolation(_) => {
			AppError::BadRequest("Invalid category selected.".to_string())
		}
		StoreError::UniqueViolation(_) => {
			AppError::BadRequest("An event with this slug already exists.".to_string())
		}
		StoreError::NotFound => AppError::NotFound("Event not found.".to_string()),
		other => other.into(),
	}
}

/// The only foreign key on an image row is its event.
fn image_error(e: StoreError) -> AppError {
	match e {
		StoreError::ForeignKeyViolation(_) | StoreError::NotFound => {
			AppError::NotFound("Event not found.".to_string())
		}
		other => other.into(),
	}
}

fn event_folder(id: Uuid) -> String {
	format!("events/{}", id)
}

/// Loads an event by id, hiding drafts from visitors.
async fn visible_event(req: &HttpRequest, state: &AppState, id: Uuid) -> AppResult<Event> {
	let event = state
		.store
		.get_event(&EventLookup::Id(id))
		.await
		.map_err(event_error)?;
	if !event.is_published && !is_admin(req) {
		return Err(AppError::NotFound("Event not found.".to_string()));
	}
	Ok(event)
}

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
	pub category: Option<String>,
	pub month: Option<String>,
	pub published: Option<bool>,
	pub limit: Option<i64>,
	pub offset: Option<i64>,
}

/// `YYYY-MM` -> (year, month)
fn parse_month(raw: &str) -> AppResult<(i32, u32)> {
	let invalid = || AppError::BadRequest("Invalid month. Expected YYYY-MM.".to_string());
	let (year, month) = raw.split_once('-').ok_or_else(invalid)?;
	if year.len() != 4 || month.len() != 2 {
		return Err(invalid());
	}
	let year: i32 = year.parse().map_err(|_| invalid())?;
	let month: u32 = month.parse().map_err(|_| invalid())?;
	if !(1..=12).contains(&month) {
		return Err(invalid());
	}
	Ok((year, month))
}

/// Fetches the categories of `events` in one query and pairs them up.
async fn with_categories(state: &AppState, events: Vec<Event>) -> AppResult<Vec<EventView>> {
	let mut ids: Vec<Uuid> = events.iter().filter_map(|e| e.category_id).collect();
	ids.sort();
	ids.dedup();

	let categories: HashMap<Uuid, _> = if ids.is_empty() {
		HashMap::new()
	} else {
		state
			.store
			.get_categories(&ids)
			.await?
			.into_iter()
			.map(|c| (c.id, c))
			.collect()
	};

	Ok(events
		.into_iter()
		.map(|event| EventView {
			category: event.category_id.and_then(|id| categories.get(&id).cloned()),
			event,
			images: None,
		})
		.collect())
}

fn event_paths(slugs: &[&str]) -> Vec<String> {
	let mut paths = vec!["/".to_string(), "/events".to_string()];
	for slug in slugs {
		let path = format!("/events/{}", slug);
		if !paths.contains(&path) {
			paths.push(path);
		}
	}
	paths
}

fn check_dates(record: &EventRecord) -> AppResult<()> {
	if let (Some(start), Some(end)) = (record.start_date, record.end_date) {
		if end < start {
			return Err(AppError::BadRequest(
				"End date cannot be before start date.".to_string(),
			));
		}
	}
	Ok(())
}

async fn list_categories(state: web::Data<AppState>) -> AppResult<HttpResponse> {
	let categories = state.store.list_categories().await?;
	Ok(ok(categories))
}

/// Visitors only ever see published events; admins may filter freely.
async fn list_events(
	req: HttpRequest,
	state: web::Data<AppState>,
	query: web::Query<EventsQuery>,
) -> AppResult<HttpResponse> {
	let query = query.into_inner();
	let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
	let offset = query.offset.unwrap_or(0).max(0);
	let meta = |total: i64| json!({ "total": total, "limit": limit, "offset": offset });

	let month = query.month.as_deref().map(parse_month).transpose()?;
	let published = if is_admin(&req) {
		query.published
	} else {
		Some(true)
	};

	let category_id = match query.category.as_deref() {
		None | Some("") => None,
		Some(raw) => match Uuid::parse_str(raw) {
			Ok(id) => Some(id),
			Err(_) => {
				let categories = state.store.list_categories().await?;
				match categories.into_iter().find(|c| c.slug == raw) {
					Some(category) => Some(category.id),
					None => return Ok(ok_with_meta(Vec::<EventView>::new(), meta(0))),
				}
			}
		},
	};

	let filter = EventFilter {
		category_id,
		month,
		published,
		limit,
		offset,
	};
	let (events, total) = state.store.list_events(&filter).await?;
	let views = with_categories(&state, events).await?;
	Ok(ok_with_meta(views, meta(total)))
}

async fn get_event(
	req: HttpRequest,
	state: web::Data<AppState>,
	path: web::Path<String>,
) -> AppResult<HttpResponse> {
	let event = state
		.store
		.get_event(&EventLookup::parse(&path))
		.await
		.map_err(event_error)?;
	if !event.is_published && !is_admin(&req) {
		return Err(AppError::NotFound("Event not found.".to_string()));
	}

	let images = state.store.list_event_images(event.id).await?;
	let mut view = with_categories(&state, vec![event])
		.await?
		.pop()
		.ok_or_else(|| AppError::NotFound("Event not found.".to_string()))?;
	view.images = Some(images);
	Ok(ok(view))
}

async fn create_event(
	_: AdminGuard,
	state: web::Data<AppState>,
	body: web::Json<EventPayload>,
) -> AppResult<HttpResponse> {
	let payload = body.into_inner();
	let title = payload.title.unwrap_or_default().trim().to_string();
	if title.is_empty() {
		return Err(AppError::BadRequest("Title is required.".to_string()));
	}
	let slug = Slug::resolve(payload.slug.as_deref(), &title);
	if slug.is_empty() {
		return Err(AppError::BadRequest(
			"Slug could not be derived from the title.".to_string(),
		));
	}

	let record = EventRecord {
		title,
		slug,
		description: payload.description,
		category_id: payload.category_id,
		location: payload.location,
		venue: payload.venue,
		start_date: payload.start_date,
		end_date: payload.end_date,
		cover_image_url: payload.cover_image_url,
		is_published: payload.is_published.unwrap_or(false),
	};
	check_dates(&record)?;

	let event = state.store.insert_event(record).await.map_err(event_error)?;
	revalidate_paths(&*state.revalidator, &event_paths(&[event.slug.as_str()])).await;
	Ok(created(event))
}

/// Absent fields keep their stored value. The slug only changes when one is
/// submitted.
async fn update_event(
	_: AdminGuard,
	state: web::Data<AppState>,
	path: web::Path<String>,
	body: web::Json<EventPayload>,
) -> AppResult<HttpResponse> {
	let id = parse_id(&path, "event")?;
	let current = state
		.store
		.get_event(&EventLookup::Id(id))
		.await
		.map_err(event_error)?;
	let payload = body.into_inner();

	let mut record = EventRecord::from(&current);
	if let Some(title) = payload.title {
		let title = title.trim().to_string();
		if title.is_empty() {
			return Err(AppError::BadRequest("Title is required.".to_string()));
		}
		record.title = title;
	}
	if let Some(slug) = payload.slug {
		record.slug = Slug::resolve(Some(&slug), &record.title);
	}
	if record.slug.is_empty() {
		return Err(AppError::BadRequest(
			"Slug could not be derived from the title.".to_string(),
		));
	}
	record.description = payload.description.or(record.description);
	record.category_id = payload.category_id.or(record.category_id);
	record.location = payload.location.or(record.location);
	record.venue = payload.venue.or(record.venue);
	record.start_date = payload.start_date.or(record.start_date);
	record.end_date = payload.end_date.or(record.end_date);
	record.cover_image_url = payload.cover_image_url.or(record.cover_image_url);
	record.is_published = payload.is_published.unwrap_or(record.is_published);
	check_dates(&record)?;

	let event = state
		.store
		.update_event(id, record)
		.await
		.map_err(event_error)?;
	revalidate_paths(
		&*state.revalidator,
		&event_paths(&[current.slug.as_str(), event.slug.as_str()]),
	)
	.await;
	Ok(ok(event))
}

/// Image rows and the event go in one transaction. The stored files are
/// removed afterwards, along with any object left in the event's folder.
async fn delete_event(
	_: AdminGuard,
	state: web::Data<AppState>,
	path: web::Path<String>,
) -> AppResult<HttpResponse> {
	let id = parse_id(&path, "event")?;
	let event = state
		.store
		.get_event(&EventLookup::Id(id))
		.await
		.map_err(event_error)?;
	let images = state.store.delete_event(id).await.map_err(event_error)?;

	let paths = images.iter().map(|i| i.file_path.clone()).collect();
	state.remove_objects(EVENT_IMAGES_BUCKET, paths).await;
	state.remove_folder(EVENT_IMAGES_BUCKET, &event_folder(id)).await;
	revalidate_paths(&*state.revalidator, &event_paths(&[event.slug.as_str()])).await;
	Ok(ok(json!({ "id": id, "images_removed": images.len() })))
}

async fn list_images(
	req: HttpRequest,
	state: web::Data<AppState>,
	path: web::Path<String>,
) -> AppResult<HttpResponse> {
	let id = parse_id(&path, "event")?;
	let event = visible_event(&req, &state, id).await?;
	let images = state.store.list_event_images(event.id).await?;
	Ok(ok(images))
}

async fn upload_image(
	_: AdminGuard,
	state: web::Data<AppState>,
	path: web::Path<String>,
	mut payload: Multipart,
) -> AppResult<HttpResponse> {
	let id = parse_id(&path, "event")?;
	let event = state
		.store
		.get_event(&EventLookup::Id(id))
		.await
		.map_err(event_error)?;
	let existing = state.store.list_event_images(id).await?;

	let policy = UploadPolicy::image(state.config.image_max_bytes);
	let upload = read_upload(&mut payload, &policy).await?;
	let folder = event_folder(id);
	let file =
		upload_file(&*state.storage, EVENT_IMAGES_BUCKET, &folder, &policy, upload).await?;

	let image = NewEventImage {
		event_id: id,
		file_path: file.path.clone(),
		public_url: file.public_url,
		file_name: file.file_name,
		file_size: file.size,
		mime_type: file.content_type,
		width: file.width,
		height: file.height,
		sort_order: existing.len() as i32,
	};
	match state.store.insert_event_image(image).await {
		Ok(row) => {
			revalidate_paths(&*state.revalidator, &event_paths(&[event.slug.as_str()])).await;
			Ok(created(row))
		}
		Err(e) => {
			state.remove_objects(EVENT_IMAGES_BUCKET, vec![file.path]).await;
			Err(image_error(e))
		}
	}
}

async fn delete_image(
	_: AdminGuard,
	state: web::Data<AppState>,
	path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
	let (event_id, image_id) = path.into_inner();
	let event_id = parse_id(&event_id, "event")?;
	let image_id = parse_id(&image_id, "image")?;

	let image = state
		.store
		.delete_event_image(event_id, image_id)
		.await
		.map_err(|e| match e {
			StoreError::NotFound => AppError::NotFound("Image not found.".to_string()),
			other => other.into(),
		})?;
	state
		.remove_objects(EVENT_IMAGES_BUCKET, vec![image.file_path.clone()])
		.await;
	if let Ok(event) = state.store.get_event(&EventLookup::Id(event_id)).await {
		revalidate_paths(&*state.revalidator, &event_paths(&[event.slug.as_str()])).await;
	}
	Ok(ok(image))
}
