//! In-process collaborators for tests.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{StorageError, StoreError};
use crate::models::{
	Collection, CollectionItem, Content, Event, EventCategory, EventFilter, EventImage,
	EventLookup, EventRecord, ItemRecord, MediaImage, NewEventImage, NewMediaImage, Section,
	SectionKind,
};
use crate::services::{
	CollectionStore, EventStore, MediaStore, ObjectStorage, RevalidateError, Revalidator,
	SectionStore, StoreResult, StoredObject,
};

#[derive(Default)]
struct Tables {
	sections: Vec<Section>,
	items: Vec<CollectionItem>,
	categories: Vec<EventCategory>,
	events: Vec<Event>,
	event_images: Vec<EventImage>,
	media: Vec<MediaImage>,
}

#[derive(Default)]
pub struct MemoryStore {
	tables: Mutex<Tables>,
	pub deny_writes: AtomicBool,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn add_category(&self, name: &str, slug: &str) -> EventCategory {
		let category = EventCategory {
			id: Uuid::new_v4(),
			name: name.to_string(),
			slug: slug.to_string(),
		};
		self.tables.lock().await.categories.push(category.clone());
		category
	}

	pub async fn active_count(&self, kind: SectionKind) -> usize {
		self.tables
			.lock()
			.await
			.sections
			.iter()
			.filter(|s| s.section_key == kind.key() && s.is_active)
			.count()
	}

	/// Inserts a row as-is, bypassing the single-active rule.
	pub async fn insert_raw_section(&self, kind: SectionKind, content: Content, is_active: bool) {
		let now = Utc::now();
		self.tables.lock().await.sections.push(Section {
			id: Uuid::new_v4(),
			section_key: kind.key().to_string(),
			content: Json(content),
			is_active,
			created_at: now,
			updated_at: now,
		});
	}

	fn check_writable(&self) -> StoreResult<()> {
		if self.deny_writes.load(Ordering::SeqCst) {
			return Err(StoreError::PermissionDenied);
		}
		Ok(())
	}
}

#[async_trait]
impl SectionStore for MemoryStore {
	async fn active_section(&self, kind: SectionKind) -> StoreResult<Option<Section>> {
		let tables = self.tables.lock().await;
		Ok(tables
			.sections
			.iter()
			.filter(|s| s.section_key == kind.key() && s.is_active)
			.max_by_key(|s| s.updated_at)
			.cloned())
	}

	async fn save_active_section(
		&self,
		kind: SectionKind,
		id: Option<Uuid>,
		content: Content,
	) -> StoreResult<Section> {
		self.check_writable()?;
		let mut tables = self.tables.lock().await;
		let now = Utc::now();
		let id = id.unwrap_or_else(Uuid::new_v4);

		for row in tables.sections.iter_mut() {
			if row.section_key == kind.key() && row.id != id {
				row.is_active = false;
			}
		}

		match tables.sections.iter_mut().find(|s| s.id == id) {
			Some(row) => {
				row.content = Json(content);
				row.is_active = true;
				row.updated_at = now;
				Ok(row.clone())
			}
			None => {
				let row = Section {
					id,
					section_key: kind.key().to_string(),
					content: Json(content),
					is_active: true,
					created_at: now,
					updated_at: now,
				};
				tables.sections.push(row.clone());
				Ok(row)
			}
		}
	}

	async fn section_history(&self, kind: SectionKind) -> StoreResult<Vec<Section>> {
		let tables = self.tables.lock().await;
		let mut rows: Vec<Section> = tables
			.sections
			.iter()
			.filter(|s| s.section_key == kind.key())
			.cloned()
			.collect();
		rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
		Ok(rows)
	}
}

fn sorted_items(tables: &Tables, collection: Collection) -> Vec<CollectionItem> {
	let mut items: Vec<CollectionItem> = tables
		.items
		.iter()
		.filter(|i| i.collection == collection.key())
		.cloned()
		.collect();
	items.sort_by(|a, b| {
		a.sort_order
			.cmp(&b.sort_order)
			.then(a.created_at.cmp(&b.created_at))
	});
	items
}

fn slug_taken(
	tables: &Tables,
	collection: Collection,
	slug: &Option<String>,
	except: Uuid,
) -> bool {
	match slug {
		Some(slug) => tables.items.iter().any(|i| {
			i.collection == collection.key() && i.id != except && i.slug.as_ref() == Some(slug)
		}),
		None => false,
	}
}

#[async_trait]
impl CollectionStore for MemoryStore {
	async fn list_items(&self, collection: Collection) -> StoreResult<Vec<CollectionItem>> {
		Ok(sorted_items(&*self.tables.lock().await, collection))
	}

	async fn get_item(&self, collection: Collection, id: Uuid) -> StoreResult<CollectionItem> {
		let tables = self.tables.lock().await;
		tables
			.items
			.iter()
			.find(|i| i.collection == collection.key() && i.id == id)
			.cloned()
			.ok_or(StoreError::NotFound)
	}

	async fn insert_item(
		&self,
		collection: Collection,
		record: ItemRecord,
	) -> StoreResult<CollectionItem> {
		self.check_writable()?;
		let mut tables = self.tables.lock().await;
		if slug_taken(&tables, collection, &record.slug, Uuid::nil()) {
			return Err(StoreError::UniqueViolation(
				"collection_items_collection_slug_key".into(),
			));
		}
		let now = Utc::now();
		let item = CollectionItem {
			id: Uuid::new_v4(),
			collection: collection.key().to_string(),
			title: record.title,
			slug: record.slug,
			content: Json(record.content),
			image_path: record.image_path,
			sort_order: record.sort_order,
			created_at: now,
			updated_at: now,
		};
		tables.items.push(item.clone());
		Ok(item)
	}

	async fn update_item(
		&self,
		collection: Collection,
		id: Uuid,
		record: ItemRecord,
	) -> StoreResult<CollectionItem> {
		self.check_writable()?;
		let mut tables = self.tables.lock().await;
		if slug_taken(&tables, collection, &record.slug, id) {
			return Err(StoreError::UniqueViolation(
				"collection_items_collection_slug_key".into(),
			));
		}
		let item = tables
			.items
			.iter_mut()
			.find(|i| i.collection == collection.key() && i.id == id)
			.ok_or(StoreError::NotFound)?;
		item.title = record.title;
		item.slug = record.slug;
		item.content = Json(record.content);
		item.image_path = record.image_path;
		item.sort_order = record.sort_order;
		item.updated_at = Utc::now();
		Ok(item.clone())
	}

	async fn delete_item(&self, collection: Collection, id: Uuid) -> StoreResult<CollectionItem> {
		self.check_writable()?;
		let mut tables = self.tables.lock().await;
		let position = tables
			.items
			.iter()
			.position(|i| i.collection == collection.key() && i.id == id)
			.ok_or(StoreError::NotFound)?;
		Ok(tables.items.remove(position))
	}

	async fn reorder_items(
		&self,
		collection: Collection,
		ids: &[Uuid],
	) -> StoreResult<Vec<CollectionItem>> {
		self.check_writable()?;
		let mut tables = self.tables.lock().await;
		for (order, id) in ids.iter().enumerate() {
			if let Some(item) = tables
				.items
				.iter_mut()
				.find(|i| i.collection == collection.key() && i.id == *id)
			{
				item.sort_order = order as i32;
			}
		}
		Ok(sorted_items(&tables, collection))
	}
}

impl MemoryStore {
	fn check_event(tables: &Tables, record: &EventRecord, except: Uuid) -> StoreResult<()> {
		if let Some(category_id) = record.category_id {
			if !tables.categories.iter().any(|c| c.id == category_id) {
				return Err(StoreError::ForeignKeyViolation(
					"events_category_id_fkey".into(),
				));
			}
		}
		if tables
			.events
			.iter()
			.any(|e| e.slug == record.slug && e.id != except)
		{
			return Err(StoreError::UniqueViolation("events_slug_key".into()));
		}
		Ok(())
	}
}

fn apply_record(event: &mut Event, record: EventRecord) {
	event.title = record.title;
	event.slug = record.slug;
	event.description = record.description;
	event.category_id = record.category_id;
	event.location = record.location;
	event.venue = record.venue;
	event.start_date = record.start_date;
	event.end_date = record.end_date;
	event.cover_image_url = record.cover_image_url;
	event.is_published = record.is_published;
}

#[async_trait]
impl EventStore for MemoryStore {
	async fn list_categories(&self) -> StoreResult<Vec<EventCategory>> {
		let mut categories = self.tables.lock().await.categories.clone();
		categories.sort_by(|a, b| a.name.cmp(&b.name));
		Ok(categories)
	}

	async fn get_categories(&self, ids: &[Uuid]) -> StoreResult<Vec<EventCategory>> {
		let tables = self.tables.lock().await;
		Ok(tables
			.categories
			.iter()
			.filter(|c| ids.contains(&c.id))
			.cloned()
			.collect())
	}

	async fn list_events(&self, filter: &EventFilter) -> StoreResult<(Vec<Event>, i64)> {
		let tables = self.tables.lock().await;
		let mut events: Vec<Event> = tables
			.events
			.iter()
			.filter(|e| filter.category_id.map_or(true, |c| e.category_id == Some(c)))
			.filter(|e| filter.published.map_or(true, |p| e.is_published == p))
			.filter(|e| filter.month.map_or(true, |(y, m)| e.overlaps_month(y, m)))
			.cloned()
			.collect();
		events.sort_by(|a, b| {
			a.start_date
				.cmp(&b.start_date)
				.then(a.created_at.cmp(&b.created_at))
		});
		let total = events.len() as i64;
		let page = events
			.into_iter()
			.skip(filter.offset.max(0) as usize)
			.take(filter.limit.max(0) as usize)
			.collect();
		Ok((page, total))
	}

	async fn get_event(&self, lookup: &EventLookup) -> StoreResult<Event> {
		let tables = self.tables.lock().await;
		tables
			.events
			.iter()
			.find(|e| match lookup {
				EventLookup::Id(id) => e.id == *id,
				EventLookup::Slug(slug) => &e.slug == slug,
			})
			.cloned()
			.ok_or(StoreError::NotFound)
	}

	async fn insert_event(&self, record: EventRecord) -> StoreResult<Event> {
		self.check_writable()?;
		let mut tables = self.tables.lock().await;
		MemoryStore::check_event(&tables, &record, Uuid::nil())?;
		let now = Utc::now();
		let mut event = Event {
			id: Uuid::new_v4(),
			title: String::new(),
			slug: String::new(),
			description: None,
			category_id: None,
			location: None,
			venue: None,
			start_date: None,
			end_date: None,
			cover_image_url: None,
			is_published: false,
			created_at: now,
			updated_at: now,
		};
		apply_record(&mut event, record);
		tables.events.push(event.clone());
		Ok(event)
	}

	async fn update_event(&self, id: Uuid, record: EventRecord) -> StoreResult<Event> {
		self.check_writable()?;
		let mut tables = self.tables.lock().await;
		MemoryStore::check_event(&tables, &record, id)?;
		let event = tables
			.events
			.iter_mut()
			.find(|e| e.id == id)
			.ok_or(StoreError::NotFound)?;
		apply_record(event, record);
		event.updated_at = Utc::now();
		Ok(event.clone())
	}

	async fn delete_event(&self, id: Uuid) -> StoreResult<Vec<EventImage>> {
		self.check_writable()?;
		let mut tables = self.tables.lock().await;
		let position = tables
			.events
			.iter()
			.position(|e| e.id == id)
			.ok_or(StoreError::NotFound)?;
		let (removed, kept): (Vec<EventImage>, Vec<EventImage>) = tables
			.event_images
			.drain(..)
			.partition(|i| i.event_id == id);
		tables.event_images = kept;
		tables.events.remove(position);
		Ok(removed)
	}

	async fn list_event_images(&self, event_id: Uuid) -> StoreResult<Vec<EventImage>> {
		let tables = self.tables.lock().await;
		let mut images: Vec<EventImage> = tables
			.event_images
			.iter()
			.filter(|i| i.event_id == event_id)
			.cloned()
			.collect();
		images.sort_by_key(|i| i.sort_order);
		Ok(images)
	}

	async fn insert_event_image(&self, image: NewEventImage) -> StoreResult<EventImage> {
		self.check_writable()?;
		let mut tables = self.tables.lock().await;
		if !tables.events.iter().any(|e| e.id == image.event_id) {
			return Err(StoreError::ForeignKeyViolation(
				"event_images_event_id_fkey".into(),
			));
		}
		let row = EventImage {
			id: Uuid::new_v4(),
			event_id: image.event_id,
			file_path: image.file_path,
			public_url: image.public_url,
			file_name: image.file_name,
			file_size: image.file_size,
			mime_type: image.mime_type,
			width: image.width,
			height: image.height,
			sort_order: image.sort_order,
			created_at: Utc::now(),
		};
		tables.event_images.push(row.clone());
		Ok(row)
	}

	async fn delete_event_image(&self, event_id: Uuid, image_id: Uuid) -> StoreResult<EventImage> {
		self.check_writable()?;
		let mut tables = self.tables.lock().await;
		let position = tables
			.event_images
			.iter()
			.position(|i| i.event_id == event_id && i.id == image_id)
			.ok_or(StoreError::NotFound)?;
		Ok(tables.event_images.remove(position))
	}
}

#[async_trait]
impl MediaStore for MemoryStore {
	async fn list_media(&self) -> StoreResult<Vec<MediaImage>> {
		let mut media = self.tables.lock().await.media.clone();
		media.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Ok(media)
	}

	async fn insert_media(&self, image: NewMediaImage) -> StoreResult<MediaImage> {
		self.check_writable()?;
		let row = MediaImage {
			id: Uuid::new_v4(),
			bucket: image.bucket,
			file_path: image.file_path,
			public_url: image.public_url,
			file_name: image.file_name,
			file_size: image.file_size,
			mime_type: image.mime_type,
			width: image.width,
			height: image.height,
			alt_text: image.alt_text,
			created_at: Utc::now(),
		};
		self.tables.lock().await.media.push(row.clone());
		Ok(row)
	}

	async fn delete_media(&self, id: Uuid) -> StoreResult<MediaImage> {
		self.check_writable()?;
		let mut tables = self.tables.lock().await;
		let position = tables
			.media
			.iter()
			.position(|m| m.id == id)
			.ok_or(StoreError::NotFound)?;
		Ok(tables.media.remove(position))
	}
}

#[derive(Default)]
pub struct MemoryStorage {
	objects: Mutex<HashMap<(String, String), Vec<u8>>>,
	pub uploads: AtomicUsize,
	pub fail_uploads: AtomicBool,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn contains(&self, bucket: &str, path: &str) -> bool {
		self.objects
			.lock()
			.await
			.contains_key(&(bucket.to_string(), path.to_string()))
	}

	pub async fn len(&self) -> usize {
		self.objects.lock().await.len()
	}
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
	async fn upload(
		&self,
		bucket: &str,
		path: &str,
		bytes: Vec<u8>,
		_content_type: &str,
	) -> Result<(), StorageError> {
		self.uploads.fetch_add(1, Ordering::SeqCst);
		if self.fail_uploads.load(Ordering::SeqCst) {
			return Err(StorageError::Request("connection reset".into()));
		}
		self.objects
			.lock()
			.await
			.insert((bucket.to_string(), path.to_string()), bytes);
		Ok(())
	}

	fn public_url(&self, bucket: &str, path: &str) -> String {
		format!("https://cdn.test/{}/{}", bucket, path)
	}

	async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), StorageError> {
		let mut objects = self.objects.lock().await;
		for path in paths {
			objects.remove(&(bucket.to_string(), path.clone()));
		}
		Ok(())
	}

	async fn list(&self, bucket: &str, folder: &str) -> Result<Vec<StoredObject>, StorageError> {
		let prefix = format!("{}/", folder.trim_matches('/'));
		let objects = self.objects.lock().await;
		let mut names: Vec<StoredObject> = objects
			.keys()
			.filter(|(b, _)| b == bucket)
			.filter_map(|(_, p)| p.strip_prefix(&prefix))
			.filter(|name| !name.contains('/'))
			.map(|name| StoredObject {
				name: name.to_string(),
				id: None,
			})
			.collect();
		names.sort_by(|a, b| a.name.cmp(&b.name));
		Ok(names)
	}
}

#[derive(Default)]
pub struct RecordingRevalidator {
	pub paths: Mutex<Vec<String>>,
	pub fail: AtomicBool,
}

impl RecordingRevalidator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn failing() -> Self {
		let revalidator = Self::default();
		revalidator.fail.store(true, Ordering::SeqCst);
		revalidator
	}

	pub async fn seen(&self) -> Vec<String> {
		self.paths.lock().await.clone()
	}
}

#[async_trait]
impl Revalidator for RecordingRevalidator {
	async fn revalidate(&self, path: &str) -> Result<(), RevalidateError> {
		self.paths.lock().await.push(path.to_string());
		if self.fail.load(Ordering::SeqCst) {
			return Err("site unreachable".into());
		}
		Ok(())
	}
}
