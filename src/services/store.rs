use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
	Collection, CollectionItem, Content, Event, EventCategory, EventFilter, EventImage,
	EventLookup, EventRecord, ItemRecord, MediaImage, NewEventImage, NewMediaImage, Section,
	SectionKind,
};

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait SectionStore: Send + Sync {
	async fn active_section(&self, kind: SectionKind) -> StoreResult<Option<Section>>;

	/// Writes `content` as the single active row of `kind`. With `id` the
	/// existing row is updated, otherwise a new row is inserted. Every other
	/// row of the kind is deactivated in the same unit of work.
	async fn save_active_section(
		&self,
		kind: SectionKind,
		id: Option<Uuid>,
		content: Content,
	) -> StoreResult<Section>;

	/// All rows of `kind`, newest first.
	async fn section_history(&self, kind: SectionKind) -> StoreResult<Vec<Section>>;
}

#[async_trait]
pub trait CollectionStore: Send + Sync {
	async fn list_items(&self, collection: Collection) -> StoreResult<Vec<CollectionItem>>;

	async fn get_item(&self, collection: Collection, id: Uuid) -> StoreResult<CollectionItem>;

	async fn insert_item(
		&self,
		collection: Collection,
		record: ItemRecord,
	) -> StoreResult<CollectionItem>;

	async fn update_item(
		&self,
		collection: Collection,
		id: Uuid,
		record: ItemRecord,
	) -> StoreResult<CollectionItem>;

	/// Hard delete. Returns the removed row so callers can clean up storage.
	async fn delete_item(&self, collection: Collection, id: Uuid) -> StoreResult<CollectionItem>;

	/// Sets `sort_order` to the position of each id in `ids`.
	async fn reorder_items(
		&self,
		collection: Collection,
		ids: &[Uuid],
	) -> StoreResult<Vec<CollectionItem>>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
	async fn list_categories(&self) -> StoreResult<Vec<EventCategory>>;

	async fn get_categories(&self, ids: &[Uuid]) -> StoreResult<Vec<EventCategory>>;

	/// Returns one page of events and the total number matching the filter.
	async fn list_events(&self, filter: &EventFilter) -> StoreResult<(Vec<Event>, i64)>;

	async fn get_event(&self, lookup: &EventLookup) -> StoreResult<Event>;

	async fn insert_event(&self, record: EventRecord) -> StoreResult<Event>;

	async fn update_event(&self, id: Uuid, record: EventRecord) -> StoreResult<Event>;

	/// Removes the event and its image rows together. Returns the image rows
	/// that were removed.
	async fn delete_event(&self, id: Uuid) -> StoreResult<Vec<EventImage>>;

	async fn list_event_images(&self, event_id: Uuid) -> StoreResult<Vec<EventImage>>;

	async fn insert_event_image(&self, image: NewEventImage) -> StoreResult<EventImage>;

	async fn delete_event_image(&self, event_id: Uuid, image_id: Uuid) -> StoreResult<EventImage>;
}

#[async_trait]
pub trait MediaStore: Send + Sync {
	async fn list_media(&self) -> StoreResult<Vec<MediaImage>>;

	async fn insert_media(&self, image: NewMediaImage) -> StoreResult<MediaImage>;

	async fn delete_media(&self, id: Uuid) -> StoreResult<MediaImage>;
}

pub trait ContentStore: SectionStore + CollectionStore + EventStore + MediaStore {}

impl<T> ContentStore for T where T: SectionStore + CollectionStore + EventStore + MediaStore {}
