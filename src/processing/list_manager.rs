use log::warn;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult, StoreError};
use crate::models::{Collection, CollectionItem, Content, ItemDraft, ItemRecord};
use crate::processing::StoredFile;
use crate::services::{
	revalidate_paths, CollectionStore, ObjectStorage, Revalidator, SITE_MEDIA_BUCKET,
};
use crate::utils::Slug;

fn item_error(e: StoreError) -> AppError {
	match e {
		StoreError::UniqueViolation(_) => {
			AppError::BadRequest("An item with this slug already exists.".to_string())
		}
		StoreError::NotFound => AppError::NotFound("Item not found.".to_string()),
		other => other.into(),
	}
}

/// CRUD over one ordered collection.
pub struct ListManager<'a, S: ?Sized, O: ?Sized, R: ?Sized> {
	collection: Collection,
	store: &'a S,
	storage: &'a O,
	revalidator: &'a R,
}

impl<'a, S, O, R> ListManager<'a, S, O, R>
where
	S: CollectionStore + ?Sized,
	O: ObjectStorage + ?Sized,
	R: Revalidator + ?Sized,
{
	pub fn new(collection: Collection, store: &'a S, storage: &'a O, revalidator: &'a R) -> Self {
		Self {
			collection,
			store,
			storage,
			revalidator,
		}
	}

	pub async fn list(&self) -> AppResult<Vec<CollectionItem>> {
		self.store.list_items(self.collection).await.map_err(item_error)
	}

	pub async fn create(&self, draft: ItemDraft) -> AppResult<CollectionItem> {
		let title = draft.title.clone().unwrap_or_default();
		if title.trim().is_empty() {
			return Err(AppError::BadRequest("Title is required.".to_string()));
		}
		let content = draft.content.clone().unwrap_or_default();
		self.validate(&content)?;

		let slug = self.slug_for(draft.slug.as_deref(), &title)?;
		let sort_order = match draft.sort_order {
			Some(order) => order,
			None => self
				.list()
				.await?
				.iter()
				.map(|i| i.sort_order + 1)
				.max()
				.unwrap_or(0),
		};

		let item = self
			.store
			.insert_item(
				self.collection,
				ItemRecord {
					title,
					slug,
					content,
					image_path: None,
					sort_order,
				},
			)
			.await
			.map_err(item_error)?;

		self.revalidate().await;
		Ok(item)
	}

	/// Same form as `create`; absent fields keep their stored value. The slug
	/// only changes when one is submitted, so renaming keeps public URLs.
	pub async fn update(&self, id: Uuid, draft: ItemDraft) -> AppResult<CollectionItem> {
		let current = self
			.store
			.get_item(self.collection, id)
			.await
			.map_err(item_error)?;

		let title = draft.title.unwrap_or(current.title);
		if title.trim().is_empty() {
			return Err(AppError::BadRequest("Title is required.".to_string()));
		}
		let content = draft.content.unwrap_or(current.content.0);
		self.validate(&content)?;

		let slug = match draft.slug.as_deref() {
			Some(explicit) => self.slug_for(Some(explicit), &title)?,
			None => current.slug,
		};

		let item = self
			.store
			.update_item(
				self.collection,
				id,
				ItemRecord {
					title,
					slug,
					content,
					image_path: current.image_path,
					sort_order: draft.sort_order.unwrap_or(current.sort_order),
				},
			)
			.await
			.map_err(item_error)?;

		self.revalidate().await;
		Ok(item)
	}

	/// Hard delete. The stored image, if any, is removed afterwards on a
	/// best-effort basis.
	pub async fn delete(&self, id: Uuid) -> AppResult<CollectionItem> {
		let item = self
			.store
			.delete_item(self.collection, id)
			.await
			.map_err(item_error)?;

		if let Some(path) = &item.image_path {
			self.remove_object(path).await;
		}

		self.revalidate().await;
		Ok(item)
	}

	pub async fn reorder(&self, ids: &[Uuid]) -> AppResult<Vec<CollectionItem>> {
		let items = self
			.store
			.reorder_items(self.collection, ids)
			.await
			.map_err(item_error)?;
		self.revalidate().await;
		Ok(items)
	}

	/// Points the item at a freshly uploaded image and drops the old object.
	pub async fn attach_image(&self, id: Uuid, file: &StoredFile) -> AppResult<CollectionItem> {
		let field = self.collection.image_field().ok_or_else(|| {
			AppError::BadRequest(format!(
				"Items in {} do not have images.",
				self.collection.key()
			))
		})?;

		let current = self
			.store
			.get_item(self.collection, id)
			.await
			.map_err(item_error)?;
		let previous = current.image_path.clone();

		let mut content = current.content.0;
		content.insert(field.to_string(), Value::String(file.public_url.clone()));

		let item = self
			.store
			.update_item(
				self.collection,
				id,
				ItemRecord {
					title: current.title,
					slug: current.slug,
					content,
					image_path: Some(file.path.clone()),
					sort_order: current.sort_order,
				},
			)
			.await
			.map_err(item_error)?;

		if let Some(path) = previous {
			if path != file.path {
				self.remove_object(&path).await;
			}
		}

		self.revalidate().await;
		Ok(item)
	}

	fn validate(&self, content: &Content) -> AppResult<()> {
		self.collection
			.schema()
			.validate(content)
			.map_err(AppError::BadRequest)
	}

	fn slug_for(&self, explicit: Option<&str>, title: &str) -> AppResult<Option<String>> {
		if !self.collection.has_slug() {
			return Ok(None);
		}
		let slug = Slug::resolve(explicit, title);
		if slug.is_empty() {
			return Err(AppError::BadRequest(
				"Slug could not be derived from the title.".to_string(),
			));
		}
		Ok(Some(slug))
	}

	async fn remove_object(&self, path: &str) {
		if let Err(e) = self
			.storage
			.remove(SITE_MEDIA_BUCKET, &[path.to_string()])
			.await
		{
			warn!("failed to remove {} from storage: {}", path, e);
		}
	}

	async fn revalidate(&self) {
		revalidate_paths(
			self.revalidator,
			&[self.collection.public_path().to_string()],
		)
		.await;
	}
}
