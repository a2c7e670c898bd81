use async_trait::async_trait;
use sqlx::types::Json;
use uuid::Uuid;

use crate::api::PgStore;
use crate::models::{Collection, CollectionItem, ItemRecord};
use crate::services::{CollectionStore, StoreResult};

#[async_trait]
impl CollectionStore for PgStore {
	async fn list_items(&self, collection: Collection) -> StoreResult<Vec<CollectionItem>> {
		let items = sqlx::query_as::<_, CollectionItem>(
			"SELECT * FROM collection_items WHERE collection = $1 ORDER BY sort_order, created_at",
		)
		.bind(collection.key())
		.fetch_all(&self.db)
		.await?;

		Ok(items)
	}

	async fn get_item(&self, collection: Collection, id: Uuid) -> StoreResult<CollectionItem> {
		let item = sqlx::query_as::<_, CollectionItem>(
			"SELECT * FROM collection_items WHERE collection = $1 AND id = $2",
		)
		.bind(collection.key())
		.bind(id)
		.fetch_one(&self.db)
		.await?;

		Ok(item)
	}

	async fn insert_item(
		&self,
		collection: Collection,
		record: ItemRecord,
	) -> StoreResult<CollectionItem> {
		let item = sqlx::query_as::<_, CollectionItem>(
			"INSERT INTO collection_items
			(id, collection, title, slug, content, image_path, sort_order)
			VALUES ($1, $2, $3, $4, $5, $6, $7)
			RETURNING *",
		)
		.bind(Uuid::new_v4())
		.bind(collection.key())
		.bind(record.title)
		.bind(record.slug)
		.bind(Json(record.content))
		.bind(record.image_path)
		.bind(record.sort_order)
		.fetch_one(&self.db)
		.await?;

		Ok(item)
	}

	async fn update_item(
		&self,
		collection: Collection,
		id: Uuid,
		record: ItemRecord,
	) -> StoreResult<CollectionItem> {
		let item = sqlx::query_as::<_, CollectionItem>(
			"UPDATE collection_items
			SET title = $3, slug = $4, content = $5, image_path = $6, sort_order = $7,
				updated_at = NOW()
			WHERE collection = $1 AND id = $2
			RETURNING *",
		)
		.bind(collection.key())
		.bind(id)
		.bind(record.title)
		.bind(record.slug)
		.bind(Json(record.content))
		.bind(record.image_path)
		.bind(record.sort_order)
		.fetch_one(&self.db)
		.await?;

		Ok(item)
	}

	async fn delete_item(&self, collection: Collection, id: Uuid) -> StoreResult<CollectionItem> {
		let item = sqlx::query_as::<_, CollectionItem>(
			"DELETE FROM collection_items WHERE collection = $1 AND id = $2 RETURNING *",
		)
		.bind(collection.key())
		.bind(id)
		.fetch_one(&self.db)
		.await?;

		Ok(item)
	}

	async fn reorder_items(
		&self,
		collection: Collection,
		ids: &[Uuid],
	) -> StoreResult<Vec<CollectionItem>> {
		sqlx::query(
			"UPDATE collection_items AS c
			SET sort_order = (o.ord - 1)::int, updated_at = NOW()
			FROM UNNEST($2::uuid[]) WITH ORDINALITY AS o(id, ord)
			WHERE c.collection = $1 AND c.id = o.id",
		)
		.bind(collection.key())
		.bind(ids)
		.execute(&self.db)
		.await?;

		self.list_items(collection).await
	}
}
