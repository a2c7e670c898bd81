use async_trait::async_trait;
use uuid::Uuid;

use crate::api::PgStore;
use crate::models::{MediaImage, NewMediaImage};
use crate::services::{MediaStore, StoreResult};

#[async_trait]
impl MediaStore for PgStore {
	async fn list_media(&self) -> StoreResult<Vec<MediaImage>> {
		let images =
			sqlx::query_as::<_, MediaImage>("SELECT * FROM media_images ORDER BY created_at DESC")
				.fetch_all(&self.db)
				.await?;

		Ok(images)
	}

	async fn insert_media(&self, image: NewMediaImage) -> StoreResult<MediaImage> {
		let row = sqlx::query_as::<_, MediaImage>(
			"INSERT INTO media_images
			(id, bucket, file_path, public_url, file_name, file_size, mime_type,
			 width, height, alt_text)
			VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
			RETURNING *",
		)
		.bind(Uuid::new_v4())
		.bind(image.bucket)
		.bind(image.file_path)
		.bind(image.public_url)
		.bind(image.file_name)
		.bind(image.file_size)
		.bind(image.mime_type)
		.bind(image.width)
		.bind(image.height)
		.bind(image.alt_text)
		.fetch_one(&self.db)
		.await?;

		Ok(row)
	}

	async fn delete_media(&self, id: Uuid) -> StoreResult<MediaImage> {
		let row =
			sqlx::query_as::<_, MediaImage>("DELETE FROM media_images WHERE id = $1 RETURNING *")
				.bind(id)
				.fetch_one(&self.db)
				.await?;

		Ok(row)
	}
}
