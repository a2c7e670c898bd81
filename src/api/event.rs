use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::api::PgStore;
use crate::error::StoreError;
use crate::models::{
	month_bounds, Count, Event, EventCategory, EventFilter, EventImage, EventLookup, EventRecord,
	NewEventImage,
};
use crate::services::{EventStore, StoreResult};

const EVENT_FILTER: &str = "
	WHERE ($1::uuid IS NULL OR category_id = $1)
	AND ($2::boolean IS NULL OR is_published = $2)
	AND ($3::date IS NULL OR (
		COALESCE(start_date, end_date) <= $4 AND COALESCE(end_date, start_date) >= $3
	))";

fn filter_bounds(filter: &EventFilter) -> (Option<NaiveDate>, Option<NaiveDate>) {
	match filter.month {
		Some((year, month)) => month_bounds(year, month),
		None => (None, None),
	}
}

#[async_trait]
impl EventStore for PgStore {
	async fn list_categories(&self) -> StoreResult<Vec<EventCategory>> {
		let categories = sqlx::query_as::<_, EventCategory>(
			"SELECT id, name, slug FROM event_categories ORDER BY name",
		)
		.fetch_all(&self.db)
		.await?;

		Ok(categories)
	}

	async fn get_categories(&self, ids: &[Uuid]) -> StoreResult<Vec<EventCategory>> {
		if ids.is_empty() {
			return Ok(Vec::new());
		}
		let categories = sqlx::query_as::<_, EventCategory>(
			"SELECT id, name, slug FROM event_categories WHERE id = ANY($1)",
		)
		.bind(ids)
		.fetch_all(&self.db)
		.await?;

		Ok(categories)
	}

	async fn list_events(&self, filter: &EventFilter) -> StoreResult<(Vec<Event>, i64)> {
		let (first_day, last_day) = filter_bounds(filter);

		let count_sql = format!("SELECT count(*) AS count FROM events {}", EVENT_FILTER);
		let count = sqlx::query_as::<_, Count>(&count_sql)
			.bind(filter.category_id)
			.bind(filter.published)
			.bind(first_day)
			.bind(last_day)
			.fetch_one(&self.db)
			.await?;

		let list_sql = format!(
			"SELECT * FROM events {}
			ORDER BY start_date NULLS FIRST, created_at
			LIMIT $5 OFFSET $6",
			EVENT_FILTER
		);
		let events = sqlx::query_as::<_, Event>(&list_sql)
			.bind(filter.category_id)
			.bind(filter.published)
			.bind(first_day)
			.bind(last_day)
			.bind(filter.limit)
			.bind(filter.offset)
			.fetch_all(&self.db)
			.await?;

		Ok((events, count.count.unwrap_or(0)))
	}

	async fn get_event(&self, lookup: &EventLookup) -> StoreResult<Event> {
		let query = match lookup {
			EventLookup::Id(id) => {
				sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1").bind(*id)
			}
			EventLookup::Slug(slug) => {
				sqlx::query_as::<_, Event>("SELECT * FROM events WHERE slug = $1")
					.bind(slug.clone())
			}
		};

		Ok(query.fetch_one(&self.db).await?)
	}

	async fn insert_event(&self, record: EventRecord) -> StoreResult<Event> {
		let event = sqlx::query_as::<_, Event>(
			"INSERT INTO events
			(id, title, slug, description, category_id, location, venue,
			 start_date, end_date, cover_image_url, is_published)
			VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
			RETURNING *",
		)
		.bind(Uuid::new_v4())
		.bind(record.title)
		.bind(record.slug)
		.bind(record.description)
		.bind(record.category_id)
		.bind(record.location)
		.bind(record.venue)
		.bind(record.start_date)
		.bind(record.end_date)
		.bind(record.cover_image_url)
		.bind(record.is_published)
		.fetch_one(&self.db)
		.await?;

		Ok(event)
	}

	async fn update_event(&self, id: Uuid, record: EventRecord) -> StoreResult<Event> {
		let event = sqlx::query_as::<_, Event>(
			"UPDATE events
			SET title = $2, slug = $3, description = $4, category_id = $5, location = $6,
				venue = $7, start_date = $8, end_date = $9, cover_image_url = $10,
				is_published = $11, updated_at = NOW()
			WHERE id = $1
			RETURNING *",
		)
		.bind(id)
		.bind(record.title)
		.bind(record.slug)
		.bind(record.description)
		.bind(record.category_id)
		.bind(record.location)
		.bind(record.venue)
		.bind(record.start_date)
		.bind(record.end_date)
		.bind(record.cover_image_url)
		.bind(record.is_published)
		.fetch_one(&self.db)
		.await?;

		Ok(event)
	}

	async fn delete_event(&self, id: Uuid) -> StoreResult<Vec<EventImage>> {
		let mut tx = self.db.begin().await?;

		let images = sqlx::query_as::<_, EventImage>(
			"DELETE FROM event_images WHERE event_id = $1 RETURNING *",
		)
		.bind(id)
		.fetch_all(&mut *tx)
		.await?;

		let deleted = sqlx::query("DELETE FROM events WHERE id = $1")
			.bind(id)
			.execute(&mut *tx)
			.await?;

		if deleted.rows_affected() == 0 {
			// dropping the transaction rolls the image delete back
			return Err(StoreError::NotFound);
		}

		tx.commit().await?;

		Ok(images)
	}

	async fn list_event_images(&self, event_id: Uuid) -> StoreResult<Vec<EventImage>> {
		let images = sqlx::query_as::<_, EventImage>(
			"SELECT * FROM event_images WHERE event_id = $1 ORDER BY sort_order, created_at",
		)
		.bind(event_id)
		.fetch_all(&self.db)
		.await?;

		Ok(images)
	}

	async fn insert_event_image(&self, image: NewEventImage) -> StoreResult<EventImage> {
		let row = sqlx::query_as::<_, EventImage>(
			"INSERT INTO event_images
			(id, event_id, file_path, public_url, file_name, file_size, mime_type,
			 width, height, sort_order)
			VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
			RETURNING *",
		)
		.bind(Uuid::new_v4())
		.bind(image.event_id)
		.bind(image.file_path)
		.bind(image.public_url)
		.bind(image.file_name)
		.bind(image.file_size)
		.bind(image.mime_type)
		.bind(image.width)
		.bind(image.height)
		.bind(image.sort_order)
		.fetch_one(&self.db)
		.await?;

		Ok(row)
	}

	async fn delete_event_image(&self, event_id: Uuid, image_id: Uuid) -> StoreResult<EventImage> {
		let row = sqlx::query_as::<_, EventImage>(
			"DELETE FROM event_images WHERE event_id = $1 AND id = $2 RETURNING *",
		)
		.bind(event_id)
		.bind(image_id)
		.fetch_one(&self.db)
		.await?;

		Ok(row)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use sqlx::PgPool;

	fn record(title: &str, slug: &str) -> EventRecord {
		EventRecord {
			title: title.to_string(),
			slug: slug.to_string(),
			description: None,
			category_id: None,
			location: Some("Dubai".into()),
			venue: None,
			start_date: NaiveDate::from_ymd_opt(2025, 2, 17),
			end_date: NaiveDate::from_ymd_opt(2025, 2, 21),
			cover_image_url: None,
			is_published: true,
		}
	}

	fn image(event_id: Uuid, sort_order: i32) -> NewEventImage {
		NewEventImage {
			event_id,
			file_path: format!("events/{}/{}-stand.png", event_id, sort_order),
			public_url: format!("https://cdn.test/events/{}/{}-stand.png", event_id, sort_order),
			file_name: "stand.png".into(),
			file_size: 3,
			mime_type: "image/png".into(),
			width: None,
			height: None,
			sort_order,
		}
	}

	#[sqlx::test(migrations = "./migrations")]
	#[ignore = "requires DATABASE_URL pointing at Postgres"]
	async fn delete_returns_the_removed_images(pool: PgPool) -> StoreResult<()> {
		let store = PgStore::new(pool);
		let event = store.insert_event(record("Gulfood", "gulfood")).await?;
		store.insert_event_image(image(event.id, 0)).await?;
		store.insert_event_image(image(event.id, 1)).await?;

		let removed = store.delete_event(event.id).await?;
		assert_eq!(removed.len(), 2);
		assert_eq!(
			store.get_event(&EventLookup::Id(event.id)).await,
			Err(StoreError::NotFound)
		);
		assert!(store.list_event_images(event.id).await?.is_empty());
		Ok(())
	}

	#[sqlx::test(migrations = "./migrations")]
	#[ignore = "requires DATABASE_URL pointing at Postgres"]
	async fn deleting_a_missing_event_changes_nothing(pool: PgPool) -> StoreResult<()> {
		let store = PgStore::new(pool);
		let kept = store.insert_event(record("Big 5", "big-5")).await?;
		store.insert_event_image(image(kept.id, 0)).await?;

		assert_eq!(store.delete_event(Uuid::new_v4()).await, Err(StoreError::NotFound));
		assert_eq!(store.list_event_images(kept.id).await?.len(), 1);
		Ok(())
	}

	#[sqlx::test(migrations = "./migrations")]
	#[ignore = "requires DATABASE_URL pointing at Postgres"]
	async fn image_for_a_missing_event_violates_its_key(pool: PgPool) -> StoreResult<()> {
		let store = PgStore::new(pool);
		let err = store
			.insert_event_image(image(Uuid::new_v4(), 0))
			.await
			.unwrap_err();
		assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
		Ok(())
	}
}
