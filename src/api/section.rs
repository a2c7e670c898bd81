use async_trait::async_trait;
use sqlx::types::Json;
use uuid::Uuid;

use crate::api::PgStore;
use crate::models::{Content, Section, SectionKind};
use crate::services::{SectionStore, StoreResult};

#[async_trait]
impl SectionStore for PgStore {
	async fn active_section(&self, kind: SectionKind) -> StoreResult<Option<Section>> {
		let section = sqlx::query_as::<_, Section>(
			"SELECT * FROM site_sections
			WHERE section_key = $1 AND is_active
			ORDER BY updated_at DESC LIMIT 1",
		)
		.bind(kind.key())
		.fetch_optional(&self.db)
		.await?;

		Ok(section)
	}

	async fn save_active_section(
		&self,
		kind: SectionKind,
		id: Option<Uuid>,
		content: Content,
	) -> StoreResult<Section> {
		let id = id.unwrap_or_else(Uuid::new_v4);
		let mut tx = self.db.begin().await?;

		// serialises writers of the same section until commit
		sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
			.bind(kind.key())
			.execute(&mut *tx)
			.await?;

		sqlx::query(
			"UPDATE site_sections SET is_active = FALSE, updated_at = NOW()
			WHERE section_key = $1 AND is_active AND id <> $2",
		)
		.bind(kind.key())
		.bind(id)
		.execute(&mut *tx)
		.await?;

		let section = sqlx::query_as::<_, Section>(
			"INSERT INTO site_sections (id, section_key, content, is_active)
			VALUES ($1, $2, $3, TRUE)
			ON CONFLICT (id) DO UPDATE
			SET content = EXCLUDED.content, is_active = TRUE, updated_at = NOW()
			WHERE site_sections.section_key = EXCLUDED.section_key
			RETURNING *",
		)
		.bind(id)
		.bind(kind.key())
		.bind(Json(content))
		.fetch_one(&mut *tx)
		.await?;

		tx.commit().await?;

		Ok(section)
	}

	async fn section_history(&self, kind: SectionKind) -> StoreResult<Vec<Section>> {
		let sections = sqlx::query_as::<_, Section>(
			"SELECT * FROM site_sections WHERE section_key = $1 ORDER BY updated_at DESC",
		)
		.bind(kind.key())
		.fetch_all(&self.db)
		.await?;

		Ok(sections)
	}
}
