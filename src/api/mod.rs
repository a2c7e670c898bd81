pub mod collection;
pub mod event;
pub mod media;
pub mod section;

use sqlx::{Pool, Postgres};

/// Store backed by the site's Postgres database.
#[derive(Clone)]
pub struct PgStore {
	db: Pool<Postgres>,
}

impl PgStore {
	pub fn new(db: Pool<Postgres>) -> Self {
		Self { db }
	}
}
