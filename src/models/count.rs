use serde::Deserialize;
use sqlx::FromRow;

/// Result row of `SELECT count(*) AS count ...`.
#[derive(Deserialize, Debug, FromRow, Default)]
pub struct Count {
	pub count: Option<i64>,
}
