use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventCategory {
	pub id: Uuid,
	pub name: String,
	pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
	pub id: Uuid,
	pub title: String,
	pub slug: String,
	pub description: Option<String>,
	pub category_id: Option<Uuid>,
	pub location: Option<String>,
	pub venue: Option<String>,
	pub start_date: Option<NaiveDate>,
	pub end_date: Option<NaiveDate>,
	pub cover_image_url: Option<String>,
	pub is_published: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Event {
	/// True when the event's date range touches the given calendar month.
	/// Undated events match no month.
	pub fn overlaps_month(&self, year: i32, month: u32) -> bool {
		let (Some(first), Some(last)) = month_bounds(year, month) else {
			return false;
		};
		match (self.start_date, self.end_date) {
			(Some(start), Some(end)) => start <= last && end >= first,
			(Some(day), None) | (None, Some(day)) => day >= first && day <= last,
			(None, None) => false,
		}
	}
}

pub fn month_bounds(year: i32, month: u32) -> (Option<NaiveDate>, Option<NaiveDate>) {
	let first = NaiveDate::from_ymd_opt(year, month, 1);
	let next = if month == 12 {
		NaiveDate::from_ymd_opt(year + 1, 1, 1)
	} else {
		NaiveDate::from_ymd_opt(year, month + 1, 1)
	};
	(first, next.and_then(|d| d.pred_opt()))
}

/// Body of POST/PUT/PATCH on events. Absent fields keep their current value
/// on update.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EventPayload {
	pub title: Option<String>,
	pub slug: Option<String>,
	pub description: Option<String>,
	pub category_id: Option<Uuid>,
	pub location: Option<String>,
	pub venue: Option<String>,
	pub start_date: Option<NaiveDate>,
	pub end_date: Option<NaiveDate>,
	pub cover_image_url: Option<String>,
	pub is_published: Option<bool>,
}

/// Complete set of writable event columns.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
	pub title: String,
	pub slug: String,
	pub description: Option<String>,
	pub category_id: Option<Uuid>,
	pub location: Option<String>,
	pub venue: Option<String>,
	pub start_date: Option<NaiveDate>,
	pub end_date: Option<NaiveDate>,
	pub cover_image_url: Option<String>,
	pub is_published: bool,
}

impl From<&Event> for EventRecord {
	fn from(e: &Event) -> Self {
		EventRecord {
			title: e.title.clone(),
			slug: e.slug.clone(),
			description: e.description.clone(),
			category_id: e.category_id,
			location: e.location.clone(),
			venue: e.venue.clone(),
			start_date: e.start_date,
			end_date: e.end_date,
			cover_image_url: e.cover_image_url.clone(),
			is_published: e.is_published,
		}
	}
}

/// `/api/events/{key}` accepts either the generated id or the slug.
#[derive(Debug, Clone, PartialEq)]
pub enum EventLookup {
	Id(Uuid),
	Slug(String),
}

impl EventLookup {
	pub fn parse(key: &str) -> Self {
		match Uuid::parse_str(key) {
			Ok(id) => EventLookup::Id(id),
			Err(_) => EventLookup::Slug(key.to_string()),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
	pub category_id: Option<Uuid>,
	pub month: Option<(i32, u32)>,
	pub published: Option<bool>,
	pub limit: i64,
	pub offset: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventImage {
	pub id: Uuid,
	pub event_id: Uuid,
	pub file_path: String,
	pub public_url: String,
	pub file_name: String,
	pub file_size: i64,
	pub mime_type: String,
	pub width: Option<i32>,
	pub height: Option<i32>,
	pub sort_order: i32,
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEventImage {
	pub event_id: Uuid,
	pub file_path: String,
	pub public_url: String,
	pub file_name: String,
	pub file_size: i64,
	pub mime_type: String,
	pub width: Option<i32>,
	pub height: Option<i32>,
	pub sort_order: i32,
}

/// Event as returned by the API, with its category fetched separately.
#[derive(Debug, Clone, Serialize)]
pub struct EventView {
	#[serde(flatten)]
	pub event: Event,
	pub category: Option<EventCategory>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub images: Option<Vec<EventImage>>,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn event(start: Option<(i32, u32, u32)>, end: Option<(i32, u32, u32)>) -> Event {
		let date = |d: Option<(i32, u32, u32)>| {
			d.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
		};
		Event {
			id: Uuid::new_v4(),
			title: "Expo".into(),
			slug: "expo".into(),
			description: None,
			category_id: None,
			location: None,
			venue: None,
			start_date: date(start),
			end_date: date(end),
			cover_image_url: None,
			is_published: true,
			created_at: Utc::now(),
			updated_at: Utc::now(),
		}
	}

	#[test]
	fn month_overlap() {
		let spanning = event(Some((2025, 1, 28)), Some((2025, 2, 3)));
		assert!(spanning.overlaps_month(2025, 1));
		assert!(spanning.overlaps_month(2025, 2));
		assert!(!spanning.overlaps_month(2025, 3));

		let single = event(Some((2025, 12, 31)), None);
		assert!(single.overlaps_month(2025, 12));
		assert!(!single.overlaps_month(2026, 1));

		assert!(!event(None, None).overlaps_month(2025, 1));
	}

	#[test]
	fn lookup_detects_ids() {
		let id = Uuid::new_v4();
		assert_eq!(EventLookup::parse(&id.to_string()), EventLookup::Id(id));
		assert_eq!(
			EventLookup::parse("trade-show-2025"),
			EventLookup::Slug("trade-show-2025".into())
		);
	}
}
