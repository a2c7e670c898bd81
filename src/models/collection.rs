use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::Content;
use crate::utils::{FieldSpec, Schema};

/// Ordered lists the admin edits item by item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
	Tags,
	Faq,
	Portfolio,
	GroupCompanies,
}

const TAGS: Schema = Schema(&[]);

const FAQ: Schema = Schema(&[FieldSpec::text("answer").required()]);

const PORTFOLIO: Schema = Schema(&[
	FieldSpec::text("description"),
	FieldSpec::text("client_name"),
	FieldSpec::text("stand_size"),
	FieldSpec::url("image_url"),
]);

const GROUP_COMPANIES: Schema = Schema(&[
	FieldSpec::text("description"),
	FieldSpec::url("website_url"),
	FieldSpec::url("logo_url"),
]);

impl Collection {
	pub const ALL: [Collection; 4] = [
		Collection::Tags,
		Collection::Faq,
		Collection::Portfolio,
		Collection::GroupCompanies,
	];

	pub fn key(&self) -> &'static str {
		match self {
			Collection::Tags => "tags",
			Collection::Faq => "faq",
			Collection::Portfolio => "portfolio",
			Collection::GroupCompanies => "group_companies",
		}
	}

	pub fn from_key(key: &str) -> Option<Self> {
		Collection::ALL.into_iter().find(|c| c.key() == key)
	}

	pub fn schema(&self) -> Schema {
		match self {
			Collection::Tags => TAGS,
			Collection::Faq => FAQ,
			Collection::Portfolio => PORTFOLIO,
			Collection::GroupCompanies => GROUP_COMPANIES,
		}
	}

	/// Whether items carry a slug derived from their title.
	pub fn has_slug(&self) -> bool {
		!matches!(self, Collection::Faq)
	}

	/// Content field that receives the public URL of an uploaded image.
	pub fn image_field(&self) -> Option<&'static str> {
		match self {
			Collection::Portfolio => Some("image_url"),
			Collection::GroupCompanies => Some("logo_url"),
			_ => None,
		}
	}

	pub fn public_path(&self) -> &'static str {
		match self {
			Collection::Tags | Collection::Portfolio => "/exhibition-stands",
			Collection::Faq => "/faq",
			Collection::GroupCompanies => "/about",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CollectionItem {
	pub id: Uuid,
	pub collection: String,
	pub title: String,
	pub slug: Option<String>,
	pub content: Json<Content>,
	pub image_path: Option<String>,
	pub sort_order: i32,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Body of the create/update form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ItemDraft {
	pub title: Option<String>,
	pub slug: Option<String>,
	pub content: Option<Content>,
	pub sort_order: Option<i32>,
}

/// Validated values written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
	pub title: String,
	pub slug: Option<String>,
	pub content: Content,
	pub image_path: Option<String>,
	pub sort_order: i32,
}
