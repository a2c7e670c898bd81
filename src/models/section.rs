use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use uuid::Uuid;

use crate::utils::{FieldSpec, Schema};

pub type Content = Map<String, Value>;

/// One editable block of the public site. Each kind keeps its rows in
/// `site_sections` under its key; only one of them is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
	Hero,
	About,
	CompanyProfile,
	Services,
	StandsIntro,
	EventsIntro,
	ContactCta,
}

const HERO: Schema = Schema(&[
	FieldSpec::text("heading").required(),
	FieldSpec::text("subheading"),
	FieldSpec::url("background_image_url"),
	FieldSpec::url("video_url"),
	FieldSpec::text("cta_text"),
	FieldSpec::url("cta_url"),
	FieldSpec::color("overlay_color"),
]);

const ABOUT: Schema = Schema(&[
	FieldSpec::text("heading").required(),
	FieldSpec::text("paragraph_one").required(),
	FieldSpec::text("paragraph_two"),
	FieldSpec::url("image_url"),
]);

const COMPANY_PROFILE: Schema = Schema(&[
	FieldSpec::text("heading").required(),
	FieldSpec::text("description").required(),
	FieldSpec::url("document_url"),
	FieldSpec::url("cover_image_url"),
]);

const SERVICES: Schema = Schema(&[
	FieldSpec::text("heading").required(),
	FieldSpec::text("intro").required(),
	FieldSpec::url("image_url"),
]);

const STANDS_INTRO: Schema = Schema(&[
	FieldSpec::text("heading").required(),
	FieldSpec::text("intro").required(),
	FieldSpec::color("background_color"),
	FieldSpec::url("image_url"),
]);

const EVENTS_INTRO: Schema = Schema(&[
	FieldSpec::text("heading").required(),
	FieldSpec::text("intro"),
]);

const CONTACT_CTA: Schema = Schema(&[
	FieldSpec::text("heading").required(),
	FieldSpec::text("text"),
	FieldSpec::text("button_text").required(),
	FieldSpec::url("button_url").required(),
	FieldSpec::color("background_color"),
]);

impl SectionKind {
	pub const ALL: [SectionKind; 7] = [
		SectionKind::Hero,
		SectionKind::About,
		SectionKind::CompanyProfile,
		SectionKind::Services,
		SectionKind::StandsIntro,
		SectionKind::EventsIntro,
		SectionKind::ContactCta,
	];

	pub fn key(&self) -> &'static str {
		match self {
			SectionKind::Hero => "hero",
			SectionKind::About => "about",
			SectionKind::CompanyProfile => "company_profile",
			SectionKind::Services => "services",
			SectionKind::StandsIntro => "stands_intro",
			SectionKind::EventsIntro => "events_intro",
			SectionKind::ContactCta => "contact_cta",
		}
	}

	pub fn from_key(key: &str) -> Option<Self> {
		SectionKind::ALL.into_iter().find(|k| k.key() == key)
	}

	pub fn schema(&self) -> Schema {
		match self {
			SectionKind::Hero => HERO,
			SectionKind::About => ABOUT,
			SectionKind::CompanyProfile => COMPANY_PROFILE,
			SectionKind::Services => SERVICES,
			SectionKind::StandsIntro => STANDS_INTRO,
			SectionKind::EventsIntro => EVENTS_INTRO,
			SectionKind::ContactCta => CONTACT_CTA,
		}
	}

	/// Page of the public site that renders this section.
	pub fn public_path(&self) -> &'static str {
		match self {
			SectionKind::Hero => "/",
			SectionKind::About => "/about",
			SectionKind::CompanyProfile => "/company-profile",
			SectionKind::Services => "/services",
			SectionKind::StandsIntro => "/exhibition-stands",
			SectionKind::EventsIntro => "/events",
			SectionKind::ContactCta => "/contact",
		}
	}

	/// Placeholder content written by an explicit seed. Required fields get
	/// a value so the seeded row passes the schema.
	pub fn seed_content(&self) -> Content {
		let mut content = self.schema().defaults();
		let placeholders: &[(&str, &str)] = match self {
			SectionKind::Hero => &[
				("heading", "Exhibition stands that stand out"),
				("cta_text", "Get a quote"),
				("cta_url", "/contact"),
			],
			SectionKind::About => &[
				("heading", "About us"),
				("paragraph_one", "We design and build exhibition stands."),
			],
			SectionKind::CompanyProfile => &[
				("heading", "Company profile"),
				("description", "Download our company profile."),
			],
			SectionKind::Services => &[
				("heading", "Our services"),
				("intro", "Design, production and installation."),
			],
			SectionKind::StandsIntro => &[
				("heading", "Exhibition stands"),
				("intro", "Custom, modular and system stands."),
			],
			SectionKind::EventsIntro => &[("heading", "Upcoming events")],
			SectionKind::ContactCta => &[
				("heading", "Planning your next show?"),
				("button_text", "Contact us"),
				("button_url", "/contact"),
			],
		};
		for (name, value) in placeholders {
			content.insert(name.to_string(), Value::String(value.to_string()));
		}
		content
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Section {
	pub id: Uuid,
	pub section_key: String,
	pub content: Json<Content>,
	pub is_active: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}
