use log::info;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::models::{Content, Section, SectionKind};
use crate::services::{revalidate_paths, Revalidator, SectionStore};
use crate::utils::FieldKind;

#[derive(Debug, Clone, PartialEq)]
pub enum BinderState {
	Loading,
	Empty,
	Ready(Section),
	Saving,
	Error(String),
}

/// Editing session for one section: load the active row, validate and save
/// edits, revalidate the public page afterwards.
///
/// Concurrent editors are last-write-wins; the store keeps exactly one
/// active row per section whatever order the saves land in.
pub struct SectionBinder<'a, S: ?Sized, R: ?Sized> {
	kind: SectionKind,
	store: &'a S,
	revalidator: &'a R,
	state: BinderState,
	row: Option<Section>,
}

impl<'a, S, R> SectionBinder<'a, S, R>
where
	S: SectionStore + ?Sized,
	R: Revalidator + ?Sized,
{
	pub fn new(kind: SectionKind, store: &'a S, revalidator: &'a R) -> Self {
		Self {
			kind,
			store,
			revalidator,
			state: BinderState::Loading,
			row: None,
		}
	}

	pub fn state(&self) -> &BinderState {
		&self.state
	}

	/// Last row loaded or saved, kept across failed saves.
	pub fn row(&self) -> Option<&Section> {
		self.row.as_ref()
	}

	/// Reads the active row. Never writes, even when the section is empty.
	pub async fn load(&mut self) -> &BinderState {
		self.state = BinderState::Loading;
		self.state = match self.store.active_section(self.kind).await {
			Ok(Some(row)) => {
				self.row = Some(row.clone());
				BinderState::Ready(row)
			}
			Ok(None) => {
				self.row = None;
				BinderState::Empty
			}
			Err(e) => BinderState::Error(AppError::from(e).to_string()),
		};
		&self.state
	}

	/// Validates `form` and writes it as the active row. A rejected form
	/// never reaches the store. The submitted values are not rolled back in
	/// the caller on failure; the binder only records the error.
	pub async fn save(&mut self, form: Content) -> AppResult<Section> {
		if let Err(message) = self.kind.schema().validate(&form) {
			self.state = BinderState::Error(message.clone());
			return Err(AppError::BadRequest(message));
		}

		self.state = BinderState::Saving;
		let id = self.row.as_ref().map(|row| row.id);
		match self.store.save_active_section(self.kind, id, form).await {
			Ok(row) => {
				self.row = Some(row.clone());
				self.state = BinderState::Ready(row.clone());
				revalidate_paths(self.revalidator, &[self.kind.public_path().to_string()]).await;
				Ok(row)
			}
			Err(e) => {
				let err = AppError::from(e);
				self.state = BinderState::Error(err.to_string());
				Err(err)
			}
		}
	}

	/// Writes the kind's placeholder content when the section has no active
	/// row. Returns the row and whether it was created.
	pub async fn seed_default(&mut self) -> AppResult<(Section, bool)> {
		if let BinderState::Error(message) = self.load().await {
			return Err(AppError::Internal(message.clone()));
		}
		if let Some(row) = &self.row {
			return Ok((row.clone(), false));
		}

		info!("seeding default content for section {}", self.kind.key());
		let row = self.save(self.kind.seed_content()).await?;
		Ok((row, true))
	}

	/// Stores an uploaded file's public URL in one `url` field and saves.
	pub async fn set_field_url(&mut self, field: &str, url: &str) -> AppResult<Section> {
		match self.kind.schema().field(field) {
			Some(spec) if spec.kind == FieldKind::Url => {}
			_ => {
				return Err(AppError::BadRequest(format!(
					"Field {} does not accept uploads.",
					field
				)))
			}
		}

		if matches!(self.state, BinderState::Loading) {
			if let BinderState::Error(message) = self.load().await {
				return Err(AppError::Internal(message.clone()));
			}
		}

		let mut content = match &self.row {
			Some(row) => row.content.0.clone(),
			None => self.kind.seed_content(),
		};
		content.insert(field.to_string(), Value::String(url.to_string()));
		self.save(content).await
	}
}
