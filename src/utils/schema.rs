use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
	Text,
	Url,
	Color,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
	pub name: &'static str,
	pub kind: FieldKind,
	pub required: bool,
}

impl FieldSpec {
	pub const fn text(name: &'static str) -> Self {
		FieldSpec {
			name,
			kind: FieldKind::Text,
			required: false,
		}
	}

	pub const fn url(name: &'static str) -> Self {
		FieldSpec {
			name,
			kind: FieldKind::Url,
			required: false,
		}
	}

	pub const fn color(name: &'static str) -> Self {
		FieldSpec {
			name,
			kind: FieldKind::Color,
			required: false,
		}
	}

	pub const fn required(self) -> Self {
		FieldSpec {
			required: true,
			..self
		}
	}

	/// `cta_text` -> `Cta text`
	pub fn label(&self) -> String {
		let words = self.name.replace('_', " ");
		let mut chars = words.chars();
		match chars.next() {
			Some(first) => first.to_uppercase().chain(chars).collect(),
			None => String::new(),
		}
	}
}

/// Shape of a JSON content object: every field is a string.
#[derive(Debug, Clone, Copy)]
pub struct Schema(pub &'static [FieldSpec]);

impl Schema {
	pub fn fields(&self) -> &'static [FieldSpec] {
		self.0
	}

	pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
		self.0.iter().find(|f| f.name == name)
	}

	/// Presence checks only. Values are never trimmed or rewritten.
	pub fn validate(&self, content: &Map<String, Value>) -> Result<(), String> {
		for key in content.keys() {
			if self.field(key).is_none() {
				return Err(format!("Unknown field: {}", key));
			}
		}

		for spec in self.0 {
			match content.get(spec.name) {
				None | Some(Value::Null) => {
					if spec.required {
						return Err(format!("{} is required.", spec.label()));
					}
				}
				Some(Value::String(s)) => {
					if spec.required && s.trim().is_empty() {
						return Err(format!("{} is required.", spec.label()));
					}
				}
				Some(_) => return Err(format!("Field {} must be a string", spec.name)),
			}
		}

		Ok(())
	}

	pub fn defaults(&self) -> Map<String, Value> {
		self.0
			.iter()
			.map(|f| (f.name.to_string(), Value::String(String::new())))
			.collect()
	}
}
