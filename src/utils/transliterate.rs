use translit::{CharsMapping, Transliterator};

pub struct Slug {}

impl Slug {
	/// Lowercase latin slug: cyrillic is transliterated, every run of other
	/// characters becomes a single `-`, no leading or trailing `-`.
	pub fn generate(name: &str) -> String {
		let table: CharsMapping = [
			("а", "a"),
			("б", "b"),
			("в", "v"),
			("г", "g"),
			("д", "d"),
			("е", "e"),
			("ё", "e"),
			("ж", "zh"),
			("з", "z"),
			("и", "i"),
			("й", "i"),
			("к", "k"),
			("л", "l"),
			("м", "m"),
			("н", "n"),
			("о", "o"),
			("п", "p"),
			("р", "r"),
			("с", "s"),
			("т", "t"),
			("у", "u"),
			("ф", "f"),
			("х", "h"),
			("ц", "c"),
			("ч", "ch"),
			("ш", "sh"),
			("щ", "shch"),
			("ы", "y"),
			("э", "e"),
			("ю", "yu"),
			("я", "ya"),
			("ъ", ""),
			("ь", ""),
		]
		.iter()
		.cloned()
		.collect();

		let transliterator = Transliterator::new(table);
		let latin = transliterator.convert(&name.to_lowercase(), false);

		let mut slug = String::with_capacity(latin.len());
		let mut pending_dash = false;
		for c in latin.chars() {
			if c.is_ascii_alphanumeric() {
				if pending_dash && !slug.is_empty() {
					slug.push('-');
				}
				pending_dash = false;
				slug.push(c.to_ascii_lowercase());
			} else {
				pending_dash = true;
			}
		}
		slug
	}

	/// An explicit, non-blank slug is kept as given; otherwise one is derived
	/// from `source`.
	pub fn resolve(explicit: Option<&str>, source: &str) -> String {
		match explicit {
			Some(s) if !s.trim().is_empty() => s.to_string(),
			_ => Slug::generate(source),
		}
	}
}
