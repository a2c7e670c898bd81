use std::env;
use thiserror::Error;

const MB: u64 = 1024 * 1024;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
	#[error("{0} not set")]
	Missing(&'static str),
	#[error("{name} has an invalid value: {value}")]
	Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
	pub database_url: String,
	pub database_max_connections: u32,
	pub storage_url: String,
	pub storage_service_key: String,
	pub site_url: String,
	pub revalidate_secret: String,
	pub admin_api_token: String,
	pub admin_auth_enabled: bool,
	pub host: String,
	pub port: u16,
	pub image_max_bytes: u64,
	pub document_max_bytes: u64,
	pub processing_type: String,
}

impl Config {
	pub fn init() -> Result<Config, ConfigError> {
		Config::from_lookup(|name| env::var(name).ok())
	}

	/// Builds the config from any variable source; `init` passes the process env.
	pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let required = |name: &'static str| {
			lookup(name)
				.filter(|v| !v.is_empty())
				.ok_or(ConfigError::Missing(name))
		};
		let optional = |name: &str, default: &str| lookup(name).unwrap_or(default.to_string());

		let admin_auth_enabled =
			parse::<bool>("ADMIN_AUTH_ENABLED", optional("ADMIN_AUTH_ENABLED", "true"))?;
		let admin_api_token = if admin_auth_enabled {
			required("ADMIN_API_TOKEN")?
		} else {
			optional("ADMIN_API_TOKEN", "")
		};

		Ok(Config {
			database_url: required("DATABASE_URL")?,
			database_max_connections: parse(
				"DATABASE_MAX_CONNECTIONS",
				optional("DATABASE_MAX_CONNECTIONS", "10"),
			)?,
			storage_url: required("STORAGE_URL")?.trim_end_matches('/').to_string(),
			storage_service_key: required("STORAGE_SERVICE_KEY")?,
			site_url: required("SITE_URL")?.trim_end_matches('/').to_string(),
			revalidate_secret: optional("REVALIDATE_SECRET", ""),
			admin_api_token,
			admin_auth_enabled,
			host: optional("HOST", "0.0.0.0"),
			port: parse("PORT", optional("PORT", "8080"))?,
			image_max_bytes: parse(
				"IMAGE_MAX_BYTES",
				optional("IMAGE_MAX_BYTES", &(10 * MB).to_string()),
			)?,
			document_max_bytes: parse(
				"DOCUMENT_MAX_BYTES",
				optional("DOCUMENT_MAX_BYTES", &(50 * MB).to_string()),
			)?,
			processing_type: optional("PROCESSING_TYPE", "server"),
		})
	}
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
	value
		.trim()
		.parse::<T>()
		.map_err(|_| ConfigError::Invalid { name, value })
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	fn base() -> HashMap<String, String> {
		vars(&[
			("DATABASE_URL", "postgres://localhost/stands"),
			("STORAGE_URL", "https://storage.example.com/"),
			("STORAGE_SERVICE_KEY", "service-key"),
			("SITE_URL", "https://stands.example.com/"),
			("ADMIN_API_TOKEN", "secret"),
		])
	}

	#[test]
	fn defaults_are_applied() {
		let env = base();
		let config = Config::from_lookup(|k| env.get(k).cloned()).unwrap();
		assert_eq!(config.port, 8080);
		assert_eq!(config.image_max_bytes, 10 * MB);
		assert_eq!(config.document_max_bytes, 50 * MB);
		assert_eq!(config.site_url, "https://stands.example.com");
		assert_eq!(config.storage_url, "https://storage.example.com");
		assert!(config.admin_auth_enabled);
		assert_eq!(config.processing_type, "server");
	}

	#[test]
	fn missing_database_url_fails() {
		let mut env = base();
		env.remove("DATABASE_URL");
		let err = Config::from_lookup(|k| env.get(k).cloned()).unwrap_err();
		assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
	}

	#[test]
	fn token_only_required_with_auth() {
		let mut env = base();
		env.remove("ADMIN_API_TOKEN");
		assert_eq!(
			Config::from_lookup(|k| env.get(k).cloned()).unwrap_err(),
			ConfigError::Missing("ADMIN_API_TOKEN")
		);

		env.insert("ADMIN_AUTH_ENABLED".into(), "false".into());
		let config = Config::from_lookup(|k| env.get(k).cloned()).unwrap();
		assert!(!config.admin_auth_enabled);
	}

	#[test]
	fn invalid_port_is_reported() {
		let mut env = base();
		env.insert("PORT".into(), "eighty".into());
		assert!(matches!(
			Config::from_lookup(|k| env.get(k).cloned()),
			Err(ConfigError::Invalid { name: "PORT", .. })
		));
	}
}
