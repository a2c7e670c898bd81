use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use std::error::Error;

pub type RevalidateError = Box<dyn Error + Send + Sync>;

/// Invalidates a rendered page of the public site.
#[async_trait]
pub trait Revalidator: Send + Sync {
	async fn revalidate(&self, path: &str) -> Result<(), RevalidateError>;
}

pub struct HttpRevalidator {
	client: Client,
	site_url: String,
	secret: String,
}

impl HttpRevalidator {
	pub fn new(site_url: &str, secret: &str) -> Self {
		Self {
			client: Client::new(),
			site_url: site_url.trim_end_matches('/').to_string(),
			secret: secret.to_string(),
		}
	}

	pub fn hook_url(&self, path: &str) -> Result<String, RevalidateError> {
		let query =
			serde_urlencoded::to_string(&[("path", path), ("secret", self.secret.as_str())])?;
		Ok(format!("{}/api/revalidate?{}", self.site_url, query))
	}
}

#[async_trait]
impl Revalidator for HttpRevalidator {
	async fn revalidate(&self, path: &str) -> Result<(), RevalidateError> {
		if self.secret.is_empty() {
			info!("revalidation hook not configured, skipping {}", path);
			return Ok(());
		}
		let response = self.client.post(self.hook_url(path)?).send().await?;
		if !response.status().is_success() {
			return Err(format!("revalidate {} returned {}", path, response.status()).into());
		}
		Ok(())
	}
}

/// Revalidates each path in turn. Failures are logged and never returned:
/// a saved edit stays saved even when the public page is now stale.
pub async fn revalidate_paths<R>(revalidator: &R, paths: &[String])
where
	R: Revalidator + ?Sized,
{
	for path in paths {
		if let Err(e) = revalidator.revalidate(path).await {
			warn!("failed to revalidate {}: {}", path, e);
		}
	}
}
