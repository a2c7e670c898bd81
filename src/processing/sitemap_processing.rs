use sitemap::structs::UrlEntry;
use sitemap::writer::SiteMapWriter;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::error::StoreError;
use crate::models::{Collection, EventFilter, SectionKind};
use crate::services::ContentStore;

const STATIC_PAGES: &[&str] = &["/", "/events", "/exhibition-stands", "/faq", "/contact"];
const EVENTS_PAGE_SIZE: i64 = 200;

#[derive(Error, Debug)]
pub enum SitemapError {
	#[error("{0}")]
	Store(#[from] StoreError),
	#[error("unable to write sitemap: {0}")]
	Write(String),
}

/// Public page paths: static pages, section pages, published events and
/// portfolio stands. Sorted, no duplicates.
pub async fn public_paths<S>(store: &S) -> Result<Vec<String>, StoreError>
where
	S: ContentStore + ?Sized,
{
	let mut paths: BTreeSet<String> = STATIC_PAGES.iter().map(|p| p.to_string()).collect();
	for kind in SectionKind::ALL {
		paths.insert(kind.public_path().to_string());
	}

	let mut filter = EventFilter {
		published: Some(true),
		limit: EVENTS_PAGE_SIZE,
		..Default::default()
	};
	loop {
		let (events, total) = store.list_events(&filter).await?;
		let fetched = events.len() as i64;
		for event in events {
			paths.insert(format!("/events/{}", event.slug));
		}
		filter.offset += fetched;
		if fetched == 0 || filter.offset >= total {
			break;
		}
	}

	for item in store.list_items(Collection::Portfolio).await? {
		if let Some(slug) = item.slug {
			paths.insert(format!("/exhibition-stands/{}", slug));
		}
	}

	Ok(paths.into_iter().collect())
}

pub async fn sitemap_processing<S>(store: &S, site_url: &str) -> Result<String, SitemapError>
where
	S: ContentStore + ?Sized,
{
	let paths = public_paths(store).await?;
	let site_url = site_url.trim_end_matches('/');

	let mut output: Vec<u8> = Vec::new();
	{
		let sitemap_writer = SiteMapWriter::new(&mut output);
		let mut urlwriter = sitemap_writer
			.start_urlset()
			.map_err(|e| SitemapError::Write(format!("{:?}", e)))?;

		for path in &paths {
			let url = if path == "/" {
				format!("{}/", site_url)
			} else {
				format!("{}{}", site_url, path)
			};
			urlwriter
				.url(UrlEntry::builder().loc(&url))
				.map_err(|e| SitemapError::Write(format!("{:?}", e)))?;
		}

		urlwriter
			.end()
			.map_err(|e| SitemapError::Write(format!("{:?}", e)))?;
	}

	String::from_utf8(output).map_err(|e| SitemapError::Write(e.to_string()))
}
