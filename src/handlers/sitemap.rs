use actix_web::{http::header::ContentType, web, HttpResponse};

use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::processing::{sitemap_processing, SitemapError};

pub async fn sitemap_xml(state: web::Data<AppState>) -> AppResult<HttpResponse> {
	let xml = sitemap_processing(&*state.store, &state.config.site_url)
		.await
		.map_err(|e| match e {
			SitemapError::Store(store) => AppError::from(store),
			other => AppError::Internal(other.to_string()),
		})?;

	Ok(HttpResponse::Ok().content_type(ContentType::xml()).body(xml))
}
