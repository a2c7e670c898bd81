use actix_web::HttpResponse;
use serde_json::json;

use crate::handlers::ok;

pub async fn health() -> HttpResponse {
	ok(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
