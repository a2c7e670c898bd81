use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::handlers::AppState;

/// Extractor for admin-only routes: requires `Authorization: Bearer <token>`
/// matching `ADMIN_API_TOKEN`, unless admin auth is switched off.
pub struct AdminGuard;

impl FromRequest for AdminGuard {
	type Error = AppError;
	type Future = Ready<Result<Self, Self::Error>>;

	fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
		ready(authorize(req))
	}
}

fn authorize(req: &HttpRequest) -> Result<AdminGuard, AppError> {
	let state = req
		.app_data::<web::Data<AppState>>()
		.ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;
	let config = &state.config;

	if !config.admin_auth_enabled {
		return Ok(AdminGuard);
	}

	let token = req
		.headers()
		.get(header::AUTHORIZATION)
		.and_then(|v| v.to_str().ok())
		.and_then(|v| v.strip_prefix("Bearer "))
		.unwrap_or("");

	if !token.is_empty() && tokens_match(token, &config.admin_api_token) {
		Ok(AdminGuard)
	} else {
		Err(AppError::Unauthorized)
	}
}

/// Compares in time that depends only on the length of the inputs.
fn tokens_match(given: &str, expected: &str) -> bool {
	let (given, expected) = (given.as_bytes(), expected.as_bytes());
	if given.len() != expected.len() {
		return false;
	}
	given
		.iter()
		.zip(expected)
		.fold(0u8, |diff, (a, b)| diff | (a ^ b))
		== 0
}

/// Whether the request would pass `AdminGuard`. Public listings use it to
/// decide if unpublished rows may be shown.
pub fn is_admin(req: &HttpRequest) -> bool {
	authorize(req).is_ok()
}
