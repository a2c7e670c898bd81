use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use serde_json::json;
use thiserror::Error;

/// Errors coming back from the relational store, classified by error code.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
	#[error("record not found")]
	NotFound,
	#[error("unique violation: {0}")]
	UniqueViolation(String),
	#[error("foreign key violation: {0}")]
	ForeignKeyViolation(String),
	#[error("not null violation: {0}")]
	NotNullViolation(String),
	#[error("permission denied")]
	PermissionDenied,
	#[error("store unavailable: {0}")]
	Unavailable(String),
	#[error("store error: {0}")]
	Other(String),
}

impl StoreError {
	/// Maps a Postgres SQLSTATE (or a REST gateway code) to an error kind.
	/// `detail` is the constraint or column name when the code carries one.
	pub fn from_code(code: &str, detail: &str) -> Self {
		match code {
			"23505" => StoreError::UniqueViolation(detail.to_string()),
			"23503" => StoreError::ForeignKeyViolation(detail.to_string()),
			"23502" => StoreError::NotNullViolation(detail.to_string()),
			"42501" => StoreError::PermissionDenied,
			"PGRST116" => StoreError::NotFound,
			_ => StoreError::Other(format!("{} ({})", detail, code)),
		}
	}
}

impl From<sqlx::Error> for StoreError {
	fn from(e: sqlx::Error) -> Self {
		match e {
			sqlx::Error::RowNotFound => StoreError::NotFound,
			sqlx::Error::Database(db) => {
				let code = db.code().map(|c| c.to_string()).unwrap_or_default();
				let detail = match code.as_str() {
					"23502" => db
						.try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
						.and_then(|pg| pg.column())
						.unwrap_or_default()
						.to_string(),
					_ => db
						.constraint()
						.map(|c| c.to_string())
						.unwrap_or_else(|| db.message().to_string()),
				};
				StoreError::from_code(&code, &detail)
			}
			sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
				StoreError::Unavailable(e.to_string())
			}
			other => StoreError::Other(other.to_string()),
		}
	}
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
	#[error("storage request failed: {0}")]
	Request(String),
	#[error("storage rejected `{path}` with status {status}: {message}")]
	Rejected {
		path: String,
		status: u16,
		message: String,
	},
}

impl From<reqwest::Error> for StorageError {
	fn from(e: reqwest::Error) -> Self {
		StorageError::Request(e.to_string())
	}
}

/// Upload checks that run before any bytes leave the process.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
	#[error("Invalid file type. Allowed types: {allowed}")]
	InvalidType { allowed: String },
	#[error("{label} size must be less than {max_mb}MB.")]
	TooLarge { label: String, max_mb: u64 },
	#[error("File is empty.")]
	Empty,
	#[error("No file uploaded.")]
	MissingFile,
	#[error("Invalid upload form: {0}")]
	Form(String),
	#[error("{0}")]
	Storage(#[from] StorageError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
	#[error("{0}")]
	BadRequest(String),
	#[error("Unauthorized")]
	Unauthorized,
	#[error("{0}")]
	Forbidden(String),
	#[error("{0}")]
	NotFound(String),
	#[error("{0}")]
	Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<StoreError> for AppError {
	fn from(e: StoreError) -> Self {
		match e {
			StoreError::NotFound => AppError::NotFound("Record not found.".to_string()),
			StoreError::UniqueViolation(_) => {
				AppError::BadRequest("A record with this value already exists.".to_string())
			}
			StoreError::ForeignKeyViolation(_) => {
				AppError::BadRequest("Referenced record does not exist.".to_string())
			}
			StoreError::NotNullViolation(column) => {
				AppError::BadRequest(format!("Missing required field: {}.", column))
			}
			StoreError::PermissionDenied => AppError::Forbidden(
				"You do not have permission to perform this action.".to_string(),
			),
			other => {
				error!("store error: {}", other);
				AppError::Internal("Unexpected server error.".to_string())
			}
		}
	}
}

impl From<UploadError> for AppError {
	fn from(e: UploadError) -> Self {
		match e {
			UploadError::Storage(storage) => {
				error!("upload failed: {}", storage);
				AppError::Internal("File upload failed.".to_string())
			}
			other => AppError::BadRequest(other.to_string()),
		}
	}
}

impl From<StorageError> for AppError {
	fn from(e: StorageError) -> Self {
		error!("storage error: {}", e);
		AppError::Internal("Storage request failed.".to_string())
	}
}

impl ResponseError for AppError {
	fn status_code(&self) -> StatusCode {
		match self {
			AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
			AppError::Unauthorized => StatusCode::UNAUTHORIZED,
			AppError::Forbidden(_) => StatusCode::FORBIDDEN,
			AppError::NotFound(_) => StatusCode::NOT_FOUND,
			AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn error_response(&self) -> HttpResponse {
		HttpResponse::build(self.status_code()).json(json!({
			"success": false,
			"error": self.to_string(),
		}))
	}
}
