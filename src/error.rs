use axum::response::{Html, IntoResponse, Response};
use hyper::StatusCode;
use thiserror::Error;

use crate::templates;

#[derive(Error, Debug)]
pub enum AppError {
	#[error("database error: {0}")]
	Database(#[from] tokio_postgres::Error),

	#[error("not found: {0}")]
	NotFound(String),

	#[error("session error: {0}")]
	Session(#[from] jsonwebtoken::errors::Error),

	#[error("internal error: {0}")]
	Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response {
		let status = match &self {
			AppError::NotFound(what) => {
				log::warn!("not found: {}", what);
				StatusCode::NOT_FOUND
			}
			AppError::Database(e) => {
				log::error!("database error: {}", e);
				StatusCode::INTERNAL_SERVER_ERROR
			}
			AppError::Session(e) => {
				log::error!("failed to issue session: {}", e);
				StatusCode::INTERNAL_SERVER_ERROR
			}
			AppError::Internal(e) => {
				log::error!("internal error: {:#}", e);
				StatusCode::INTERNAL_SERVER_ERROR
			}
		};

		(status, Html(templates::error_page(status))).into_response()
	}
}
