use std::path::{Component, Path as FsPath, PathBuf};

use axum::{
	body::Body,
	extract::{Path, State},
	http::header,
	response::{IntoResponse, Response},
};
use hyper::StatusCode;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::{error::AppError, state::AppState};

/// Serves car photos and other uploads from the media directory.
pub async fn media_handler(State(state): State<AppState>, Path(path): Path<String>) -> Result<Response, AppError> {
	let not_found = || AppError::NotFound(format!("media file {}", path));
	let full_path = resolve(&state.config.media_dir, &path).ok_or_else(not_found)?;

	match read_file_stream(&full_path).await {
		Some(stream) => Ok((
			StatusCode::OK,
			[(header::CONTENT_TYPE, content_type(&full_path))],
			Body::from_stream(stream),
		)
			.into_response()),
		None => Err(not_found()),
	}
}

pub async fn read_file_stream(path: &FsPath) -> Option<ReaderStream<File>> {
	let file = File::open(path).await.ok()?;
	if !file.metadata().await.ok()?.is_file() {
		return None;
	}
	Some(ReaderStream::new(file))
}

/// Joins `requested` onto `root`, refusing anything that could leave it.
fn resolve(root: &FsPath, requested: &str) -> Option<PathBuf> {
	let requested = FsPath::new(requested);
	let mut resolved = root.to_path_buf();
	for component in requested.components() {
		match component {
			Component::Normal(part) => resolved.push(part),
			Component::CurDir => {}
			Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
		}
	}
	(resolved != root).then_some(resolved)
}

fn content_type(path: &FsPath) -> &'static str {
	let extension = path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase());
	match extension.as_deref() {
		Some("jpg") | Some("jpeg") => "image/jpeg",
		Some("png") => "image/png",
		Some("gif") => "image/gif",
		Some("webp") => "image/webp",
		Some("svg") => "image/svg+xml",
		Some("css") => "text/css",
		Some("pdf") => "application/pdf",
		_ => "application/octet-stream",
	}
}
