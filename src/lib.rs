//! Website of a small car dealership: a homepage featuring the main car,
//! a paginated catalog, informational pages and account registration/login.

pub mod cars;
pub mod config;
pub mod db_client;
pub mod encryption_engine;
pub mod error;
pub mod file_server;
pub mod pages;
pub mod pagination;
pub mod state;
pub mod store;
pub mod templates;
pub mod users;

use axum::{
	http::Uri,
	routing::{get, Router},
};
use tower_http::cors::CorsLayer;

use crate::{
	cars::cars::{api_cars, car_detail, get_cars, index},
	error::AppError,
	file_server::media_handler,
	state::AppState,
	users::{
		auth::{login, login_form, logout},
		users::{register, register_done, register_form},
	},
};

pub fn app(state: AppState) -> Router {
	Router::new()
		.route("/", get(index))
		.route("/cars/", get(get_cars))
		.route("/cars/:id/", get(car_detail))
		.route("/api/cars/", get(api_cars))
		.route("/about/", get(pages::about))
		.route("/services/", get(pages::services))
		.route("/contact/", get(pages::contact))
		.route("/login/", get(login_form).post(login))
		.route("/logout/", get(logout).post(logout))
		.route("/register/", get(register_form).post(register))
		.route("/register/done/", get(register_done))
		.route("/media/*path", get(media_handler))
		.fallback(not_found)
		.layer(CorsLayer::permissive())
		.with_state(state)
}

async fn not_found(uri: Uri) -> AppError {
	AppError::NotFound(uri.path().to_owned())
}
