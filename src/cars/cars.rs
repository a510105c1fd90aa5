use axum::{
	extract::{Path, Query, State},
	response::Html,
	Json,
};
use postgres_from_row::FromRow;
use serde_json::{json, Value};

use crate::{db_client::DbClient, error::AppError, pagination::Paginator, state::AppState, templates, users::session::CurrentUser};

/// Number of cars shown on the homepage.
pub const HOMEPAGE_CARS: usize = 3;

const CAR_COLUMNS: &str = "id, name, description, price, image, is_main";

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize, FromRow)]
pub struct Car {
	pub id: i32,
	pub name: String,
	#[serde(default)]
	pub description: String,
	pub price: f64,
	/// Relative to the media directory.
	#[serde(default)]
	pub image: Option<String>,
	#[serde(default)]
	pub is_main: bool,
}

#[derive(serde::Deserialize, Debug, Default)]
pub struct PageQuery {
	page: Option<String>,
}

pub async fn recent_cars(db: &DbClient, limit: i64) -> Result<Vec<Car>, tokio_postgres::Error> {
	let q = format!("SELECT {} FROM cars ORDER BY id LIMIT $1", CAR_COLUMNS);
	let rows = db.query(q.as_str(), &[&limit]).await?;
	rows.iter().map(Car::try_from_row).collect()
}

pub async fn main_car(db: &DbClient) -> Result<Option<Car>, tokio_postgres::Error> {
	let q = format!("SELECT {} FROM cars WHERE is_main ORDER BY id LIMIT 1", CAR_COLUMNS);
	let row = db.query_opt(q.as_str(), &[]).await?;
	row.as_ref().map(Car::try_from_row).transpose()
}

pub async fn all_cars(db: &DbClient) -> Result<Vec<Car>, tokio_postgres::Error> {
	let q = format!("SELECT {} FROM cars ORDER BY id", CAR_COLUMNS);
	let rows = db.query(q.as_str(), &[]).await?;
	rows.iter().map(Car::try_from_row).collect()
}

pub async fn car_by_id(db: &DbClient, id: i32) -> Result<Option<Car>, tokio_postgres::Error> {
	let q = format!("SELECT {} FROM cars WHERE id=$1", CAR_COLUMNS);
	let row = db.query_opt(q.as_str(), &[&id]).await?;
	row.as_ref().map(Car::try_from_row).transpose()
}

/// Homepage: the first few cars plus the featured one.
pub async fn index(State(state): State<AppState>, user: CurrentUser) -> Result<Html<String>, AppError> {
	let cars = state.store.recent_cars(HOMEPAGE_CARS).await?;
	let main_car = state.store.main_car().await?;
	log::debug!("homepage with {} cars, main car {:?}", cars.len(), main_car.as_ref().map(|car| car.id));
	Ok(Html(templates::index_page(user.username(), &cars, main_car.as_ref())))
}

pub async fn get_cars(
	State(state): State<AppState>,
	user: CurrentUser,
	Query(query): Query<PageQuery>,
) -> Result<Html<String>, AppError> {
	let cars = state.store.all_cars().await?;
	let page = Paginator::new(cars, state.config.cars_per_page).get_page(query.page.as_deref());
	log::debug!("catalog page {} of {}", page.number, page.num_pages);
	Ok(Html(templates::cars_page(user.username(), &page)))
}

pub async fn car_detail(
	State(state): State<AppState>,
	user: CurrentUser,
	Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
	let not_found = || AppError::NotFound(format!("car {}", id));
	let car_id: i32 = id.parse().map_err(|_| not_found())?;
	let car = state.store.car(car_id).await?.ok_or_else(not_found)?;
	Ok(Html(templates::car_detail_page(user.username(), &car)))
}

pub async fn api_cars(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Result<Json<Value>, AppError> {
	let cars = state.store.all_cars().await?;
	let page = Paginator::new(cars, state.config.cars_per_page).get_page(query.page.as_deref());
	Ok(Json(json!({
		"page": page.number,
		"num_pages": page.num_pages,
		"count": page.count,
		"has_next": page.has_next(),
		"has_previous": page.has_previous(),
		"cars": page.items,
	})))
}
