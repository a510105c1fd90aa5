use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
	cars::cars::{self, Car},
	db_client::DbClient,
	error::AppError,
	users::users::{self, NewUser, User},
};

/// Backing store for cars and accounts.
#[derive(Clone)]
pub enum Store {
	Postgres(DbClient),
	Memory(Arc<MemoryStore>),
}

impl Store {
	pub fn memory(store: MemoryStore) -> Self {
		Store::Memory(Arc::new(store))
	}

	/// Up to `limit` cars in default order.
	pub async fn recent_cars(&self, limit: usize) -> Result<Vec<Car>, AppError> {
		match self {
			Store::Postgres(db) => Ok(cars::recent_cars(db, limit as i64).await?),
			Store::Memory(mem) => Ok(mem.cars.iter().take(limit).cloned().collect()),
		}
	}

	/// First car flagged `is_main`, if any.
	pub async fn main_car(&self) -> Result<Option<Car>, AppError> {
		match self {
			Store::Postgres(db) => Ok(cars::main_car(db).await?),
			Store::Memory(mem) => Ok(mem.cars.iter().find(|car| car.is_main).cloned()),
		}
	}

	pub async fn all_cars(&self) -> Result<Vec<Car>, AppError> {
		match self {
			Store::Postgres(db) => Ok(cars::all_cars(db).await?),
			Store::Memory(mem) => Ok(mem.cars.clone()),
		}
	}

	pub async fn car(&self, id: i32) -> Result<Option<Car>, AppError> {
		match self {
			Store::Postgres(db) => Ok(cars::car_by_id(db, id).await?),
			Store::Memory(mem) => Ok(mem.cars.iter().find(|car| car.id == id).cloned()),
		}
	}

	/// Exact, case-sensitive username lookup used by login.
	pub async fn find_user(&self, username: &str) -> Result<Option<User>, AppError> {
		match self {
			Store::Postgres(db) => Ok(users::find_user(db, username).await?),
			Store::Memory(mem) => Ok(mem.users.read().await.iter().find(|user| user.username == username).cloned()),
		}
	}

	pub async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
		match self {
			Store::Postgres(db) => Ok(users::user_by_id(db, id).await?),
			Store::Memory(mem) => Ok(mem.users.read().await.iter().find(|user| user.id == id).cloned()),
		}
	}

	/// Case-insensitive check used by registration.
	pub async fn username_taken(&self, username: &str) -> Result<bool, AppError> {
		match self {
			Store::Postgres(db) => Ok(users::username_taken(db, username).await?),
			Store::Memory(mem) => {
				let username = username.to_lowercase();
				Ok(mem.users.read().await.iter().any(|user| user.username.to_lowercase() == username))
			}
		}
	}

	/// Returns `None` when the username was claimed concurrently.
	pub async fn create_user(&self, new_user: NewUser) -> Result<Option<User>, AppError> {
		match self {
			Store::Postgres(db) => Ok(users::insert_user(db, &new_user).await?),
			Store::Memory(mem) => {
				let mut accounts = mem.users.write().await;
				let lowered = new_user.username.to_lowercase();
				if accounts.iter().any(|user| user.username.to_lowercase() == lowered) {
					return Ok(None);
				}
				let id = accounts.iter().map(|user| user.id).max().unwrap_or(0) + 1;
				let user = User {
					id,
					username: new_user.username,
					email: new_user.email,
					password: new_user.password,
					is_active: true,
				};
				accounts.push(user.clone());
				Ok(Some(user))
			}
		}
	}
}

/// In-process store for local previews and tests. Cars are read-only once seeded.
#[derive(Default)]
pub struct MemoryStore {
	cars: Vec<Car>,
	users: RwLock<Vec<User>>,
}

impl MemoryStore {
	pub fn new(mut cars: Vec<Car>) -> Self {
		cars.sort_by_key(|car| car.id);
		MemoryStore {
			cars,
			users: RwLock::new(Vec::new()),
		}
	}

	pub fn with_users(self, users: Vec<User>) -> Self {
		MemoryStore {
			users: RwLock::new(users),
			..self
		}
	}

	pub async fn user_count(&self) -> usize {
		self.users.read().await.len()
	}

	/// Returns false when no user has that id.
	pub async fn set_active(&self, id: i32, active: bool) -> bool {
		let mut accounts = self.users.write().await;
		match accounts.iter_mut().find(|user| user.id == id) {
			Some(user) => {
				user.is_active = active;
				true
			}
			None => false,
		}
	}
}
