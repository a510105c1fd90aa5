use anyhow::Context;
use car_showroom::{
	app,
	cars::cars::Car,
	config::{Config, DbBackend},
	db_client::{db_client, init_schema},
	state::AppState,
	store::{MemoryStore, Store},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = Config::from_env()?;

	let store = match config.db_backend {
		DbBackend::Postgres => {
			let db = db_client(&config).await.context("failed to connect to postgres")?;
			init_schema(&db).await.context("failed to create tables")?;
			log::info!("connected to postgres at {}/{}", config.db_host, config.db_name);
			Store::Postgres(db)
		}
		DbBackend::Memory => {
			log::warn!("using the in-memory store, nothing will be persisted");
			let cars = match &config.seed_file {
				Some(path) => {
					let raw = tokio::fs::read(path).await.with_context(|| format!("failed to read {}", path.display()))?;
					let cars: Vec<Car> = serde_json::from_slice(&raw).with_context(|| format!("invalid car list in {}", path.display()))?;
					log::info!("seeded {} cars from {}", cars.len(), path.display());
					cars
				}
				None => Vec::new(),
			};
			Store::memory(MemoryStore::new(cars))
		}
	};

	let addr = config.addr.trim().to_owned();
	let router = app(AppState::new(store, config));

	let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("failed to bind {}", addr))?;
	log::info!("listening on {}", addr);
	axum::serve(listener, router).await?;

	Ok(())
}
