use std::{ops::Deref, sync::Arc};

use tokio_postgres::{Client, NoTls};

use crate::config::Config;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cars (
	id SERIAL PRIMARY KEY,
	name VARCHAR(255) NOT NULL,
	description TEXT NOT NULL DEFAULT '',
	price DOUBLE PRECISION NOT NULL DEFAULT 0,
	image VARCHAR(255),
	is_main BOOLEAN NOT NULL DEFAULT FALSE
);

CREATE TABLE IF NOT EXISTS users (
	id SERIAL PRIMARY KEY,
	username VARCHAR(150) NOT NULL UNIQUE,
	email VARCHAR(254) NOT NULL DEFAULT '',
	password VARCHAR(128) NOT NULL,
	is_active BOOLEAN NOT NULL DEFAULT TRUE
);
";

#[derive(Clone)]
pub struct DbClient(pub Arc<Client>);

impl Deref for DbClient {
	type Target = Client;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

pub async fn db_client(config: &Config) -> Result<DbClient, tokio_postgres::Error> {
	let (client, monitor) = tokio_postgres::connect(&config.db_config_string(), NoTls).await?;

	tokio::spawn(async move {
		if let Err(e) = monitor.await {
			log::error!("Connection error: {}", e);
		}
	});

	Ok(DbClient(Arc::new(client)))
}

/// Creates the `cars` and `users` tables when they do not exist yet.
pub async fn init_schema(db: &DbClient) -> Result<(), tokio_postgres::Error> {
	db.batch_execute(SCHEMA).await
}
