use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use anyhow::{anyhow, bail};
use base64::Engine;
use rand::RngCore;

use crate::encryption_engine::CUSTOM_ENGINE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbBackend {
	Postgres,
	Memory,
}

impl FromStr for DbBackend {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"postgres" => Ok(DbBackend::Postgres),
			"memory" => Ok(DbBackend::Memory),
			other => bail!("unknown DB_BACKEND `{}` (expected `postgres` or `memory`)", other),
		}
	}
}

#[derive(Debug, Clone)]
pub struct Config {
	pub addr: String,
	pub db_backend: DbBackend,
	pub db_host: String,
	pub db_user: String,
	pub db_password: String,
	pub db_name: String,
	pub cars_per_page: usize,
	pub session_secret: String,
	pub session_ttl_secs: i64,
	pub media_dir: PathBuf,
	/// JSON array of cars loaded into the memory backend at startup.
	pub seed_file: Option<PathBuf>,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			addr: "0.0.0.0:4000".to_owned(),
			db_backend: DbBackend::Postgres,
			db_host: "localhost".to_owned(),
			db_user: "ubuntu".to_owned(),
			db_password: String::new(),
			db_name: "ubuntu".to_owned(),
			cars_per_page: 4,
			session_secret: String::new(),
			session_ttl_secs: 14 * 24 * 60 * 60,
			media_dir: PathBuf::from("media"),
			seed_file: None,
		}
	}
}

impl Config {
	pub fn from_env() -> anyhow::Result<Self> {
		let defaults = Config::default();
		let db_backend: DbBackend = parse_var("DB_BACKEND", DbBackend::Postgres)?;
		let cars_per_page: usize = parse_var("CARS_PER_PAGE", defaults.cars_per_page)?;
		if cars_per_page == 0 {
			bail!("CARS_PER_PAGE must be at least 1");
		}

		let session_secret = match env::var("SESSION_SECRET") {
			Ok(secret) if !secret.is_empty() => secret,
			_ if db_backend == DbBackend::Postgres => bail!("SESSION_SECRET must be set for the postgres backend"),
			_ => {
				log::warn!("SESSION_SECRET not set, sessions will not survive a restart");
				random_secret()
			}
		};

		Ok(Config {
			addr: string_var("APP_ADDR", defaults.addr),
			db_backend,
			db_host: string_var("DB_HOST", defaults.db_host),
			db_user: string_var("DB_USER", defaults.db_user),
			db_password: string_var("DB_PASSWORD", defaults.db_password),
			db_name: string_var("DB_NAME", defaults.db_name),
			cars_per_page,
			session_secret,
			session_ttl_secs: parse_var("SESSION_TTL_SECS", defaults.session_ttl_secs)?,
			media_dir: PathBuf::from(string_var("MEDIA_DIR", "media".to_owned())),
			seed_file: env::var("SEED_FILE").ok().filter(|path| !path.is_empty()).map(PathBuf::from),
		})
	}

	/// libpq-style connection string for `tokio_postgres::connect`.
	pub fn db_config_string(&self) -> String {
		let mut config_string = format!("host={} user={} dbname={}", self.db_host, self.db_user, self.db_name);
		if !self.db_password.is_empty() {
			config_string.push_str(&format!(" password={}", self.db_password));
		}
		config_string
	}
}

fn string_var(key: &str, default: String) -> String {
	env::var(key).unwrap_or(default)
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
	T: FromStr,
	T::Err: Display,
{
	match env::var(key) {
		Ok(raw) => raw.trim().parse().map_err(|e| anyhow!("invalid {} value `{}`: {}", key, raw, e)),
		Err(_) => Ok(default),
	}
}

pub fn random_secret() -> String {
	let mut bytes = [0u8; 32];
	rand::thread_rng().fill_bytes(&mut bytes);
	CUSTOM_ENGINE.encode(bytes)
}
