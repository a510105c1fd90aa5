use std::sync::Arc;

use crate::{config::Config, store::Store};

#[derive(Clone)]
pub struct AppState {
	pub store: Store,
	pub config: Arc<Config>,
}

impl AppState {
	pub fn new(store: Store, config: Config) -> Self {
		AppState {
			store,
			config: Arc::new(config),
		}
	}
}
