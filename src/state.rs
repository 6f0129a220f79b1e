use std::sync::Arc;
use std::time::Instant;

use crate::db::TodoStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TodoStore>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self {
            store,
            started_at: Instant::now(),
        }
    }
}
