pub mod repository;

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::error::StoreError;
use crate::models::{Todo, TodoChanges};

pub use repository::SqliteTodoStore;

/// Persistence capability handed to the handlers. Every method is a single
/// round-trip to the backing store; nothing spans calls.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// All todos, newest `created_at` first.
    async fn find_all(&self) -> Result<Vec<Todo>, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Todo>, StoreError>;
    async fn insert(&self, title: &str) -> Result<Todo, StoreError>;
    /// Applies only the fields set in `changes`. `None` if the row is gone.
    async fn apply_update(&self, id: i64, changes: &TodoChanges) -> Result<Option<Todo>, StoreError>;
    /// `true` if a row was deleted.
    async fn remove(&self, id: i64) -> Result<bool, StoreError>;
    async fn ping(&self) -> Result<(), StoreError>;
}

pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("connected to database");

    Ok(pool)
}
