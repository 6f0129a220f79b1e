use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use crate::db::TodoStore;
use crate::error::StoreError;
use crate::models::{Todo, TodoChanges};

#[derive(Clone)]
pub struct SqliteTodoStore {
    db: SqlitePool,
}

impl SqliteTodoStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }
}

#[async_trait]
impl TodoStore for SqliteTodoStore {
    async fn find_all(&self) -> Result<Vec<Todo>, StoreError> {
        let todos = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, title, completed, created_at
            FROM todos
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        debug!("fetched {} todos", todos.len());
        Ok(todos)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Todo>, StoreError> {
        let todo = sqlx::query_as::<_, Todo>(
            "SELECT id, title, completed, created_at FROM todos WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(todo)
    }

    async fn insert(&self, title: &str) -> Result<Todo, StoreError> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (title)
            VALUES (?1)
            RETURNING id, title, completed, created_at
            "#,
        )
        .bind(title)
        .fetch_one(&self.db)
        .await?;
        debug!("inserted todo {}", todo.id);
        Ok(todo)
    }

    async fn apply_update(&self, id: i64, changes: &TodoChanges) -> Result<Option<Todo>, StoreError> {
        // COALESCE keeps the stored value for unset fields, so an empty
        // change set is a no-op that still returns the row.
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            UPDATE todos
            SET title = COALESCE(?1, title),
                completed = COALESCE(?2, completed)
            WHERE id = ?3
            RETURNING id, title, completed, created_at
            "#,
        )
        .bind(changes.title.as_deref())
        .bind(changes.completed)
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        debug!("updated todo {}: {:?}", id, changes);
        Ok(todo)
    }

    async fn remove(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?1")
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();
        debug!("deleted todo {} ({} rows)", id, result);
        Ok(result > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}
