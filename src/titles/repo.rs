use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::titles::repo_types::Title;

#[async_trait]
pub trait TitleRepo: Send + Sync {
    /// Insert a title owned by `user_id`. Fails if the user does not exist.
    async fn create(&self, user_id: Uuid, title: &str) -> anyhow::Result<Title>;

    /// All titles owned by `user_id`, oldest first.
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Title>>;

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Title>>;

    /// Returns `false` when no row had that id.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgTitleRepo {
    db: PgPool,
}

impl PgTitleRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TitleRepo for PgTitleRepo {
    async fn create(&self, user_id: Uuid, title: &str) -> anyhow::Result<Title> {
        let row = sqlx::query_as::<_, Title>(
            r#"
            INSERT INTO titles (title, user_id)
            VALUES ($1, $2)
            RETURNING id, title, user_id, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(user_id)
        .fetch_one(&self.db)
        .await
        .context("insert title")?;
        Ok(row)
    }

    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Title>> {
        let rows = sqlx::query_as::<_, Title>(
            r#"
            SELECT id, title, user_id, created_at, updated_at
              FROM titles
             WHERE user_id = $1
             ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list titles by user")?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Title>> {
        let row = sqlx::query_as::<_, Title>(
            r#"
            SELECT id, title, user_id, created_at, updated_at
              FROM titles
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find title by id")?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM titles WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete title")?;
        Ok(res.rows_affected() > 0)
    }
}
