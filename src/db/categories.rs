use sqlx::PgPool;

use super::models::Category;
use super::{map_constraint_err, DbError};

pub struct CategoryRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        name: &str,
        description: &str,
        image_url: Option<&str>,
    ) -> Result<Category, DbError> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, description, image_url) \
             VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(name)
        .bind(description)
        .bind(image_url)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint_err(e, format!("Category '{}' already exists", name)))
    }

    pub async fn select_all(&self) -> Result<Vec<Category>, DbError> {
        let rows = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY id")
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn select_by_id(&self, id: i64) -> Result<Option<Category>, DbError> {
        let row = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    pub async fn select_by_name(&self, name: &str) -> Result<Option<Category>, DbError> {
        let row = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE name = $1")
            .bind(name)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Batched lookup used when resolving product category lists
    pub async fn select_where_id_in(&self, ids: &[i64]) -> Result<Vec<Category>, DbError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Partial update; `None` fields keep their stored value
    pub async fn update(
        &self,
        id: i64,
        name: Option<&str>,
        description: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<Category, DbError> {
        sqlx::query_as::<_, Category>(
            "UPDATE categories SET \
                 name = COALESCE($2, name), \
                 description = COALESCE($3, description), \
                 image_url = COALESCE($4, image_url), \
                 updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(image_url)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            map_constraint_err(
                e,
                format!("Category '{}' already exists", name.unwrap_or_default()),
            )
        })
    }

    /// Returns true when a row was removed
    pub async fn delete(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
