use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;

use super::models::{Category, Product};
use super::DbError;

pub struct ProductRepo<'a> {
    pool: &'a PgPool,
}

#[derive(Debug)]
pub struct NewProduct<'a> {
    pub name: &'a str,
    pub price: Option<Decimal>,
    pub is_contact_for_price: bool,
    pub description: &'a str,
    pub machine_data: Value,
    pub show_in_hero: bool,
    pub hero_index: i32,
    /// Join rows written in the same transaction as the insert
    pub category_ids: &'a [i64],
}

/// Row shape for the batched join-table resolution query
#[derive(Debug, FromRow)]
struct LinkedCategoryRow {
    product_id: i64,
    #[sqlx(flatten)]
    category: Category,
}

impl<'a> ProductRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert the product row and its category links atomically
    pub async fn insert(&self, data: NewProduct<'_>) -> Result<Product, DbError> {
        let mut tx = self.pool.begin().await?;

        let product = sqlx::query_as::<_, Product>(
            "INSERT INTO products \
                 (name, price, is_contact_for_price, description, machine_data, \
                  show_in_hero, hero_index) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(data.name)
        .bind(data.price)
        .bind(data.is_contact_for_price)
        .bind(data.description)
        .bind(&data.machine_data)
        .bind(data.show_in_hero)
        .bind(data.hero_index)
        .fetch_one(&mut *tx)
        .await?;

        if !data.category_ids.is_empty() {
            sqlx::query(
                "INSERT INTO product_categories (product_id, category_id) \
                 SELECT $1, unnest($2::bigint[])",
            )
            .bind(product.id)
            .bind(data.category_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(product)
    }

    pub async fn select_all(&self) -> Result<Vec<Product>, DbError> {
        let rows = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY id")
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn select_by_id(&self, id: i64) -> Result<Option<Product>, DbError> {
        let row = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Write the full row computed by the service; when `category_ids` is
    /// present the join rows are replaced in the same transaction.
    pub async fn update(
        &self,
        id: i64,
        data: NewProduct<'_>,
        replace_links: bool,
    ) -> Result<Product, DbError> {
        let mut tx = self.pool.begin().await?;

        let product = sqlx::query_as::<_, Product>(
            "UPDATE products SET \
                 name = $2, price = $3, is_contact_for_price = $4, description = $5, \
                 machine_data = $6, show_in_hero = $7, hero_index = $8, updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(data.name)
        .bind(data.price)
        .bind(data.is_contact_for_price)
        .bind(data.description)
        .bind(&data.machine_data)
        .bind(data.show_in_hero)
        .bind(data.hero_index)
        .fetch_one(&mut *tx)
        .await?;

        if replace_links {
            sqlx::query("DELETE FROM product_categories WHERE product_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            if !data.category_ids.is_empty() {
                sqlx::query(
                    "INSERT INTO product_categories (product_id, category_id) \
                     SELECT $1, unnest($2::bigint[])",
                )
                .bind(id)
                .bind(data.category_ids)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(product)
    }

    /// Returns true when a row was removed; join rows cascade
    pub async fn delete(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Resolve category links for many products in a single batched query
    pub async fn links_for(
        &self,
        product_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Category>>, DbError> {
        if product_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, LinkedCategoryRow>(
            "SELECT pc.product_id, c.id, c.name, c.description, c.image_url, \
                    c.created_at, c.updated_at \
             FROM product_categories pc \
             JOIN categories c ON c.id = pc.category_id \
             WHERE pc.product_id = ANY($1) \
             ORDER BY pc.product_id, c.id",
        )
        .bind(product_ids)
        .fetch_all(self.pool)
        .await?;

        let mut map: HashMap<i64, Vec<Category>> = HashMap::new();
        for row in rows {
            map.entry(row.product_id).or_default().push(row.category);
        }
        Ok(map)
    }

    pub async fn link(&self, product_id: i64, category_id: i64) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO product_categories (product_id, category_id) \
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(product_id)
        .bind(category_id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Returns true when a link existed and was removed
    pub async fn unlink(&self, product_id: i64, category_id: i64) -> Result<bool, DbError> {
        let result = sqlx::query(
            "DELETE FROM product_categories WHERE product_id = $1 AND category_id = $2",
        )
        .bind(product_id)
        .bind(category_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
