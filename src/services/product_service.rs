// Product orchestration: coercion, image handling, attribute-bag merges and
// category links (the join table is the source of truth for associations).

use serde_json::{json, Map, Value};

use crate::db::models::{Product, ProductWithCategories};
use crate::db::products::NewProduct;
use crate::db::{CategoryRepo, ProductRepo};
use crate::error::ApiError;
use crate::media::{MediaStore, OwnerKind, UploadedFile};
use crate::state::AppState;
use crate::validation::forms::{ProductCreate, ProductUpdate};

pub struct ProductService<'a> {
    repo: ProductRepo<'a>,
    categories: CategoryRepo<'a>,
    media: &'a MediaStore,
}

impl<'a> ProductService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            repo: ProductRepo::new(&state.pool),
            categories: CategoryRepo::new(&state.pool),
            media: &state.media,
        }
    }

    /// Create a product. Every file is validated before any is stored, so a
    /// rejected upload persists nothing; stored URLs are merged into the
    /// attribute bag under `"images"`; row and links are written atomically.
    pub async fn create(
        &self,
        form: ProductCreate,
        images: &[UploadedFile],
    ) -> Result<ProductWithCategories, ApiError> {
        self.media.check_count(images.len())?;
        for file in images {
            self.media.validate(file)?;
        }
        let linked = self.require_categories(&form.category_ids).await?;

        let mut urls = Vec::with_capacity(images.len());
        for file in images {
            urls.push(self.media.store(OwnerKind::Products, file).await?);
        }

        let mut bag = form.machine_data;
        merge_images(&mut bag, &urls);

        let inserted = self
            .repo
            .insert(NewProduct {
                name: &form.name,
                price: form.price,
                is_contact_for_price: form.is_contact_for_price,
                description: &form.description,
                machine_data: Value::Object(bag),
                show_in_hero: form.show_in_hero,
                hero_index: form.hero_index,
                category_ids: &form.category_ids,
            })
            .await;

        let product = match inserted {
            Ok(product) => product,
            Err(e) => {
                // Best-effort cleanup of the freshly stored files
                for url in &urls {
                    self.media.delete(url).await;
                }
                return Err(e.into());
            }
        };

        tracing::info!(product_id = product.id, name = %product.name, "product created");
        Ok(ProductWithCategories { product, categories: linked })
    }

    /// List all products with category links resolved in one batched query
    pub async fn list(&self) -> Result<Vec<ProductWithCategories>, ApiError> {
        let products = self.repo.select_all().await?;
        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
        let mut links = self.repo.links_for(&ids).await?;

        Ok(products
            .into_iter()
            .map(|product| {
                let categories = links.remove(&product.id).unwrap_or_default();
                ProductWithCategories { product, categories }
            })
            .collect())
    }

    pub async fn get(&self, id: i64) -> Result<ProductWithCategories, ApiError> {
        let product = self.require(id).await?;
        let mut links = self.repo.links_for(&[id]).await?;
        Ok(ProductWithCategories {
            product,
            categories: links.remove(&id).unwrap_or_default(),
        })
    }

    /// Partial update. `machineData` is shallow-merged onto the stored bag
    /// (new keys overwrite, untouched keys persist); newly uploaded image
    /// URLs are appended to the merged bag's `images` list; a supplied
    /// `categoryIds` list replaces the join rows.
    pub async fn update(
        &self,
        id: i64,
        form: ProductUpdate,
        images: &[UploadedFile],
    ) -> Result<ProductWithCategories, ApiError> {
        let existing = self.require(id).await?;

        self.media.check_count(images.len())?;
        for file in images {
            self.media.validate(file)?;
        }
        if let Some(ids) = form.category_ids.as_deref() {
            self.require_categories(ids).await?;
        }

        let mut urls = Vec::with_capacity(images.len());
        for file in images {
            urls.push(self.media.store(OwnerKind::Products, file).await?);
        }

        let mut bag = match existing.machine_data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        if let Some(patch) = form.machine_data {
            for (key, value) in patch {
                bag.insert(key, value);
            }
        }
        if !urls.is_empty() {
            append_images(&mut bag, &urls);
        }

        let name = form.name.unwrap_or(existing.name);
        let description = form.description.unwrap_or(existing.description);
        let price = match form.price {
            Some(new_price) => new_price,
            None => existing.price,
        };
        // An explicit list replaces all links; an explicit empty list clears them
        let replace_links = form.category_ids.is_some();
        let category_ids = form.category_ids.unwrap_or_default();

        let product = self
            .repo
            .update(
                id,
                NewProduct {
                    name: &name,
                    price,
                    is_contact_for_price: form
                        .is_contact_for_price
                        .unwrap_or(existing.is_contact_for_price),
                    description: &description,
                    machine_data: Value::Object(bag),
                    show_in_hero: form.show_in_hero.unwrap_or(existing.show_in_hero),
                    hero_index: form.hero_index.unwrap_or(existing.hero_index),
                    category_ids: &category_ids,
                },
                replace_links,
            )
            .await?;

        let mut links = self.repo.links_for(&[id]).await?;
        Ok(ProductWithCategories {
            product,
            categories: links.remove(&id).unwrap_or_default(),
        })
    }

    /// Delete the row; join rows cascade. Image files are intentionally left
    /// in place (long-standing behavior relied on by external references).
    pub async fn delete(&self, id: i64) -> Result<Value, ApiError> {
        let existing = self.require(id).await?;
        self.repo.delete(id).await?;
        tracing::info!(product_id = id, name = %existing.name, "product deleted");

        Ok(json!({
            "success": true,
            "message": format!("Successfully deleted '{}'", existing.name),
        }))
    }

    pub async fn link_category(&self, id: i64, category_id: i64) -> Result<ProductWithCategories, ApiError> {
        self.require(id).await?;
        if self.categories.select_by_id(category_id).await?.is_none() {
            return Err(ApiError::bad_request(format!(
                "Category {} does not exist",
                category_id
            )));
        }
        self.repo.link(id, category_id).await?;
        self.get(id).await
    }

    pub async fn unlink_category(&self, id: i64, category_id: i64) -> Result<ProductWithCategories, ApiError> {
        self.require(id).await?;
        self.repo.unlink(id, category_id).await?;
        self.get(id).await
    }

    async fn require(&self, id: i64) -> Result<Product, ApiError> {
        self.repo
            .select_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Product {} not found", id)))
    }

    /// Resolve the requested category IDs, failing when any is unknown
    async fn require_categories(
        &self,
        ids: &[i64],
    ) -> Result<Vec<crate::db::models::Category>, ApiError> {
        let found = self.categories.select_where_id_in(ids).await?;
        if found.len() != ids.len() {
            let known: Vec<i64> = found.iter().map(|c| c.id).collect();
            let missing: Vec<String> = ids
                .iter()
                .filter(|id| !known.contains(id))
                .map(|id| id.to_string())
                .collect();
            return Err(ApiError::bad_request(format!(
                "Unknown category IDs: {}",
                missing.join(", ")
            )));
        }
        Ok(found)
    }
}

/// Overwrite the bag's `images` key with the freshly stored URL list
fn merge_images(bag: &mut Map<String, Value>, urls: &[String]) {
    if !urls.is_empty() {
        bag.insert(
            "images".to_string(),
            Value::Array(urls.iter().map(|u| Value::String(u.clone())).collect()),
        );
    }
}

/// Append stored URLs to the bag's existing `images` list
fn append_images(bag: &mut Map<String, Value>, urls: &[String]) {
    let list = bag
        .entry("images".to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(items) = list {
        items.extend(urls.iter().map(|u| Value::String(u.clone())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sets_images_key() {
        let mut bag = Map::new();
        bag.insert("voltage".to_string(), json!("230V"));
        merge_images(&mut bag, &["/uploads/products/a.png".to_string()]);
        assert_eq!(bag["images"], json!(["/uploads/products/a.png"]));
        assert_eq!(bag["voltage"], "230V");

        // No uploads leaves the bag untouched
        let mut empty = Map::new();
        merge_images(&mut empty, &[]);
        assert!(empty.is_empty());
    }

    #[test]
    fn append_preserves_existing_urls() {
        let mut bag = Map::new();
        bag.insert("images".to_string(), json!(["/uploads/products/old.png"]));
        append_images(&mut bag, &["/uploads/products/new.png".to_string()]);
        assert_eq!(
            bag["images"],
            json!(["/uploads/products/old.png", "/uploads/products/new.png"])
        );
    }

    #[tokio::test]
    async fn create_removes_stored_files_when_the_insert_fails() {
        use crate::config::{
            AppConfig, DatabaseConfig, Environment, MediaConfig, SecurityConfig, ServerConfig,
        };
        use crate::validation::forms::FormFields;

        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig {
            environment: Environment::Development,
            server: ServerConfig {
                port: 0,
                public_base_url: "http://localhost".to_string(),
            },
            // Nothing listens on the discard port, so the insert fails fast
            database: DatabaseConfig {
                url: "postgres://127.0.0.1:9/unreachable".to_string(),
                max_connections: 1,
                acquire_timeout_secs: 1,
            },
            security: SecurityConfig {
                jwt_secret: "test".to_string(),
                jwt_expiry_hours: 1,
                cors_origins: Vec::new(),
            },
            media: MediaConfig {
                upload_dir: tmp.path().to_path_buf(),
                max_file_bytes: 1024,
                max_files_per_product: 10,
            },
        };
        let pool = crate::db::connect_pool(&config.database).unwrap();
        let state = AppState::new(config, pool);
        let service = ProductService::new(&state);

        let mut fields = FormFields::new();
        fields.insert("name".to_string(), "Pump".to_string());
        let form = ProductCreate::from_fields(&fields).unwrap();
        let file = UploadedFile {
            filename: Some("shot.png".to_string()),
            content_type: Some("image/png".to_string()),
            data: vec![0u8; 16],
        };

        assert!(service.create(form, &[file]).await.is_err());

        // The stored file was cleaned up again
        let mut entries = tokio::fs::read_dir(tmp.path().join("products")).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }
}
