// Category orchestration: validation, image handling and persistence.

use serde_json::{json, Value};

use crate::db::models::Category;
use crate::db::CategoryRepo;
use crate::error::ApiError;
use crate::media::{MediaStore, OwnerKind, UploadedFile};
use crate::state::AppState;
use crate::validation::forms::{CategoryCreate, CategoryUpdate};

pub struct CategoryService<'a> {
    repo: CategoryRepo<'a>,
    media: &'a MediaStore,
}

impl<'a> CategoryService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            repo: CategoryRepo::new(&state.pool),
            media: &state.media,
        }
    }

    /// Create a category, storing its image first when one was uploaded.
    /// A duplicate name yields 409; the DB unique constraint backstops the
    /// pre-check against concurrent creates.
    pub async fn create(
        &self,
        form: CategoryCreate,
        image: Option<&UploadedFile>,
    ) -> Result<Category, ApiError> {
        if let Some(file) = image {
            self.media.validate(file)?;
        }

        if self.repo.select_by_name(&form.name).await?.is_some() {
            return Err(ApiError::conflict(format!(
                "Category '{}' already exists",
                form.name
            )));
        }

        let image_url = match image {
            Some(file) => Some(self.media.store(OwnerKind::Categories, file).await?),
            None => None,
        };

        let inserted = self
            .repo
            .insert(&form.name, &form.description, image_url.as_deref())
            .await;

        let category = match inserted {
            Ok(category) => category,
            Err(e) => {
                // Best-effort cleanup of the freshly stored file
                if let Some(url) = image_url.as_deref() {
                    self.media.delete(url).await;
                }
                return Err(e.into());
            }
        };

        tracing::info!(category_id = category.id, name = %category.name, "category created");
        Ok(category)
    }

    pub async fn list(&self) -> Result<Vec<Category>, ApiError> {
        Ok(self.repo.select_all().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Category, ApiError> {
        self.repo
            .select_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Category {} not found", id)))
    }

    /// Partial update; a newly uploaded image replaces the old file
    /// (old-file deletion is best-effort).
    pub async fn update(
        &self,
        id: i64,
        form: CategoryUpdate,
        image: Option<&UploadedFile>,
    ) -> Result<Category, ApiError> {
        let existing = self.get(id).await?;

        let image_url = match image {
            Some(file) => Some(
                self.media
                    .replace(OwnerKind::Categories, existing.image_url.as_deref(), file)
                    .await?,
            ),
            None => None,
        };

        let updated = self
            .repo
            .update(
                id,
                form.name.as_deref(),
                form.description.as_deref(),
                image_url.as_deref(),
            )
            .await?;

        Ok(updated)
    }

    /// Delete the category and its image file. The file removal is
    /// best-effort and never blocks the row deletion.
    pub async fn delete(&self, id: i64) -> Result<Value, ApiError> {
        let existing = self.get(id).await?;

        if let Some(url) = existing.image_url.as_deref() {
            self.media.delete(url).await;
        }

        self.repo.delete(id).await?;
        tracing::info!(category_id = id, name = %existing.name, "category deleted");

        Ok(json!({
            "success": true,
            "message": format!("Successfully deleted '{}'", existing.name),
        }))
    }
}
