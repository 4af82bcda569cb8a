use sqlx::PgPool;

use super::models::{Category, CreateCategoryDto, UpdateCategoryDto};
use crate::errors::AppError;

/// Service layer for category business logic.
pub struct CategoryService;

impl CategoryService {
    /// List all categories, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Category>, AppError> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, threshold, created_at
            FROM categories
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }

    /// Create a new category. Names are trimmed and must be unique
    /// (case-sensitive, exact match).
    pub async fn create(pool: &PgPool, dto: &CreateCategoryDto) -> Result<Category, AppError> {
        let name = dto.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }

        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM categories WHERE name = $1)")
                .bind(&name)
                .fetch_one(pool)
                .await
                .map_err(|e| AppError::InternalError(e.to_string()))?;

        if exists {
            return Err(AppError::Conflict(
                "A category with this name already exists".to_string(),
            ));
        }

        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, threshold)
            VALUES ($1, $2)
            RETURNING id, name, threshold, created_at
            "#,
        )
        .bind(&name)
        .bind(dto.threshold)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }

    /// Update an existing category (full-field replace). The uniqueness
    /// check excludes the category's own id.
    pub async fn update(
        pool: &PgPool,
        category_id: i32,
        dto: &UpdateCategoryDto,
    ) -> Result<Category, AppError> {
        let name = dto.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }

        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(category_id)
                .fetch_one(pool)
                .await
                .map_err(|e| AppError::InternalError(e.to_string()))?;

        if !exists {
            return Err(AppError::NotFound("Category not found".to_string()));
        }

        let conflict = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE name = $1 AND id != $2)",
        )
        .bind(&name)
        .bind(category_id)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        if conflict {
            return Err(AppError::Conflict(
                "A category with this name already exists".to_string(),
            ));
        }

        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $2, threshold = $3
            WHERE id = $1
            RETURNING id, name, threshold, created_at
            "#,
        )
        .bind(category_id)
        .bind(&name)
        .bind(dto.threshold)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }

    /// Delete a category. Referencing transactions are detached (their
    /// `category_id` set to NULL), never deleted. Returns whether any
    /// transactions were detached.
    pub async fn delete(pool: &PgPool, category_id: i32) -> Result<bool, AppError> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(category_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| AppError::InternalError(e.to_string()))?;

        if !exists {
            return Err(AppError::NotFound("Category not found".to_string()));
        }

        let referenced = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM transactions WHERE category_id = $1)",
        )
        .bind(category_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        if referenced {
            sqlx::query("UPDATE transactions SET category_id = NULL WHERE category_id = $1")
                .bind(category_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::InternalError(e.to_string()))?;
        }

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        Ok(referenced)
    }
}
