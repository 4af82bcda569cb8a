use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

/// Validate that a Decimal is non-negative
fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("must be non-negative"));
    }
    Ok(())
}

/// Database entity for categories
#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub threshold: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Category information returned in responses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    /// Unique category identifier
    pub id: i32,
    /// Category name
    #[schema(example = "Groceries")]
    pub name: String,
    /// Optional monthly budget ceiling
    #[schema(example = 500.00)]
    pub threshold: Option<Decimal>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(cat: Category) -> Self {
        Self {
            id: cat.id,
            name: cat.name,
            threshold: cat.threshold,
            created_at: cat.created_at,
        }
    }
}

/// Request body for creating a category
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryDto {
    /// Category name (1-50 characters)
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    #[schema(example = "Groceries")]
    pub name: String,

    /// Optional monthly budget ceiling
    #[validate(custom(
        function = "validate_non_negative",
        message = "Threshold must be non-negative"
    ))]
    #[schema(example = 500.00)]
    pub threshold: Option<Decimal>,
}

/// Request body for updating a category (PUT - full replace, omitting
/// `threshold` clears it)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryDto {
    /// Category name
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    #[schema(example = "Food & Dining")]
    pub name: String,

    /// Monthly budget ceiling; omit to clear
    #[validate(custom(
        function = "validate_non_negative",
        message = "Threshold must be non-negative"
    ))]
    #[schema(example = 600.00)]
    pub threshold: Option<Decimal>,
}

/// Response for a category deletion, reporting whether any transactions
/// were detached from the deleted category.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCategoryResponse {
    #[schema(example = "Category deleted")]
    pub message: String,
    /// True when referencing transactions had their category cleared
    pub transactions_updated: bool,
}

/// Path parameters for category ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct CategoryIdPath {
    /// Category ID
    pub id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_name_is_rejected() {
        let dto = CreateCategoryDto {
            name: String::new(),
            threshold: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_negative_threshold_is_rejected() {
        let dto = CreateCategoryDto {
            name: "Groceries".to_string(),
            threshold: Some(Decimal::from(-1)),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_threshold_is_optional() {
        let dto: CreateCategoryDto = serde_json::from_str(r#"{"name": "Rent"}"#).unwrap();
        assert!(dto.validate().is_ok());
        assert!(dto.threshold.is_none());
    }
}
