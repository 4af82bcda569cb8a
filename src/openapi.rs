use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::analytics::models::{
    AnalyticsResponse, CategorySpend, SeriesPoint, Summary, TopExpense, TrendDirection, TrendEntry,
};
use crate::category::models::{
    CategoryResponse, CreateCategoryDto, DeleteCategoryResponse, UpdateCategoryDto,
};
use crate::errors::ErrorResponse;
use crate::transaction::models::{
    CreateTransactionDto, DeleteTransactionResponse, TransactionResponse, TransactionType,
    UpdateTransactionDto,
};
use crate::upload::models::{DeleteAvatarResponse, UploadResponse};
use crate::user::models::{
    ChangePasswordDto, PasswordChangedResponse, ProfileResponse, UpdateProfileDto,
    UpdateSettingsDto, UpdatedProfile, UserSettings,
};

/// Security scheme modifier for session token authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("Session token issued by the auth provider"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fintrack API",
        version = "0.1.0",
        description = "RESTful API for personal finance tracking",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development server"),
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Categories", description = "Budget category management"),
        (name = "Transactions", description = "Income and expense records"),
        (name = "Analytics", description = "Aggregated reports and trends"),
        (name = "User", description = "Profile, settings, and password"),
        (name = "Upload", description = "Avatar storage via the media host")
    ),
    paths(
        // Category endpoints
        crate::category::handlers::list_categories,
        crate::category::handlers::create_category,
        crate::category::handlers::update_category,
        crate::category::handlers::delete_category,
        // Transaction endpoints
        crate::transaction::handlers::list_transactions,
        crate::transaction::handlers::create_transaction,
        crate::transaction::handlers::get_transaction,
        crate::transaction::handlers::update_transaction,
        crate::transaction::handlers::delete_transaction,
        // Analytics endpoints
        crate::analytics::handlers::get_analytics,
        // User endpoints
        crate::user::handlers::get_profile,
        crate::user::handlers::update_profile,
        crate::user::handlers::get_settings,
        crate::user::handlers::update_settings,
        crate::user::handlers::change_password,
        // Upload endpoints
        crate::upload::handlers::upload_avatar,
        crate::upload::handlers::delete_avatar,
    ),
    components(
        schemas(
            // Error response
            ErrorResponse,
            // Category schemas
            CategoryResponse,
            CreateCategoryDto,
            UpdateCategoryDto,
            DeleteCategoryResponse,
            // Transaction schemas
            TransactionType,
            TransactionResponse,
            CreateTransactionDto,
            UpdateTransactionDto,
            DeleteTransactionResponse,
            // Analytics schemas
            AnalyticsResponse,
            CategorySpend,
            SeriesPoint,
            TopExpense,
            TrendEntry,
            TrendDirection,
            Summary,
            // User schemas
            ProfileResponse,
            UpdateProfileDto,
            UpdatedProfile,
            UserSettings,
            UpdateSettingsDto,
            ChangePasswordDto,
            PasswordChangedResponse,
            // Upload schemas
            UploadResponse,
            DeleteAvatarResponse,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;
