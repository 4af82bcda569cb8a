use serde_json::{json, Value};

mod common;
use common::TestApp;

#[actix_rt::test]
async fn test_list_categories_requires_auth() {
    let app = TestApp::new();

    let response = app.get("/categories").await;

    assert_eq!(response.status(), 401);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[actix_rt::test]
async fn test_create_category_requires_auth() {
    let app = TestApp::new();

    let payload = json!({"name": "Groceries", "threshold": 500});
    let response = app.post("/categories", &payload).await;

    assert_eq!(response.status(), 401);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[actix_rt::test]
async fn test_update_and_delete_category_require_auth() {
    let app = TestApp::new();

    let payload = json!({"name": "Groceries"});
    let response = app.put("/categories/1", &payload).await;
    assert_eq!(response.status(), 401);

    let response = app.delete("/categories/1").await;
    assert_eq!(response.status(), 401);
}

#[actix_rt::test]
async fn test_list_transactions_requires_auth() {
    let app = TestApp::new();

    let response = app.get("/transactions?year=2025&month=6").await;

    assert_eq!(response.status(), 401);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[actix_rt::test]
async fn test_create_transaction_requires_auth() {
    let app = TestApp::new();

    let payload = json!({
        "type": "expense",
        "description": "Lunch",
        "amount": 12.5
    });
    let response = app.post("/transactions", &payload).await;

    assert_eq!(response.status(), 401);
}

#[actix_rt::test]
async fn test_transaction_by_id_routes_require_auth() {
    let app = TestApp::new();

    let response = app.get("/transactions/1").await;
    assert_eq!(response.status(), 401);

    let payload = json!({
        "type": "income",
        "description": "Salary",
        "amount": 1000
    });
    let response = app.put("/transactions/1", &payload).await;
    assert_eq!(response.status(), 401);

    let response = app.delete("/transactions/1").await;
    assert_eq!(response.status(), 401);
}

#[actix_rt::test]
async fn test_user_routes_require_auth() {
    let app = TestApp::new();

    let response = app.get("/user/profile").await;
    assert_eq!(response.status(), 401);

    let response = app.get("/user/settings").await;
    assert_eq!(response.status(), 401);

    let payload = json!({"darkMode": true});
    let response = app.put("/user/settings", &payload).await;
    assert_eq!(response.status(), 401);

    let payload = json!({"currentPassword": "old_pass", "newPassword": "new_password"});
    let response = app.put("/user/password", &payload).await;
    assert_eq!(response.status(), 401);
}

#[actix_rt::test]
async fn test_avatar_deletion_requires_auth() {
    let app = TestApp::new();

    let response = app.delete("/upload/avatar?publicId=avatars/user_1").await;

    assert_eq!(response.status(), 401);
}

#[actix_rt::test]
async fn test_non_bearer_authorization_is_rejected() {
    let app = TestApp::new();

    let response = app
        .get_with_auth("/categories", "Basic dXNlcjpwYXNz")
        .await;

    assert_eq!(response.status(), 401);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[actix_rt::test]
async fn test_analytics_store_outage_is_an_opaque_500() {
    let app = TestApp::new();

    let response = app.get("/analytics?period=monthly").await;

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "INTERNAL_ERROR");
    // Store driver detail must never reach the client
    assert_eq!(body["message"], "An internal error occurred");
}
