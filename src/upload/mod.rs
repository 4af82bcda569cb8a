pub mod handlers;
pub mod models;
pub mod service;

// Re-export handlers for use in main.rs
pub use handlers::{delete_avatar, upload_avatar};
