pub mod handlers;
pub mod models;
mod password;
pub mod service;

// Re-export handlers for use in main.rs
pub use handlers::{change_password, get_profile, get_settings, update_profile, update_settings};
