// Public API - what other modules can use
pub use handlers::{
    create_user, delete_user, get_user, is_verified, list_users, resend_verification_mail,
    verify_user,
};
pub use types::{CreateUserRequest, LoginRequest, UserResponse};

// Internal modules
mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod types;
