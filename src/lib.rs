// Library crate for the user authentication server
// This file exposes the public API for integration tests

pub mod config;
pub mod mail;
pub mod routes;
pub mod session;
pub mod shared;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use routes::app;
pub use session::AuthedUser;
pub use shared::{AppError, AppState};
pub use user::UserResponse;
