// Public API - what other modules can use
pub use handlers::{login, logout};
pub use middleware::token_auth;
pub use types::{AuthedUser, SessionClaims};

// Internal modules
mod handlers;
mod middleware;
pub mod models;
pub mod repository;
pub mod service;
pub mod token;
mod types;
