// betis — esports betting API.
// Exports all modules for use as a library crate (the binary and the
// integration tests both build on this).

pub mod app_state;
pub mod auth;
pub mod betting;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod money;
pub mod routes;
pub mod sessions;
pub mod store;

pub use app_state::{AppState, SharedState};
pub use config::Config;
pub use error::ApiError;
pub use routes::build_router;
