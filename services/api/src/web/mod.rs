pub mod auth;
pub mod catalog;
pub mod cooking;
pub mod dto;
pub mod envelope;
pub mod generate;
pub mod middleware;
pub mod rest;
pub mod state;

pub use middleware::{resolve_user, AuthUser};
pub use rest::{build_router, ApiDoc};
pub use state::AppState;
