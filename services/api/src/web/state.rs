//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use cooking_assistant_core::{
    engine::CookingEngine,
    ports::{AccountStore, CatalogStore, GeneratedRecipeStore, RecipeGenerationService},
};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub accounts: Arc<dyn AccountStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub generated: Arc<dyn GeneratedRecipeStore>,
    pub generator: Arc<dyn RecipeGenerationService>,
    pub cooking: CookingEngine,
}
