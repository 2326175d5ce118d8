pub mod domain;
pub mod engine;
pub mod memory;
pub mod ports;
pub mod recipe;

pub use domain::{
    AuthSession, CookingSession, CurrentCooking, EndedSession, GeneratedRecipe,
    GeneratedRecipeVersion, HistoryEntry, Recipe, RecipeDraft, RecipeFilter, RecipeOrigin,
    RecipeSummary, ResolvedRecipe, SessionStep, Step, Timer, TimerView, User, UserCredentials,
};
pub use engine::{require_user, CookingEngine};
pub use ports::{
    AccountStore, CatalogStore, CookingSessionStore, GeneratedRecipeStore, HistoryRecorder,
    PortError, PortResult, RecipeGenerationService, RecipeSource,
};
pub use recipe::RecipeResolver;
