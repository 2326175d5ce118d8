//! crates/cooking_assistant_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    CookingSession, CurrentCooking, EndedSession, GeneratedRecipe, GeneratedRecipeVersion,
    HistoryEntry, Recipe, RecipeDraft, RecipeFilter, RecipeOrigin, RecipeSummary,
    ResolvedRecipe, SessionStep, Step, Timer, TimerView, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type shared by every port and by the cooking engine.
///
/// The first group are the cooking-session kinds; the rest cover the
/// surrounding account, catalog and generation features.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("user not authenticated")]
    Unauthenticated,
    #[error("no recipe is being cooked")]
    NoActiveSession,
    #[error("a recipe is already being cooked")]
    AlreadyCooking,
    #[error("recipe not found")]
    RecipeNotFound,
    #[error("recipe has no steps")]
    RecipeHasNoSteps,
    #[error("step out of range")]
    OutOfRange,
    #[error("step not found")]
    StepNotFound,
    #[error("timer already exists for this step")]
    TimerAlreadyExists,
    #[error("timer not found")]
    TimerNotFound,
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Cooking ports
//=========================================================================================

/// Loads a recipe header and its ordered steps from one table family.
#[async_trait]
pub trait RecipeSource: Send + Sync {
    /// Fails with `RecipeNotFound` when the recipe is absent (or not visible to
    /// `user_id`) and `RecipeHasNoSteps` when its step array is empty.
    async fn load(&self, user_id: Uuid, recipe_id: i64) -> PortResult<ResolvedRecipe>;
}

/// Atomic persistence of a user's cooking session, its steps and its timers.
///
/// Every operation is keyed by `user_id`; implementations never expose
/// another user's rows.
#[async_trait]
pub trait CookingSessionStore: Send + Sync {
    /// Inserts the session at step 1 with all of its steps. `AlreadyCooking`
    /// if the user already has one; nothing is written on failure.
    async fn create(
        &self,
        user_id: Uuid,
        recipe_id: i64,
        origin: RecipeOrigin,
        name: &str,
        steps: &[Step],
    ) -> PortResult<CookingSession>;

    async fn read(&self, user_id: Uuid) -> PortResult<CurrentCooking>;

    async fn read_step(&self, user_id: Uuid, step_num: i32) -> PortResult<SessionStep>;

    /// Moves the step pointer by `delta` and returns the new current step.
    /// `OutOfRange` without mutation when the result would leave `[1, total_steps]`.
    async fn advance_step(&self, user_id: Uuid, delta: i32) -> PortResult<SessionStep>;

    /// Deletes the session, its steps and its timers.
    async fn destroy(&self, user_id: Uuid) -> PortResult<EndedSession>;

    async fn add_timer(
        &self,
        user_id: Uuid,
        step_num: i32,
        duration_sec: i32,
        description: &str,
    ) -> PortResult<Timer>;

    async fn delete_timer(&self, user_id: Uuid, step_num: i32) -> PortResult<()>;

    /// Timers ordered by step number. An empty list is a valid result.
    async fn list_timers(&self, user_id: Uuid) -> PortResult<Vec<TimerView>>;
}

/// Append-only log of finished cooking sessions.
#[async_trait]
pub trait HistoryRecorder: Send + Sync {
    async fn record(
        &self,
        user_id: Uuid,
        recipe_id: i64,
        origin: RecipeOrigin,
    ) -> PortResult<HistoryEntry>;

    /// Newest first.
    async fn list(&self, user_id: Uuid) -> PortResult<Vec<HistoryEntry>>;
}

//=========================================================================================
// Surrounding application ports
//=========================================================================================

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// `Conflict` when the email is already registered.
    async fn create_user_with_email(&self, email: &str, hashed_password: &str)
        -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the owning user of a live (unexpired) auth session.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_recipes(&self, filter: &RecipeFilter) -> PortResult<Vec<RecipeSummary>>;

    async fn get_recipe(&self, recipe_id: i64) -> PortResult<Recipe>;

    async fn list_favorites(&self, user_id: Uuid) -> PortResult<Vec<RecipeSummary>>;

    async fn add_favorite(&self, user_id: Uuid, recipe_id: i64) -> PortResult<()>;

    async fn remove_favorite(&self, user_id: Uuid, recipe_id: i64) -> PortResult<()>;
}

#[async_trait]
pub trait GeneratedRecipeStore: Send + Sync {
    /// Stores the draft as version 1 of a new recipe owned by `user_id`.
    async fn create(&self, user_id: Uuid, query: &str, draft: &RecipeDraft)
        -> PortResult<GeneratedRecipe>;

    /// Replaces the main row with the draft and appends a new version.
    async fn update(
        &self,
        user_id: Uuid,
        recipe_id: i64,
        query: &str,
        draft: &RecipeDraft,
    ) -> PortResult<GeneratedRecipe>;

    async fn get(&self, user_id: Uuid, recipe_id: i64) -> PortResult<GeneratedRecipe>;

    async fn list(&self, user_id: Uuid) -> PortResult<Vec<GeneratedRecipe>>;

    async fn versions(&self, user_id: Uuid, recipe_id: i64)
        -> PortResult<Vec<GeneratedRecipeVersion>>;
}

#[async_trait]
pub trait RecipeGenerationService: Send + Sync {
    /// Produces a recipe for `query`, optionally refining `previous`.
    async fn generate_recipe(
        &self,
        query: &str,
        previous: Option<&GeneratedRecipe>,
    ) -> PortResult<RecipeDraft>;
}
