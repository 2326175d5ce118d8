//! crates/cooking_assistant_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

//=========================================================================================
// Recipes
//=========================================================================================

/// Which table family a recipe lives in: the shared catalog or a user's generated recipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipeOrigin {
    Catalog,
    Generated,
}

impl RecipeOrigin {
    pub fn from_flag(is_generated: bool) -> Self {
        if is_generated {
            RecipeOrigin::Generated
        } else {
            RecipeOrigin::Catalog
        }
    }

    pub fn is_generated(self) -> bool {
        matches!(self, RecipeOrigin::Generated)
    }
}

/// One numbered instruction of a recipe.
///
/// `ingredients`, `equipment` and `length` are opaque JSON payloads.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub number: i32,
    pub text: String,
    pub ingredients: Value,
    pub equipment: Value,
    pub length: Value,
}

/// A recipe header and its ordered steps, as loaded by a `RecipeSource`.
#[derive(Debug, Clone)]
pub struct ResolvedRecipe {
    pub name: String,
    pub steps: Vec<Step>,
}

/// An editorial recipe from the shared catalog.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub ready_in_minutes: Option<i32>,
    pub servings: Option<i32>,
    pub diets: Vec<String>,
    pub dish_types: Vec<String>,
    pub ingredients: Value,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone)]
pub struct RecipeSummary {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub ready_in_minutes: Option<i32>,
}

/// Paging and filtering for catalog listings. `page` is 1-based.
#[derive(Debug, Clone)]
pub struct RecipeFilter {
    pub page: u32,
    pub per_page: u32,
    pub diet: Option<String>,
    pub dish_type: Option<String>,
}

impl RecipeFilter {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }
}

/// The main row of a recipe produced by the chat-completion provider.
#[derive(Debug, Clone)]
pub struct GeneratedRecipe {
    pub id: i64,
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub ingredients: Value,
    pub steps: Vec<Step>,
    pub query: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A frozen snapshot of a generated recipe at one version.
#[derive(Debug, Clone)]
pub struct GeneratedRecipeVersion {
    pub recipe_id: i64,
    pub version: i32,
    pub name: String,
    pub description: String,
    pub ingredients: Value,
    pub steps: Vec<Step>,
    pub query: String,
    pub created_at: DateTime<Utc>,
}

/// A recipe proposal returned by the generator, already validated.
#[derive(Debug, Clone)]
pub struct RecipeDraft {
    pub name: String,
    pub description: String,
    pub ingredients: Value,
    pub steps: Vec<Step>,
}

//=========================================================================================
// Cooking session
//=========================================================================================

/// The per-user, at-most-one in-progress cooking of a recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct CookingSession {
    pub user_id: Uuid,
    pub recipe_id: i64,
    pub origin: RecipeOrigin,
    pub name: String,
    pub current_step_num: i32,
    pub total_steps: i32,
}

/// A step materialized into the session at start. Read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStep {
    pub user_id: Uuid,
    pub recipe_id: i64,
    pub step_num: i32,
    pub text: String,
    pub ingredients: Value,
    pub equipment: Value,
    pub length: Value,
}

/// Session header together with the step the pointer is on.
#[derive(Debug, Clone)]
pub struct CurrentCooking {
    pub session: CookingSession,
    pub current_step: SessionStep,
}

/// What was being cooked when a session was destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndedSession {
    pub recipe_id: i64,
    pub origin: RecipeOrigin,
}

/// A countdown attached to one step of the current session.
#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    pub user_id: Uuid,
    pub step_num: i32,
    pub duration_sec: i32,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// A timer joined with the text of the step it belongs to.
#[derive(Debug, Clone)]
pub struct TimerView {
    pub timer: Timer,
    pub step_text: String,
}

/// Immutable record that a user finished cooking a recipe.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub user_id: Uuid,
    pub recipe_id: i64,
    pub origin: RecipeOrigin,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Accounts
//=========================================================================================

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: Option<String>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}
