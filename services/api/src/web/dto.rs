//! services/api/src/web/dto.rs
//!
//! JSON payloads of the REST API and their conversions from domain types.

use chrono::{DateTime, Utc};
use cooking_assistant_core::domain::{
    CurrentCooking, EndedSession, GeneratedRecipe, GeneratedRecipeVersion, HistoryEntry, Recipe,
    RecipeSummary, SessionStep, Step, TimerView,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Cooking session
//=========================================================================================

/// One step of a recipe or of the current cooking session.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepDto {
    pub step_num: i32,
    pub step: String,
    #[schema(value_type = Object)]
    pub ingredients: Value,
    #[schema(value_type = Object)]
    pub equipment: Value,
    #[schema(value_type = Object)]
    pub length: Value,
}

impl From<SessionStep> for StepDto {
    fn from(step: SessionStep) -> Self {
        Self {
            step_num: step.step_num,
            step: step.text,
            ingredients: step.ingredients,
            equipment: step.equipment,
            length: step.length,
        }
    }
}

impl From<Step> for StepDto {
    fn from(step: Step) -> Self {
        Self {
            step_num: step.number,
            step: step.text,
            ingredients: step.ingredients,
            equipment: step.equipment,
            length: step.length,
        }
    }
}

fn steps(steps: Vec<Step>) -> Vec<StepDto> {
    steps.into_iter().map(StepDto::from).collect()
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentRecipeDto {
    pub recipe_id: i64,
    pub is_generated: bool,
    pub name: String,
    pub total_steps: i32,
    pub current_step: StepDto,
}

impl From<CurrentCooking> for CurrentRecipeDto {
    fn from(current: CurrentCooking) -> Self {
        Self {
            recipe_id: current.session.recipe_id,
            is_generated: current.session.origin.is_generated(),
            name: current.session.name,
            total_steps: current.session.total_steps,
            current_step: current.current_step.into(),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndedRecipeDto {
    pub recipe_id: i64,
    pub is_generated: bool,
}

impl From<EndedSession> for EndedRecipeDto {
    fn from(ended: EndedSession) -> Self {
        Self {
            recipe_id: ended.recipe_id,
            is_generated: ended.origin.is_generated(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct StartForm {
    pub id: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct AddTimerRequest {
    pub step: i32,
    /// Duration in seconds.
    pub length: i32,
}

#[derive(Deserialize, ToSchema)]
pub struct FinishTimerRequest {
    pub step: i32,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimerDto {
    pub step: i32,
    pub length: i32,
    pub description: String,
    pub step_text: String,
    pub created_at: DateTime<Utc>,
}

impl From<TimerView> for TimerDto {
    fn from(view: TimerView) -> Self {
        Self {
            step: view.timer.step_num,
            length: view.timer.duration_sec,
            description: view.timer.description,
            step_text: view.step_text,
            created_at: view.timer.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryDto {
    pub recipe_id: i64,
    pub is_generated: bool,
    pub created_at: DateTime<Utc>,
}

impl From<HistoryEntry> for HistoryEntryDto {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            recipe_id: entry.recipe_id,
            is_generated: entry.origin.is_generated(),
            created_at: entry.created_at,
        }
    }
}

//=========================================================================================
// Catalog
//=========================================================================================

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RecipeListQuery {
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size, 1 to 50.
    pub per_page: Option<u32>,
    pub diet: Option<String>,
    pub dish_type: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSummaryDto {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub ready_in_minutes: Option<i32>,
}

impl From<RecipeSummary> for RecipeSummaryDto {
    fn from(summary: RecipeSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            image_url: summary.image_url,
            ready_in_minutes: summary.ready_in_minutes,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDto {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub ready_in_minutes: Option<i32>,
    pub servings: Option<i32>,
    pub diets: Vec<String>,
    pub dish_types: Vec<String>,
    #[schema(value_type = Object)]
    pub ingredients: Value,
    pub steps: Vec<StepDto>,
}

impl From<Recipe> for RecipeDto {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            description: recipe.description,
            image_url: recipe.image_url,
            ready_in_minutes: recipe.ready_in_minutes,
            servings: recipe.servings,
            diets: recipe.diets,
            dish_types: recipe.dish_types,
            ingredients: recipe.ingredients,
            steps: steps(recipe.steps),
        }
    }
}

//=========================================================================================
// Generated recipes
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct GenerateRequest {
    pub query: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRecipeDto {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[schema(value_type = Object)]
    pub ingredients: Value,
    pub steps: Vec<StepDto>,
    pub query: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GeneratedRecipe> for GeneratedRecipeDto {
    fn from(recipe: GeneratedRecipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            description: recipe.description,
            ingredients: recipe.ingredients,
            steps: steps(recipe.steps),
            query: recipe.query,
            version: recipe.version,
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedVersionDto {
    pub recipe_id: i64,
    pub version: i32,
    pub name: String,
    pub description: String,
    #[schema(value_type = Object)]
    pub ingredients: Value,
    pub steps: Vec<StepDto>,
    pub query: String,
    pub created_at: DateTime<Utc>,
}

impl From<GeneratedRecipeVersion> for GeneratedVersionDto {
    fn from(version: GeneratedRecipeVersion) -> Self {
        Self {
            recipe_id: version.recipe_id,
            version: version.version,
            name: version.name,
            description: version.description,
            ingredients: version.ingredients,
            steps: steps(version.steps),
            query: version.query,
            created_at: version.created_at,
        }
    }
}

//=========================================================================================
// Accounts
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
}
