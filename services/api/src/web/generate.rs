//! services/api/src/web/generate.rs
//!
//! Handlers for LLM-generated recipes and their version history.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};
use cooking_assistant_core::engine::require_user;
use std::sync::Arc;
use tracing::info;

use crate::web::{
    dto::{GenerateRequest, GeneratedRecipeDto, GeneratedVersionDto},
    envelope::{EnvelopeResult, Failure, Success},
    middleware::{caller, AuthUser},
    state::AppState,
};

fn query_text(body: Result<Json<GenerateRequest>, JsonRejection>) -> Result<String, Failure> {
    let Json(body) = body.map_err(|e| Failure::invalid_input(e.body_text()))?;
    let query = body.query.trim();
    if query.is_empty() {
        return Err(Failure::invalid_input("query must not be empty"));
    }
    Ok(query.to_string())
}

/// Generate a new recipe from a free-text request.
#[utoipa::path(
    post,
    path = "/api/generate",
    tag = "Generated recipes",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Envelope with the stored recipe (version 1), or an error envelope (400, 401, 422, 500)", body = GeneratedRecipeDto),
    )
)]
pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    user: Option<Extension<AuthUser>>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> EnvelopeResult<GeneratedRecipeDto> {
    let user_id = require_user(caller(user))?;
    let query = query_text(body)?;

    let draft = state.generator.generate_recipe(&query, None).await?;
    let recipe = state.generated.create(user_id, &query, &draft).await?;
    info!(
        "User {} generated recipe {} with {} steps",
        user_id,
        recipe.id,
        recipe.steps.len()
    );
    Ok(Success(recipe.into()))
}

/// The caller's generated recipes, newest first.
#[utoipa::path(
    get,
    path = "/api/generate",
    tag = "Generated recipes",
    responses(
        (status = 200, description = "Envelope with the recipes, or an error envelope (401)", body = [GeneratedRecipeDto]),
    )
)]
pub async fn list_generated_handler(
    State(state): State<Arc<AppState>>,
    user: Option<Extension<AuthUser>>,
) -> EnvelopeResult<Vec<GeneratedRecipeDto>> {
    let user_id = require_user(caller(user))?;
    let recipes = state.generated.list(user_id).await?;
    Ok(Success(
        recipes.into_iter().map(GeneratedRecipeDto::from).collect(),
    ))
}

/// Get one of the caller's generated recipes.
#[utoipa::path(
    get,
    path = "/api/generate/{recipe_id}",
    tag = "Generated recipes",
    params(("recipe_id" = i64, Path, description = "Generated recipe id")),
    responses(
        (status = 200, description = "Envelope with the recipe, or an error envelope (401, 404)", body = GeneratedRecipeDto),
    )
)]
pub async fn get_generated_handler(
    State(state): State<Arc<AppState>>,
    user: Option<Extension<AuthUser>>,
    recipe_id: Result<Path<i64>, PathRejection>,
) -> EnvelopeResult<GeneratedRecipeDto> {
    let user_id = require_user(caller(user))?;
    let Path(recipe_id) = recipe_id.map_err(|e| Failure::invalid_input(e.body_text()))?;
    let recipe = state.generated.get(user_id, recipe_id).await?;
    Ok(Success(recipe.into()))
}

/// Regenerate a recipe with a change request, storing a new version.
#[utoipa::path(
    post,
    path = "/api/generate/{recipe_id}/update",
    tag = "Generated recipes",
    params(("recipe_id" = i64, Path, description = "Generated recipe id")),
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Envelope with the updated recipe, or an error envelope (400, 401, 404, 422, 500)", body = GeneratedRecipeDto),
    )
)]
pub async fn update_generated_handler(
    State(state): State<Arc<AppState>>,
    user: Option<Extension<AuthUser>>,
    recipe_id: Result<Path<i64>, PathRejection>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> EnvelopeResult<GeneratedRecipeDto> {
    let user_id = require_user(caller(user))?;
    let Path(recipe_id) = recipe_id.map_err(|e| Failure::invalid_input(e.body_text()))?;
    let query = query_text(body)?;

    let current = state.generated.get(user_id, recipe_id).await?;
    let draft = state
        .generator
        .generate_recipe(&query, Some(&current))
        .await?;
    let recipe = state
        .generated
        .update(user_id, recipe_id, &query, &draft)
        .await?;
    info!(
        "User {} updated generated recipe {} to version {}",
        user_id, recipe.id, recipe.version
    );
    Ok(Success(recipe.into()))
}

/// All stored versions of a generated recipe, oldest first.
#[utoipa::path(
    get,
    path = "/api/generate/{recipe_id}/versions",
    tag = "Generated recipes",
    params(("recipe_id" = i64, Path, description = "Generated recipe id")),
    responses(
        (status = 200, description = "Envelope with the versions, or an error envelope (401, 404)", body = [GeneratedVersionDto]),
    )
)]
pub async fn list_versions_handler(
    State(state): State<Arc<AppState>>,
    user: Option<Extension<AuthUser>>,
    recipe_id: Result<Path<i64>, PathRejection>,
) -> EnvelopeResult<Vec<GeneratedVersionDto>> {
    let user_id = require_user(caller(user))?;
    let Path(recipe_id) = recipe_id.map_err(|e| Failure::invalid_input(e.body_text()))?;
    let versions = state.generated.versions(user_id, recipe_id).await?;
    Ok(Success(
        versions.into_iter().map(GeneratedVersionDto::from).collect(),
    ))
}
