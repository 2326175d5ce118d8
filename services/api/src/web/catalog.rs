//! services/api/src/web/catalog.rs
//!
//! Handlers for browsing the recipe catalog and managing favorites.

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Extension,
};
use cooking_assistant_core::{domain::RecipeFilter, engine::require_user};
use std::sync::Arc;

use crate::web::{
    dto::{RecipeDto, RecipeListQuery, RecipeSummaryDto},
    envelope::{EnvelopeResult, Failure, Success},
    middleware::{caller, AuthUser},
    state::AppState,
};

const DEFAULT_PER_PAGE: u32 = 20;
const MAX_PER_PAGE: u32 = 50;

fn filter_from(query: RecipeListQuery) -> Result<RecipeFilter, Failure> {
    let page = query.page.unwrap_or(1);
    if page == 0 {
        return Err(Failure::invalid_input("page starts at 1"));
    }
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE);
    if !(1..=MAX_PER_PAGE).contains(&per_page) {
        return Err(Failure::invalid_input(format!(
            "perPage must be between 1 and {}",
            MAX_PER_PAGE
        )));
    }
    Ok(RecipeFilter {
        page,
        per_page,
        diet: query.diet.filter(|d| !d.trim().is_empty()),
        dish_type: query.dish_type.filter(|d| !d.trim().is_empty()),
    })
}

/// List catalog recipes, ordered by id.
#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "Catalog",
    params(RecipeListQuery),
    responses(
        (status = 200, description = "Envelope with one page of recipe summaries, or an error envelope (400)", body = [RecipeSummaryDto]),
    )
)]
pub async fn list_recipes_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RecipeListQuery>, QueryRejection>,
) -> EnvelopeResult<Vec<RecipeSummaryDto>> {
    let Query(query) = query.map_err(|e| Failure::invalid_input(e.body_text()))?;
    let filter = filter_from(query)?;
    let recipes = state.catalog.list_recipes(&filter).await?;
    Ok(Success(
        recipes.into_iter().map(RecipeSummaryDto::from).collect(),
    ))
}

/// Get one catalog recipe with its steps.
#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    tag = "Catalog",
    params(("id" = i64, Path, description = "Catalog recipe id")),
    responses(
        (status = 200, description = "Envelope with the recipe, or an error envelope (404)", body = RecipeDto),
    )
)]
pub async fn get_recipe_handler(
    State(state): State<Arc<AppState>>,
    recipe_id: Result<Path<i64>, PathRejection>,
) -> EnvelopeResult<RecipeDto> {
    let Path(recipe_id) = recipe_id.map_err(|e| Failure::invalid_input(e.body_text()))?;
    let recipe = state.catalog.get_recipe(recipe_id).await?;
    Ok(Success(recipe.into()))
}

/// The caller's favorite recipes, most recently added first.
#[utoipa::path(
    get,
    path = "/api/favorites",
    tag = "Catalog",
    responses(
        (status = 200, description = "Envelope with recipe summaries, or an error envelope (401)", body = [RecipeSummaryDto]),
    )
)]
pub async fn list_favorites_handler(
    State(state): State<Arc<AppState>>,
    user: Option<Extension<AuthUser>>,
) -> EnvelopeResult<Vec<RecipeSummaryDto>> {
    let user_id = require_user(caller(user))?;
    let favorites = state.catalog.list_favorites(user_id).await?;
    Ok(Success(
        favorites.into_iter().map(RecipeSummaryDto::from).collect(),
    ))
}

/// Mark a catalog recipe as a favorite.
#[utoipa::path(
    post,
    path = "/api/favorites/{recipe_id}",
    tag = "Catalog",
    params(("recipe_id" = i64, Path, description = "Catalog recipe id")),
    responses(
        (status = 200, description = "Envelope with the recipe id, or an error envelope (401, 404, 409)"),
    )
)]
pub async fn add_favorite_handler(
    State(state): State<Arc<AppState>>,
    user: Option<Extension<AuthUser>>,
    recipe_id: Result<Path<i64>, PathRejection>,
) -> EnvelopeResult<serde_json::Value> {
    let user_id = require_user(caller(user))?;
    let Path(recipe_id) = recipe_id.map_err(|e| Failure::invalid_input(e.body_text()))?;
    state.catalog.add_favorite(user_id, recipe_id).await?;
    Ok(Success(serde_json::json!({ "recipeId": recipe_id })))
}

/// Remove a recipe from the caller's favorites.
#[utoipa::path(
    delete,
    path = "/api/favorites/{recipe_id}",
    tag = "Catalog",
    params(("recipe_id" = i64, Path, description = "Catalog recipe id")),
    responses(
        (status = 200, description = "Envelope with the recipe id, or an error envelope (401, 404)"),
    )
)]
pub async fn remove_favorite_handler(
    State(state): State<Arc<AppState>>,
    user: Option<Extension<AuthUser>>,
    recipe_id: Result<Path<i64>, PathRejection>,
) -> EnvelopeResult<serde_json::Value> {
    let user_id = require_user(caller(user))?;
    let Path(recipe_id) = recipe_id.map_err(|e| Failure::invalid_input(e.body_text()))?;
    state.catalog.remove_favorite(user_id, recipe_id).await?;
    Ok(Success(serde_json::json!({ "recipeId": recipe_id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<u32>, per_page: Option<u32>) -> RecipeListQuery {
        RecipeListQuery {
            page,
            per_page,
            diet: Some(" ".to_string()),
            dish_type: Some("soup".to_string()),
        }
    }

    #[test]
    fn defaults_to_first_page_of_twenty() {
        let filter = filter_from(query(None, None)).unwrap();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.per_page, 20);
        assert_eq!(filter.diet, None);
        assert_eq!(filter.dish_type.as_deref(), Some("soup"));
    }

    #[test]
    fn rejects_out_of_range_paging() {
        assert!(filter_from(query(Some(0), None)).is_err());
        assert!(filter_from(query(None, Some(0))).is_err());
        assert!(filter_from(query(None, Some(51))).is_err());
        assert!(filter_from(query(Some(3), Some(50))).is_ok());
    }
}
