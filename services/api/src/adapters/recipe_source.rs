//! services/api/src/adapters/recipe_source.rs
//!
//! `RecipeSource` implementations for the two recipe table families.

use async_trait::async_trait;
use cooking_assistant_core::domain::ResolvedRecipe;
use cooking_assistant_core::ports::{PortError, PortResult, RecipeSource};
use cooking_assistant_core::recipe::normalize_steps;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::db::store_error;

#[derive(FromRow)]
struct HeaderAndSteps {
    name: String,
    steps: Option<Value>,
}
impl HeaderAndSteps {
    fn to_domain(self) -> PortResult<ResolvedRecipe> {
        Ok(ResolvedRecipe {
            name: self.name,
            steps: normalize_steps(self.steps.as_ref().unwrap_or(&Value::Null))?,
        })
    }
}

/// Reads the shared `recipes` table. Any user may cook any catalog recipe.
#[derive(Clone)]
pub struct PgCatalogSource {
    pool: PgPool,
}

impl PgCatalogSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipeSource for PgCatalogSource {
    async fn load(&self, _user_id: Uuid, recipe_id: i64) -> PortResult<ResolvedRecipe> {
        sqlx::query_as::<_, HeaderAndSteps>("SELECT name, steps FROM recipes WHERE id = $1")
            .bind(recipe_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .ok_or(PortError::RecipeNotFound)?
            .to_domain()
    }
}

/// Reads the main row of `generated_recipes`, visible only to its owner.
#[derive(Clone)]
pub struct PgGeneratedSource {
    pool: PgPool,
}

impl PgGeneratedSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipeSource for PgGeneratedSource {
    async fn load(&self, user_id: Uuid, recipe_id: i64) -> PortResult<ResolvedRecipe> {
        sqlx::query_as::<_, HeaderAndSteps>(
            "SELECT name, steps FROM generated_recipes WHERE id = $1 AND user_id = $2",
        )
        .bind(recipe_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .ok_or(PortError::RecipeNotFound)?
        .to_domain()
    }
}
