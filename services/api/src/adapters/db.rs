//! services/api/src/adapters/db.rs
//!
//! This module contains the main database adapter. It implements the account,
//! catalog, generated-recipe and history ports from the `core` crate on top of
//! PostgreSQL using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cooking_assistant_core::domain::{
    GeneratedRecipe, GeneratedRecipeVersion, HistoryEntry, Recipe, RecipeDraft, RecipeFilter,
    RecipeOrigin, RecipeSummary, User, UserCredentials,
};
use cooking_assistant_core::ports::{
    AccountStore, CatalogStore, GeneratedRecipeStore, HistoryRecorder, PortError, PortResult,
};
use cooking_assistant_core::recipe::{normalize_steps, steps_to_json};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter for everything except the cooking session tables.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// Error classification
//=========================================================================================

/// Constraint violations that callers turn into semantic errors.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Violation {
    Unique,
    ForeignKey,
    Other,
}

pub(crate) fn violation(e: &sqlx::Error) -> Violation {
    match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Violation::Unique,
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            Violation::ForeignKey
        }
        _ => Violation::Other,
    }
}

pub(crate) fn store_error(e: sqlx::Error) -> PortError {
    PortError::StoreUnavailable(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: Option<String>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct RecipeRecord {
    id: i64,
    name: String,
    description: String,
    image_url: Option<String>,
    ready_in_minutes: Option<i32>,
    servings: Option<i32>,
    diets: Vec<String>,
    dish_types: Vec<String>,
    ingredients: Value,
    steps: Value,
}
impl RecipeRecord {
    fn to_domain(self) -> PortResult<Recipe> {
        // The catalog may hold recipes without instructions; they are only
        // rejected when someone tries to cook them.
        let steps = match normalize_steps(&self.steps) {
            Ok(steps) => steps,
            Err(PortError::RecipeHasNoSteps) => Vec::new(),
            Err(e) => return Err(e),
        };
        Ok(Recipe {
            id: self.id,
            name: self.name,
            description: self.description,
            image_url: self.image_url,
            ready_in_minutes: self.ready_in_minutes,
            servings: self.servings,
            diets: self.diets,
            dish_types: self.dish_types,
            ingredients: self.ingredients,
            steps,
        })
    }
}

#[derive(FromRow)]
struct RecipeSummaryRecord {
    id: i64,
    name: String,
    image_url: Option<String>,
    ready_in_minutes: Option<i32>,
}
impl RecipeSummaryRecord {
    fn to_domain(self) -> RecipeSummary {
        RecipeSummary {
            id: self.id,
            name: self.name,
            image_url: self.image_url,
            ready_in_minutes: self.ready_in_minutes,
        }
    }
}

#[derive(FromRow)]
struct GeneratedRecord {
    id: i64,
    user_id: Uuid,
    name: String,
    description: String,
    ingredients: Value,
    steps: Value,
    query: String,
    version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl GeneratedRecord {
    fn to_domain(self) -> PortResult<GeneratedRecipe> {
        Ok(GeneratedRecipe {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            description: self.description,
            ingredients: self.ingredients,
            steps: normalize_steps(&self.steps)?,
            query: self.query,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct GeneratedVersionRecord {
    recipe_id: i64,
    version: i32,
    name: String,
    description: String,
    ingredients: Value,
    steps: Value,
    query: String,
    created_at: DateTime<Utc>,
}
impl GeneratedVersionRecord {
    fn to_domain(self) -> PortResult<GeneratedRecipeVersion> {
        Ok(GeneratedRecipeVersion {
            recipe_id: self.recipe_id,
            version: self.version,
            name: self.name,
            description: self.description,
            ingredients: self.ingredients,
            steps: normalize_steps(&self.steps)?,
            query: self.query,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct HistoryRecord {
    user_id: Uuid,
    recipe_id: i64,
    is_generated: bool,
    created_at: DateTime<Utc>,
}
impl HistoryRecord {
    fn to_domain(self) -> HistoryEntry {
        HistoryEntry {
            user_id: self.user_id,
            recipe_id: self.recipe_id,
            origin: RecipeOrigin::from_flag(self.is_generated),
            created_at: self.created_at,
        }
    }
}

const GENERATED_COLUMNS: &str =
    "id, user_id, name, description, ingredients, steps, query, version, created_at, updated_at";

//=========================================================================================
// `AccountStore` Implementation
//=========================================================================================

#[async_trait]
impl AccountStore for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) RETURNING user_id, email",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violation(&e) {
            Violation::Unique => {
                PortError::Conflict(format!("Email {} is already registered", email))
            }
            _ => store_error(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1 AND hashed_password IS NOT NULL",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))?;
        Ok(record.to_domain())
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;
        user_id.ok_or(PortError::Unauthenticated)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

//=========================================================================================
// `CatalogStore` Implementation
//=========================================================================================

#[async_trait]
impl CatalogStore for DbAdapter {
    async fn list_recipes(&self, filter: &RecipeFilter) -> PortResult<Vec<RecipeSummary>> {
        let records = sqlx::query_as::<_, RecipeSummaryRecord>(
            r#"
            SELECT id, name, image_url, ready_in_minutes
            FROM recipes
            WHERE ($1::text IS NULL OR $1 = ANY(diets))
              AND ($2::text IS NULL OR $2 = ANY(dish_types))
            ORDER BY id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.diet.as_deref())
        .bind(filter.dish_type.as_deref())
        .bind(i64::from(filter.per_page))
        .bind(filter.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_recipe(&self, recipe_id: i64) -> PortResult<Recipe> {
        sqlx::query_as::<_, RecipeRecord>(
            r#"
            SELECT id, name, description, image_url, ready_in_minutes, servings,
                   diets, dish_types, ingredients, steps
            FROM recipes WHERE id = $1
            "#,
        )
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .ok_or_else(|| PortError::NotFound(format!("Recipe {} not found", recipe_id)))?
        .to_domain()
    }

    async fn list_favorites(&self, user_id: Uuid) -> PortResult<Vec<RecipeSummary>> {
        let records = sqlx::query_as::<_, RecipeSummaryRecord>(
            r#"
            SELECT r.id, r.name, r.image_url, r.ready_in_minutes
            FROM favorites f
            JOIN recipes r ON r.id = f.recipe_id
            WHERE f.user_id = $1
            ORDER BY f.created_at DESC, r.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn add_favorite(&self, user_id: Uuid, recipe_id: i64) -> PortResult<()> {
        sqlx::query("INSERT INTO favorites (user_id, recipe_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(recipe_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match violation(&e) {
                Violation::Unique => {
                    PortError::Conflict(format!("Recipe {} is already a favorite", recipe_id))
                }
                Violation::ForeignKey => {
                    PortError::NotFound(format!("Recipe {} not found", recipe_id))
                }
                Violation::Other => store_error(e),
            })?;
        Ok(())
    }

    async fn remove_favorite(&self, user_id: Uuid, recipe_id: i64) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Favorite {} not found", recipe_id)));
        }
        Ok(())
    }
}

//=========================================================================================
// `GeneratedRecipeStore` Implementation
//=========================================================================================

#[async_trait]
impl GeneratedRecipeStore for DbAdapter {
    async fn create(
        &self,
        user_id: Uuid,
        query: &str,
        draft: &RecipeDraft,
    ) -> PortResult<GeneratedRecipe> {
        let steps = steps_to_json(&draft.steps);
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let record = sqlx::query_as::<_, GeneratedRecord>(&format!(
            r#"
            INSERT INTO generated_recipes (user_id, name, description, ingredients, steps, query, version)
            VALUES ($1, $2, $3, $4, $5, $6, 1)
            RETURNING {GENERATED_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(&draft.ingredients)
        .bind(&steps)
        .bind(query)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_error)?;

        insert_version(&mut tx, &record).await?;
        tx.commit().await.map_err(store_error)?;

        record.to_domain()
    }

    async fn update(
        &self,
        user_id: Uuid,
        recipe_id: i64,
        query: &str,
        draft: &RecipeDraft,
    ) -> PortResult<GeneratedRecipe> {
        let steps = steps_to_json(&draft.steps);
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let record = sqlx::query_as::<_, GeneratedRecord>(&format!(
            r#"
            UPDATE generated_recipes SET
                name = $3,
                description = $4,
                ingredients = $5,
                steps = $6,
                query = $7,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {GENERATED_COLUMNS}
            "#
        ))
        .bind(recipe_id)
        .bind(user_id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(&draft.ingredients)
        .bind(&steps)
        .bind(query)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_error)?
        .ok_or_else(|| PortError::NotFound(format!("Generated recipe {} not found", recipe_id)))?;

        insert_version(&mut tx, &record).await?;
        tx.commit().await.map_err(store_error)?;

        record.to_domain()
    }

    async fn get(&self, user_id: Uuid, recipe_id: i64) -> PortResult<GeneratedRecipe> {
        sqlx::query_as::<_, GeneratedRecord>(&format!(
            "SELECT {GENERATED_COLUMNS} FROM generated_recipes WHERE id = $1 AND user_id = $2"
        ))
        .bind(recipe_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .ok_or_else(|| PortError::NotFound(format!("Generated recipe {} not found", recipe_id)))?
        .to_domain()
    }

    async fn list(&self, user_id: Uuid) -> PortResult<Vec<GeneratedRecipe>> {
        let records = sqlx::query_as::<_, GeneratedRecord>(&format!(
            "SELECT {GENERATED_COLUMNS} FROM generated_recipes WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn versions(
        &self,
        user_id: Uuid,
        recipe_id: i64,
    ) -> PortResult<Vec<GeneratedRecipeVersion>> {
        // Ownership check first so strangers get NotFound rather than an empty list.
        self.get(user_id, recipe_id).await?;

        let records = sqlx::query_as::<_, GeneratedVersionRecord>(
            r#"
            SELECT recipe_id, version, name, description, ingredients, steps, query, created_at
            FROM generated_recipe_versions
            WHERE recipe_id = $1
            ORDER BY version ASC
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }
}

async fn insert_version(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    record: &GeneratedRecord,
) -> PortResult<()> {
    sqlx::query(
        r#"
        INSERT INTO generated_recipe_versions
            (recipe_id, version, name, description, ingredients, steps, query, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(record.id)
    .bind(record.version)
    .bind(&record.name)
    .bind(&record.description)
    .bind(&record.ingredients)
    .bind(&record.steps)
    .bind(&record.query)
    .bind(record.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(store_error)?;
    Ok(())
}

//=========================================================================================
// `HistoryRecorder` Implementation
//=========================================================================================

#[async_trait]
impl HistoryRecorder for DbAdapter {
    async fn record(
        &self,
        user_id: Uuid,
        recipe_id: i64,
        origin: RecipeOrigin,
    ) -> PortResult<HistoryEntry> {
        let record = sqlx::query_as::<_, HistoryRecord>(
            r#"
            INSERT INTO user_cooking_history (user_id, recipe_id, is_generated, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING user_id, recipe_id, is_generated, created_at
            "#,
        )
        .bind(user_id)
        .bind(recipe_id)
        .bind(origin.is_generated())
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(record.to_domain())
    }

    async fn list(&self, user_id: Uuid) -> PortResult<Vec<HistoryEntry>> {
        let records = sqlx::query_as::<_, HistoryRecord>(
            r#"
            SELECT user_id, recipe_id, is_generated, created_at
            FROM user_cooking_history
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
