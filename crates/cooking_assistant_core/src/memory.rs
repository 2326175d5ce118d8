//! crates/cooking_assistant_core/src/memory.rs
//!
//! In-memory implementations of the ports. They hold the same invariants as
//! the Postgres adapters (one session per user, one timer per step, owner-only
//! generated recipes) and back the test suites of both workspace members.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::{
    AuthSession, CookingSession, CurrentCooking, EndedSession, GeneratedRecipe,
    GeneratedRecipeVersion, HistoryEntry, Recipe, RecipeDraft, RecipeFilter, RecipeOrigin,
    RecipeSummary, ResolvedRecipe, SessionStep, Step, Timer, TimerView, User, UserCredentials,
};
use crate::ports::{
    AccountStore, CatalogStore, CookingSessionStore, GeneratedRecipeStore, HistoryRecorder,
    PortError, PortResult, RecipeSource,
};
use crate::recipe::{normalize_steps, steps_to_json};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

//=========================================================================================
// Recipes (catalog, generated, favorites)
//=========================================================================================

#[derive(Clone)]
struct CatalogRow {
    recipe: Recipe,
    raw_steps: Value,
}

#[derive(Clone)]
struct GeneratedRow {
    user_id: Uuid,
    name: String,
    description: String,
    ingredients: Value,
    raw_steps: Value,
    query: String,
    version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    history: Vec<GeneratedRecipeVersion>,
}

impl GeneratedRow {
    fn to_domain(&self, id: i64) -> PortResult<GeneratedRecipe> {
        Ok(GeneratedRecipe {
            id,
            user_id: self.user_id,
            name: self.name.clone(),
            description: self.description.clone(),
            ingredients: self.ingredients.clone(),
            steps: normalize_steps(&self.raw_steps)?,
            query: self.query.clone(),
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    fn snapshot(&self, id: i64) -> PortResult<GeneratedRecipeVersion> {
        Ok(GeneratedRecipeVersion {
            recipe_id: id,
            version: self.version,
            name: self.name.clone(),
            description: self.description.clone(),
            ingredients: self.ingredients.clone(),
            steps: normalize_steps(&self.raw_steps)?,
            query: self.query.clone(),
            created_at: self.updated_at,
        })
    }
}

#[derive(Default)]
struct RecipeTables {
    catalog: BTreeMap<i64, CatalogRow>,
    generated: BTreeMap<i64, GeneratedRow>,
    // (user, recipe) -> added at
    favorites: HashMap<(Uuid, i64), DateTime<Utc>>,
}

/// Catalog, generated recipes and favorites kept in process memory.
#[derive(Clone, Default)]
pub struct InMemoryRecipes {
    tables: Arc<Mutex<RecipeTables>>,
}

impl InMemoryRecipes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a catalog recipe with a raw step array, stored as-is.
    pub fn add_catalog(&self, id: i64, name: &str, raw_steps: Value) {
        let recipe = Recipe {
            id,
            name: name.to_string(),
            description: String::new(),
            image_url: None,
            ready_in_minutes: None,
            servings: None,
            diets: Vec::new(),
            dish_types: Vec::new(),
            ingredients: json!([]),
            steps: Vec::new(),
        };
        self.add_catalog_recipe(recipe, raw_steps);
    }

    /// Adds a fully described catalog recipe. `recipe.steps` is ignored in
    /// favor of `raw_steps`.
    pub fn add_catalog_recipe(&self, recipe: Recipe, raw_steps: Value) {
        lock(&self.tables)
            .catalog
            .insert(recipe.id, CatalogRow { recipe, raw_steps });
    }

    pub fn add_generated(&self, id: i64, owner: Uuid, name: &str, raw_steps: Value) {
        let now = Utc::now();
        let row = GeneratedRow {
            user_id: owner,
            name: name.to_string(),
            description: String::new(),
            ingredients: json!([]),
            raw_steps,
            query: String::new(),
            version: 1,
            created_at: now,
            updated_at: now,
            history: Vec::new(),
        };
        lock(&self.tables).generated.insert(id, row);
    }

    pub fn catalog_source(&self) -> Arc<dyn RecipeSource> {
        Arc::new(CatalogSource {
            tables: self.tables.clone(),
        })
    }

    pub fn generated_source(&self) -> Arc<dyn RecipeSource> {
        Arc::new(GeneratedSource {
            tables: self.tables.clone(),
        })
    }
}

struct CatalogSource {
    tables: Arc<Mutex<RecipeTables>>,
}

#[async_trait]
impl RecipeSource for CatalogSource {
    async fn load(&self, _user_id: Uuid, recipe_id: i64) -> PortResult<ResolvedRecipe> {
        let tables = lock(&self.tables);
        let row = tables
            .catalog
            .get(&recipe_id)
            .ok_or(PortError::RecipeNotFound)?;
        Ok(ResolvedRecipe {
            name: row.recipe.name.clone(),
            steps: normalize_steps(&row.raw_steps)?,
        })
    }
}

struct GeneratedSource {
    tables: Arc<Mutex<RecipeTables>>,
}

#[async_trait]
impl RecipeSource for GeneratedSource {
    async fn load(&self, user_id: Uuid, recipe_id: i64) -> PortResult<ResolvedRecipe> {
        let tables = lock(&self.tables);
        let row = tables
            .generated
            .get(&recipe_id)
            .filter(|row| row.user_id == user_id)
            .ok_or(PortError::RecipeNotFound)?;
        Ok(ResolvedRecipe {
            name: row.name.clone(),
            steps: normalize_steps(&row.raw_steps)?,
        })
    }
}

fn summary(recipe: &Recipe) -> RecipeSummary {
    RecipeSummary {
        id: recipe.id,
        name: recipe.name.clone(),
        image_url: recipe.image_url.clone(),
        ready_in_minutes: recipe.ready_in_minutes,
    }
}

#[async_trait]
impl CatalogStore for InMemoryRecipes {
    async fn list_recipes(&self, filter: &RecipeFilter) -> PortResult<Vec<RecipeSummary>> {
        let tables = lock(&self.tables);
        Ok(tables
            .catalog
            .values()
            .map(|row| &row.recipe)
            .filter(|r| filter.diet.as_ref().map_or(true, |d| r.diets.contains(d)))
            .filter(|r| {
                filter
                    .dish_type
                    .as_ref()
                    .map_or(true, |d| r.dish_types.contains(d))
            })
            .skip(filter.offset() as usize)
            .take(filter.per_page as usize)
            .map(summary)
            .collect())
    }

    async fn get_recipe(&self, recipe_id: i64) -> PortResult<Recipe> {
        let tables = lock(&self.tables);
        let row = tables
            .catalog
            .get(&recipe_id)
            .ok_or_else(|| PortError::NotFound(format!("Recipe {} not found", recipe_id)))?;
        let mut recipe = row.recipe.clone();
        recipe.steps = match normalize_steps(&row.raw_steps) {
            Ok(steps) => steps,
            Err(PortError::RecipeHasNoSteps) => Vec::new(),
            Err(e) => return Err(e),
        };
        Ok(recipe)
    }

    async fn list_favorites(&self, user_id: Uuid) -> PortResult<Vec<RecipeSummary>> {
        let tables = lock(&self.tables);
        let mut favorites: Vec<_> = tables
            .favorites
            .iter()
            .filter(|((owner, _), _)| *owner == user_id)
            .filter_map(|((_, recipe_id), added_at)| {
                tables
                    .catalog
                    .get(recipe_id)
                    .map(|row| (*added_at, summary(&row.recipe)))
            })
            .collect();
        favorites.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.id.cmp(&b.1.id)));
        Ok(favorites.into_iter().map(|(_, s)| s).collect())
    }

    async fn add_favorite(&self, user_id: Uuid, recipe_id: i64) -> PortResult<()> {
        let mut tables = lock(&self.tables);
        if !tables.catalog.contains_key(&recipe_id) {
            return Err(PortError::NotFound(format!("Recipe {} not found", recipe_id)));
        }
        if tables.favorites.contains_key(&(user_id, recipe_id)) {
            return Err(PortError::Conflict(format!(
                "Recipe {} is already a favorite",
                recipe_id
            )));
        }
        tables.favorites.insert((user_id, recipe_id), Utc::now());
        Ok(())
    }

    async fn remove_favorite(&self, user_id: Uuid, recipe_id: i64) -> PortResult<()> {
        lock(&self.tables)
            .favorites
            .remove(&(user_id, recipe_id))
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("Favorite {} not found", recipe_id)))
    }
}

#[async_trait]
impl GeneratedRecipeStore for InMemoryRecipes {
    async fn create(
        &self,
        user_id: Uuid,
        query: &str,
        draft: &RecipeDraft,
    ) -> PortResult<GeneratedRecipe> {
        let mut tables = lock(&self.tables);
        let id = tables.generated.keys().next_back().map_or(1, |last| last + 1);
        let now = Utc::now();
        let mut row = GeneratedRow {
            user_id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            ingredients: draft.ingredients.clone(),
            raw_steps: steps_to_json(&draft.steps),
            query: query.to_string(),
            version: 1,
            created_at: now,
            updated_at: now,
            history: Vec::new(),
        };
        let first = row.snapshot(id)?;
        row.history.push(first);
        let recipe = row.to_domain(id)?;
        tables.generated.insert(id, row);
        Ok(recipe)
    }

    async fn update(
        &self,
        user_id: Uuid,
        recipe_id: i64,
        query: &str,
        draft: &RecipeDraft,
    ) -> PortResult<GeneratedRecipe> {
        let mut tables = lock(&self.tables);
        let row = tables
            .generated
            .get_mut(&recipe_id)
            .filter(|row| row.user_id == user_id)
            .ok_or_else(|| {
                PortError::NotFound(format!("Generated recipe {} not found", recipe_id))
            })?;
        row.name = draft.name.clone();
        row.description = draft.description.clone();
        row.ingredients = draft.ingredients.clone();
        row.raw_steps = steps_to_json(&draft.steps);
        row.query = query.to_string();
        row.version += 1;
        row.updated_at = Utc::now();
        let snapshot = row.snapshot(recipe_id)?;
        row.history.push(snapshot);
        row.to_domain(recipe_id)
    }

    async fn get(&self, user_id: Uuid, recipe_id: i64) -> PortResult<GeneratedRecipe> {
        let tables = lock(&self.tables);
        tables
            .generated
            .get(&recipe_id)
            .filter(|row| row.user_id == user_id)
            .ok_or_else(|| {
                PortError::NotFound(format!("Generated recipe {} not found", recipe_id))
            })?
            .to_domain(recipe_id)
    }

    async fn list(&self, user_id: Uuid) -> PortResult<Vec<GeneratedRecipe>> {
        let tables = lock(&self.tables);
        tables
            .generated
            .iter()
            .rev()
            .filter(|(_, row)| row.user_id == user_id)
            .map(|(id, row)| row.to_domain(*id))
            .collect()
    }

    async fn versions(
        &self,
        user_id: Uuid,
        recipe_id: i64,
    ) -> PortResult<Vec<GeneratedRecipeVersion>> {
        let tables = lock(&self.tables);
        let row = tables
            .generated
            .get(&recipe_id)
            .filter(|row| row.user_id == user_id)
            .ok_or_else(|| {
                PortError::NotFound(format!("Generated recipe {} not found", recipe_id))
            })?;
        Ok(row.history.clone())
    }
}

//=========================================================================================
// Cooking sessions
//=========================================================================================

struct ActiveCooking {
    session: CookingSession,
    steps: Vec<SessionStep>,
    timers: BTreeMap<i32, Timer>,
}

impl ActiveCooking {
    fn step(&self, step_num: i32) -> Option<&SessionStep> {
        if step_num < 1 {
            return None;
        }
        self.steps.get(step_num as usize - 1)
    }
}

/// Cooking sessions keyed by user. The map key plays the role of the
/// unique index on `current_recipe.user_id`.
#[derive(Default)]
pub struct InMemoryCookingStore {
    sessions: Mutex<HashMap<Uuid, ActiveCooking>>,
}

impl InMemoryCookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step_count(&self, user_id: Uuid) -> usize {
        lock(&self.sessions)
            .get(&user_id)
            .map_or(0, |active| active.steps.len())
    }

    pub fn timer_count(&self, user_id: Uuid) -> usize {
        lock(&self.sessions)
            .get(&user_id)
            .map_or(0, |active| active.timers.len())
    }
}

#[async_trait]
impl CookingSessionStore for InMemoryCookingStore {
    async fn create(
        &self,
        user_id: Uuid,
        recipe_id: i64,
        origin: RecipeOrigin,
        name: &str,
        steps: &[Step],
    ) -> PortResult<CookingSession> {
        let mut sessions = lock(&self.sessions);
        if sessions.contains_key(&user_id) {
            return Err(PortError::AlreadyCooking);
        }
        if steps.is_empty() {
            return Err(PortError::RecipeHasNoSteps);
        }

        let session = CookingSession {
            user_id,
            recipe_id,
            origin,
            name: name.to_string(),
            current_step_num: 1,
            total_steps: steps.len() as i32,
        };
        let steps = steps
            .iter()
            .enumerate()
            .map(|(index, step)| SessionStep {
                user_id,
                recipe_id,
                step_num: index as i32 + 1,
                text: step.text.clone(),
                ingredients: step.ingredients.clone(),
                equipment: step.equipment.clone(),
                length: step.length.clone(),
            })
            .collect();
        sessions.insert(
            user_id,
            ActiveCooking {
                session: session.clone(),
                steps,
                timers: BTreeMap::new(),
            },
        );
        Ok(session)
    }

    async fn read(&self, user_id: Uuid) -> PortResult<CurrentCooking> {
        let sessions = lock(&self.sessions);
        let active = sessions.get(&user_id).ok_or(PortError::NoActiveSession)?;
        let current_step = active
            .step(active.session.current_step_num)
            .cloned()
            .ok_or(PortError::StepNotFound)?;
        Ok(CurrentCooking {
            session: active.session.clone(),
            current_step,
        })
    }

    async fn read_step(&self, user_id: Uuid, step_num: i32) -> PortResult<SessionStep> {
        let sessions = lock(&self.sessions);
        let active = sessions.get(&user_id).ok_or(PortError::NoActiveSession)?;
        active.step(step_num).cloned().ok_or(PortError::StepNotFound)
    }

    async fn advance_step(&self, user_id: Uuid, delta: i32) -> PortResult<SessionStep> {
        let mut sessions = lock(&self.sessions);
        let active = sessions
            .get_mut(&user_id)
            .ok_or(PortError::NoActiveSession)?;
        let target = active.session.current_step_num + delta;
        if target < 1 || target > active.session.total_steps {
            return Err(PortError::OutOfRange);
        }
        active.session.current_step_num = target;
        active.step(target).cloned().ok_or(PortError::StepNotFound)
    }

    async fn destroy(&self, user_id: Uuid) -> PortResult<EndedSession> {
        let active = lock(&self.sessions)
            .remove(&user_id)
            .ok_or(PortError::NoActiveSession)?;
        Ok(EndedSession {
            recipe_id: active.session.recipe_id,
            origin: active.session.origin,
        })
    }

    async fn add_timer(
        &self,
        user_id: Uuid,
        step_num: i32,
        duration_sec: i32,
        description: &str,
    ) -> PortResult<Timer> {
        let mut sessions = lock(&self.sessions);
        let active = sessions
            .get_mut(&user_id)
            .ok_or(PortError::NoActiveSession)?;
        if active.step(step_num).is_none() {
            return Err(PortError::StepNotFound);
        }
        if active.timers.contains_key(&step_num) {
            return Err(PortError::TimerAlreadyExists);
        }
        let timer = Timer {
            user_id,
            step_num,
            duration_sec,
            description: description.to_string(),
            created_at: Utc::now(),
        };
        active.timers.insert(step_num, timer.clone());
        Ok(timer)
    }

    async fn delete_timer(&self, user_id: Uuid, step_num: i32) -> PortResult<()> {
        let mut sessions = lock(&self.sessions);
        let active = sessions
            .get_mut(&user_id)
            .ok_or(PortError::TimerNotFound)?;
        active
            .timers
            .remove(&step_num)
            .map(|_| ())
            .ok_or(PortError::TimerNotFound)
    }

    async fn list_timers(&self, user_id: Uuid) -> PortResult<Vec<TimerView>> {
        let sessions = lock(&self.sessions);
        let active = sessions.get(&user_id).ok_or(PortError::NoActiveSession)?;
        Ok(active
            .timers
            .values()
            .map(|timer| TimerView {
                timer: timer.clone(),
                step_text: active
                    .step(timer.step_num)
                    .map(|s| s.text.clone())
                    .unwrap_or_default(),
            })
            .collect())
    }
}

//=========================================================================================
// History
//=========================================================================================

#[derive(Default)]
pub struct InMemoryHistory {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries_for(&self, user_id: Uuid) -> Vec<HistoryEntry> {
        lock(&self.entries)
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HistoryRecorder for InMemoryHistory {
    async fn record(
        &self,
        user_id: Uuid,
        recipe_id: i64,
        origin: RecipeOrigin,
    ) -> PortResult<HistoryEntry> {
        let entry = HistoryEntry {
            user_id,
            recipe_id,
            origin,
            created_at: Utc::now(),
        };
        lock(&self.entries).push(entry.clone());
        Ok(entry)
    }

    async fn list(&self, user_id: Uuid) -> PortResult<Vec<HistoryEntry>> {
        let mut entries = self.entries_for(user_id);
        entries.reverse();
        Ok(entries)
    }
}

//=========================================================================================
// Accounts
//=========================================================================================

#[derive(Default)]
struct AccountTables {
    users: HashMap<Uuid, UserCredentials>,
    emails: BTreeSet<String>,
    sessions: HashMap<String, AuthSession>,
}

#[derive(Default)]
pub struct InMemoryAccounts {
    tables: Mutex<AccountTables>,
}

impl InMemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccounts {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let mut tables = lock(&self.tables);
        if !tables.emails.insert(email.to_string()) {
            return Err(PortError::Conflict(format!("Email {} is already registered", email)));
        }
        let user_id = Uuid::new_v4();
        tables.users.insert(
            user_id,
            UserCredentials {
                user_id,
                email: email.to_string(),
                hashed_password: hashed_password.to_string(),
            },
        );
        Ok(User {
            user_id,
            email: Some(email.to_string()),
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        lock(&self.tables)
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        lock(&self.tables)
            .users
            .get(&user_id)
            .map(|u| User {
                user_id: u.user_id,
                email: Some(u.email.clone()),
            })
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        lock(&self.tables).sessions.insert(
            session_id.to_string(),
            AuthSession {
                id: session_id.to_string(),
                user_id,
                expires_at,
            },
        );
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        lock(&self.tables)
            .sessions
            .get(session_id)
            .filter(|s| s.expires_at > Utc::now())
            .map(|s| s.user_id)
            .ok_or(PortError::Unauthenticated)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        lock(&self.tables).sessions.remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn steps(count: usize) -> Vec<Step> {
        (1..=count)
            .map(|n| Step {
                number: n as i32,
                text: format!("Step {}", n),
                ingredients: json!([]),
                equipment: json!([]),
                length: json!([]),
            })
            .collect()
    }

    #[tokio::test]
    async fn session_steps_match_total_steps() {
        let store = InMemoryCookingStore::new();
        let user = Uuid::new_v4();
        let session = store
            .create(user, 1, RecipeOrigin::Catalog, "Soup", &steps(3))
            .await
            .unwrap();
        assert_eq!(session.current_step_num, 1);
        assert_eq!(session.total_steps, 3);
        assert_eq!(store.step_count(user), 3);
    }

    #[tokio::test]
    async fn failed_create_leaves_no_rows() {
        let store = InMemoryCookingStore::new();
        let user = Uuid::new_v4();
        store
            .create(user, 1, RecipeOrigin::Catalog, "Soup", &steps(2))
            .await
            .unwrap();
        let err = store
            .create(user, 2, RecipeOrigin::Catalog, "Stew", &steps(5))
            .await
            .unwrap_err();
        assert_eq!(err, PortError::AlreadyCooking);
        assert_eq!(store.step_count(user), 2);
    }

    #[tokio::test]
    async fn destroy_removes_steps_and_timers() {
        let store = InMemoryCookingStore::new();
        let user = Uuid::new_v4();
        store
            .create(user, 7, RecipeOrigin::Generated, "Soup", &steps(2))
            .await
            .unwrap();
        store.add_timer(user, 1, 60, "Step 1").await.unwrap();

        let ended = store.destroy(user).await.unwrap();
        assert_eq!(ended.recipe_id, 7);
        assert_eq!(ended.origin, RecipeOrigin::Generated);
        assert_eq!(store.step_count(user), 0);
        assert_eq!(store.timer_count(user), 0);
        assert_eq!(store.destroy(user).await.unwrap_err(), PortError::NoActiveSession);
    }

    #[tokio::test]
    async fn timer_without_session_is_no_active_session() {
        let store = InMemoryCookingStore::new();
        assert_eq!(
            store.add_timer(Uuid::new_v4(), 1, 60, "x").await.unwrap_err(),
            PortError::NoActiveSession
        );
    }

    #[tokio::test]
    async fn expired_auth_sessions_are_rejected() {
        let accounts = InMemoryAccounts::new();
        let user = accounts.create_user_with_email("a@b.c", "hash").await.unwrap();
        accounts
            .create_auth_session("old", user.user_id, Utc::now() - Duration::minutes(1))
            .await
            .unwrap();
        accounts
            .create_auth_session("new", user.user_id, Utc::now() + Duration::days(1))
            .await
            .unwrap();

        assert_eq!(
            accounts.validate_auth_session("old").await.unwrap_err(),
            PortError::Unauthenticated
        );
        assert_eq!(accounts.validate_auth_session("new").await.unwrap(), user.user_id);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let accounts = InMemoryAccounts::new();
        accounts.create_user_with_email("a@b.c", "h").await.unwrap();
        assert!(matches!(
            accounts.create_user_with_email("a@b.c", "h").await,
            Err(PortError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn generated_versions_accumulate() {
        let recipes = InMemoryRecipes::new();
        let user = Uuid::new_v4();
        let draft = RecipeDraft {
            name: "Soup".to_string(),
            description: String::new(),
            ingredients: json!([]),
            steps: steps(2),
        };
        let created = GeneratedRecipeStore::create(&recipes, user, "soup", &draft)
            .await
            .unwrap();
        let updated = GeneratedRecipeStore::update(&recipes, user, created.id, "spicier", &draft)
            .await
            .unwrap();
        assert_eq!(updated.version, 2);

        let versions = recipes.versions(user, created.id).await.unwrap();
        assert_eq!(versions.iter().map(|v| v.version).collect::<Vec<_>>(), vec![1, 2]);
        assert!(recipes.versions(Uuid::new_v4(), created.id).await.is_err());
    }
}
