//! services/api/src/adapters/cooking_store.rs
//!
//! PostgreSQL implementation of the `CookingSessionStore` port.
//!
//! Tables: `current_recipe` (one row per user, primary key on `user_id`),
//! `current_recipe_step` and `current_recipe_timer`. Every operation that
//! touches more than one row runs in a single transaction; dropping the
//! transaction (error or cancelled request) rolls it back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cooking_assistant_core::domain::{
    CookingSession, CurrentCooking, EndedSession, RecipeOrigin, SessionStep, Step, Timer,
    TimerView,
};
use cooking_assistant_core::ports::{CookingSessionStore, PortError, PortResult};
use cooking_assistant_core::recipe::normalize_length;
use serde_json::Value;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::db::{store_error, violation, Violation};

#[derive(Clone)]
pub struct PgCookingStore {
    pool: PgPool,
}

impl PgCookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

//=========================================================================================
// Records
//=========================================================================================

#[derive(FromRow)]
struct SessionRecord {
    user_id: Uuid,
    recipe_id: i64,
    name: String,
    current_step_num: i32,
    total_steps: i32,
    is_generated: bool,
}
impl SessionRecord {
    fn to_domain(self) -> CookingSession {
        CookingSession {
            user_id: self.user_id,
            recipe_id: self.recipe_id,
            origin: RecipeOrigin::from_flag(self.is_generated),
            name: self.name,
            current_step_num: self.current_step_num,
            total_steps: self.total_steps,
        }
    }
}

#[derive(FromRow)]
struct StepRecord {
    user_id: Uuid,
    recipe_id: i64,
    step_num: i32,
    step: String,
    ingredients: Value,
    equipment: Value,
    length: Option<Value>,
}
impl StepRecord {
    fn to_domain(self) -> SessionStep {
        SessionStep {
            user_id: self.user_id,
            recipe_id: self.recipe_id,
            step_num: self.step_num,
            text: self.step,
            ingredients: self.ingredients,
            equipment: self.equipment,
            length: normalize_length(self.length.as_ref()),
        }
    }
}

#[derive(FromRow)]
struct CurrentRecord {
    #[sqlx(flatten)]
    session: SessionRecord,
    step: String,
    ingredients: Value,
    equipment: Value,
    length: Option<Value>,
}

/// One row per session; step columns are NULL when the requested step does not exist.
#[derive(FromRow)]
struct StepLookupRecord {
    recipe_id: i64,
    step_num: Option<i32>,
    step: Option<String>,
    ingredients: Option<Value>,
    equipment: Option<Value>,
    length: Option<Value>,
}
impl StepLookupRecord {
    fn to_domain(self, user_id: Uuid) -> PortResult<SessionStep> {
        match (self.step_num, self.step) {
            (Some(step_num), Some(text)) => Ok(SessionStep {
                user_id,
                recipe_id: self.recipe_id,
                step_num,
                text,
                ingredients: self.ingredients.unwrap_or_else(|| Value::Array(Vec::new())),
                equipment: self.equipment.unwrap_or_else(|| Value::Array(Vec::new())),
                length: normalize_length(self.length.as_ref()),
            }),
            _ => Err(PortError::StepNotFound),
        }
    }
}

#[derive(FromRow)]
struct TimerRecord {
    user_id: Uuid,
    step_num: i32,
    duration_sec: i32,
    description: String,
    created_at: DateTime<Utc>,
}
impl TimerRecord {
    fn to_domain(self) -> Timer {
        Timer {
            user_id: self.user_id,
            step_num: self.step_num,
            duration_sec: self.duration_sec,
            description: self.description,
            created_at: self.created_at,
        }
    }
}

/// Session row left-joined with its timers; timer columns are NULL when there are none.
#[derive(FromRow)]
struct TimerListRecord {
    user_id: Uuid,
    step_num: Option<i32>,
    duration_sec: Option<i32>,
    description: Option<String>,
    created_at: Option<DateTime<Utc>>,
    step_text: Option<String>,
}

#[derive(FromRow)]
struct EndedRecord {
    recipe_id: i64,
    is_generated: bool,
}

//=========================================================================================
// Shared queries
//=========================================================================================

async fn lookup_step(
    conn: &mut PgConnection,
    user_id: Uuid,
    step_num: i32,
) -> PortResult<SessionStep> {
    let record = sqlx::query_as::<_, StepLookupRecord>(
        r#"
        SELECT r.recipe_id, s.step_num, s.step, s.ingredients, s.equipment, s.length
        FROM current_recipe r
        LEFT JOIN current_recipe_step s ON s.user_id = r.user_id AND s.step_num = $2
        WHERE r.user_id = $1
        "#,
    )
    .bind(user_id)
    .bind(step_num)
    .fetch_optional(&mut *conn)
    .await
    .map_err(store_error)?
    .ok_or(PortError::NoActiveSession)?;

    record.to_domain(user_id)
}

async fn session_exists(conn: &mut PgConnection, user_id: Uuid) -> PortResult<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM current_recipe WHERE user_id = $1)")
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(store_error)
}

//=========================================================================================
// `CookingSessionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CookingSessionStore for PgCookingStore {
    async fn create(
        &self,
        user_id: Uuid,
        recipe_id: i64,
        origin: RecipeOrigin,
        name: &str,
        steps: &[Step],
    ) -> PortResult<CookingSession> {
        if steps.is_empty() {
            return Err(PortError::RecipeHasNoSteps);
        }
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        // The primary key on user_id is what serializes concurrent starts.
        let session = sqlx::query_as::<_, SessionRecord>(
            r#"
            INSERT INTO current_recipe (user_id, recipe_id, name, current_step_num, total_steps, is_generated)
            VALUES ($1, $2, $3, 1, $4, $5)
            RETURNING user_id, recipe_id, name, current_step_num, total_steps, is_generated
            "#,
        )
        .bind(user_id)
        .bind(recipe_id)
        .bind(name)
        .bind(steps.len() as i32)
        .bind(origin.is_generated())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match violation(&e) {
            Violation::Unique => PortError::AlreadyCooking,
            _ => store_error(e),
        })?;

        let mut insert = QueryBuilder::<Postgres>::new(
            "INSERT INTO current_recipe_step (user_id, recipe_id, step_num, step, ingredients, equipment, length) ",
        );
        insert.push_values(steps.iter().enumerate(), |mut row, (index, step)| {
            row.push_bind(user_id)
                .push_bind(recipe_id)
                .push_bind(index as i32 + 1)
                .push_bind(step.text.clone())
                .push_bind(step.ingredients.clone())
                .push_bind(step.equipment.clone())
                .push_bind(step.length.clone());
        });
        insert
            .build()
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;
        debug!("Materialized {} steps for user {}", steps.len(), user_id);

        Ok(session.to_domain())
    }

    async fn read(&self, user_id: Uuid) -> PortResult<CurrentCooking> {
        let record = sqlx::query_as::<_, CurrentRecord>(
            r#"
            SELECT r.user_id, r.recipe_id, r.name, r.current_step_num, r.total_steps, r.is_generated,
                   s.step, s.ingredients, s.equipment, s.length
            FROM current_recipe r
            JOIN current_recipe_step s ON s.user_id = r.user_id AND s.step_num = r.current_step_num
            WHERE r.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .ok_or(PortError::NoActiveSession)?;

        let session = record.session.to_domain();
        let current_step = StepRecord {
            user_id,
            recipe_id: session.recipe_id,
            step_num: session.current_step_num,
            step: record.step,
            ingredients: record.ingredients,
            equipment: record.equipment,
            length: record.length,
        }
        .to_domain();

        Ok(CurrentCooking {
            session,
            current_step,
        })
    }

    async fn read_step(&self, user_id: Uuid, step_num: i32) -> PortResult<SessionStep> {
        let mut conn = self.pool.acquire().await.map_err(store_error)?;
        lookup_step(&mut conn, user_id, step_num).await
    }

    async fn advance_step(&self, user_id: Uuid, delta: i32) -> PortResult<SessionStep> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let moved: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE current_recipe
            SET current_step_num = current_step_num + $2
            WHERE user_id = $1 AND current_step_num + $2 BETWEEN 1 AND total_steps
            RETURNING current_step_num
            "#,
        )
        .bind(user_id)
        .bind(delta)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_error)?;

        let Some(step_num) = moved else {
            return if session_exists(&mut tx, user_id).await? {
                Err(PortError::OutOfRange)
            } else {
                Err(PortError::NoActiveSession)
            };
        };

        let step = lookup_step(&mut tx, user_id, step_num).await?;
        tx.commit().await.map_err(store_error)?;
        Ok(step)
    }

    async fn destroy(&self, user_id: Uuid) -> PortResult<EndedSession> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let ended = sqlx::query_as::<_, EndedRecord>(
            "SELECT recipe_id, is_generated FROM current_recipe WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_error)?
        .ok_or(PortError::NoActiveSession)?;

        for statement in [
            "DELETE FROM current_recipe_timer WHERE user_id = $1",
            "DELETE FROM current_recipe_step WHERE user_id = $1",
            "DELETE FROM current_recipe WHERE user_id = $1",
        ] {
            sqlx::query(statement)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(store_error)?;
        }

        tx.commit().await.map_err(store_error)?;

        Ok(EndedSession {
            recipe_id: ended.recipe_id,
            origin: RecipeOrigin::from_flag(ended.is_generated),
        })
    }

    async fn add_timer(
        &self,
        user_id: Uuid,
        step_num: i32,
        duration_sec: i32,
        description: &str,
    ) -> PortResult<Timer> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let total_steps: i32 = sqlx::query_scalar(
            "SELECT total_steps FROM current_recipe WHERE user_id = $1 FOR SHARE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_error)?
        .ok_or(PortError::NoActiveSession)?;

        if step_num < 1 || step_num > total_steps {
            return Err(PortError::StepNotFound);
        }

        let record = sqlx::query_as::<_, TimerRecord>(
            r#"
            INSERT INTO current_recipe_timer (user_id, step_num, duration_sec, description)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, step_num, duration_sec, description, created_at
            "#,
        )
        .bind(user_id)
        .bind(step_num)
        .bind(duration_sec)
        .bind(description)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match violation(&e) {
            Violation::Unique => PortError::TimerAlreadyExists,
            Violation::ForeignKey => PortError::NoActiveSession,
            Violation::Other => store_error(e),
        })?;

        tx.commit().await.map_err(store_error)?;
        Ok(record.to_domain())
    }

    async fn delete_timer(&self, user_id: Uuid, step_num: i32) -> PortResult<()> {
        let result =
            sqlx::query("DELETE FROM current_recipe_timer WHERE user_id = $1 AND step_num = $2")
                .bind(user_id)
                .bind(step_num)
                .execute(&self.pool)
                .await
                .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(PortError::TimerNotFound);
        }
        Ok(())
    }

    async fn list_timers(&self, user_id: Uuid) -> PortResult<Vec<TimerView>> {
        let records = sqlx::query_as::<_, TimerListRecord>(
            r#"
            SELECT r.user_id, t.step_num, t.duration_sec, t.description, t.created_at,
                   s.step AS step_text
            FROM current_recipe r
            LEFT JOIN current_recipe_timer t ON t.user_id = r.user_id
            LEFT JOIN current_recipe_step s ON s.user_id = t.user_id AND s.step_num = t.step_num
            WHERE r.user_id = $1
            ORDER BY t.step_num
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        if records.is_empty() {
            return Err(PortError::NoActiveSession);
        }

        Ok(records
            .into_iter()
            .filter_map(|r| {
                Some(TimerView {
                    timer: Timer {
                        user_id: r.user_id,
                        step_num: r.step_num?,
                        duration_sec: r.duration_sec?,
                        description: r.description?,
                        created_at: r.created_at?,
                    },
                    step_text: r.step_text.unwrap_or_default(),
                })
            })
            .collect())
    }
}
