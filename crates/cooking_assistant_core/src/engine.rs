//! crates/cooking_assistant_core/src/engine.rs
//!
//! The cooking-session state machine.
//!
//! Per user the engine is either idle or cooking one recipe at step `k`
//! (`1 <= k <= total_steps`). It holds no state of its own: every transition
//! is a single call into the `CookingSessionStore`, which is responsible for
//! making it atomic and for rejecting a second concurrent writer.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::domain::{
    CookingSession, CurrentCooking, EndedSession, HistoryEntry, RecipeOrigin, SessionStep,
    Timer, TimerView,
};
use crate::ports::{CookingSessionStore, HistoryRecorder, PortError, PortResult};
use crate::recipe::RecipeResolver;

/// Coordinates the resolver, the session store and the history log.
#[derive(Clone)]
pub struct CookingEngine {
    resolver: RecipeResolver,
    store: Arc<dyn CookingSessionStore>,
    history: Arc<dyn HistoryRecorder>,
}

impl CookingEngine {
    pub fn new(
        resolver: RecipeResolver,
        store: Arc<dyn CookingSessionStore>,
        history: Arc<dyn HistoryRecorder>,
    ) -> Self {
        Self {
            resolver,
            store,
            history,
        }
    }

    /// Starts cooking a recipe and returns its first step.
    ///
    /// An existing session is never overwritten: the caller gets
    /// `AlreadyCooking` and must end it first.
    pub async fn start(
        &self,
        caller: Option<Uuid>,
        recipe_id: i64,
        origin: RecipeOrigin,
    ) -> PortResult<SessionStep> {
        let user_id = require_user(caller)?;
        let recipe = self.resolver.resolve(user_id, recipe_id, origin).await?;

        let session: CookingSession = self
            .store
            .create(user_id, recipe_id, origin, &recipe.name, &recipe.steps)
            .await?;
        info!(
            "User {} started cooking recipe {} ({:?}, {} steps)",
            user_id, recipe_id, origin, session.total_steps
        );

        self.store.read_step(user_id, 1).await
    }

    pub async fn current(&self, caller: Option<Uuid>) -> PortResult<CurrentCooking> {
        let user_id = require_user(caller)?;
        self.store.read(user_id).await
    }

    pub async fn step(&self, caller: Option<Uuid>, step_num: i32) -> PortResult<SessionStep> {
        let user_id = require_user(caller)?;
        self.store.read_step(user_id, step_num).await
    }

    /// `OutOfRange` on the last step; there is no wrap-around.
    pub async fn next(&self, caller: Option<Uuid>) -> PortResult<SessionStep> {
        let user_id = require_user(caller)?;
        self.store.advance_step(user_id, 1).await
    }

    /// `OutOfRange` on the first step.
    pub async fn prev(&self, caller: Option<Uuid>) -> PortResult<SessionStep> {
        let user_id = require_user(caller)?;
        self.store.advance_step(user_id, -1).await
    }

    /// Destroys the session, then records it in the history log.
    ///
    /// Once the session is gone the transition is complete: a failed history
    /// append is logged and not returned to the caller.
    pub async fn end(&self, caller: Option<Uuid>) -> PortResult<EndedSession> {
        let user_id = require_user(caller)?;
        let ended = self.store.destroy(user_id).await?;
        info!("User {} finished cooking recipe {}", user_id, ended.recipe_id);

        if let Err(e) = self
            .history
            .record(user_id, ended.recipe_id, ended.origin)
            .await
        {
            error!(
                "Failed to record cooking history for user {} recipe {} (generated: {}): {}",
                user_id,
                ended.recipe_id,
                ended.origin.is_generated(),
                e
            );
        }

        Ok(ended)
    }

    /// Attaches a timer to a step; the step's text becomes the description.
    pub async fn add_timer(
        &self,
        caller: Option<Uuid>,
        step_num: i32,
        duration_sec: i32,
    ) -> PortResult<Timer> {
        let user_id = require_user(caller)?;
        let step = self.store.read_step(user_id, step_num).await?;
        if duration_sec <= 0 {
            return Err(PortError::InvalidInput(
                "timer length must be positive".to_string(),
            ));
        }

        self.store
            .add_timer(user_id, step_num, duration_sec, &step.text)
            .await
    }

    pub async fn delete_timer(&self, caller: Option<Uuid>, step_num: i32) -> PortResult<()> {
        let user_id = require_user(caller)?;
        self.store.delete_timer(user_id, step_num).await
    }

    pub async fn list_timers(&self, caller: Option<Uuid>) -> PortResult<Vec<TimerView>> {
        let user_id = require_user(caller)?;
        self.store.list_timers(user_id).await
    }

    pub async fn history(&self, caller: Option<Uuid>) -> PortResult<Vec<HistoryEntry>> {
        let user_id = require_user(caller)?;
        self.history.list(user_id).await
    }
}

/// Every operation acts on behalf of an authenticated user.
pub fn require_user(caller: Option<Uuid>) -> PortResult<Uuid> {
    caller.ok_or(PortError::Unauthenticated)
}
