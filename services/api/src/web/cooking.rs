//! services/api/src/web/cooking.rs
//!
//! Handlers for the interactive cooking session: start, navigate, end, timers.
//!
//! Each handler is a thin shell over `CookingEngine`: it extracts the caller
//! and the parameters, runs one engine operation and renders the envelope.

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Form, Json,
};
use cooking_assistant_core::domain::RecipeOrigin;
use std::sync::Arc;

use crate::web::{
    dto::{
        AddTimerRequest, CurrentRecipeDto, EndedRecipeDto, FinishTimerRequest, HistoryEntryDto,
        StartForm, StepDto, TimerDto,
    },
    envelope::{EnvelopeResult, Failure, Success},
    middleware::{caller, AuthUser},
    state::AppState,
};

type Caller = Option<Extension<AuthUser>>;

/// Get the recipe being cooked and its current step.
#[utoipa::path(
    get,
    path = "/api/recipe",
    tag = "Cooking",
    responses(
        (status = 200, description = "Envelope with the current recipe, or an error envelope (401, 404)", body = CurrentRecipeDto),
    )
)]
pub async fn current_handler(
    State(state): State<Arc<AppState>>,
    user: Caller,
) -> EnvelopeResult<CurrentRecipeDto> {
    let current = state.cooking.current(caller(user)).await?;
    Ok(Success(current.into()))
}

/// Start cooking a catalog recipe.
#[utoipa::path(
    post,
    path = "/api/recipe/start",
    tag = "Cooking",
    request_body(content = StartForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Envelope with step 1, or an error envelope (401, 404, 409, 422)", body = StepDto),
    )
)]
pub async fn start_catalog_handler(
    State(state): State<Arc<AppState>>,
    user: Caller,
    form: Result<Form<StartForm>, FormRejection>,
) -> EnvelopeResult<StepDto> {
    let Form(form) = form.map_err(|e| Failure::invalid_input(e.body_text()))?;
    let step = state
        .cooking
        .start(caller(user), form.id, RecipeOrigin::Catalog)
        .await?;
    Ok(Success(step.into()))
}

/// Start cooking one of the caller's generated recipes.
#[utoipa::path(
    post,
    path = "/api/generate/{recipe_id}/start",
    tag = "Cooking",
    params(("recipe_id" = i64, Path, description = "Generated recipe id")),
    responses(
        (status = 200, description = "Envelope with step 1, or an error envelope (401, 404, 409, 422)", body = StepDto),
    )
)]
pub async fn start_generated_handler(
    State(state): State<Arc<AppState>>,
    user: Caller,
    recipe_id: Result<Path<i64>, PathRejection>,
) -> EnvelopeResult<StepDto> {
    let Path(recipe_id) = recipe_id.map_err(|e| Failure::invalid_input(e.body_text()))?;
    let step = state
        .cooking
        .start(caller(user), recipe_id, RecipeOrigin::Generated)
        .await?;
    Ok(Success(step.into()))
}

/// Finish cooking and record it in the history.
#[utoipa::path(
    post,
    path = "/api/recipe/end",
    tag = "Cooking",
    responses(
        (status = 200, description = "Envelope with the ended recipe, or an error envelope (401, 404)", body = EndedRecipeDto),
    )
)]
pub async fn end_handler(
    State(state): State<Arc<AppState>>,
    user: Caller,
) -> EnvelopeResult<EndedRecipeDto> {
    let ended = state.cooking.end(caller(user)).await?;
    Ok(Success(ended.into()))
}

/// Move to the next step.
#[utoipa::path(
    post,
    path = "/api/recipe/next",
    tag = "Cooking",
    responses(
        (status = 200, description = "Envelope with the new current step, or an error envelope (401, 404, 500 on the last step)", body = StepDto),
    )
)]
pub async fn next_handler(
    State(state): State<Arc<AppState>>,
    user: Caller,
) -> EnvelopeResult<StepDto> {
    let step = state.cooking.next(caller(user)).await?;
    Ok(Success(step.into()))
}

/// Move to the previous step.
#[utoipa::path(
    post,
    path = "/api/recipe/prev",
    tag = "Cooking",
    responses(
        (status = 200, description = "Envelope with the new current step, or an error envelope (401, 404, 500 on the first step)", body = StepDto),
    )
)]
pub async fn prev_handler(
    State(state): State<Arc<AppState>>,
    user: Caller,
) -> EnvelopeResult<StepDto> {
    let step = state.cooking.prev(caller(user)).await?;
    Ok(Success(step.into()))
}

/// Read any step of the current session without moving the pointer.
#[utoipa::path(
    get,
    path = "/api/recipe/step/{step_num}",
    tag = "Cooking",
    params(("step_num" = i32, Path, description = "1-based step number")),
    responses(
        (status = 200, description = "Envelope with the step, or an error envelope (401, 404)", body = StepDto),
    )
)]
pub async fn step_handler(
    State(state): State<Arc<AppState>>,
    user: Caller,
    step_num: Result<Path<i32>, PathRejection>,
) -> EnvelopeResult<StepDto> {
    let Path(step_num) = step_num.map_err(|e| Failure::invalid_input(e.body_text()))?;
    let step = state.cooking.step(caller(user), step_num).await?;
    Ok(Success(step.into()))
}

/// List the timers of the current session.
#[utoipa::path(
    get,
    path = "/api/recipe/timers",
    tag = "Cooking",
    responses(
        (status = 200, description = "Envelope with the timers ordered by step, or an error envelope (401, 404)", body = [TimerDto]),
    )
)]
pub async fn list_timers_handler(
    State(state): State<Arc<AppState>>,
    user: Caller,
) -> EnvelopeResult<Vec<TimerDto>> {
    let timers = state.cooking.list_timers(caller(user)).await?;
    Ok(Success(timers.into_iter().map(TimerDto::from).collect()))
}

/// Attach a timer to a step.
#[utoipa::path(
    post,
    path = "/api/recipe/timer/add",
    tag = "Cooking",
    request_body = AddTimerRequest,
    responses(
        (status = 200, description = "Envelope with the timer, or an error envelope (400, 401, 404, 409)", body = TimerDto),
    )
)]
pub async fn add_timer_handler(
    State(state): State<Arc<AppState>>,
    user: Caller,
    body: Result<Json<AddTimerRequest>, JsonRejection>,
) -> EnvelopeResult<TimerDto> {
    let Json(body) = body.map_err(|e| Failure::invalid_input(e.body_text()))?;
    let timer = state
        .cooking
        .add_timer(caller(user), body.step, body.length)
        .await?;
    Ok(Success(TimerDto {
        step: timer.step_num,
        length: timer.duration_sec,
        step_text: timer.description.clone(),
        description: timer.description,
        created_at: timer.created_at,
    }))
}

/// Remove the timer of a step.
#[utoipa::path(
    post,
    path = "/api/recipe/timer/finish",
    tag = "Cooking",
    request_body = FinishTimerRequest,
    responses(
        (status = 200, description = "Envelope echoing the step, or an error envelope (400, 401, 404)"),
    )
)]
pub async fn finish_timer_handler(
    State(state): State<Arc<AppState>>,
    user: Caller,
    body: Result<Json<FinishTimerRequest>, JsonRejection>,
) -> EnvelopeResult<serde_json::Value> {
    let Json(body) = body.map_err(|e| Failure::invalid_input(e.body_text()))?;
    state.cooking.delete_timer(caller(user), body.step).await?;
    Ok(Success(serde_json::json!({ "step": body.step })))
}

/// The caller's finished cooking sessions, newest first.
#[utoipa::path(
    get,
    path = "/api/recipe/history",
    tag = "Cooking",
    responses(
        (status = 200, description = "Envelope with the history entries, or an error envelope (401)", body = [HistoryEntryDto]),
    )
)]
pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    user: Caller,
) -> EnvelopeResult<Vec<HistoryEntryDto>> {
    let entries = state.cooking.history(caller(user)).await?;
    Ok(Success(
        entries.into_iter().map(HistoryEntryDto::from).collect(),
    ))
}
