//! services/api/src/web/rest.rs
//!
//! Builds the Axum router for the REST API and holds the master definition
//! for the OpenAPI specification.

use crate::error::ApiError;
use crate::web::{auth, catalog, cooking, dto, envelope::ErrorEnvelope, generate};
use crate::web::{middleware::resolve_user, state::AppState};
use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        cooking::current_handler,
        cooking::start_catalog_handler,
        cooking::start_generated_handler,
        cooking::end_handler,
        cooking::next_handler,
        cooking::prev_handler,
        cooking::step_handler,
        cooking::list_timers_handler,
        cooking::add_timer_handler,
        cooking::finish_timer_handler,
        cooking::history_handler,
        catalog::list_recipes_handler,
        catalog::get_recipe_handler,
        catalog::list_favorites_handler,
        catalog::add_favorite_handler,
        catalog::remove_favorite_handler,
        generate::generate_handler,
        generate::list_generated_handler,
        generate::get_generated_handler,
        generate::update_generated_handler,
        generate::list_versions_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
    ),
    components(
        schemas(
            ErrorEnvelope,
            dto::StepDto,
            dto::CurrentRecipeDto,
            dto::EndedRecipeDto,
            dto::StartForm,
            dto::AddTimerRequest,
            dto::FinishTimerRequest,
            dto::TimerDto,
            dto::HistoryEntryDto,
            dto::RecipeSummaryDto,
            dto::RecipeDto,
            dto::GenerateRequest,
            dto::GeneratedRecipeDto,
            dto::GeneratedVersionDto,
            dto::SignupRequest,
            dto::LoginRequest,
            dto::AuthResponse,
        )
    ),
    tags(
        (name = "Cooking", description = "Step-by-step cooking session with timers. Every response is an envelope sent with HTTP 200; `Status` carries the real outcome."),
        (name = "Catalog", description = "Editorial recipes and favorites."),
        (name = "Generated recipes", description = "Recipes written by the LLM, with version history."),
        (name = "Auth", description = "Email and password accounts with cookie sessions."),
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Router
//=========================================================================================

/// Assembles every route with the auth middleware, CORS, the request
/// deadline and request tracing.
pub fn build_router(state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = HeaderValue::from_str(&state.config.cors_origin).map_err(|e| {
        ApiError::Internal(format!(
            "Invalid CORS origin '{}': {}",
            state.config.cors_origin, e
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let cooking_routes = Router::new()
        .route("/api/recipe", get(cooking::current_handler))
        .route("/api/recipe/start", post(cooking::start_catalog_handler))
        .route("/api/recipe/end", post(cooking::end_handler))
        .route("/api/recipe/next", post(cooking::next_handler))
        .route("/api/recipe/prev", post(cooking::prev_handler))
        .route("/api/recipe/step/{step_num}", get(cooking::step_handler))
        .route("/api/recipe/timers", get(cooking::list_timers_handler))
        .route("/api/recipe/timer/add", post(cooking::add_timer_handler))
        .route("/api/recipe/timer/finish", post(cooking::finish_timer_handler))
        .route("/api/recipe/history", get(cooking::history_handler));

    let catalog_routes = Router::new()
        .route("/api/recipes", get(catalog::list_recipes_handler))
        .route("/api/recipes/{id}", get(catalog::get_recipe_handler))
        .route("/api/favorites", get(catalog::list_favorites_handler))
        .route(
            "/api/favorites/{recipe_id}",
            post(catalog::add_favorite_handler).delete(catalog::remove_favorite_handler),
        );

    let generate_routes = Router::new()
        .route(
            "/api/generate",
            post(generate::generate_handler).get(generate::list_generated_handler),
        )
        .route("/api/generate/{recipe_id}", get(generate::get_generated_handler))
        .route(
            "/api/generate/{recipe_id}/update",
            post(generate::update_generated_handler),
        )
        .route(
            "/api/generate/{recipe_id}/versions",
            get(generate::list_versions_handler),
        )
        .route(
            "/api/generate/{recipe_id}/start",
            post(cooking::start_generated_handler),
        );

    let auth_routes = Router::new()
        .route("/api/auth/signup", post(auth::signup_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/logout", post(auth::logout_handler))
        .route("/api/auth/me", get(auth::me_handler));

    let api_router = Router::new()
        .merge(cooking_routes)
        .merge(catalog_routes)
        .merge(generate_routes)
        .merge(auth_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            resolve_user,
        ))
        .with_state(state.clone());

    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TimeoutLayer::new(state.config.server_timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}
