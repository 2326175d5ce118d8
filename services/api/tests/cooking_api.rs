//! Drives the full router over in-memory ports.

use api_lib::{
    config::Config,
    web::{build_router, AppState},
};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use cooking_assistant_core::{
    domain::{GeneratedRecipe, RecipeDraft, Step, User, UserCredentials},
    engine::CookingEngine,
    memory::{InMemoryAccounts, InMemoryCookingStore, InMemoryHistory, InMemoryRecipes},
    ports::{AccountStore, PortError, PortResult, RecipeGenerationService},
    recipe::RecipeResolver,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

/// Always proposes the same three-step soup, or a vegan variant when refining.
struct SoupGenerator;

#[async_trait]
impl RecipeGenerationService for SoupGenerator {
    async fn generate_recipe(
        &self,
        query: &str,
        previous: Option<&GeneratedRecipe>,
    ) -> PortResult<RecipeDraft> {
        let name = match previous {
            Some(recipe) => format!("{} ({})", recipe.name, query),
            None => "Tomato soup".to_string(),
        };
        Ok(RecipeDraft {
            name,
            description: "A quick soup".to_string(),
            ingredients: json!([{"name": "tomato"}]),
            steps: (1..=3)
                .map(|n| Step {
                    number: n,
                    text: format!("Soup step {}", n),
                    ingredients: json!([]),
                    equipment: json!([]),
                    length: json!([]),
                })
                .collect(),
        })
    }
}

struct TestApp {
    router: Router,
    recipes: InMemoryRecipes,
    history: Arc<InMemoryHistory>,
    accounts: Arc<InMemoryAccounts>,
}

fn steps_json(count: usize) -> Value {
    Value::Array(
        (1..=count)
            .map(|n| json!({"number": n, "step": format!("Step {}", n), "length": {}}))
            .collect(),
    )
}

fn router_with(
    accounts: Arc<dyn AccountStore>,
    recipes: &InMemoryRecipes,
    history: Arc<InMemoryHistory>,
) -> Router {
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://unused".to_string()),
        _ => None,
    })
    .unwrap();

    let cooking = CookingEngine::new(
        RecipeResolver::new(recipes.catalog_source(), recipes.generated_source()),
        Arc::new(InMemoryCookingStore::new()),
        history,
    );

    let state = Arc::new(AppState {
        config: Arc::new(config),
        accounts,
        catalog: Arc::new(recipes.clone()),
        generated: Arc::new(recipes.clone()),
        generator: Arc::new(SoupGenerator),
        cooking,
    });
    build_router(state).unwrap()
}

fn test_app() -> TestApp {
    let recipes = InMemoryRecipes::new();
    let history = Arc::new(InMemoryHistory::new());
    let accounts = Arc::new(InMemoryAccounts::new());

    TestApp {
        router: router_with(accounts.clone(), &recipes, history.clone()),
        recipes,
        history,
        accounts,
    }
}

impl TestApp {
    /// Registers a user directly in the account store and returns `(user_id, cookie)`.
    async fn user(&self) -> (Uuid, String) {
        let email = format!("{}@example.com", Uuid::new_v4());
        let user = self
            .accounts
            .create_user_with_email(&email, "not-a-real-hash")
            .await
            .unwrap();
        let session_id = Uuid::new_v4().to_string();
        self.accounts
            .create_auth_session(&session_id, user.user_id, Utc::now() + Duration::days(1))
            .await
            .unwrap();
        (user.user_id, format!("session_id={}", session_id))
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str, cookie: &str) -> Value {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        let (status, body) = self.send(request).await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    async fn post(&self, uri: &str, cookie: &str) -> Value {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        let (status, body) = self.send(request).await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    async fn post_json(&self, uri: &str, cookie: &str, payload: Value) -> Value {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::COOKIE, cookie)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        let (status, body) = self.send(request).await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    async fn start(&self, recipe_id: i64, cookie: &str) -> Value {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/recipe/start")
            .header(header::COOKIE, cookie)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("id={}", recipe_id)))
            .unwrap();
        let (status, body) = self.send(request).await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    async fn start_raw(&self, form: &str, cookie: &str) -> Value {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/recipe/start")
            .header(header::COOKIE, cookie)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.send(request).await.1
    }
}

#[tokio::test]
async fn happy_path_walk() {
    let app = test_app();
    app.recipes.add_catalog(645348, "Pancakes", steps_json(4));
    let (user_id, cookie) = app.user().await;

    let started = app.start(645348, &cookie).await;
    assert_eq!(started["Status"], 200);
    assert_eq!(started["Data"]["stepNum"], 1);
    assert_eq!(started["Data"]["length"], json!([]));

    let current = app.get("/api/recipe", &cookie).await;
    assert_eq!(current["Data"]["currentStep"]["stepNum"], 1);
    assert_eq!(current["Data"]["totalSteps"], 4);
    assert_eq!(current["Data"]["isGenerated"], false);

    for expected in 2..=4 {
        let next = app.post("/api/recipe/next", &cookie).await;
        assert_eq!(next["Data"]["stepNum"], expected);
    }

    let past_end = app.post("/api/recipe/next", &cookie).await;
    assert_eq!(past_end["Status"], 500);
    assert_eq!(past_end["Msg"], "step out of range");
    assert!(past_end.get("Data").is_none());

    let ended = app.post("/api/recipe/end", &cookie).await;
    assert_eq!(ended["Status"], 200);
    assert_eq!(ended["Data"]["recipeId"], 645348);

    let after = app.get("/api/recipe", &cookie).await;
    assert_eq!(after["Status"], 404);
    assert_eq!(after["Msg"], "no recipe is being cooked");
    assert_eq!(app.history.entries_for(user_id).len(), 1);

    let history = app.get("/api/recipe/history", &cookie).await;
    assert_eq!(history["Data"][0]["recipeId"], 645348);
}

#[tokio::test]
async fn double_start_is_rejected() {
    let app = test_app();
    app.recipes.add_catalog(10, "Omelette", steps_json(3));
    app.recipes.add_catalog(11, "Salad", steps_json(2));
    let (_, cookie) = app.user().await;

    assert_eq!(app.start(10, &cookie).await["Status"], 200);
    let second = app.start(11, &cookie).await;
    assert_eq!(second["Status"], 409);
    assert!(!second["MsgRus"].as_str().unwrap().is_empty());

    let current = app.get("/api/recipe", &cookie).await;
    assert_eq!(current["Data"]["recipeId"], 10);
    assert_eq!(current["Data"]["currentStep"]["stepNum"], 1);
}

#[tokio::test]
async fn timer_lifecycle() {
    let app = test_app();
    app.recipes.add_catalog(20, "Stew", steps_json(5));
    let (_, cookie) = app.user().await;
    app.start(20, &cookie).await;

    let added = app
        .post_json("/api/recipe/timer/add", &cookie, json!({"step": 2, "length": 600}))
        .await;
    assert_eq!(added["Status"], 200);
    assert_eq!(added["Data"]["length"], 600);

    let duplicate = app
        .post_json("/api/recipe/timer/add", &cookie, json!({"step": 2, "length": 300}))
        .await;
    assert_eq!(duplicate["Status"], 409);

    let missing_step = app
        .post_json("/api/recipe/timer/add", &cookie, json!({"step": 99, "length": 60}))
        .await;
    assert_eq!(missing_step["Status"], 404);
    assert_eq!(missing_step["Msg"], "step not found");

    let timers = app.get("/api/recipe/timers", &cookie).await;
    let list = timers["Data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["step"], 2);
    assert_eq!(list[0]["description"], "Step 2");
    assert_eq!(list[0]["stepText"], "Step 2");

    let finished = app
        .post_json("/api/recipe/timer/finish", &cookie, json!({"step": 2}))
        .await;
    assert_eq!(finished["Status"], 200);
    let finished_again = app
        .post_json("/api/recipe/timer/finish", &cookie, json!({"step": 2}))
        .await;
    assert_eq!(finished_again["Msg"], "timer not found");

    app.post("/api/recipe/end", &cookie).await;
    let after = app.get("/api/recipe/timers", &cookie).await;
    assert_eq!(after["Status"], 404);
    assert_eq!(after["Msg"], "no recipe is being cooked");
}

#[tokio::test]
async fn prev_at_first_step_does_not_move() {
    let app = test_app();
    app.recipes.add_catalog(30, "Toast", steps_json(2));
    let (_, cookie) = app.user().await;
    app.start(30, &cookie).await;

    let prev = app.post("/api/recipe/prev", &cookie).await;
    assert_eq!(prev["Status"], 500);

    let current = app.get("/api/recipe", &cookie).await;
    assert_eq!(current["Data"]["currentStep"]["stepNum"], 1);
}

#[tokio::test]
async fn generated_recipes_are_owner_only() {
    let app = test_app();
    let (owner, owner_cookie) = app.user().await;
    let (_, other_cookie) = app.user().await;
    app.recipes
        .add_generated(77, owner, "Owner's curry", steps_json(3));

    let started = app.post("/api/generate/77/start", &owner_cookie).await;
    assert_eq!(started["Data"]["stepNum"], 1);

    let stolen = app.post("/api/generate/77/start", &other_cookie).await;
    assert_eq!(stolen["Status"], 404);
    assert_eq!(stolen["Msg"], "recipe not found");

    let current = app.get("/api/recipe", &owner_cookie).await;
    assert_eq!(current["Data"]["isGenerated"], true);
}

#[tokio::test]
async fn sessions_are_isolated_per_user() {
    let app = test_app();
    app.recipes.add_catalog(40, "Bread", steps_json(3));
    app.recipes.add_catalog(41, "Butter", steps_json(3));
    let (_, a) = app.user().await;
    let (_, b) = app.user().await;

    app.start(40, &a).await;
    app.start(41, &b).await;
    assert_eq!(app.post("/api/recipe/next", &a).await["Data"]["stepNum"], 2);

    let current_b = app.get("/api/recipe", &b).await;
    assert_eq!(current_b["Data"]["recipeId"], 41);
    assert_eq!(current_b["Data"]["currentStep"]["stepNum"], 1);
}

#[tokio::test]
async fn missing_or_unknown_cookie_is_unauthenticated() {
    let app = test_app();
    app.recipes.add_catalog(50, "Tea", steps_json(1));

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/recipe")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Status"], 401);
    assert_eq!(body["Msg"], "user not authenticated");

    let unknown = app.start(50, "session_id=does-not-exist").await;
    assert_eq!(unknown["Status"], 401);
}

/// An account store whose database is down.
struct OfflineAccounts;

#[async_trait]
impl AccountStore for OfflineAccounts {
    async fn create_user_with_email(&self, _email: &str, _hashed: &str) -> PortResult<User> {
        Err(offline())
    }

    async fn get_user_by_email(&self, _email: &str) -> PortResult<UserCredentials> {
        Err(offline())
    }

    async fn get_user(&self, _user_id: Uuid) -> PortResult<User> {
        Err(offline())
    }

    async fn create_auth_session(
        &self,
        _session_id: &str,
        _user_id: Uuid,
        _expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        Err(offline())
    }

    async fn validate_auth_session(&self, _session_id: &str) -> PortResult<Uuid> {
        Err(offline())
    }

    async fn delete_auth_session(&self, _session_id: &str) -> PortResult<()> {
        Err(offline())
    }
}

fn offline() -> PortError {
    PortError::StoreUnavailable("connection refused".to_string())
}

#[tokio::test]
async fn account_store_outage_is_not_reported_as_logged_out() {
    let recipes = InMemoryRecipes::new();
    let router = router_with(
        Arc::new(OfflineAccounts),
        &recipes,
        Arc::new(InMemoryHistory::new()),
    );

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/recipe")
        .header(header::COOKIE, "session_id=abc123")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["Status"], 500);
    assert_ne!(body["Msg"], "user not authenticated");

    // Without a cookie the store is never asked.
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/recipe")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["Status"], 401);
}

#[tokio::test]
async fn malformed_bodies_are_invalid_input() {
    let app = test_app();
    let (_, cookie) = app.user().await;

    let bad_form = app.start_raw("id=pancakes", &cookie).await;
    assert_eq!(bad_form["Status"], 400);

    let bad_json = app
        .post_json("/api/recipe/timer/add", &cookie, json!({"step": "two"}))
        .await;
    assert_eq!(bad_json["Status"], 400);

    let no_session = app
        .post_json("/api/recipe/timer/add", &cookie, json!({"step": 1, "length": 0}))
        .await;
    assert_eq!(no_session["Status"], 404);

    app.recipes.add_catalog(55, "Rice", steps_json(2));
    assert_eq!(app.start(55, &cookie).await["Status"], 200);
    let zero_length = app
        .post_json("/api/recipe/timer/add", &cookie, json!({"step": 1, "length": 0}))
        .await;
    assert_eq!(zero_length["Status"], 400);
}

#[tokio::test]
async fn recipe_without_steps_cannot_be_started() {
    let app = test_app();
    app.recipes.add_catalog(60, "Air", json!([]));
    let (_, cookie) = app.user().await;

    let started = app.start(60, &cookie).await;
    assert_eq!(started["Status"], 422);
    assert_eq!(app.get("/api/recipe", &cookie).await["Status"], 404);
}

#[tokio::test]
async fn step_can_be_read_without_moving() {
    let app = test_app();
    app.recipes.add_catalog(70, "Pie", steps_json(3));
    let (_, cookie) = app.user().await;
    app.start(70, &cookie).await;

    let third = app.get("/api/recipe/step/3", &cookie).await;
    assert_eq!(third["Data"]["step"], "Step 3");
    assert_eq!(app.get("/api/recipe/step/4", &cookie).await["Status"], 404);
    assert_eq!(
        app.get("/api/recipe", &cookie).await["Data"]["currentStep"]["stepNum"],
        1
    );
}

#[tokio::test]
async fn generate_refine_and_cook() {
    let app = test_app();
    let (_, cookie) = app.user().await;

    let created = app
        .post_json("/api/generate", &cookie, json!({"query": "tomato soup"}))
        .await;
    assert_eq!(created["Status"], 200);
    assert_eq!(created["Data"]["version"], 1);
    let id = created["Data"]["id"].as_i64().unwrap();

    let updated = app
        .post_json(
            &format!("/api/generate/{}/update", id),
            &cookie,
            json!({"query": "make it vegan"}),
        )
        .await;
    assert_eq!(updated["Data"]["version"], 2);
    assert_eq!(updated["Data"]["name"], "Tomato soup (make it vegan)");

    let versions = app
        .get(&format!("/api/generate/{}/versions", id), &cookie)
        .await;
    assert_eq!(versions["Data"].as_array().unwrap().len(), 2);
    assert_eq!(versions["Data"][0]["version"], 1);

    let started = app
        .post(&format!("/api/generate/{}/start", id), &cookie)
        .await;
    assert_eq!(started["Data"]["step"], "Soup step 1");

    let empty_query = app
        .post_json("/api/generate", &cookie, json!({"query": "  "}))
        .await;
    assert_eq!(empty_query["Status"], 400);
}

#[tokio::test]
async fn favorites_round_trip() {
    let app = test_app();
    app.recipes.add_catalog(80, "Borscht", steps_json(2));
    let (_, cookie) = app.user().await;

    assert_eq!(app.post("/api/favorites/80", &cookie).await["Status"], 200);
    assert_eq!(app.post("/api/favorites/80", &cookie).await["Status"], 409);
    assert_eq!(app.post("/api/favorites/81", &cookie).await["Status"], 404);

    let favorites = app.get("/api/favorites", &cookie).await;
    assert_eq!(favorites["Data"][0]["name"], "Borscht");

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/favorites/80")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let (_, removed) = app.send(request).await;
    assert_eq!(removed["Status"], 200);

    let recipe = app.get("/api/recipes/80", &cookie).await;
    assert_eq!(recipe["Data"]["steps"].as_array().unwrap().len(), 2);
    let list = app.get("/api/recipes?perPage=51", &cookie).await;
    assert_eq!(list["Status"], 400);
}

#[tokio::test]
async fn signup_then_cook_with_the_issued_cookie() {
    let app = test_app();
    app.recipes.add_catalog(90, "Porridge", steps_json(2));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"email": "Cook@Example.com", "password": "correct horse"}).to_string(),
        ))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.contains("HttpOnly"));
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    let me = app.get("/api/auth/me", &cookie).await;
    assert_eq!(me["Data"]["email"], "cook@example.com");
    assert_eq!(app.start(90, &cookie).await["Data"]["stepNum"], 1);

    let wrong_password = app
        .post_json(
            "/api/auth/login",
            "",
            json!({"email": "cook@example.com", "password": "wrong password"}),
        )
        .await;
    assert_eq!(wrong_password["Status"], 401);

    app.post("/api/auth/logout", &cookie).await;
    assert_eq!(app.get("/api/recipe", &cookie).await["Status"], 401);
}

