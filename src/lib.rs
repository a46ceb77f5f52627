use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod db;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;

// Routing segregated by access requirement (public, authenticated).
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{ApiError, StoreError};
pub use repository::{Repository, RepositoryState, SqliteRepository};

/// ApiDoc
///
/// OpenAPI document aggregated from every `#[utoipa::path]` handler and the wire schemas.
/// Served at `/api-docs/openapi.json` and browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::recipes::list_recipes, handlers::recipes::get_recipe,
        handlers::recipes::create_recipe, handlers::recipes::update_recipe,
        handlers::recipes::delete_recipe,
        handlers::ingredients::list_ingredients, handlers::ingredients::get_ingredient,
        handlers::ingredients::create_ingredient, handlers::ingredients::update_ingredient,
        handlers::ingredients::delete_ingredient,
        handlers::recipe_ingredients::list_recipe_ingredients,
        handlers::recipe_ingredients::list_ingredient_recipes,
        handlers::recipe_ingredients::link_ingredient,
        handlers::recipe_ingredients::link_ingredients,
        handlers::recipe_ingredients::unlink_ingredient,
        handlers::recipe_ingredients::unlink_all_ingredients,
        handlers::auth::register_user, handlers::auth::login_user,
    ),
    components(
        schemas(
            models::Recipe, models::Ingredient, models::LinkedIngredient, models::User,
            models::RecipePayload, models::IngredientPayload, models::LinkIngredientsRequest,
            models::LinkResponse, models::LinkManyResponse,
            models::RegisterRequest, models::LoginRequest, models::LoginResponse,
            envelope::RecipeList, envelope::RecipeData, envelope::RecipeEntry,
            envelope::IngredientList, envelope::IngredientData, envelope::IngredientEntry,
            envelope::Pagination,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "recipe-api", description = "Recipes, ingredients and their associations")
    )
)]
struct ApiDoc;

/// Registers the bearer scheme so Swagger UI can send the token.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// AppState
///
/// The single container of shared services, cloned into every request.
#[derive(Clone)]
pub struct AppState {
    /// Persistence: every repository trait behind one trait object.
    pub repo: RepositoryState,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

impl AppState {
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self { repo, config }
    }
}

// --- Axum FromRef Extractor Implementations ---

// Lets extractors such as `AuthUser` pull just the piece of state they need.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Access gate for the resource routes. Extracting `AuthUser` performs the whole bearer
/// check; a rejection short-circuits with 401 and the handler never runs.
async fn auth_middleware(auth_user: AuthUser, request: Request, next: Next) -> Response {
    tracing::debug!(user_id = auth_user.id, username = %auth_user.username, "request authenticated");
    next.run(request).await
}

/// create_router
///
/// Assembles routes, the access gate, observability layers and the shared state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state);

    // Request id first, so the trace span and the response both carry it.
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span with method, URI and the `x-request-id` value, so every log
/// line emitted while serving the request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
