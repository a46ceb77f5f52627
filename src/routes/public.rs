use crate::{AppState, handlers::auth};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a bearer token: the health probe and the access gate's
/// own register/login pair, which is how a client obtains a token in the first place.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers and container orchestration.
        .route("/health", get(|| async { "ok" }))
        // POST /api/auth/register
        // Creates an account; the password is hashed before it reaches the store.
        .route("/api/auth/register", post(auth::register_user))
        // POST /api/auth/login
        // Returns a signed bearer token for valid credentials.
        .route("/api/auth/login", post(auth::login_user))
}
