/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use daybook_api::{app::{build_router, AppState}, config::Config};
/// use daybook_shared::mail::outbox::OutboxMailer;
/// use daybook_shared::services::Services;
/// use daybook_shared::store::memory::MemoryStore;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let services = Services::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(OutboxMailer::new()),
///     config.service.clone(),
/// );
/// let app = build_router(AppState::new(services, config));
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, routes};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use daybook_shared::auth::jwt;
use daybook_shared::services::Services;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Service layer
    pub services: Services,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(services: Services, config: Config) -> Self {
        Self {
            services,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Signed-in caller, inserted into request extensions by [`jwt_auth_layer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health
/// └── /api/
///     ├── POST   /account/register
///     ├── GET    /account/verify/:token
///     ├── POST   /account/login
///     ├── POST   /account/forgot/:email
///     ├── GET    /account/reset/:token
///     ├── POST   /account/reset
///     ├── GET    /account                 (auth)
///     ├── PUT    /account                 (auth)
///     ├── POST   /journal                 (auth)
///     ├── GET    /journal/:date           (auth)
///     ├── PUT    /journal/:id             (auth)
///     ├── DELETE /journal/:id             (auth)
///     ├── POST   /search                  (auth)
///     ├── POST   /search/date             (auth)
///     └── GET    /streak/:date            (auth)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Account routes that work without a session
    let public_routes = Router::new()
        .route("/account/register", post(routes::account::register))
        .route("/account/verify/:token", get(routes::account::verify))
        .route("/account/login", post(routes::account::login))
        .route("/account/forgot/:email", post(routes::account::forgot_password))
        .route(
            "/account/reset/:token",
            get(routes::account::check_reset_token),
        )
        .route("/account/reset", post(routes::account::reset_password));

    // Everything else requires a session token
    let protected_routes = Router::new()
        .route(
            "/account",
            get(routes::account::get_profile).put(routes::account::update_profile),
        )
        .route("/journal", post(routes::journal::create_entry))
        // GET takes a date, PUT and DELETE an entry id
        .route(
            "/journal/:key",
            get(routes::journal::get_entry)
                .put(routes::journal::update_entry)
                .delete(routes::journal::delete_entry),
        )
        .route("/search", post(routes::search::search))
        .route("/search/date", post(routes::search::search_dates))
        .route("/streak/:date", get(routes::search::streak))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api_routes = Router::new().merge(public_routes).merge(protected_routes);

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config.api.cors_origins))
        .with_state(state)
}

/// Permissive CORS when `*` is listed, otherwise only the listed origins
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// JWT authentication middleware layer
///
/// Extracts and validates the session token from the Authorization header,
/// then injects [`AuthContext`] into request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;
    if claims.sub.is_empty() {
        return Err(ApiError::Unauthorized("Token has no subject".to_string()));
    }

    req.extensions_mut().insert(AuthContext { user_id: claims.sub });

    Ok(next.run(req).await)
}
