use axum::{
    Router,
    http::HeaderValue,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::{AuthService, Notifier, SeaOrmAuthService, TokenService};
use crate::state::SharedState;

pub mod auth;
mod dashboard;
mod error;
mod roles;
mod system;
mod types;
mod users;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub auth_service: Arc<dyn AuthService>,

    /// Token decoding for callers that sit in front of the API
    pub tokens: Arc<TokenService>,

    pub config: Config,

    pub start_time: std::time::Instant,
}

impl AppState {
    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }
}

pub fn create_app_state(shared: Arc<SharedState>) -> Arc<AppState> {
    let config = shared.config.clone();

    let auth_service: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
        shared.store.clone(),
        shared.notifier.clone(),
        config.clone(),
    ));

    let tokens = Arc::new(TokenService::new(
        &config.auth.jwt_secret,
        config.auth.token_ttl_hours,
    ));

    Arc::new(AppState {
        shared,
        auth_service,
        tokens,
        config,
        start_time: std::time::Instant::now(),
    })
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared))
}

/// Variant for tests that need to observe notifier calls
pub async fn create_app_state_with_notifier(
    config: Config,
    notifier: Arc<dyn Notifier>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::with_notifier(config, notifier).await?);
    Ok(create_app_state(shared))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/verify-code", post(auth::verify_code))
        .route("/reset-password", post(auth::reset_password))
        .route("/cambiar-password", post(auth::cambiar_password))
        .route("/usuarios", get(users::list_usuarios))
        .route("/usuarios", post(users::create_usuario))
        .route("/usuarios/{id}", get(users::get_usuario))
        .route("/usuarios/{id}", put(users::update_usuario))
        .route("/usuarios/{id}", delete(users::delete_usuario))
        .route("/perfil/{id}", get(users::get_perfil))
        .route("/actividad/{id}", get(users::get_actividad))
        .route("/roles", get(roles::list_roles))
        .route("/roles", post(roles::create_rol))
        .route("/roles/{id}", delete(roles::delete_rol))
        .route("/dashboard/data", get(dashboard::get_dashboard_data))
        .route("/health", get(system::health))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
