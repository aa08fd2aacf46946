//! LuminaHealth Backend
//!
//! REST backend for the hospital site: public submissions, the admin dashboard, and
//! a sync gateway between a local SQLite cache and the remote document store.

mod api;
mod approval;
mod auth;
mod config;
mod db;
mod deadline;
mod errors;
mod models;
mod notify;
mod remote;
mod sync;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use approval::ApprovalFlow;
use auth::AdminSession;
use config::{Config, LogFormat};
use db::LocalCache;
use notify::EmailJsNotifier;
use remote::{HttpRemoteStore, MemoryRemoteStore, RemoteStore};
use sync::SyncGateway;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<SyncGateway>,
    pub approvals: Arc<ApprovalFlow>,
    pub session: Arc<AdminSession>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer().json().with_current_span(false).boxed(),
        LogFormat::Text => fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Starting LuminaHealth Backend");
    tracing::info!("Cache path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.uses_default_admin_password() {
        tracing::warn!("LUMINA_ADMIN_PASSWORD is not set. The default admin password is in use!");
    }

    // Initialize local cache
    let pool = db::init_database(&config.db_path).await?;
    let cache = Arc::new(LocalCache::new(pool));

    let http = reqwest::Client::builder()
        .user_agent(concat!("lumina-backend/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let remote: Arc<dyn RemoteStore> = match &config.remote_url {
        Some(url) => {
            let mut base = url.clone();
            if !base.path().ends_with('/') {
                let path = format!("{}/", base.path());
                base.set_path(&path);
            }
            tracing::info!("Remote store: {}", base);
            Arc::new(HttpRemoteStore::new(
                base,
                config.remote_api_key.clone(),
                http.clone(),
            ))
        }
        None => {
            tracing::warn!(
                "No remote store configured (LUMINA_REMOTE_URL). Using the in-memory store!"
            );
            Arc::new(MemoryRemoteStore::new())
        }
    };

    let notifier = EmailJsNotifier::new(config.email.clone(), http);
    let notifier_status = notify::Notifier::status(&notifier);
    if !notifier_status.configured {
        tracing::warn!("Approval emails disabled: {}", notifier_status.message);
    }

    let gateway = Arc::new(SyncGateway::new(cache, remote, config.sync.clone()));
    let approvals = Arc::new(ApprovalFlow::new(gateway.clone(), Arc::new(notifier)));

    // Create application state
    let state = AppState {
        gateway,
        approvals,
        session: Arc::new(AdminSession::new(config.admin.clone())),
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let session = state.session.clone();

    // Dashboard routes
    let admin_routes = Router::new()
        .route("/logout", post(api::logout))
        .route("/session", get(api::get_session))
        .route("/appointments", get(api::list_appointments))
        .route("/applications", get(api::list_applications))
        .route("/applications/{id}/approve", post(api::approve_application))
        .route("/applications/{id}/reject", post(api::reject_application))
        .route("/homepage", put(api::update_homepage))
        .route("/notifier", get(api::notifier_status))
        .layer(middleware::from_fn(move |req, next| {
            auth::require_admin(session.clone(), req, next)
        }));

    // Public routes
    let api_routes = Router::new()
        .route("/applications", post(api::submit_application))
        .route("/appointments", post(api::submit_appointment))
        .route("/contacts", post(api::submit_contact))
        .route("/homepage", get(api::get_homepage))
        .route("/admin/login", post(api::login))
        .nest("/admin", admin_routes);

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
