//! Application startup and lifecycle management.

use crate::config::ErpConfig;
use crate::handlers;
use crate::middleware::{auth_middleware, metrics_middleware};
use crate::services::{
    get_metrics, init_metrics, AuthService, Database, EmailProvider, EmailService, JwtService,
    NoopEmailer,
};
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use erp_core::error::AppError;
use erp_core::middleware::tracing::request_id_middleware;
use secrecy::ExposeSecret;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ErpConfig,
    pub db: Arc<Database>,
    pub jwt: JwtService,
    pub auth: AuthService,
}

/// State for health check endpoints.
#[derive(Clone)]
struct HealthState {
    db: Arc<Database>,
}

/// Health check endpoint for liveness probes.
async fn health_check(State(state): State<HealthState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(_) => {
            tracing::debug!("Health check passed");
            (
                StatusCode::OK,
                Json(json!({
                    "status": "ok",
                    "service": "erp-service",
                    "version": env!("CARGO_PKG_VERSION")
                })),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed - database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": "erp-service",
                    "error": e.to_string()
                })),
            )
        }
    }
}

/// Readiness check endpoint.
async fn readiness_check(State(state): State<HealthState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Metrics endpoint for Prometheus scraping.
async fn metrics_handler() -> impl IntoResponse {
    let metrics = get_metrics();
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        metrics,
    )
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: ErpConfig) -> Result<Self, AppError> {
        Self::build_internal(config, true).await
    }

    /// Build the application without running migrations. Use in tests when
    /// the schema is prepared by the harness.
    pub async fn build_without_migrations(config: ErpConfig) -> Result<Self, AppError> {
        Self::build_internal(config, false).await
    }

    async fn build_internal(config: ErpConfig, run_migrations: bool) -> Result<Self, AppError> {
        init_metrics();

        let db = Database::new(
            config.database.url.expose_secret(),
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        if run_migrations {
            db.run_migrations().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;
        }

        let db = Arc::new(db);
        let jwt = JwtService::new(&config.jwt);

        let email: Arc<dyn EmailProvider> = match &config.smtp {
            Some(smtp) => Arc::new(EmailService::new(smtp)?),
            None => Arc::new(NoopEmailer),
        };

        let auth = AuthService::new(db.clone(), jwt.clone(), email, config.app_url.clone());

        let state = AppState {
            config: config.clone(),
            db,
            jwt,
            auth,
        };

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Port the server is bound to (useful with port 0 in tests).
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the HTTP server until the task is stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let app = router(self.state);

        tracing::info!(port = self.port, "HTTP server listening");

        axum::serve(self.listener, app.into_make_service()).await
    }
}

/// Assemble the router: public auth family, token-guarded /api resources,
/// and the operational endpoints.
fn router(state: AppState) -> Router {
    use axum::routing::post;

    let health_state = HealthState {
        db: state.db.clone(),
    };

    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/signup", post(handlers::auth::signup))
        .route("/forgot-password", post(handlers::auth::forgot_password))
        .route("/reset-password", post(handlers::auth::reset_password));

    let protected = Router::new()
        .route(
            "/customers",
            get(handlers::customers::list_customers)
                .post(handlers::customers::create_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        )
        .route(
            "/products",
            get(handlers::products::list_products)
                .post(handlers::products::create_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .route(
            "/plans",
            get(handlers::plans::list_plans)
                .post(handlers::plans::create_plan)
                .put(handlers::plans::update_plan)
                .delete(handlers::plans::delete_plan),
        )
        .route(
            "/taxes",
            get(handlers::taxes::list_taxes)
                .post(handlers::taxes::create_tax)
                .put(handlers::taxes::update_tax)
                .delete(handlers::taxes::delete_tax),
        )
        .route(
            "/discounts",
            get(handlers::discounts::list_discounts)
                .post(handlers::discounts::create_discount)
                .put(handlers::discounts::update_discount)
                .delete(handlers::discounts::delete_discount),
        )
        .route(
            "/users",
            get(handlers::users::list_users)
                .post(handlers::users::create_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route(
            "/subscriptions",
            get(handlers::subscriptions::list_subscriptions)
                .post(handlers::subscriptions::create_subscription)
                .put(handlers::subscriptions::update_subscription)
                .delete(handlers::subscriptions::delete_subscription),
        )
        .route(
            "/invoices",
            get(handlers::invoices::list_invoices)
                .post(handlers::invoices::create_invoice)
                .put(handlers::invoices::update_invoice)
                .delete(handlers::invoices::delete_invoice),
        )
        .route(
            "/payments",
            get(handlers::payments::list_payments)
                .post(handlers::payments::create_payment)
                .put(handlers::payments::update_payment)
                .delete(handlers::payments::delete_payment),
        )
        .route("/dashboard/stats", get(handlers::dashboard::stats))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let ops = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .with_state(health_state)
        .route("/metrics", get(metrics_handler));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", protected)
        .with_state(state)
        .merge(ops)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
}
