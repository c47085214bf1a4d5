//! Billing Sync API server
//!
//! Loads configuration, connects to PostgreSQL, wires the Stripe client and
//! session validator into the billing router and serves it.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use billing_sync::adapters::http::middleware::AuthState;
use billing_sync::adapters::http::{billing_router, BillingAppState};
use billing_sync::adapters::{
    JwtConfig, JwtSessionValidator, PostgresProfileRepository, PostgresSubscriptionRepository,
    PostgresWebhookEventRepository, StripeConfig, StripePaymentAdapter,
};
use billing_sync::config::{AppConfig, ServerConfig};
use billing_sync::domain::billing::StripeWebhookVerifier;
use billing_sync::ports::PaymentProvider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);

    tracing::info!("Starting billing-sync v{}", env!("CARGO_PKG_VERSION"));
    config.validate()?;

    tracing::info!("Connecting to database...");
    let pool = config.database.connect().await?;
    tracing::info!("Database connection established");

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let payment_provider = config.stripe.api_key().map(|key| {
        let stripe = StripeConfig::from_secret(key.clone())
            .with_base_url(config.stripe.api_base_url.as_str());
        Arc::new(StripePaymentAdapter::new(stripe)) as Arc<dyn PaymentProvider>
    });
    if payment_provider.is_none() {
        tracing::warn!("Stripe API key not configured; webhook and admin endpoints will fail");
    }

    let webhook_verifier = config
        .stripe
        .webhook_secret()
        .cloned()
        .map(StripeWebhookVerifier::from_secret);
    if webhook_verifier.is_none() {
        tracing::warn!("Stripe webhook secret not configured; webhook endpoint will fail");
    }

    let cron_secret = config.cron.secret().cloned();
    if cron_secret.is_none() {
        tracing::warn!("Cron secret not configured; grace sweep endpoint will fail");
    }

    let state = BillingAppState {
        subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        profiles: Arc::new(PostgresProfileRepository::new(pool.clone())),
        webhook_events: Arc::new(PostgresWebhookEventRepository::new(pool.clone())),
        payment_provider,
        webhook_verifier,
        cron_secret,
        grace_policy: config.cron.grace_policy(),
    };

    let validator: AuthState = Arc::new(JwtSessionValidator::new(
        JwtConfig::new(config.auth.jwt_secret.clone(), config.auth.jwt_audience.clone())
            .with_leeway(config.auth.leeway_secs),
    ));

    let app = with_middleware(billing_router(state, validator), &config.server);

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, environment = ?config.server.environment, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

/// JSON logs in production, human-readable otherwise. `RUST_LOG` wins over
/// the configured level.
fn init_tracing(server: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if server.is_production() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }
}

fn with_middleware(router: Router, server: &ServerConfig) -> Router {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    tracing::info!(allowed_origins = ?origins, "CORS configured");

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<axum::body::Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                },
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::new(server.request_timeout()))
            .layer(cors),
    )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
