//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all demo handlers
//! - Wire up middleware (request id, server span, metrics, timeout)
//! - Mount the admin API when enabled
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::{get, post};
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::admin::setup_admin_router;
use crate::config::DemoConfig;
use crate::http::request::{track_metrics, RecordStatus, ServerSpan};
use crate::http::{failure, health, joke, llm, quote, sdk_test, weather};
use crate::llm::MockLlm;
use crate::logs::{LogBatcher, Logger};
use crate::upstream::{UpstreamResult, Upstreams};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DemoConfig>,
    pub upstreams: Upstreams,
    pub llm: Arc<MockLlm>,
    pub logger: Logger,
    pub batcher: Option<Arc<LogBatcher>>,
    pub started_at: Instant,
}

/// HTTP server for the demo service.
pub struct HttpServer {
    router: Router,
    config: Arc<DemoConfig>,
}

impl HttpServer {
    pub fn new(
        config: DemoConfig,
        logger: Logger,
        batcher: Option<Arc<LogBatcher>>,
    ) -> UpstreamResult<Self> {
        let config = Arc::new(config);
        let state = AppState {
            upstreams: Upstreams::new(&config.upstream)?,
            llm: Arc::new(MockLlm::new(config.llm.clone())),
            config: config.clone(),
            logger,
            batcher,
            started_at: Instant::now(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &DemoConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/", get(health::index))
            .route("/health", get(health::health))
            .route("/api/weather", get(weather::get_weather))
            .route("/api/quote", get(quote::get_quote))
            .route("/api/joke", get(joke::get_joke))
            .route("/api/llm/chat", post(llm::chat))
            .route("/api/llm/models", get(llm::models))
            .route("/api/fail", get(failure::simulate_failure))
            .route("/api/sdk-test", get(sdk_test::sdk_test))
            .with_state(state.clone());

        if config.admin.enabled {
            router = router.merge(setup_admin_router(state));
        }

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(ServerSpan)
                        .on_response(RecordStatus),
                )
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(middleware::from_fn(track_metrics))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.timeouts.request_secs,
                ))),
        )
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            service = %self.config.service.name,
            environment = %self.config.service.environment,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
