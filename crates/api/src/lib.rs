//! Drowsiness Detection Demo Server
//!
//! Serves the camera page, runs one detection session per WebSocket
//! connection, and exposes health and Prometheus metrics endpoints.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use alerting::{AlertEmitter, SystemBeep};
use camera_capture::CaptureConfig;
use dms::{DmsConfig, DmsError, FaceEyeLocator};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub mod routes;
pub mod settings;

pub use settings::{LoggingSettings, Settings};

/// Name of the video widget on the page; also the WebSocket path segment
pub const WIDGET_KEY: &str = "drowsiness-detector";

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Detector error: {0}")]
    Dms(#[from] DmsError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Metrics setup failed: {0}")]
    Metrics(String),
}

/// Application state shared across handlers
pub struct AppState {
    /// Face and eye locators, loaded once and shared by every session
    pub locator: FaceEyeLocator,
    /// Alert sink handed to each session's tracker
    pub emitter: Arc<dyn AlertEmitter>,
    /// Capture settings advertised to the page
    pub capture: CaptureConfig,
    /// Prometheus render handle
    pub metrics: PrometheusHandle,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
    /// Open WebSocket sessions
    pub active_sessions: AtomicUsize,
}

impl AppState {
    /// Create new application state
    pub fn new(
        locator: FaceEyeLocator,
        emitter: Arc<dyn AlertEmitter>,
        capture: CaptureConfig,
        metrics: PrometheusHandle,
    ) -> Self {
        Self {
            locator,
            emitter,
            capture,
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
            active_sessions: AtomicUsize::new(0),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub active_sessions: usize,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::page::index))
        .route(&format!("/ws/{}", WIDGET_KEY), get(routes::stream::upgrade))
        .route("/api/v1/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        active_sessions: state.active_sessions.load(Ordering::Relaxed),
    })
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    state.metrics.render()
}

/// Initialize logging
pub fn init_logging(settings: &LoggingSettings) -> Result<(), ApiError> {
    let level: Level = settings
        .level
        .parse()
        .map_err(|_| ApiError::Logging(format!("unknown level '{}'", settings.level)))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let installed = if settings.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    installed.map_err(|e| ApiError::Logging(e.to_string()))
}

/// Run the server until Ctrl-C
pub async fn run_server(settings: Settings) -> Result<(), ApiError> {
    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ApiError::Metrics(e.to_string()))?;

    let dms_config = DmsConfig::with_cascade_dir(settings.detector.cascade_dir.clone());
    let locator = FaceEyeLocator::load(&dms_config)?;

    let capture = CaptureConfig {
        jpeg_quality: settings.detector.jpeg_quality,
        ..CaptureConfig::default()
    };

    let state = Arc::new(AppState::new(locator, Arc::new(SystemBeep), capture, metrics));
    let app = create_router(state);

    info!("Starting drowsiness demo on {}", settings.server.addr);

    let listener = tokio::net::TcpListener::bind(&settings.server.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alerting::AlertError;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use dms::{ObjectLocator, Region};
    use image::GrayImage;
    use tower::ServiceExt;

    pub(crate) struct Fixed(pub Vec<Region>);

    impl ObjectLocator for Fixed {
        fn locate(&self, _gray: &GrayImage) -> Result<Vec<Region>, DmsError> {
            Ok(self.0.clone())
        }
    }

    pub(crate) struct Silent;

    impl AlertEmitter for Silent {
        fn emit(&self) -> Result<(), AlertError> {
            Ok(())
        }
    }

    pub(crate) fn test_state(faces: Vec<Region>, eyes: Vec<Region>) -> Arc<AppState> {
        let locator = FaceEyeLocator::new(Arc::new(Fixed(faces)), Arc::new(Fixed(eyes)));
        let handle = PrometheusBuilder::new().build_recorder().handle();
        Arc::new(AppState::new(locator, Arc::new(Silent), CaptureConfig::default(), handle))
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_sessions() {
        let state = test_state(vec![], vec![]);
        state.active_sessions.store(2, Ordering::Relaxed);
        let app = create_router(state);

        let response = app
            .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["active_sessions"], 2);
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_index_serves_widget_page() {
        let app = create_router(test_state(vec![], vec![]));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let page = body_string(response).await;
        assert!(page.contains("Driver Drowsiness Detection System"));
        assert!(page.contains("/ws/${WIDGET_KEY}"));
        assert!(page.contains(r#"const WIDGET_KEY = "drowsiness-detector";"#));
    }

    #[tokio::test]
    async fn test_metrics_endpoint_responds() {
        let app = create_router(test_state(vec![], vec![]));

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_websocket_route_requires_upgrade() {
        let app = create_router(test_state(vec![], vec![]));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ws/drowsiness-detector")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[test]
    fn test_init_logging_rejects_unknown_level() {
        let settings = LoggingSettings {
            level: "loud".to_string(),
            json: false,
        };
        assert!(matches!(init_logging(&settings), Err(ApiError::Logging(_))));
    }
}
