// Brand History ETL - Web Server
// REST API over the exported historical data, plus scenario simulation

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use brand_history::{
    export::JSON_FILE, read_json, simulate, PipelineConfig, ReconciledRecord, ReconciliationSummary,
    SimulationInput,
};
use chrono::Local;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Shared application state
#[derive(Clone)]
struct AppState {
    data_file: Arc<PathBuf>,
}

impl AppState {
    /// Exported records, or an empty list when nothing has been exported yet
    fn load(&self) -> Vec<ReconciledRecord> {
        match read_json(&self.data_file) {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %self.data_file.display(), error = %e, "historical data unavailable");
                Vec::new()
            }
        }
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<Option<()>> {
    fn failed(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/data/historical - Exported record array (bare, as written to disk)
async fn get_historical(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.load()))
}

/// GET /api/data/summary - Totals over the exported records
async fn get_summary(State(state): State<AppState>) -> impl IntoResponse {
    let records = state.load();
    let summary = if records.is_empty() {
        None
    } else {
        Some(ReconciliationSummary::from_records(&records))
    };

    (StatusCode::OK, Json(ApiResponse::ok(summary)))
}

/// POST /api/simulation - Project the metrics forward from next month
async fn run_simulation(Json(input): Json<SimulationInput>) -> impl IntoResponse {
    match simulate(&input, Local::now().date_naive()) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            warn!(error = %e, "simulation rejected");
            (StatusCode::BAD_REQUEST, Json(ApiResponse::failed(e.to_string()))).into_response()
        }
    }
}

fn router(state: AppState, frontend: &str) -> Router {
    let cors = match HeaderValue::from_str(frontend) {
        Ok(origin) => CorsLayer::new().allow_origin(origin),
        Err(_) => CorsLayer::new().allow_origin(Any),
    }
    .allow_methods([Method::GET, Method::POST])
    .allow_headers([header::CONTENT_TYPE]);

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/data/historical", get(get_historical))
        .route("/data/summary", get(get_summary))
        .route("/simulation", post(run_simulation))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(ServiceBuilder::new().layer(cors))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = PipelineConfig::from_env();
    let data_file = config.processed_dir.join(JSON_FILE);
    info!(path = %data_file.display(), "serving historical data");

    let state = AppState {
        data_file: Arc::new(data_file),
    };

    let frontend = std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let addr = std::env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());

    let app = router(state, &frontend);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("❌ Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/data/historical", addr);
    println!("        http://{}/api/simulation (POST)", addr);
    println!("\n   Press Ctrl+C to stop\n");

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("❌ Server error: {}", e);
        std::process::exit(1);
    }
}
