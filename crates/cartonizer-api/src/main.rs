use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cartonizer_core::{
    CartonizationRequest, CartonizationResult, Cartonizer, CartonizerError, Container, Item,
    Parameters,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::AppConfig;

const OPENAPI_SPEC: &str = include_str!("../../../openapi.yaml");
const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Cartonizer API Docs</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = () => {
            SwaggerUIBundle({
                url: '/openapi.yaml',
                dom_id: '#swagger-ui',
                presets: [SwaggerUIBundle.presets.apis],
                layout: 'BaseLayout',
            });
        };
    </script>
</body>
</html>"#;
const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Cartonizer</title>
</head>
<body>
    <h1>Cartonizer API</h1>
    <h2>API Endpoints:</h2>
    <ul>
        <li>GET /api/health - Health check</li>
        <li>POST /api/cartonize - Recommend containers for one shipment</li>
        <li>POST /api/cartonize/batch - Recommend containers for several orders</li>
        <li>GET /docs - API documentation</li>
    </ul>
</body>
</html>"#;

#[derive(Clone)]
struct AppState {
    default_parameters: Parameters,
}

/// Single shipment. Missing `parameters` fall back to the service defaults.
#[derive(Debug, Deserialize)]
struct CartonizeRequest {
    items: Vec<Item>,
    containers: Vec<Container>,
    #[serde(default)]
    parameters: Option<Parameters>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Status {
    Recommended,
    ManualPackingRequired,
    Invalid,
}

#[derive(Debug, Serialize, Deserialize)]
struct CartonizeResponse {
    status: Status,
    result: Option<CartonizationResult>,
}

impl From<Option<CartonizationResult>> for CartonizeResponse {
    fn from(result: Option<CartonizationResult>) -> Self {
        let status = if result.is_some() {
            Status::Recommended
        } else {
            Status::ManualPackingRequired
        };
        Self { status, result }
    }
}

#[derive(Debug, Deserialize)]
struct BatchOrder {
    order_id: String,
    items: Vec<Item>,
}

/// Several orders evaluated against one shared catalog snapshot.
#[derive(Debug, Deserialize)]
struct BatchRequest {
    containers: Vec<Container>,
    #[serde(default)]
    parameters: Option<Parameters>,
    orders: Vec<BatchOrder>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BatchOrderResult {
    order_id: String,
    status: Status,
    result: Option<CartonizationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BatchResponse {
    results: Vec<BatchOrderResult>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            eprintln!("Could not load .env: {err}");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Cartonizer API");

    let config = AppConfig::from_env();
    let app = app(AppState {
        default_parameters: config.parameters.clone(),
    });

    let addr = config.api.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Failed to bind to {}: {}", addr, err);
            std::process::exit(1);
        }
    };

    info!("API server listening on http://{}", addr);
    info!("Try: curl http://localhost:{}/api/health", addr.port());

    if let Err(err) = axum::serve(listener, app).await {
        error!("Server error: {}", err);
    }
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_ui))
        .route("/api/health", get(health_check))
        .route("/api/cartonize", post(cartonize))
        .route("/api/cartonize/batch", post(cartonize_batch))
        .route("/openapi.yaml", get(serve_openapi_spec))
        .route("/docs", get(serve_swagger_ui))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "cartonizer-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Main recommendation endpoint
async fn cartonize(
    State(state): State<AppState>,
    Json(request): Json<CartonizeRequest>,
) -> Result<Json<CartonizeResponse>, AppError> {
    info!(
        "Received cartonization request with {} items and {} containers",
        request.items.len(),
        request.containers.len()
    );

    let cartonizer = Cartonizer::new(CartonizationRequest {
        items: request.items,
        containers: request.containers,
        parameters: request.parameters.unwrap_or(state.default_parameters),
    })?;
    let result = cartonizer.recommend();

    match &result {
        Some(result) => info!(
            "Recommended {} package(s), primary container '{}', confidence {:.1}",
            result.package_count, result.primary_container.id, result.confidence
        ),
        None => warn!("No suitable container found, manual packing required"),
    }

    Ok(Json(result.into()))
}

/// Batch endpoint. Orders are independent, so each runs on its own blocking task.
async fn cartonize_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, AppError> {
    info!(
        "Received batch request with {} orders and {} containers",
        request.orders.len(),
        request.containers.len()
    );

    let parameters = request.parameters.unwrap_or(state.default_parameters);
    let tasks: Vec<_> = request
        .orders
        .into_iter()
        .map(|order| {
            let request = CartonizationRequest {
                items: order.items,
                containers: request.containers.clone(),
                parameters: parameters.clone(),
            };
            let order_id = order.order_id;
            tokio::task::spawn_blocking(move || evaluate_order(order_id, request))
        })
        .collect();

    let mut results = Vec::with_capacity(tasks.len());
    for task in tasks {
        results.push(task.await.map_err(anyhow::Error::from)?);
    }

    let recommended = results
        .iter()
        .filter(|r| r.status == Status::Recommended)
        .count();
    info!(
        "Batch complete: {} of {} orders recommended",
        recommended,
        results.len()
    );

    Ok(Json(BatchResponse { results }))
}

fn evaluate_order(order_id: String, request: CartonizationRequest) -> BatchOrderResult {
    match Cartonizer::new(request) {
        Ok(cartonizer) => {
            let response = CartonizeResponse::from(cartonizer.recommend());
            BatchOrderResult {
                order_id,
                status: response.status,
                result: response.result,
                error: None,
            }
        }
        Err(err) => {
            warn!("Order {} rejected: {}", order_id, err);
            BatchOrderResult {
                order_id,
                status: Status::Invalid,
                result: None,
                error: Some(err.to_string()),
            }
        }
    }
}

/// Application error type
struct AppError(anyhow::Error);

impl From<CartonizerError> for AppError {
    fn from(err: CartonizerError) -> Self {
        AppError(err.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request error: {}", self.0);

        let status = if self.0.downcast_ref::<CartonizerError>().is_some() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (
            status,
            Json(json!({
                "error": self.0.to_string(),
            })),
        )
            .into_response()
    }
}

async fn serve_ui() -> impl IntoResponse {
    Html(INDEX_HTML)
}

async fn serve_openapi_spec() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("Content-Type", "application/yaml")],
        OPENAPI_SPEC,
    )
}

async fn serve_swagger_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
