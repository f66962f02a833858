//! HTTP routes over the weather façade.

use axum::{
    Json, Router,
    extract::{Query, Request, State, rejection::QueryRejection},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Instant;
use weather_core::{Config, ErrorKind, WeatherError, WeatherFacade, WeatherObservation};

const SERVER_ERROR_MESSAGE: &str =
    "An error occurred while fetching weather data. Please try again later.";

#[derive(Clone)]
pub struct AppState {
    facade: WeatherFacade,
}

pub fn router(facade: WeatherFacade) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/weather/coordinates", get(by_coordinates))
        .route("/api/weather/city", get(by_city))
        .route("/api-docs/openapi.json", get(openapi))
        .with_state(AppState { facade })
        .layer(middleware::from_fn(log_request))
}

/// One log line per request with its status and latency.
async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed = ?started.elapsed(),
        "handled request"
    );
    response
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: &Config, facade: WeatherFacade) -> anyhow::Result<()> {
    let addr = (config.server.bind_address.as_str(), config.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(address = %listener.local_addr()?, "starting web server");
    axum::serve(listener, router(facade))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Errors rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Core(WeatherError),
}

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        ApiError::Core(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Core(err) => match err.kind() {
                ErrorKind::InvalidInput => (StatusCode::BAD_REQUEST, err.to_string()),
                ErrorKind::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
                ErrorKind::Upstream => {
                    tracing::error!(error = %err, "upstream failure");
                    (StatusCode::BAD_GATEWAY, SERVER_ERROR_MESSAGE.to_string())
                }
                ErrorKind::Internal => {
                    tracing::error!(error = %err, "internal failure");
                    (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_MESSAGE.to_string())
                }
            },
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn health() -> &'static str {
    "ok"
}

/// GET /api-docs/openapi.json
async fn openapi() -> Json<Value> {
    Json(openapi_document())
}

fn openapi_document() -> Value {
    let ok = json!({
        "description": "Current weather observation",
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/WeatherObservation" }
            }
        }
    });
    let error = |description: &str| {
        json!({
            "description": description,
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/Error" } }
            }
        })
    };
    let number_param = |name: &str| {
        json!({
            "name": name,
            "in": "query",
            "required": true,
            "schema": { "type": "number", "format": "double" }
        })
    };

    json!({
        "openapi": "3.0.3",
        "info": { "title": "Weather Service API", "version": "v1" },
        "paths": {
            "/api/weather/coordinates": {
                "get": {
                    "summary": "Current weather for a latitude/longitude pair",
                    "parameters": [number_param("latitude"), number_param("longitude")],
                    "responses": {
                        "200": ok.clone(),
                        "400": error("Coordinate missing or out of range"),
                        "500": error("Store failure"),
                        "502": error("Forecast provider failed")
                    }
                }
            },
            "/api/weather/city": {
                "get": {
                    "summary": "Current weather for a place name",
                    "parameters": [{
                        "name": "city",
                        "in": "query",
                        "required": true,
                        "schema": { "type": "string" }
                    }],
                    "responses": {
                        "200": ok,
                        "400": error("Empty place name"),
                        "404": error("Place name did not resolve"),
                        "500": error("Store failure"),
                        "502": error("Geocoding or forecast provider failed")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "WeatherObservation": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "latitude": { "type": "number", "format": "double" },
                        "longitude": { "type": "number", "format": "double" },
                        "temperature": { "type": "number", "format": "double" },
                        "windBearing": { "type": "number", "format": "double" },
                        "windSpeed": { "type": "number", "format": "double" },
                        "sunrise": { "type": "string", "example": "2024-06-01T04:43:00" },
                        "capturedAt": { "type": "string", "format": "date-time" }
                    }
                },
                "Error": {
                    "type": "object",
                    "properties": { "error": { "type": "string" } }
                }
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct CoordinateParams {
    latitude: f64,
    longitude: f64,
}

/// GET /api/weather/coordinates?latitude=..&longitude=..
#[tracing::instrument(skip(state, params))]
async fn by_coordinates(
    State(state): State<AppState>,
    params: Result<Query<CoordinateParams>, QueryRejection>,
) -> Result<Json<WeatherObservation>, ApiError> {
    let Query(params) = params?;
    let observation = state.facade.by_coordinate(params.latitude, params.longitude).await?;
    Ok(Json(observation))
}

#[derive(Debug, Deserialize)]
struct CityParams {
    #[serde(default)]
    city: String,
}

/// GET /api/weather/city?city=..
#[tracing::instrument(skip(state, params))]
async fn by_city(
    State(state): State<AppState>,
    params: Result<Query<CityParams>, QueryRejection>,
) -> Result<Json<WeatherObservation>, ApiError> {
    let Query(params) = params?;
    let observation = state.facade.by_place_name(&params.city).await?;
    Ok(Json(observation))
}
