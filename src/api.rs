use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use utoipa::{OpenApi, ToSchema};

use crate::db::DbError;
use crate::services::query_service::{
    StationRef, StatsQuery, WeatherDayPage, WeatherDayResponse, WeatherQuery, WeatherStatsPage,
    WeatherStatsResponse,
};
use crate::services::QueryService;

#[derive(Clone)]
pub struct AppState {
    pub query_service: QueryService,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failures surfaced by the HTTP handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid query parameters: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, list_weather, list_weather_stats),
    components(schemas(
        HealthResponse,
        ErrorResponse,
        StationRef,
        WeatherDayResponse,
        WeatherDayPage,
        WeatherStatsResponse,
        WeatherStatsPage
    )),
    tags((name = "weather", description = "Historical weather records and yearly statistics"))
)]
pub struct ApiDoc;

/// OpenAPI document for every route served by `create_router`
pub fn generate_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/weather", get(list_weather))
        .route("/weather/stats", get(list_weather_stats))
        .with_state(state);

    Router::new().nest("/api", api_routes)
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "weather",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
#[instrument(skip(_state))]
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

#[utoipa::path(
    get,
    path = "/api/weather",
    tag = "weather",
    params(WeatherQuery),
    responses(
        (status = 200, description = "Daily records ordered by station code then date", body = WeatherDayPage),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
#[instrument(skip(state, query))]
async fn list_weather(
    State(state): State<AppState>,
    query: Result<Query<WeatherQuery>, QueryRejection>,
) -> Result<Json<WeatherDayPage>, ApiError> {
    let Query(query) = query.map_err(|e| {
        warn!("Rejected weather query: {}", e);
        ApiError::from(e)
    })?;
    debug!(
        "Listing weather records (station={:?}, date={:?}, limit={:?}, offset={:?})",
        query.station_code, query.date, query.limit, query.offset
    );

    let page = state.query_service.list_weather(&query).await.map_err(|e| {
        error!("Failed to list weather records: {}", e);
        ApiError::from(e)
    })?;

    info!(
        "Retrieved {} of {} weather records",
        page.results.len(),
        page.count
    );
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/weather/stats",
    tag = "weather",
    params(StatsQuery),
    responses(
        (status = 200, description = "Yearly statistics ordered by station code then year", body = WeatherStatsPage),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
#[instrument(skip(state, query))]
async fn list_weather_stats(
    State(state): State<AppState>,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Json<WeatherStatsPage>, ApiError> {
    let Query(query) = query.map_err(|e| {
        warn!("Rejected stats query: {}", e);
        ApiError::from(e)
    })?;
    debug!(
        "Listing yearly stats (station={:?}, year={:?}, limit={:?}, offset={:?})",
        query.station_code, query.year, query.limit, query.offset
    );

    let page = state.query_service.list_stats(&query).await.map_err(|e| {
        error!("Failed to list yearly stats: {}", e);
        ApiError::from(e)
    })?;

    info!(
        "Retrieved {} of {} yearly stats rows",
        page.results.len(),
        page.count
    );
    Ok(Json(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_weather_routes() {
        let spec = generate_openapi_spec();
        let paths: Vec<&String> = spec.paths.paths.keys().collect();
        assert!(paths.contains(&&"/api/weather".to_string()));
        assert!(paths.contains(&&"/api/weather/stats".to_string()));
        assert!(paths.contains(&&"/api/health".to_string()));
    }

    #[test]
    fn test_api_error_status_codes() {
        let response = ApiError::BadRequest("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError::Database(DbError::SqlxError(sqlx::Error::PoolTimedOut)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
