pub mod cache;
pub mod health;
pub mod stations;

use axum::{routing::get, Router};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::common::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        stations::list_stations,
        stations::get_day_average,
        stations::get_range_average,
    ),
    components(
        schemas(
            stations::StationSummary,
            crate::averages::SensorAverage,
            crate::averages::AverageWindow,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "stations", description = "Synchronized stations"),
        (name = "averages", description = "Per-sensor averages"),
    ),
    info(
        title = "Weather DB API",
        description = "Per-station weather measurements and averages",
        version = "0.1.0"
    )
)]
struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let concurrency_limit = state.config.api_concurrency_limit;
    tracing::info!(concurrency_limit, "API concurrency limit configured");

    let api_routes = Router::new()
        .route("/stations", get(stations::list_stations))
        .route(
            "/stations/{station_id}/averages/day",
            get(stations::get_day_average),
        )
        .route(
            "/stations/{station_id}/averages/range",
            get(stations::get_range_average),
        )
        .layer(ConcurrencyLimitLayer::new(concurrency_limit));

    // Health check routes (no concurrency limit)
    let health_routes = Router::new().route("/healthz", get(health::healthz));

    // OpenAPI documentation
    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(docs_routes)
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
