//! REST API for the routing engine
//!
//! Endpoints:
//! - `GET  /health` — liveness probe
//! - `GET  /api/route` — dual-mode route between two intersections
//! - `GET  /api/route/nearest` — snap a coordinate to its intersection
//! - `GET  /api/route/intersections` — all nodes, for map rendering
//! - `GET  /api/route/streets` — all edges with current danger scores
//! - `POST /api/incidents` — apply a structured (already parsed) incident
//! - `GET  /api/incidents` — recent incidents, newest first
//! - `POST /api/incidents/{id}/resolve` — flip an incident's resolved flag

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    error_handling::HandleErrorLayer,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use safewalk_core::model::{CityGraph, GraphStore, Intersection, Street};
use safewalk_core::risk::{DangerPolicy, Incident, IncidentReport, RiskUpdater};
use safewalk_core::routing::{RouteMode, plan_route};
use safewalk_core::spatial::SpatialIndex;
use safewalk_core::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared application state: the graph store, its spatial index, and the
/// incident pipeline.
pub struct AppState {
    pub store: Arc<GraphStore>,
    pub index: SpatialIndex,
    pub updater: RiskUpdater,
}

impl AppState {
    pub fn new(graph: CityGraph, policy: DangerPolicy) -> Self {
        let index = SpatialIndex::build(&graph);
        let store = Arc::new(GraphStore::new(graph));
        let updater = RiskUpdater::new(Arc::clone(&store), policy);
        Self {
            store,
            index,
            updater,
        }
    }
}

/// Creates the API router with tracing, CORS, and a request timeout.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/route", get(get_route))
        .route("/api/route/nearest", get(nearest_intersection))
        .route("/api/route/intersections", get(list_intersections))
        .route("/api/route/streets", get(list_streets))
        .route("/api/incidents", post(report_incident).get(list_incidents))
        .route("/api/incidents/{id}/resolve", post(resolve_incident))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(REQUEST_TIMEOUT),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn handle_middleware_error(err: tower::BoxError) -> (StatusCode, String) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "request timed out".to_string())
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("internal error: {err}"),
        )
    }
}

// ── Error mapping ─────────────────────────────────────────────────────────

/// Core error wrapper mapping the typed failure taxonomy onto HTTP statuses.
/// `Unreachable` is surfaced distinctly (422) so a caller can retry without
/// the ADA constraint.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            Error::NodeNotFound(_) | Error::StreetNotFound(_) => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            Error::Unreachable { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "unreachable"),
            Error::EmptyGraph => (StatusCode::SERVICE_UNAVAILABLE, "empty_graph"),
            Error::InvalidData(_) | Error::JsonError(_) => (StatusCode::BAD_REQUEST, "invalid_data"),
            Error::IoError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
        };
        let body = Json(json!({ "error": kind, "detail": self.0.to_string() }));
        (status, body).into_response()
    }
}

// ── Wire types ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    pub start: String,
    pub end: String,
    #[serde(default = "default_mode")]
    pub mode: RouteMode,
    #[serde(default)]
    pub ada_required: bool,
    /// `geojson` returns the route as a Feature for direct map rendering
    #[serde(default)]
    pub format: Option<String>,
}

fn default_mode() -> RouteMode {
    RouteMode::Safest
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub path: Vec<String>,
    pub coordinates: Vec<[f64; 2]>,
    pub total_cost: f64,
    pub mode: RouteMode,
    pub ada_required: bool,
    pub hazards_bypassed: usize,
}

#[derive(Debug, Deserialize)]
pub struct NearestQuery {
    pub lng: f64,
    pub lat: f64,
}

#[derive(Debug, Serialize)]
pub struct IntersectionDto {
    pub id: String,
    pub name: String,
    /// `[longitude, latitude]`
    pub location: [f64; 2],
    pub tags: Vec<String>,
}

impl From<&Intersection> for IntersectionDto {
    fn from(node: &Intersection) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            location: [node.geometry.x(), node.geometry.y()],
            tags: node.tags.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StreetDto {
    pub id: String,
    pub name: String,
    pub start_intersection_id: String,
    pub end_intersection_id: String,
    pub geometry: Vec<[f64; 2]>,
    pub distance_m: f64,
    pub danger_score: f64,
    pub is_accessible: bool,
}

impl From<&Street> for StreetDto {
    fn from(street: &Street) -> Self {
        Self {
            id: street.id.clone(),
            name: street.name.clone(),
            start_intersection_id: street.start.clone(),
            end_intersection_id: street.end.clone(),
            geometry: street.geometry.coords().map(|c| [c.x, c.y]).collect(),
            distance_m: street.distance_m,
            danger_score: street.danger_score,
            is_accessible: street.is_accessible,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IncidentListQuery {
    #[serde(default = "default_incident_limit")]
    pub limit: usize,
}

fn default_incident_limit() -> usize {
    50
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "safewalk",
        "time": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Compute the optimal pedestrian route between two intersections.
async fn get_route(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RouteQuery>,
) -> Result<Response, ApiError> {
    let snapshot = state.store.snapshot();
    let route = plan_route(
        &snapshot,
        &query.start,
        &query.end,
        query.mode,
        query.ada_required,
    )?;

    if query.format.as_deref() == Some("geojson") {
        return Ok(Json(route.to_geojson()).into_response());
    }

    Ok(Json(RouteResponse {
        coordinates: route.coordinates(),
        path: route.path,
        total_cost: route.total_cost,
        mode: route.mode,
        ada_required: route.ada_required,
        hazards_bypassed: route.hazards_bypassed,
    })
    .into_response())
}

/// Find the intersection closest to a coordinate pair.
async fn nearest_intersection(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearestQuery>,
) -> Result<Json<IntersectionDto>, ApiError> {
    let node_id = state.index.nearest(query.lng, query.lat)?;
    let snapshot = state.store.snapshot();
    let node = snapshot.node(&node_id)?;
    Ok(Json(IntersectionDto::from(node)))
}

/// All intersections (graph nodes) for map rendering.
async fn list_intersections(State(state): State<Arc<AppState>>) -> Json<Vec<IntersectionDto>> {
    let snapshot = state.store.snapshot();
    Json(snapshot.intersections().map(IntersectionDto::from).collect())
}

/// All streets (graph edges) with current danger scores.
async fn list_streets(State(state): State<Arc<AppState>>) -> Json<Vec<StreetDto>> {
    let snapshot = state.store.snapshot();
    Json(snapshot.streets().map(StreetDto::from).collect())
}

/// Apply a structured incident delivered by the parsing collaborator.
async fn report_incident(
    State(state): State<Arc<AppState>>,
    Json(report): Json<IncidentReport>,
) -> Result<(StatusCode, Json<Incident>), ApiError> {
    if report.raw_text.trim().len() < 5 {
        return Err(ApiError(Error::InvalidData(
            "incident raw_text must be at least 5 characters".to_string(),
        )));
    }
    let incident = state.updater.apply_incident(report);
    Ok((StatusCode::CREATED, Json(incident)))
}

/// Most recent incidents, newest first.
async fn list_incidents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IncidentListQuery>,
) -> Json<Vec<Incident>> {
    Json(state.updater.recent_incidents(query.limit))
}

/// Flip an incident's display-only resolved flag.
async fn resolve_incident(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> StatusCode {
    if state.updater.resolve_incident(&id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
