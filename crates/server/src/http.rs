//! HTTP/REST transport (§6): the service's only external interface.

use crate::state::AppState;
use axum::extract::{FromRequest, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::str::FromStr;
use tracing::{error, info, warn};
use tripindex::error::{QueryError, WriterError};
use tripindex_types::bbox::BoundingBox;
use tripindex_types::event::{Event, MalformedEvent};
use tripindex_types::window::Window;

/// `Json<T>` that reports a missing-field or unparseable body as the same
/// `WriterError::Malformed` → 400 path as `Event::validate()` failures,
/// instead of axum's default 422 for deserialization rejections.
struct ValidatedJson<T>(T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = WriterError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| WriterError::Malformed(MalformedEvent::Invalid(rejection.to_string())))?;
        Ok(Self(value))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/trips/", post(ingest_trip))
        .route("/query/trip_count_right_now/", get(trip_count_right_now))
        .route("/query/trip_count_at_time_t/", post(trip_count_at_time_t))
        .route("/query/trips_passed_through/", post(trips_passed_through))
        .route("/query/trips_start_stop/", post(trips_start_stop))
        .route("/healthz", get(healthz))
        .with_state(state)
}

pub async fn run_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for WriterError {
    fn into_response(self) -> Response {
        match &self {
            WriterError::Malformed(e) => {
                warn!(error = %e, "rejected malformed event");
                (StatusCode::BAD_REQUEST, Json(ErrorBody { error: e.to_string() })).into_response()
            }
            WriterError::Store(e) => {
                error!(error = %e, "store failure applying event");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ErrorBody { error: e.to_string() }),
                )
                    .into_response()
            }
        }
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        match &self {
            QueryError::Store(e) => {
                error!(error = %e, "store failure answering query");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ErrorBody { error: e.to_string() }),
                )
                    .into_response()
            }
            _ => (StatusCode::BAD_REQUEST, Json(ErrorBody { error: self.to_string() })).into_response(),
        }
    }
}

async fn ingest_trip(
    State(state): State<AppState>,
    ValidatedJson(event): ValidatedJson<Event>,
) -> Result<StatusCode, WriterError> {
    let arrival_time = Utc::now();
    let gh = state.writer.apply(&event, arrival_time).await?;
    if let Some(touched) = &state.touched_prefixes {
        touched.record(&gh).await;
    }
    Ok(StatusCode::OK)
}

#[derive(Debug, Serialize)]
struct CountResponse {
    count: i64,
}

async fn trip_count_right_now(
    State(state): State<AppState>,
) -> Result<Json<CountResponse>, QueryError> {
    let count = state.planner.current_count().await?;
    Ok(Json(CountResponse { count }))
}

#[derive(Debug, Deserialize)]
struct TimeInstantRequest {
    time_instant: String,
}

async fn trip_count_at_time_t(
    State(state): State<AppState>,
    Json(req): Json<TimeInstantRequest>,
) -> Result<Json<CountResponse>, QueryError> {
    let naive = NaiveDateTime::parse_from_str(&req.time_instant, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| QueryError::InvalidTime(e.to_string()))?;
    let t = Utc.from_utc_datetime(&naive);
    let count = state.planner.count_at_instant(t).await?;
    Ok(Json(CountResponse { count }))
}

#[derive(Debug, Deserialize)]
struct BoundingBoxWindowRequest {
    lat1: f64,
    lng1: f64,
    lat2: f64,
    lng2: f64,
    days_back: String,
}

impl BoundingBoxWindowRequest {
    fn resolve(&self) -> Result<(BoundingBox, Window), QueryError> {
        let bbox = BoundingBox::new(self.lat1, self.lng1, self.lat2, self.lng2)?;
        let window = Window::from_str(&self.days_back)?;
        Ok((bbox, window))
    }
}

async fn trips_passed_through(
    State(state): State<AppState>,
    Json(req): Json<BoundingBoxWindowRequest>,
) -> Result<Json<CountResponse>, QueryError> {
    let (bbox, window) = req.resolve()?;
    let count = state.planner.trips_passed_through(&bbox, window).await?;
    Ok(Json(CountResponse { count }))
}

#[derive(Debug, Serialize)]
struct StartStopFareResponse {
    start_count: i64,
    stop_count: i64,
    fare_sum: f64,
}

async fn trips_start_stop(
    State(state): State<AppState>,
    Json(req): Json<BoundingBoxWindowRequest>,
) -> Result<Json<StartStopFareResponse>, QueryError> {
    let (bbox, window) = req.resolve()?;
    let agg = state.planner.trips_start_stop(&bbox, window).await?;
    Ok(Json(StartStopFareResponse {
        start_count: agg.start_count,
        stop_count: agg.stop_count,
        fare_sum: agg.fare_sum,
    }))
}

async fn healthz() -> &'static str {
    "ok"
}
