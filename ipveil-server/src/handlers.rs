//! Route handlers
//!
//! Input validation happens here: a malformed address is rejected with 400
//! before any probe or provider is contacted. Upstream outages never turn
//! into 5xx; the engine degrades signals and still answers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::Arc;
use uuid::Uuid;

use ipveil_core::VerdictResult;
use ipveil_runtime::{submit_bulk, BulkJob, Detector, HistoryFilter, HistoryPage};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    pub ip: String,
}

#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub ips: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkAccepted {
    pub job_id: Uuid,
}

fn parse_ip(raw: &str) -> Result<IpAddr, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::Validation(format!("invalid IP address: {raw}")))
}

pub async fn detect(
    State(state): State<AppState>,
    Json(request): Json<DetectRequest>,
) -> Result<Json<VerdictResult>, ApiError> {
    let ip = parse_ip(&request.ip)?;
    let verdict = state.engine.detect(ip).await;
    Ok(Json(verdict))
}

pub async fn bulk_submit(
    State(state): State<AppState>,
    Json(request): Json<BulkRequest>,
) -> Result<(StatusCode, Json<BulkAccepted>), ApiError> {
    let ips: Vec<IpAddr> = request
        .ips
        .iter()
        .map(|raw| parse_ip(raw))
        .collect::<Result<_, _>>()?;

    let engine: Arc<dyn Detector> = state.engine.clone();
    let job_id = submit_bulk(state.jobs.clone(), engine, state.sink.clone(), ips)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    Ok((StatusCode::ACCEPTED, Json(BulkAccepted { job_id })))
}

pub async fn bulk_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BulkJob>, ApiError> {
    state
        .jobs
        .get(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no bulk job with id {id}")))
}

pub async fn history(
    State(state): State<AppState>,
    Query(filter): Query<HistoryFilter>,
) -> Result<Json<HistoryPage>, ApiError> {
    let page = state
        .engine
        .history()
        .query(&filter)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(page))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
