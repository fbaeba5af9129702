//! Report handlers

use axum::{
    extract::rejection::QueryRejection,
    extract::{Query, State},
    Json,
};

use domain_billing::{DailySummary, OutstandingEntry};

use crate::dto::reports::{DailySummaryParams, OutstandingParams};
use crate::{error::ApiError, AppState};

/// Customer outstanding report
pub async fn outstanding(
    State(state): State<AppState>,
    params: Result<Query<OutstandingParams>, QueryRejection>,
) -> Result<Json<Vec<OutstandingEntry>>, ApiError> {
    let Query(params) = params?;
    let filter = params.into_filter()?;
    Ok(Json(state.queries.outstanding(&filter).await?))
}

/// Vehicles serviced and labour billed on one invoice date
pub async fn daily_summary(
    State(state): State<AppState>,
    params: Result<Query<DailySummaryParams>, QueryRejection>,
) -> Result<Json<DailySummary>, ApiError> {
    let Query(params) = params?;
    Ok(Json(state.queries.daily_summary(params.date).await?))
}
