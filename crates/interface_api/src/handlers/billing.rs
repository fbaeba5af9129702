//! Billing record handlers

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::RecordKey;
use domain_billing::{AuditLogEntry, ImportSummary, UpdateOutcome};

use crate::auth::{permissions, require_permission, Claims};
use crate::dto::billing::*;
use crate::{error::ApiError, AppState};

fn record_key(dealer_code: &str, gst_invoice_no: &str) -> Result<RecordKey, ApiError> {
    RecordKey::parse(dealer_code, gst_invoice_no).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Searches records by invoice number, vehicle number or invoice date
pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<BillingRecordResponse>>, ApiError> {
    let Query(params) = params?;
    let search = params.into_search().map_err(ApiError::BadRequest)?;
    let records = state.queries.search(&search).await?;
    Ok(Json(records.into_iter().map(BillingRecordResponse::from).collect()))
}

/// Gets one record by dealer code and GST invoice number
pub async fn get_record(
    State(state): State<AppState>,
    Path((dealer_code, gst_invoice_no)): Path<(String, String)>,
) -> Result<Json<BillingRecordResponse>, ApiError> {
    let key = record_key(&dealer_code, &gst_invoice_no)?;
    let record = state.editor.fetch(&key).await?;
    Ok(Json(record.into()))
}

/// Replaces the collection fields of a record
///
/// The caller's username is recorded as the actor of every audit entry.
pub async fn update_collection(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((dealer_code, gst_invoice_no)): Path<(String, String)>,
    payload: Result<Json<UpdateCollectionRequest>, JsonRejection>,
) -> Result<Json<UpdateOutcome>, ApiError> {
    require_permission(&claims, permissions::BILLING_WRITE)?;
    let key = record_key(&dealer_code, &gst_invoice_no)?;
    let Json(request) = payload?;
    let fields = request.into_fields()?;

    let outcome = state.editor.update(&key, fields, &claims.sub).await?;
    Ok(Json(outcome))
}

/// Audit trail of a record, newest first
pub async fn history(
    State(state): State<AppState>,
    Path((dealer_code, gst_invoice_no)): Path<(String, String)>,
) -> Result<Json<Vec<AuditLogEntry>>, ApiError> {
    let key = record_key(&dealer_code, &gst_invoice_no)?;
    Ok(Json(state.editor.history(&key).await?))
}

/// Loads a batch of billing rows
pub async fn import(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ImportSummary>), ApiError> {
    require_permission(&claims, permissions::BILLING_IMPORT)?;
    let Json(request) = payload?;
    request.validate()?;

    let summary = state.queries.import(request.rows, &claims.sub).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}
