//! Enquiry route handlers.
//!
//! CRUD, workflow mutations, bulk updates, search, statistics, and the CSV
//! export.

use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{PaginationMeta, parse_id};
use crate::error::AppResult;
use crate::models::{CreateEnquiry, Enquiry, UpdateEnquiry};
use crate::services::enquiry::{
    EnquiryExportParams, EnquiryListParams, EnquiryStats,
};
use crate::state::AppState;

/// Paginated enquiry listing.
#[derive(Debug, Serialize)]
pub struct EnquiryListResponse {
    pub enquiries: Vec<Enquiry>,
    pub pagination: PaginationMeta,
}

/// Request for updating the workflow status.
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// Request for updating the priority.
#[derive(Debug, Deserialize)]
pub struct PriorityUpdateRequest {
    pub priority: Option<String>,
}

/// Request for marking an enquiry completed.
#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub notes: Option<String>,
}

/// Request for a bulk status update.
#[derive(Debug, Deserialize)]
pub struct BulkStatusRequest {
    #[serde(rename = "enquiryIds")]
    pub enquiry_ids: Option<Vec<String>>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// Query parameters for term search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub limit: Option<String>,
}

/// Create the enquiry router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/enquiries", get(list_enquiries).post(create_enquiry))
        .route("/api/enquiries/stats/overview", get(stats_overview))
        .route("/api/enquiries/pending/list", get(pending_list))
        .route("/api/enquiries/priority/{priority}", get(by_priority))
        .route("/api/enquiries/search/{term}", get(search_enquiries))
        .route("/api/enquiries/bulk/status", put(bulk_update_status))
        .route("/api/enquiries/export/csv", get(export_csv))
        .route(
            "/api/enquiries/{id}",
            get(get_enquiry).put(update_enquiry).delete(delete_enquiry),
        )
        .route("/api/enquiries/{id}/status", put(update_status))
        .route("/api/enquiries/{id}/priority", put(update_priority))
        .route("/api/enquiries/{id}/complete", post(complete_enquiry))
}

/// List enquiries with filtering, search, and pagination.
///
/// GET /api/enquiries?search=&status=&priority=&city=&state=&source=&dateFrom=&dateTo=&page=&limit=&sortBy=&sortOrder=
async fn list_enquiries(
    State(state): State<AppState>,
    Query(params): Query<EnquiryListParams>,
) -> AppResult<Json<EnquiryListResponse>> {
    let page = state.enquiries().list(&params).await?;
    let pagination = PaginationMeta::from(&page);

    Ok(Json(EnquiryListResponse {
        enquiries: page.items,
        pagination,
    }))
}

/// Get a single enquiry.
async fn get_enquiry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Enquiry>> {
    let enquiry = state.enquiries().get(parse_id(&id)?).await?;
    Ok(Json(enquiry))
}

/// Create a new enquiry.
async fn create_enquiry(
    State(state): State<AppState>,
    Json(request): Json<CreateEnquiry>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let enquiry = state.enquiries().create(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Enquiry created successfully",
            "enquiry": enquiry,
        })),
    ))
}

/// Update an enquiry; only provided fields change.
async fn update_enquiry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateEnquiry>,
) -> AppResult<Json<serde_json::Value>> {
    let enquiry = state.enquiries().update(parse_id(&id)?, &request).await?;

    Ok(Json(json!({
        "message": "Enquiry updated successfully",
        "enquiry": enquiry,
    })))
}

/// Delete an enquiry.
async fn delete_enquiry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let enquiry = state.enquiries().delete(parse_id(&id)?).await?;

    Ok(Json(json!({
        "message": "Enquiry deleted successfully",
        "enquiry": enquiry,
    })))
}

/// Update the workflow status, with optional notes.
async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let enquiry = state
        .enquiries()
        .set_status(
            parse_id(&id)?,
            request.status.as_deref(),
            request.notes.as_deref(),
        )
        .await?;

    Ok(Json(json!({
        "message": "Status updated successfully",
        "enquiry": enquiry,
    })))
}

/// Update the priority.
async fn update_priority(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PriorityUpdateRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let enquiry = state
        .enquiries()
        .set_priority(parse_id(&id)?, request.priority.as_deref())
        .await?;

    Ok(Json(json!({
        "message": "Priority updated successfully",
        "enquiry": enquiry,
    })))
}

/// Mark an enquiry completed; notes are overwritten only when provided.
async fn complete_enquiry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Option<Json<CompleteRequest>>,
) -> AppResult<Json<serde_json::Value>> {
    let notes = request.as_ref().and_then(|r| r.notes.clone());
    let enquiry = state
        .enquiries()
        .complete(parse_id(&id)?, notes.as_deref())
        .await?;

    Ok(Json(json!({
        "message": "Enquiry marked as completed",
        "enquiry": enquiry,
    })))
}

/// Pending enquiries, most urgent first.
async fn pending_list(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let enquiries = state.enquiries().pending().await?;

    Ok(Json(json!({
        "message": "Pending enquiries fetched successfully",
        "count": enquiries.len(),
        "enquiries": enquiries,
    })))
}

/// Non-completed enquiries of one priority.
async fn by_priority(
    State(state): State<AppState>,
    Path(priority): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let enquiries = state.enquiries().by_priority(&priority).await?;

    Ok(Json(json!({
        "message": format!("{priority} priority enquiries fetched successfully"),
        "count": enquiries.len(),
        "enquiries": enquiries,
    })))
}

/// Statistics report set.
async fn stats_overview(State(state): State<AppState>) -> AppResult<Json<EnquiryStats>> {
    let stats = state.enquiries().stats().await?;
    Ok(Json(stats))
}

/// Case-insensitive substring search across contact fields.
async fn search_enquiries(
    State(state): State<AppState>,
    Path(term): Path<String>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let enquiries = state
        .enquiries()
        .search(&term, query.limit.as_deref())
        .await?;

    Ok(Json(json!({
        "message": "Search completed successfully",
        "count": enquiries.len(),
        "enquiries": enquiries,
        "searchTerm": term,
    })))
}

/// Update the status of a batch of enquiries.
async fn bulk_update_status(
    State(state): State<AppState>,
    Json(request): Json<BulkStatusRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let ids = request
        .enquiry_ids
        .unwrap_or_default()
        .iter()
        .map(|raw| parse_id(raw))
        .collect::<AppResult<Vec<Uuid>>>()?;

    let outcome = state
        .enquiries()
        .bulk_set_status(&ids, request.status.as_deref(), request.notes.as_deref())
        .await?;

    Ok(Json(json!({
        "message": format!("{} enquiries updated successfully", outcome.modified_count),
        "modifiedCount": outcome.modified_count,
        "matchedCount": outcome.matched_count,
    })))
}

/// Export enquiries as CSV.
async fn export_csv(
    State(state): State<AppState>,
    Query(params): Query<EnquiryExportParams>,
) -> AppResult<impl IntoResponse> {
    let enquiries = state.enquiries().export(&params).await?;

    let mut csv = String::from("Name,Email,Phone,City,State,Status,Priority,Created Date\n");
    for enquiry in &enquiries {
        let created = chrono::DateTime::from_timestamp(enquiry.created, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();
        csv.push_str(&format!(
            "\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\"\n",
            csv_field(&enquiry.name),
            csv_field(&enquiry.email),
            csv_field(&enquiry.phone),
            csv_field(&enquiry.city),
            csv_field(&enquiry.state),
            csv_field(&enquiry.status),
            csv_field(&enquiry.priority),
            created,
        ));
    }

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=enquiries.csv",
            ),
        ],
        csv,
    ))
}

/// Escape embedded quotes for a double-quoted CSV field.
fn csv_field(value: &str) -> String {
    value.replace('"', "\"\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_field_escapes_quotes() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("say \"hi\""), "say \"\"hi\"\"");
    }
}
