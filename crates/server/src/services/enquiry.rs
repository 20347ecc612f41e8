//! Enquiry service.
//!
//! Engine facade for the enquiry pipeline: listing with the full filter
//! schema, workflow mutations, bulk updates, search, CSV export data, and
//! the statistics report set.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::domain::{EnquirySource, EnquiryStatus, Priority};
use crate::error::{AppError, AppResult};
use crate::models::enquiry::{self, CreateEnquiry, Enquiry, UpdateEnquiry};
use crate::query::QueryError;
use crate::query::builder::SelectBuilder;
use crate::query::executor;
use crate::query::filter::FilterSet;
use crate::query::sort::SortableSet;
use crate::query::types::{
    CountBucket, MonthBucket, Page, PageWindow, SortDirection, SortSpec,
};

const TABLE: &str = "enquiry";

/// Fields enquiries may be sorted by; first entry is the default.
const SORTABLE: SortableSet = SortableSet {
    fields: &[
        ("createdAt", "created"),
        ("updatedAt", "changed"),
        ("name", "name"),
        ("email", "email"),
        ("city", "city"),
        ("state", "state"),
        ("status", "status"),
        ("priority", "priority"),
    ],
};

/// Default ordering for fixed reports and exports.
const CREATED_DESC: SortSpec = SortSpec {
    column: "created",
    direction: SortDirection::Desc,
};

/// Raw listing parameters, names preserved from the public API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnquiryListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub source: Option<String>,
    #[serde(rename = "dateFrom")]
    pub date_from: Option<String>,
    #[serde(rename = "dateTo")]
    pub date_to: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
}

/// Raw CSV export parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnquiryExportParams {
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(rename = "dateFrom")]
    pub date_from: Option<String>,
    #[serde(rename = "dateTo")]
    pub date_to: Option<String>,
}

/// Headline counts for the stats report.
#[derive(Debug, Clone, Serialize)]
pub struct EnquiryOverview {
    #[serde(rename = "totalEnquiries")]
    pub total_enquiries: i64,
    #[serde(rename = "pendingCount")]
    pub pending_count: i64,
    #[serde(rename = "inProgressCount")]
    pub in_progress_count: i64,
    #[serde(rename = "completedCount")]
    pub completed_count: i64,
    #[serde(rename = "cancelledCount")]
    pub cancelled_count: i64,
}

/// Enquiry statistics report set.
#[derive(Debug, Clone, Serialize)]
pub struct EnquiryStats {
    pub overview: EnquiryOverview,
    #[serde(rename = "priorityStats")]
    pub priority_stats: Vec<CountBucket>,
    #[serde(rename = "cityStats")]
    pub city_stats: Vec<CountBucket>,
    #[serde(rename = "monthlyStats")]
    pub monthly_stats: Vec<MonthBucket>,
    #[serde(rename = "sourceStats")]
    pub source_stats: Vec<CountBucket>,
}

/// Outcome of a bulk status update.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BulkStatusOutcome {
    #[serde(rename = "matchedCount")]
    pub matched_count: u64,
    #[serde(rename = "modifiedCount")]
    pub modified_count: u64,
}

/// Service for enquiry operations.
#[derive(Clone)]
pub struct EnquiryService {
    pool: PgPool,
    query_timeout: u64,
}

impl EnquiryService {
    pub fn new(pool: PgPool, query_timeout: u64) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    /// List enquiries matching the given parameters.
    pub async fn list(&self, params: &EnquiryListParams) -> AppResult<Page<Enquiry>> {
        let window = PageWindow::resolve(params.page.as_deref(), params.limit.as_deref())?;
        let sort = SORTABLE.resolve(params.sort_by.as_deref(), params.sort_order.as_deref())?;
        let filters = Self::build_filters(params)?;

        let builder = SelectBuilder::new(TABLE, filters, sort);
        let page = executor::fetch_page(&self.pool, &builder, window, self.query_timeout).await?;

        Ok(page)
    }

    /// Translate listing parameters into the enquiry filter predicate.
    fn build_filters(params: &EnquiryListParams) -> Result<FilterSet, QueryError> {
        let mut filters = FilterSet::new();
        filters.full_text(params.search.as_deref());
        filters.enumerated("status", params.status.as_deref(), EnquiryStatus::VALUES)?;
        filters.enumerated("priority", params.priority.as_deref(), Priority::VALUES)?;
        filters.contains("city", params.city.as_deref());
        filters.contains("state", params.state.as_deref());
        filters.enumerated("source", params.source.as_deref(), EnquirySource::VALUES)?;
        filters.date_range(
            "created",
            params.date_from.as_deref(),
            params.date_to.as_deref(),
        )?;
        Ok(filters)
    }

    /// Fetch one enquiry.
    pub async fn get(&self, id: Uuid) -> AppResult<Enquiry> {
        Enquiry::find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Create an enquiry from validated input.
    pub async fn create(&self, input: &CreateEnquiry) -> AppResult<Enquiry> {
        let errors = enquiry::validate_new(input);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let created = Enquiry::create(&self.pool, input).await?;
        info!(
            enquiry_id = %created.id,
            source = %created.source,
            priority = %created.priority,
            "enquiry created"
        );
        Ok(created)
    }

    /// Partially update an enquiry; only provided fields change.
    pub async fn update(&self, id: Uuid, input: &UpdateEnquiry) -> AppResult<Enquiry> {
        let errors = enquiry::validate_update(input);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let updated = Enquiry::update(&self.pool, id, input)
            .await?
            .ok_or(AppError::NotFound)?;
        info!(enquiry_id = %updated.id, "enquiry updated");
        Ok(updated)
    }

    /// Hard-delete an enquiry, returning the removed record.
    pub async fn delete(&self, id: Uuid) -> AppResult<Enquiry> {
        let deleted = Enquiry::delete(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound)?;
        info!(enquiry_id = %deleted.id, "enquiry deleted");
        Ok(deleted)
    }

    /// Set the workflow status, with optional notes.
    pub async fn set_status(
        &self,
        id: Uuid,
        status: Option<&str>,
        notes: Option<&str>,
    ) -> AppResult<Enquiry> {
        let status = status.and_then(EnquiryStatus::parse).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Valid status is required ({})",
                EnquiryStatus::VALUES.join(", ")
            ))
        })?;

        let updated = Enquiry::set_status(&self.pool, id, status, notes)
            .await?
            .ok_or(AppError::NotFound)?;
        info!(enquiry_id = %updated.id, status = %updated.status, "enquiry status updated");
        Ok(updated)
    }

    /// Set the priority.
    pub async fn set_priority(&self, id: Uuid, priority: Option<&str>) -> AppResult<Enquiry> {
        let priority = priority.and_then(Priority::parse).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Valid priority is required ({})",
                Priority::VALUES.join(", ")
            ))
        })?;

        let updated = Enquiry::set_priority(&self.pool, id, priority)
            .await?
            .ok_or(AppError::NotFound)?;
        info!(enquiry_id = %updated.id, priority = %updated.priority, "enquiry priority updated");
        Ok(updated)
    }

    /// Mark an enquiry completed; notes are overwritten only when provided.
    pub async fn complete(&self, id: Uuid, notes: Option<&str>) -> AppResult<Enquiry> {
        let updated = Enquiry::mark_completed(&self.pool, id, notes)
            .await?
            .ok_or(AppError::NotFound)?;
        info!(enquiry_id = %updated.id, "enquiry completed");
        Ok(updated)
    }

    /// Pending enquiries, most urgent first.
    pub async fn pending(&self) -> AppResult<Vec<Enquiry>> {
        Ok(Enquiry::pending(&self.pool).await?)
    }

    /// Non-completed enquiries of one priority, newest first.
    pub async fn by_priority(&self, priority: &str) -> AppResult<Vec<Enquiry>> {
        let priority = Priority::parse(priority)
            .ok_or_else(|| AppError::BadRequest("Invalid priority level".to_string()))?;

        let mut filters = FilterSet::new();
        filters.equals_str("priority", priority.as_str());
        filters.not_equals_str("status", EnquiryStatus::Completed.as_str());

        let builder = SelectBuilder::new(TABLE, filters, CREATED_DESC);
        let enquiries = executor::fetch_all(&self.pool, &builder, self.query_timeout).await?;

        Ok(enquiries)
    }

    /// Case-insensitive substring search across contact fields.
    pub async fn search(&self, term: &str, limit: Option<&str>) -> AppResult<Vec<Enquiry>> {
        // Reuse the pagination rules for the limit: strict parse, capped.
        let window = PageWindow::resolve(None, limit)?;
        Ok(Enquiry::term_search(&self.pool, term, i64::from(window.limit)).await?)
    }

    /// Update the status of a batch of enquiries.
    pub async fn bulk_set_status(
        &self,
        ids: &[Uuid],
        status: Option<&str>,
        notes: Option<&str>,
    ) -> AppResult<BulkStatusOutcome> {
        if ids.is_empty() {
            return Err(AppError::BadRequest(
                "Valid enquiry IDs array is required".to_string(),
            ));
        }

        let status = status.and_then(EnquiryStatus::parse).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Valid status is required ({})",
                EnquiryStatus::VALUES.join(", ")
            ))
        })?;

        let affected = Enquiry::bulk_set_status(&self.pool, ids, status, notes).await?;
        info!(count = affected, status = status.as_str(), "bulk status update");

        Ok(BulkStatusOutcome {
            matched_count: affected,
            modified_count: affected,
        })
    }

    /// Rows for the CSV export, newest first.
    pub async fn export(&self, params: &EnquiryExportParams) -> AppResult<Vec<Enquiry>> {
        let mut filters = FilterSet::new();
        filters.enumerated("status", params.status.as_deref(), EnquiryStatus::VALUES)?;
        filters.enumerated("priority", params.priority.as_deref(), Priority::VALUES)?;
        filters.date_range(
            "created",
            params.date_from.as_deref(),
            params.date_to.as_deref(),
        )?;

        let builder = SelectBuilder::new(TABLE, filters, CREATED_DESC);
        let enquiries = executor::fetch_all(&self.pool, &builder, self.query_timeout).await?;

        Ok(enquiries)
    }

    /// Statistics report set.
    ///
    /// Each report is an independent read; no cross-report snapshot is
    /// claimed.
    pub async fn stats(&self) -> AppResult<EnquiryStats> {
        let status_counts = Enquiry::status_counts(&self.pool).await?;
        let mut priority_stats = Enquiry::priority_counts(&self.pool).await?;
        let city_stats = Enquiry::top_cities(&self.pool).await?;
        let monthly_stats = Enquiry::monthly_counts(&self.pool).await?;
        let source_stats = Enquiry::source_counts(&self.pool).await?;

        // Present priorities in declared order, not storage order.
        priority_stats.sort_by_key(|bucket| {
            Priority::parse(&bucket.key).map_or(u8::MAX, |p| p.rank())
        });

        Ok(EnquiryStats {
            overview: overview_from_counts(&status_counts),
            priority_stats,
            city_stats,
            monthly_stats,
            source_stats,
        })
    }
}

/// Derive the headline counts from the status breakdown.
fn overview_from_counts(counts: &[CountBucket]) -> EnquiryOverview {
    let count_for = |status: EnquiryStatus| {
        counts
            .iter()
            .find(|bucket| bucket.key == status.as_str())
            .map_or(0, |bucket| bucket.count)
    };

    EnquiryOverview {
        total_enquiries: counts.iter().map(|bucket| bucket.count).sum(),
        pending_count: count_for(EnquiryStatus::Pending),
        in_progress_count: count_for(EnquiryStatus::InProgress),
        completed_count: count_for(EnquiryStatus::Completed),
        cancelled_count: count_for(EnquiryStatus::Cancelled),
    }
}
