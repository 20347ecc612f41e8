//! Enquiry model and CRUD operations.
//!
//! Enquiries are hard-deleted. Status, priority, and source are stored as
//! text; the allowed sets live in [`crate::domain`].

use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{URL_RE, now};
use crate::domain::{EnquirySource, EnquiryStatus, Priority};
use crate::query::builder::escape_like_wildcards;
use crate::query::types::{CountBucket, MonthBucket};

const COLUMNS: &str = "id, name, email, phone, address, city, state, pincode, subject, message, \
     status, priority, product_urls, attached_images, notes, assigned_to, follow_up_date, \
     source, created, changed";

#[allow(clippy::expect_used)]
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").expect("email pattern is valid")
});

#[allow(clippy::expect_used)]
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[6-9]\d{9}$").expect("phone pattern is valid"));

#[allow(clippy::expect_used)]
static PINCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9][0-9]{5}$").expect("pincode pattern is valid"));

/// Enquiry record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Enquiry {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    pub name: String,

    pub email: String,

    pub phone: String,

    pub address: Option<String>,

    pub city: String,

    pub state: String,

    pub pincode: String,

    pub subject: Option<String>,

    pub message: Option<String>,

    /// Workflow state; one of [`EnquiryStatus::VALUES`].
    pub status: String,

    /// Urgency; one of [`Priority::VALUES`].
    pub priority: String,

    /// Product page URLs the customer referenced.
    pub product_urls: Vec<String>,

    /// Attached image URLs.
    pub attached_images: Vec<String>,

    pub notes: Option<String>,

    pub assigned_to: Option<String>,

    /// Unix timestamp of the scheduled follow-up, if any.
    pub follow_up_date: Option<i64>,

    /// Channel the enquiry arrived through; one of [`EnquirySource::VALUES`].
    pub source: String,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,
}

/// Input for creating an enquiry.
///
/// Fields are optional so validation can report every problem at once.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEnquiry {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "productUrls")]
    pub product_urls: Option<Vec<String>>,
    #[serde(rename = "attachedImages")]
    pub attached_images: Option<Vec<String>>,
    pub source: Option<String>,
    pub priority: Option<String>,
}

/// Input for updating an enquiry; only provided fields change.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEnquiry {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub notes: Option<String>,
    #[serde(rename = "assignedTo")]
    pub assigned_to: Option<String>,
    /// RFC 3339 instant or YYYY-MM-DD date.
    #[serde(rename = "followUpDate")]
    pub follow_up_date: Option<String>,
}

/// Validate input for a new enquiry, returning field-level messages.
pub fn validate_new(input: &CreateEnquiry) -> Vec<String> {
    let mut errors = Vec::new();

    let name = input.name.as_deref().unwrap_or("").trim();
    if name.is_empty() {
        errors.push("Customer name is required".to_string());
    } else if name.len() > 50 {
        errors.push("Name cannot exceed 50 characters".to_string());
    }

    let email = input.email.as_deref().unwrap_or("").trim();
    if email.is_empty() {
        errors.push("Email is required".to_string());
    } else if !EMAIL_RE.is_match(&email.to_lowercase()) {
        errors.push("Please provide a valid email address".to_string());
    }

    let phone = input.phone.as_deref().unwrap_or("").trim();
    if phone.is_empty() {
        errors.push("Phone number is required".to_string());
    } else if !PHONE_RE.is_match(phone) {
        errors.push("Please provide a valid 10-digit phone number".to_string());
    }

    if input.address.as_deref().unwrap_or("").trim().len() > 200 {
        errors.push("Address cannot exceed 200 characters".to_string());
    }

    if input.city.as_deref().unwrap_or("").trim().is_empty() {
        errors.push("City is required".to_string());
    }

    if input.state.as_deref().unwrap_or("").trim().is_empty() {
        errors.push("State is required".to_string());
    }

    let pincode = input.pincode.as_deref().unwrap_or("").trim();
    if pincode.is_empty() {
        errors.push("Pincode is required".to_string());
    } else if !PINCODE_RE.is_match(pincode) {
        errors.push("Please provide a valid 6-digit pincode".to_string());
    }

    if input.subject.as_deref().unwrap_or("").trim().len() > 100 {
        errors.push("Subject cannot exceed 100 characters".to_string());
    }

    if input.message.as_deref().unwrap_or("").trim().len() > 1000 {
        errors.push("Message cannot exceed 1000 characters".to_string());
    }

    for url in input.product_urls.iter().flatten() {
        if !URL_RE.is_match(url) {
            errors.push("Please provide valid URLs".to_string());
            break;
        }
    }

    for url in input.attached_images.iter().flatten() {
        if !URL_RE.is_match(url) {
            errors.push("Please provide valid image URLs".to_string());
            break;
        }
    }

    if let Some(source) = input.source.as_deref()
        && EnquirySource::parse(source).is_none()
    {
        errors.push(format!(
            "'{source}' is not a valid source (expected one of: {})",
            EnquirySource::VALUES.join(", ")
        ));
    }

    if let Some(priority) = input.priority.as_deref()
        && Priority::parse(priority).is_none()
    {
        errors.push(format!(
            "'{priority}' is not a valid priority (expected one of: {})",
            Priority::VALUES.join(", ")
        ));
    }

    errors
}

/// Validate an update request, returning field-level messages.
pub fn validate_update(input: &UpdateEnquiry) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(status) = input.status.as_deref()
        && EnquiryStatus::parse(status).is_none()
    {
        errors.push(format!(
            "'{status}' is not a valid status (expected one of: {})",
            EnquiryStatus::VALUES.join(", ")
        ));
    }

    if let Some(priority) = input.priority.as_deref()
        && Priority::parse(priority).is_none()
    {
        errors.push(format!(
            "'{priority}' is not a valid priority (expected one of: {})",
            Priority::VALUES.join(", ")
        ));
    }

    if input.notes.as_deref().unwrap_or("").trim().len() > 500 {
        errors.push("Notes cannot exceed 500 characters".to_string());
    }

    if let Some(raw) = input.follow_up_date.as_deref()
        && parse_follow_up(raw).is_none()
    {
        errors.push("Please provide a valid follow-up date".to_string());
    }

    errors
}

/// Parse a follow-up date: RFC 3339 instant or YYYY-MM-DD (midnight UTC).
pub(crate) fn parse_follow_up(raw: &str) -> Option<i64> {
    if let Ok(instant) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(instant.timestamp());
    }
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp())
}

impl Enquiry {
    /// Find an enquiry by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let enquiry = sqlx::query_as::<_, Enquiry>(&format!(
            "SELECT {COLUMNS} FROM enquiry WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch enquiry by id")?;

        Ok(enquiry)
    }

    /// Create a new enquiry. Input must already be validated.
    pub async fn create(pool: &PgPool, input: &CreateEnquiry) -> Result<Self> {
        let id = Uuid::now_v7();
        let now = now();

        sqlx::query(
            r#"
            INSERT INTO enquiry (id, name, email, phone, address, city, state, pincode, subject, message, status, priority, product_urls, attached_images, notes, assigned_to, follow_up_date, source, created, changed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, NULL, NULL, NULL, $15, $16, $17)
            "#,
        )
        .bind(id)
        .bind(input.name.as_deref().unwrap_or("").trim())
        .bind(input.email.as_deref().unwrap_or("").trim().to_lowercase())
        .bind(input.phone.as_deref().unwrap_or("").trim())
        .bind(input.address.as_deref().map(str::trim))
        .bind(input.city.as_deref().unwrap_or("").trim())
        .bind(input.state.as_deref().unwrap_or("").trim())
        .bind(input.pincode.as_deref().unwrap_or("").trim())
        .bind(input.subject.as_deref().map(str::trim))
        .bind(input.message.as_deref().map(str::trim))
        .bind(EnquiryStatus::default().as_str())
        .bind(
            input
                .priority
                .as_deref()
                .and_then(Priority::parse)
                .unwrap_or_default()
                .as_str(),
        )
        .bind(input.product_urls.clone().unwrap_or_default())
        .bind(input.attached_images.clone().unwrap_or_default())
        .bind(
            input
                .source
                .as_deref()
                .and_then(EnquirySource::parse)
                .unwrap_or_default()
                .as_str(),
        )
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("failed to insert enquiry")?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("failed to fetch created enquiry"))
    }

    /// Update an enquiry, merging provided fields over current values.
    pub async fn update(pool: &PgPool, id: Uuid, input: &UpdateEnquiry) -> Result<Option<Self>> {
        let Some(current) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let status = input.status.clone().unwrap_or(current.status);
        let priority = input.priority.clone().unwrap_or(current.priority);
        let notes = input.notes.clone().or(current.notes);
        let assigned_to = input.assigned_to.clone().or(current.assigned_to);
        let follow_up_date = input
            .follow_up_date
            .as_deref()
            .and_then(parse_follow_up)
            .or(current.follow_up_date);

        sqlx::query(
            r#"
            UPDATE enquiry SET
                status = $1,
                priority = $2,
                notes = $3,
                assigned_to = $4,
                follow_up_date = $5,
                changed = $6
            WHERE id = $7
            "#,
        )
        .bind(&status)
        .bind(&priority)
        .bind(&notes)
        .bind(&assigned_to)
        .bind(follow_up_date)
        .bind(now())
        .bind(id)
        .execute(pool)
        .await
        .context("failed to update enquiry")?;

        Self::find_by_id(pool, id).await
    }

    /// Delete an enquiry, returning the removed record.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let enquiry = sqlx::query_as::<_, Enquiry>(&format!(
            "DELETE FROM enquiry WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to delete enquiry")?;

        Ok(enquiry)
    }

    /// Set the status, overwriting notes only when provided.
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: EnquiryStatus,
        notes: Option<&str>,
    ) -> Result<Option<Self>> {
        let enquiry = sqlx::query_as::<_, Enquiry>(&format!(
            r#"
            UPDATE enquiry
            SET status = $1, notes = COALESCE($2, notes), changed = $3
            WHERE id = $4
            RETURNING {COLUMNS}
            "#
        ))
        .bind(status.as_str())
        .bind(notes)
        .bind(now())
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update enquiry status")?;

        Ok(enquiry)
    }

    /// Set the priority.
    pub async fn set_priority(
        pool: &PgPool,
        id: Uuid,
        priority: Priority,
    ) -> Result<Option<Self>> {
        let enquiry = sqlx::query_as::<_, Enquiry>(&format!(
            "UPDATE enquiry SET priority = $1, changed = $2 WHERE id = $3 RETURNING {COLUMNS}"
        ))
        .bind(priority.as_str())
        .bind(now())
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update enquiry priority")?;

        Ok(enquiry)
    }

    /// Mark an enquiry completed; notes are overwritten only when provided.
    pub async fn mark_completed(
        pool: &PgPool,
        id: Uuid,
        notes: Option<&str>,
    ) -> Result<Option<Self>> {
        Self::set_status(pool, id, EnquiryStatus::Completed, notes).await
    }

    /// Pending enquiries, most urgent first, newest within a priority.
    pub async fn pending(pool: &PgPool) -> Result<Vec<Self>> {
        let enquiries = sqlx::query_as::<_, Enquiry>(&format!(
            r#"
            SELECT {COLUMNS} FROM enquiry
            WHERE status = 'pending'
            ORDER BY CASE priority
                WHEN 'urgent' THEN 3
                WHEN 'high' THEN 2
                WHEN 'medium' THEN 1
                ELSE 0
            END DESC, created DESC
            "#
        ))
        .fetch_all(pool)
        .await
        .context("failed to fetch pending enquiries")?;

        Ok(enquiries)
    }

    /// Update the status of every listed enquiry in one statement.
    ///
    /// Returns the number of rows matched (Postgres does not distinguish
    /// matched from modified).
    pub async fn bulk_set_status(
        pool: &PgPool,
        ids: &[Uuid],
        status: EnquiryStatus,
        notes: Option<&str>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE enquiry
            SET status = $1, notes = COALESCE($2, notes), changed = $3
            WHERE id = ANY($4)
            "#,
        )
        .bind(status.as_str())
        .bind(notes)
        .bind(now())
        .bind(ids)
        .execute(pool)
        .await
        .context("failed to bulk-update enquiry status")?;

        Ok(result.rows_affected())
    }

    /// Case-insensitive substring search across contact fields.
    pub async fn term_search(pool: &PgPool, term: &str, limit: i64) -> Result<Vec<Self>> {
        let pattern = format!("%{}%", escape_like_wildcards(term));

        let enquiries = sqlx::query_as::<_, Enquiry>(&format!(
            r#"
            SELECT {COLUMNS} FROM enquiry
            WHERE name ILIKE $1
               OR email ILIKE $1
               OR phone ILIKE $1
               OR subject ILIKE $1
               OR city ILIKE $1
            ORDER BY created DESC, id ASC
            LIMIT $2
            "#
        ))
        .bind(&pattern)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("failed to search enquiries")?;

        Ok(enquiries)
    }

    /// Per-status counts.
    pub async fn status_counts(pool: &PgPool) -> Result<Vec<CountBucket>> {
        let buckets = sqlx::query_as::<_, CountBucket>(
            "SELECT status AS key, COUNT(*) AS count FROM enquiry GROUP BY status",
        )
        .fetch_all(pool)
        .await
        .context("failed to aggregate statuses")?;

        Ok(buckets)
    }

    /// Per-priority counts.
    pub async fn priority_counts(pool: &PgPool) -> Result<Vec<CountBucket>> {
        let buckets = sqlx::query_as::<_, CountBucket>(
            "SELECT priority AS key, COUNT(*) AS count FROM enquiry GROUP BY priority",
        )
        .fetch_all(pool)
        .await
        .context("failed to aggregate priorities")?;

        Ok(buckets)
    }

    /// Per-source counts, most common first.
    pub async fn source_counts(pool: &PgPool) -> Result<Vec<CountBucket>> {
        let buckets = sqlx::query_as::<_, CountBucket>(
            r#"
            SELECT source AS key, COUNT(*) AS count
            FROM enquiry
            GROUP BY source
            ORDER BY count DESC, key ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .context("failed to aggregate sources")?;

        Ok(buckets)
    }

    /// Ten most common cities by enquiry count.
    pub async fn top_cities(pool: &PgPool) -> Result<Vec<CountBucket>> {
        let buckets = sqlx::query_as::<_, CountBucket>(
            r#"
            SELECT city AS key, COUNT(*) AS count
            FROM enquiry
            GROUP BY city
            ORDER BY count DESC, key ASC
            LIMIT 10
            "#,
        )
        .fetch_all(pool)
        .await
        .context("failed to aggregate cities")?;

        Ok(buckets)
    }

    /// Monthly enquiry counts, most recent first, at most twelve buckets.
    pub async fn monthly_counts(pool: &PgPool) -> Result<Vec<MonthBucket>> {
        let buckets = sqlx::query_as::<_, MonthBucket>(
            r#"
            SELECT CAST(EXTRACT(YEAR FROM to_timestamp(created)) AS INT) AS year,
                   CAST(EXTRACT(MONTH FROM to_timestamp(created)) AS INT) AS month,
                   COUNT(*) AS count
            FROM enquiry
            GROUP BY 1, 2
            ORDER BY 1 DESC, 2 DESC
            LIMIT 12
            "#,
        )
        .fetch_all(pool)
        .await
        .context("failed to aggregate monthly counts")?;

        Ok(buckets)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn valid_input() -> CreateEnquiry {
        CreateEnquiry {
            name: Some("Asha Verma".to_string()),
            email: Some("Asha.Verma@Example.com".to_string()),
            phone: Some("9876543210".to_string()),
            address: Some("12 MG Road".to_string()),
            city: Some("Pune".to_string()),
            state: Some("Maharashtra".to_string()),
            pincode: Some("411001".to_string()),
            subject: Some("Bulk order".to_string()),
            message: Some("Looking for 200 units".to_string()),
            product_urls: Some(vec!["https://example.com/p/1".to_string()]),
            attached_images: None,
            source: Some("website".to_string()),
            priority: Some("high".to_string()),
        }
    }

    #[test]
    fn valid_input_passes() {
        assert!(validate_new(&valid_input()).is_empty());
    }

    #[test]
    fn missing_required_fields_collected() {
        let input = CreateEnquiry {
            name: None,
            email: None,
            phone: None,
            address: None,
            city: None,
            state: None,
            pincode: None,
            subject: None,
            message: None,
            product_urls: None,
            attached_images: None,
            source: None,
            priority: None,
        };
        let errors = validate_new(&input);
        assert!(errors.iter().any(|e| e.contains("name is required")));
        assert!(errors.iter().any(|e| e.contains("Email is required")));
        assert!(errors.iter().any(|e| e.contains("Phone number is required")));
        assert!(errors.iter().any(|e| e.contains("City is required")));
        assert!(errors.iter().any(|e| e.contains("State is required")));
        assert!(errors.iter().any(|e| e.contains("Pincode is required")));
    }

    #[test]
    fn email_format_checked() {
        let mut input = valid_input();
        input.email = Some("not-an-email".to_string());
        let errors = validate_new(&input);
        assert!(errors.iter().any(|e| e.contains("valid email address")));
    }

    #[test]
    fn phone_format_checked() {
        let mut input = valid_input();
        input.phone = Some("12345".to_string());
        assert!(
            validate_new(&input)
                .iter()
                .any(|e| e.contains("10-digit phone number"))
        );

        // Must start with 6-9.
        input.phone = Some("1876543210".to_string());
        assert!(!validate_new(&input).is_empty());
    }

    #[test]
    fn pincode_format_checked() {
        let mut input = valid_input();
        input.pincode = Some("011001".to_string());
        assert!(
            validate_new(&input)
                .iter()
                .any(|e| e.contains("6-digit pincode"))
        );
    }

    #[test]
    fn bad_product_url_rejected() {
        let mut input = valid_input();
        input.product_urls = Some(vec!["example.com/p/1".to_string()]);
        assert!(
            validate_new(&input)
                .iter()
                .any(|e| e.contains("valid URLs"))
        );
    }

    #[test]
    fn invalid_enum_values_rejected() {
        let mut input = valid_input();
        input.source = Some("carrier-pigeon".to_string());
        input.priority = Some("asap".to_string());
        let errors = validate_new(&input);
        assert!(errors.iter().any(|e| e.contains("not a valid source")));
        assert!(errors.iter().any(|e| e.contains("not a valid priority")));
    }

    #[test]
    fn update_validation() {
        let input = UpdateEnquiry {
            status: Some("done".to_string()),
            priority: None,
            notes: None,
            assigned_to: None,
            follow_up_date: Some("next tuesday".to_string()),
        };
        let errors = validate_update(&input);
        assert!(errors.iter().any(|e| e.contains("not a valid status")));
        assert!(errors.iter().any(|e| e.contains("valid follow-up date")));
    }

    #[test]
    fn follow_up_date_formats() {
        assert_eq!(parse_follow_up("2024-03-01"), Some(1709251200));
        assert_eq!(
            parse_follow_up("2024-03-15T12:30:00Z"),
            Some(1710505800)
        );
        assert_eq!(parse_follow_up("soon"), None);
    }
}
