//! Shared domain enumerations.
//!
//! Every allowed-value set lives here exactly once; filter validation,
//! report ordering, and request validation all reference these definitions.

use serde::{Deserialize, Serialize};

/// Workflow state of a customer enquiry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EnquiryStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl EnquiryStatus {
    /// Wire names, in declared order.
    pub const VALUES: &'static [&'static str] =
        &["pending", "in-progress", "completed", "cancelled"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in-progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Urgency of an enquiry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Wire names, in declared order (least to most urgent).
    pub const VALUES: &'static [&'static str] = &["low", "medium", "high", "urgent"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Severity rank used for report ordering (higher is more urgent).
    pub fn rank(&self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
            Self::Urgent => 3,
        }
    }
}

/// Channel an enquiry arrived through.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EnquirySource {
    #[default]
    Website,
    Phone,
    Email,
    SocialMedia,
    Referral,
    Other,
}

impl EnquirySource {
    /// Wire names, in declared order.
    pub const VALUES: &'static [&'static str] =
        &["website", "phone", "email", "social-media", "referral", "other"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "website" => Some(Self::Website),
            "phone" => Some(Self::Phone),
            "email" => Some(Self::Email),
            "social-media" => Some(Self::SocialMedia),
            "referral" => Some(Self::Referral),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::SocialMedia => "social-media",
            Self::Referral => "referral",
            Self::Other => "other",
        }
    }
}

/// Stock level derived from the stored quantity; never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    InStock,
}

/// Quantity at or below which a product counts as low stock.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

impl StockStatus {
    /// Wire names, in declared order.
    pub const VALUES: &'static [&'static str] = &["out-of-stock", "low-stock", "in-stock"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "out-of-stock" => Some(Self::OutOfStock),
            "low-stock" => Some(Self::LowStock),
            "in-stock" => Some(Self::InStock),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfStock => "out-of-stock",
            Self::LowStock => "low-stock",
            Self::InStock => "in-stock",
        }
    }

    /// Derive the status from a stock quantity.
    pub fn from_stock(stock: i32) -> Self {
        if stock == 0 {
            Self::OutOfStock
        } else if stock <= LOW_STOCK_THRESHOLD {
            Self::LowStock
        } else {
            Self::InStock
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip() {
        for name in EnquiryStatus::VALUES {
            let parsed = EnquiryStatus::parse(name).unwrap();
            assert_eq!(parsed.as_str(), *name);
        }
        assert_eq!(EnquiryStatus::parse("done"), None);
    }

    #[test]
    fn priority_rank_ordering() {
        assert!(Priority::Urgent.rank() > Priority::High.rank());
        assert!(Priority::High.rank() > Priority::Medium.rank());
        assert!(Priority::Medium.rank() > Priority::Low.rank());
    }

    #[test]
    fn source_round_trip() {
        for name in EnquirySource::VALUES {
            let parsed = EnquirySource::parse(name).unwrap();
            assert_eq!(parsed.as_str(), *name);
        }
    }

    #[test]
    fn stock_status_boundaries() {
        assert_eq!(StockStatus::from_stock(0), StockStatus::OutOfStock);
        assert_eq!(StockStatus::from_stock(1), StockStatus::LowStock);
        assert_eq!(StockStatus::from_stock(5), StockStatus::LowStock);
        assert_eq!(StockStatus::from_stock(10), StockStatus::LowStock);
        assert_eq!(StockStatus::from_stock(11), StockStatus::InStock);
    }

    #[test]
    fn kebab_case_serialization() {
        let json = serde_json::to_string(&EnquiryStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let json = serde_json::to_string(&EnquirySource::SocialMedia).unwrap();
        assert_eq!(json, "\"social-media\"");
        let parsed: StockStatus = serde_json::from_str("\"out-of-stock\"").unwrap();
        assert_eq!(parsed, StockStatus::OutOfStock);
    }
}
