//! Data models and validation.

pub mod enquiry;
pub mod product;

pub use enquiry::{CreateEnquiry, Enquiry, UpdateEnquiry};
pub use product::{CreateProduct, Product, UpdateProduct};

use std::sync::LazyLock;

use regex::Regex;

/// Current Unix timestamp in seconds.
pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// http(s) URL check shared by image and attachment validation.
#[allow(clippy::expect_used)]
pub(crate) static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://").expect("url pattern is valid"));
