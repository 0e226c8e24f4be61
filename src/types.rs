//! Resolved title records and typed per-item outcomes

use serde::Serialize;
use std::fmt;

/// A catalog identifier resolved to its display title and gallery page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTitle {
    pub code: String,
    pub detail_url: String,
    pub gallery_url: String,
    /// Alphanumeric only; doubles as file stem and grouping key.
    /// Distinct titles may sanitize to the same value.
    pub title: String,
}

/// Why a single identifier, gallery or image produced nothing
#[derive(Debug, thiserror::Error)]
pub enum SkipReason {
    #[error("failed to fetch {url}: {source:#}")]
    Fetch {
        url: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("no <title> element found")]
    MissingTitle,
    #[error("no mediaviewer link found")]
    MissingGallery,
    #[error("title {0:?} has no alphanumeric characters")]
    EmptyTitle(String),
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to write {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// A skipped item paired with the reason it was skipped
#[derive(Debug)]
pub struct Skipped {
    /// Identifier, gallery URL or image URL that was skipped
    pub item: String,
    pub reason: SkipReason,
}

impl Skipped {
    pub fn new(item: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            item: item.into(),
            reason,
        }
    }
}

impl fmt::Display for Skipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.item, self.reason)
    }
}

/// Print the skip list collected by a phase
pub fn report_skips(phase: &str, skipped: &[Skipped]) {
    if skipped.is_empty() {
        return;
    }
    eprintln!("{} skipped {} item(s):", phase, skipped.len());
    for skip in skipped {
        eprintln!("  {}", skip);
    }
}
