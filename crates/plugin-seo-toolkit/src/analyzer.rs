//! Content analysis run on `content:afterCreate`.

use std::sync::Mutex;

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use cmsdash_plugin_sdk::prelude::*;

/// Recommended title length range, in characters.
const TITLE_LENGTH: std::ops::RangeInclusive<usize> = 10..=60;

/// Recommended meta description length range, in characters.
const DESCRIPTION_LENGTH: std::ops::RangeInclusive<usize> = 50..=160;

/// Penalty per issue found.
const ISSUE_PENALTY: u8 = 25;

/// Result of analyzing one content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoReport {
    /// Analyzed content.
    pub content_id: Uuid,
    /// Content type of the analyzed item.
    pub content_type: String,
    /// Score from 0 to 100.
    pub score: u8,
    /// Human-readable problems.
    pub issues: Vec<String>,
}

/// Scores new content for basic on-page SEO.
#[derive(Debug, Default)]
pub struct SeoAnalyzer {
    reports: Mutex<Vec<SeoReport>>,
}

impl SeoAnalyzer {
    /// Creates an analyzer with no reports.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports produced so far, oldest first.
    pub fn reports(&self) -> Vec<SeoReport> {
        self.lock().clone()
    }

    /// Drops all reports.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Scores `data`, the stored fields of a content item.
    pub fn analyze(content_id: Uuid, content_type: &str, data: &Value) -> SeoReport {
        let mut issues = Vec::new();

        match data.get("title").and_then(Value::as_str) {
            None => issues.push("Missing title".to_string()),
            Some(title) if !TITLE_LENGTH.contains(&title.chars().count()) => issues.push(format!(
                "Title should be {}-{} characters",
                TITLE_LENGTH.start(),
                TITLE_LENGTH.end()
            )),
            Some(_) => {}
        }

        match data.get("metaDescription").and_then(Value::as_str) {
            None => issues.push("Missing meta description".to_string()),
            Some(desc) if !DESCRIPTION_LENGTH.contains(&desc.chars().count()) => {
                issues.push(format!(
                    "Meta description should be {}-{} characters",
                    DESCRIPTION_LENGTH.start(),
                    DESCRIPTION_LENGTH.end()
                ))
            }
            Some(_) => {}
        }

        if data.get("slug").and_then(Value::as_str).is_none() {
            issues.push("Missing slug".to_string());
        }

        let penalty = u8::try_from(issues.len())
            .unwrap_or(u8::MAX)
            .saturating_mul(ISSUE_PENALTY);
        SeoReport {
            content_id,
            content_type: content_type.to_string(),
            score: 100u8.saturating_sub(penalty),
            issues,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SeoReport>> {
        self.reports.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EventHandler for SeoAnalyzer {
    fn kind(&self) -> EventKind {
        EventKind::ContentAfterCreate
    }

    fn handle(&self, event: &CmsEvent) -> ListenerResult {
        let CmsEvent::Content(ContentEvent::AfterCreate {
            content_id,
            content_type,
            data,
        }) = event
        else {
            return Ok(());
        };

        let report = Self::analyze(*content_id, content_type, data);
        tracing::debug!(
            content_id = %content_id,
            score = report.score,
            issues = report.issues.len(),
            "Content analyzed"
        );
        self.lock().push(report);
        Ok(())
    }
}
