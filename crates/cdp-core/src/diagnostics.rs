//! Issues recorded while loading regions.
//!
//! Lenient loading drops invalid regions instead of aborting, and source
//! assembly treats unreadable cells as empty. Both leave an entry here so that
//! nothing disappears silently.
//!
//! ```
//! use cdp_core::Diagnostics;
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning_with_entity("source", "unreadable value 'n/a'", "zip 10001");
//! diag.add_error_with_entity("validation", "population0_5 exceeds population0_12", "region 10002");
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.error_count(), 1);
//! ```

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Recorded, the region was kept
    Warning,
    /// The region was dropped
    Error,
}

/// One recorded problem and the region, facility or ZIP it concerns.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// `"validation"` for dropped regions, `"source"` for CSV cells
    pub category: String,
    pub message: String,
    pub entity: String,
}

impl fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(
            f,
            "[{severity}:{}] {} ({})",
            self.category, self.message, self.entity
        )
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, severity: Severity, category: &str, message: &str, entity: &str) {
        self.issues.push(DiagnosticIssue {
            severity,
            category: category.to_string(),
            message: message.to_string(),
            entity: entity.to_string(),
        });
    }

    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.record(Severity::Warning, category, message, entity);
    }

    pub fn add_error_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.record(Severity::Error, category, message, entity);
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.error_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_display() {
        let mut diag = Diagnostics::new();
        diag.add_error_with_entity("validation", "negative population", "region 14850");
        assert_eq!(
            diag.issues[0].to_string(),
            "[error:validation] negative population (region 14850)"
        );
    }

    #[test]
    fn test_counts_by_severity() {
        let mut diag = Diagnostics::new();
        diag.add_warning_with_entity("source", "unreadable value", "zip 10001");
        diag.add_error_with_entity("validation", "missing population0_5", "region 1");
        diag.add_error_with_entity("validation", "missing employment_rate", "region 2");

        assert_eq!(diag.warning_count(), 1);
        assert_eq!(diag.error_count(), 2);
        let entities: Vec<&str> = diag.errors().map(|i| i.entity.as_str()).collect();
        assert_eq!(entities, vec!["region 1", "region 2"]);
    }
}
