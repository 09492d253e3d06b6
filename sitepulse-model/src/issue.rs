use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    /// Numeric rank used for "higher severity wins" comparisons.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueCategory {
    Technical,
    OnPage,
    Content,
    Accessibility,
    Performance,
}

impl IssueCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::Technical => "technical",
            IssueCategory::OnPage => "on_page",
            IssueCategory::Content => "content",
            IssueCategory::Accessibility => "accessibility",
            IssueCategory::Performance => "performance",
        }
    }

    pub const ALL: [IssueCategory; 5] = [
        IssueCategory::Technical,
        IssueCategory::OnPage,
        IssueCategory::Content,
        IssueCategory::Accessibility,
        IssueCategory::Performance,
    ];
}

/// One detected defect, produced by an external per-category analyzer.
///
/// The engine deduplicates and scores issues; it never creates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub category: IssueCategory,
    pub severity: Severity,
    pub message: String,
    pub details: Option<String>,
    /// URLs exhibiting the defect. Kept in discovery order, deduplicated.
    pub affected_pages: Vec<String>,
    pub fix_instructions: Option<String>,
}

impl Issue {
    pub fn new(category: IssueCategory, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            category,
            severity,
            message: message.into(),
            details: None,
            affected_pages: Vec::new(),
            fix_instructions: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_affected_pages<I, S>(mut self, pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affected_pages = pages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fix_instructions(mut self, fix: impl Into<String>) -> Self {
        self.fix_instructions = Some(fix.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_rank_ordering() {
        assert!(Severity::High.rank() > Severity::Medium.rank());
        assert!(Severity::Medium.rank() > Severity::Low.rank());
    }

    #[test]
    fn issue_serializes_with_field_names() {
        let issue = Issue::new(IssueCategory::Technical, Severity::High, "Missing title tag")
            .with_affected_pages(["https://example.com/"]);
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["category"], "Technical");
        assert_eq!(json["severity"], "High");
        assert_eq!(json["affected_pages"][0], "https://example.com/");
    }
}
