pub mod ledger;
pub mod queries;
pub mod record;


use serde::Serialize;

/// Urgency band for a contract still inside its grace period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeadlineSeverity {
    Critical,
    Warning,
    Normal,
}

impl DeadlineSeverity {
    /// A week or less left (including already overdue) is critical, two
    /// weeks or less is a warning, anything further out is normal.
    pub fn classify(days_remaining: i64) -> DeadlineSeverity {
        if days_remaining <= 7 {
            DeadlineSeverity::Critical
        } else if days_remaining <= 14 {
            DeadlineSeverity::Warning
        } else {
            DeadlineSeverity::Normal
        }
    }
}
