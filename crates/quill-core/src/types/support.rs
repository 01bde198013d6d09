use crate::ids::TicketId;
use serde::{Deserialize, Serialize};

/// Lifecycle of a support ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    Pending,
    Resolved,
    Closed,
}

impl TicketStatus {
    /// Parse a server status label, case-insensitively. Unknown labels map to `Open`.
    pub fn parse_lenient(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "pending" | "waiting" => Self::Pending,
            "resolved" | "solved" => Self::Resolved,
            "closed" => Self::Closed,
            _ => Self::Open,
        }
    }
}

/// Support ticket submitted from the embedded help widget
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub subject: String,
    pub body: String,
    pub status: TicketStatus,
    pub created_at: String,
}
