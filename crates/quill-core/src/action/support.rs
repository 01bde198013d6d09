use super::ActionKind;
use crate::ids::CorrelationId;
use crate::types::{Failure, Ticket};
use serde::{Deserialize, Serialize};

/// Requests forwarded from the embedded support widget, and their outcomes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SupportAction {
    TicketSubmitRequest {
        correlation: CorrelationId,
        subject: String,
        body: String,
    },
    TicketSubmitSuccess {
        correlation: CorrelationId,
        ticket: Ticket,
    },
    TicketSubmitFail {
        correlation: CorrelationId,
        failure: Failure,
    },
    HistoryRequest {
        correlation: CorrelationId,
    },
    HistorySuccess {
        correlation: CorrelationId,
        tickets: Vec<Ticket>,
    },
    HistoryFail {
        correlation: CorrelationId,
        failure: Failure,
    },
}

impl SupportAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::TicketSubmitRequest { .. } => ActionKind::TicketSubmitRequest,
            Self::TicketSubmitSuccess { .. } => ActionKind::TicketSubmitSuccess,
            Self::TicketSubmitFail { .. } => ActionKind::TicketSubmitFail,
            Self::HistoryRequest { .. } => ActionKind::TicketHistoryRequest,
            Self::HistorySuccess { .. } => ActionKind::TicketHistorySuccess,
            Self::HistoryFail { .. } => ActionKind::TicketHistoryFail,
        }
    }

    pub fn correlation(&self) -> CorrelationId {
        match self {
            Self::TicketSubmitRequest { correlation, .. }
            | Self::TicketSubmitSuccess { correlation, .. }
            | Self::TicketSubmitFail { correlation, .. }
            | Self::HistoryRequest { correlation }
            | Self::HistorySuccess { correlation, .. }
            | Self::HistoryFail { correlation, .. } => *correlation,
        }
    }
}
