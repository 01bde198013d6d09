//! Support ticket workflows, driven by the embedded help widget.

use super::{Operation, WorkflowContext};
use quill_core::effects::{HttpMethod, HttpRequest};
use quill_core::ids::CorrelationId;
use quill_core::SupportAction;
use serde_json::json;
use std::sync::Arc;

const TICKETS_PATH: &str = "/support/tickets";

pub(super) fn submit(ctx: &Arc<WorkflowContext>, correlation: CorrelationId, subject: String, body: String) {
    ctx.run(|ctx| async move {
        let request = HttpRequest::json(
            HttpMethod::Post,
            TICKETS_PATH,
            json!({ "subject": subject.trim(), "body": body }),
        );
        match Operation::SubmitTicket.entity(ctx.call(request).await) {
            Ok(body) => {
                let ticket = ctx.normalize.ticket(&body);
                tracing::info!(ticket_id = %ticket.id, "Support ticket submitted");
                ctx.emit(SupportAction::TicketSubmitSuccess { correlation, ticket });
            }
            Err(failure) => ctx.emit_failure(
                &failure,
                SupportAction::TicketSubmitFail { correlation, failure: failure.clone() },
            ),
        }
    });
}

pub(super) fn history(ctx: &Arc<WorkflowContext>, correlation: CorrelationId) {
    ctx.run(|ctx| async move {
        match Operation::LoadTickets.list(ctx.call(HttpRequest::get(TICKETS_PATH)).await) {
            Ok(body) => {
                let tickets = ctx.normalize.tickets(body.as_ref());
                ctx.emit(SupportAction::HistorySuccess { correlation, tickets });
            }
            Err(failure) => ctx.emit_failure(
                &failure,
                SupportAction::HistoryFail { correlation, failure: failure.clone() },
            ),
        }
    });
}
