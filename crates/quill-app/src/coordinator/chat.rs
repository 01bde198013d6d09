//! Room list and message history workflows. Live traffic goes through the
//! realtime bridge, not here.

use super::{Operation, WorkflowContext};
use quill_core::effects::HttpRequest;
use quill_core::ids::{CorrelationId, RoomId};
use quill_core::ChatAction;
use std::sync::Arc;

pub(super) fn load_rooms(ctx: &Arc<WorkflowContext>, correlation: CorrelationId) {
    ctx.run(|ctx| async move {
        match Operation::LoadRooms.list(ctx.call(HttpRequest::get("/rooms")).await) {
            Ok(body) => {
                let rooms = ctx.normalize.rooms(body.as_ref());
                ctx.emit(ChatAction::RoomsLoadSuccess { correlation, rooms });
            }
            Err(failure) => ctx.emit_failure(
                &failure,
                ChatAction::RoomsLoadFail { correlation, failure: failure.clone() },
            ),
        }
    });
}

pub(super) fn load_history(ctx: &Arc<WorkflowContext>, correlation: CorrelationId, room_id: RoomId) {
    ctx.run(|ctx| async move {
        let request = HttpRequest::get(format!("/rooms/{room_id}/messages"));
        match Operation::LoadChatHistory.list(ctx.call(request).await) {
            Ok(body) => {
                let messages = ctx
                    .normalize
                    .messages(body.as_ref())
                    .into_iter()
                    .map(|mut message| {
                        if message.room_id == RoomId::default() {
                            message.room_id = room_id;
                        }
                        message
                    })
                    .collect();
                ctx.emit(ChatAction::HistorySuccess {
                    correlation,
                    room_id,
                    messages,
                });
            }
            Err(failure) => ctx.emit_failure(
                &failure,
                ChatAction::HistoryFail {
                    correlation,
                    room_id,
                    failure: failure.clone(),
                },
            ),
        }
    });
}
