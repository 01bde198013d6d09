//! The realtime and embedded bridges wired through `AppCore`.

mod common;

use common::{Harness, PLACEHOLDER};
use quill_core::action::ActionKind;
use quill_core::effects::HttpMethod;
use quill_core::ids::RoomId;
use quill_core::types::ChannelStatus;
use quill_core::ChatAction;
use quill_embed::{EmbeddedClient, EnvelopeType, HostEvent};
use quill_testkit::{FakeConnector, RecordingPort};
use serde_json::json;
use std::sync::Arc;

#[test]
fn realtime_messages_reach_the_chat_store() {
    let h = Harness::new();
    let connector = Arc::new(FakeConnector::new());
    let bridge = h.core.start_realtime(connector.clone());
    let socket = connector.latest().unwrap();
    socket.open();
    assert_eq!(h.core.chat().state().status, ChannelStatus::Open);

    h.core.dispatch(ChatAction::RoomSelect { room_id: RoomId(4) }).unwrap();
    assert_eq!(bridge.selected_room(), Some(RoomId(4)));
    assert_eq!(socket.sent_json()[0]["type"], "select_room");

    socket.deliver(
        &json!({"type": "message", "data": {"id": 1, "room_id": 4, "user_id": 2, "avatar": "", "text": "hey"}, "ts": 1})
            .to_string(),
    );
    let chat = h.core.chat().state();
    let message = chat.messages().next().unwrap();
    assert_eq!(message.text, "hey");
    assert_eq!(message.avatar, PLACEHOLDER);

    h.core.dispatch(ChatAction::MessageSend { text: "yo".into() }).unwrap();
    assert_eq!(socket.sent_json()[1]["payload"]["text"], "yo");

    h.core.shutdown();
    assert!(h.core.realtime().is_none());
    assert_eq!(h.core.chat().state().status, ChannelStatus::Disconnected);
}

#[test]
fn embedded_ticket_round_trip() {
    let h = Harness::new();
    let origin = h.core.config().host_origin.clone();
    h.transport.respond_json(
        HttpMethod::Post,
        "/support/tickets",
        201,
        json!({"ticket": {"id": 31, "subject": "Broken", "body": "It broke", "status": "open"}}),
    );

    // host -> embedded
    let to_embedded = Arc::new(RecordingPort::new());
    let instance = h.core.embed().open(to_embedded.clone());
    // embedded -> host
    let to_host = Arc::new(RecordingPort::new());
    let client = EmbeddedClient::new(instance, origin.clone(), to_host.clone());

    let forward = || {
        for (data, _) in to_host.take_raw() {
            h.core.embed().receive(&origin, &data);
        }
    };

    client.announce_ready().unwrap();
    client.submit_ticket("Broken", "It broke").unwrap();
    forward();
    h.settle();

    assert_eq!(h.recorder.count(ActionKind::TicketSubmitRequest), 1);
    assert_eq!(h.core.support().tickets()[0].subject, "Broken");
    let submitted: Vec<_> = to_embedded
        .posted()
        .into_iter()
        .filter_map(|(data, _)| client.receive(&origin, &data))
        .collect();
    assert!(submitted
        .iter()
        .any(|event| matches!(event, HostEvent::TicketSubmitted(t) if t.id.0 == 31)));

    h.core.shutdown();
    assert_eq!(to_embedded.kinds().last(), Some(&EnvelopeType::Cleanup));
}
