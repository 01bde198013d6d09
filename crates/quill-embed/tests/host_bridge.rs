//! Host bridge behavior against a live bus, with the embedded side played
//! by `EmbeddedClient` over recording ports.

use quill_core::action::{Action, ActionKind, SupportAction};
use quill_core::bus::ActionBus;
use quill_core::ids::{CorrelationId, TicketId};
use quill_core::types::{Failure, Ticket, User};
use quill_embed::{
    EmbedHost, EmbeddedClient, Envelope, EnvelopeType, HostConfig, HostEvent, InitPayload,
    InstanceId, Source,
};
use quill_testkit::{ActionRecorder, ManualScheduler, RecordingPort};
use std::sync::Arc;
use std::time::Duration;

const ORIGIN: &str = "https://app.example.com";

struct Fixture {
    bus: ActionBus,
    scheduler: Arc<ManualScheduler>,
    host: EmbedHost,
    recorder: ActionRecorder,
    /// host -> embedded
    to_embedded: Arc<RecordingPort>,
    /// embedded -> host
    to_host: Arc<RecordingPort>,
    client: EmbeddedClient,
}

impl Fixture {
    fn new() -> Self {
        quill_testkit::init_test_tracing();
        let bus = ActionBus::new();
        let scheduler = Arc::new(ManualScheduler::new());
        let host = EmbedHost::new(
            HostConfig {
                origin: ORIGIN.into(),
                submit_ticket_ms: 2_000,
                reload_history_ms: 1_000,
            },
            scheduler.clock(),
            scheduler.clone(),
            &bus,
        );
        let recorder = ActionRecorder::attach(&bus);
        let to_embedded = Arc::new(RecordingPort::new());
        let instance = host.open(to_embedded.clone());
        let to_host = Arc::new(RecordingPort::new());
        let client = EmbeddedClient::new(instance, ORIGIN, to_host.clone());
        Self {
            bus,
            scheduler,
            host,
            recorder,
            to_embedded,
            to_host,
            client,
        }
    }

    /// Deliver everything the embedded side posted.
    fn flush(&self) {
        for (data, target) in self.to_host.take_raw() {
            assert_eq!(target, ORIGIN);
            self.host.receive(ORIGIN, &data);
        }
    }

    fn ready(&self) {
        self.client.announce_ready().unwrap();
        self.flush();
    }

    fn history_requests(&self) -> Vec<CorrelationId> {
        self.recorder
            .of_kind(ActionKind::TicketHistoryRequest)
            .into_iter()
            .filter_map(|action| match action {
                Action::Support(SupportAction::HistoryRequest { correlation }) => Some(correlation),
                _ => None,
            })
            .collect()
    }

    fn complete_history(&self, correlation: CorrelationId) {
        self.bus
            .dispatch(SupportAction::HistorySuccess {
                correlation,
                tickets: vec![ticket(1)],
            })
            .unwrap();
    }

    /// Host events the embedded side accepts from everything posted so far
    fn events(&self) -> Vec<HostEvent> {
        self.to_embedded
            .take_raw()
            .into_iter()
            .filter_map(|(data, _)| self.client.receive(ORIGIN, &data))
            .collect()
    }
}

fn ticket(id: u64) -> Ticket {
    Ticket {
        id: TicketId(id),
        subject: format!("ticket {id}"),
        ..Ticket::default()
    }
}

#[test]
fn invalid_messages_never_reach_the_bus() {
    let f = Fixture::new();
    let instance = f.client.instance();
    let from_host = Envelope::new(EnvelopeType::SubmitTicket, Source::Host, instance)
        .encode()
        .unwrap();
    let good_submit = r#"{"type":"submit_ticket","payload":{"subject":"s","body":"b"},"source":"embedded","instanceId":1}"#;

    f.host.receive("https://evil.example.com", good_submit);
    f.host.receive(ORIGIN, &from_host);
    f.host.receive(ORIGIN, r#"{"type":"submit_ticket","source":"iframe","instanceId":1}"#);
    f.host.receive(ORIGIN, r#"{"type":"submit_ticket","instanceId":1}"#);
    f.host.receive(ORIGIN, "{not json");
    f.host.receive(ORIGIN, r#"{"type":"self_destruct","source":"embedded","instanceId":1}"#);
    f.host.receive(ORIGIN, r#"{"type":"history_loaded","source":"embedded","instanceId":1}"#);

    assert!(f.recorder.actions().is_empty());
    let stats = f.host.stats();
    assert_eq!(stats.received, 7);
    assert_eq!(stats.accepted, 0);
    assert_eq!(stats.wrong_origin, 1);
    assert_eq!(stats.invalid_source, 3);
    assert_eq!(stats.malformed, 1);
    assert_eq!(stats.unknown_type, 1);
    assert_eq!(stats.unexpected_type, 1);
}

#[test]
fn pushes_wait_for_ready() {
    let f = Fixture::new();
    let first = InitPayload {
        user: None,
        tickets: vec![],
    };
    let latest = InitPayload {
        user: Some(User {
            name: "Ada".into(),
            ..User::default()
        }),
        tickets: vec![ticket(4)],
    };
    f.host.push_init(&first).unwrap();
    f.host.push_init(&latest).unwrap();
    assert!(f.to_embedded.posted().is_empty());
    assert!(!f.host.is_ready());

    f.ready();
    assert!(f.host.is_ready());
    assert_eq!(f.events(), vec![HostEvent::Init(latest)]);

    // A second ready is neither re-sent by the client nor acted on by the host.
    assert!(!f.client.announce_ready().unwrap());
    let duplicate = Envelope::new(EnvelopeType::Ready, Source::Embedded, f.client.instance())
        .encode()
        .unwrap();
    f.host.receive(ORIGIN, &duplicate);
    assert!(f.to_embedded.posted().is_empty());
}

#[test]
fn envelopes_from_a_previous_instance_are_dropped() {
    let f = Fixture::new();
    let old_client = &f.client;
    let new_port = Arc::new(RecordingPort::new());
    let new_instance = f.host.open(new_port.clone());
    assert_eq!(new_instance, InstanceId(old_client.instance().0 + 1));
    assert_eq!(f.to_embedded.kinds(), vec![EnvelopeType::Cleanup]);

    old_client.submit_ticket("late", "from the old widget").unwrap();
    f.flush();
    assert_eq!(f.recorder.count(ActionKind::TicketSubmitRequest), 0);
    assert_eq!(f.host.stats().stale_instance, 1);

    let missing_id = r#"{"type":"ready","source":"embedded"}"#;
    f.host.receive(ORIGIN, missing_id);
    assert_eq!(f.host.stats().stale_instance, 2);
    assert!(!f.host.is_ready());
}

#[test]
fn ticket_submissions_are_throttled() {
    let f = Fixture::new();
    f.ready();

    f.client.submit_ticket("one", "body").unwrap();
    f.client.submit_ticket("two", "body").unwrap();
    f.flush();
    assert_eq!(f.recorder.count(ActionKind::TicketSubmitRequest), 1);
    assert_eq!(f.host.stats().throttled, 1);

    f.scheduler.advance(Duration::from_millis(2_000));
    f.client.submit_ticket("three", "body").unwrap();
    f.flush();
    assert_eq!(f.recorder.count(ActionKind::TicketSubmitRequest), 2);
}

#[test]
fn only_outcomes_of_forwarded_submissions_are_pushed() {
    let f = Fixture::new();
    f.ready();
    f.client.submit_ticket("Broken", "It broke").unwrap();
    f.flush();
    let Action::Support(SupportAction::TicketSubmitRequest { correlation, .. }) =
        f.recorder.of_kind(ActionKind::TicketSubmitRequest)[0].clone()
    else {
        panic!("expected submit request");
    };

    // Someone else's submission on the same bus.
    f.bus
        .dispatch(SupportAction::TicketSubmitFail {
            correlation: CorrelationId::new(),
            failure: Failure::offline("offline"),
        })
        .unwrap();
    f.bus
        .dispatch(SupportAction::TicketSubmitSuccess {
            correlation,
            ticket: ticket(9),
        })
        .unwrap();
    // Duplicate outcome is not pushed twice.
    f.bus
        .dispatch(SupportAction::TicketSubmitSuccess {
            correlation,
            ticket: ticket(9),
        })
        .unwrap();

    assert_eq!(f.events(), vec![HostEvent::TicketSubmitted(ticket(9))]);
}

#[test]
fn reloads_during_a_load_coalesce_into_one_follow_up() {
    let f = Fixture::new();
    f.ready();

    f.client.reload_history().unwrap();
    f.flush();
    let first = f.history_requests();
    assert_eq!(first.len(), 1);

    f.client.reload_history().unwrap();
    f.client.reload_history().unwrap();
    f.flush();
    assert_eq!(f.history_requests().len(), 1);
    assert_eq!(f.host.history_pending(), 2);
    assert_eq!(f.host.stats().coalesced, 2);

    // Still inside the throttle window when the load completes.
    f.complete_history(first[0]);
    assert_eq!(f.history_requests().len(), 1);
    assert_eq!(f.scheduler.pending_timers(), 1);

    f.scheduler.advance(Duration::from_millis(1_000));
    let requests = f.history_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(f.host.history_pending(), 0);

    f.complete_history(requests[1]);
    f.scheduler.advance(Duration::from_secs(10));
    assert_eq!(f.history_requests().len(), 2);

    let loaded = f
        .events()
        .into_iter()
        .filter(|e| matches!(e, HostEvent::HistoryLoaded(_)))
        .count();
    assert_eq!(loaded, 2);
}

#[test]
fn follow_up_starts_immediately_once_the_window_has_passed() {
    let f = Fixture::new();
    f.ready();
    f.client.reload_history().unwrap();
    f.client.reload_history().unwrap();
    f.flush();
    let first = f.history_requests()[0];

    f.scheduler.clock().advance(Duration::from_millis(1_500));
    f.complete_history(first);
    assert_eq!(f.history_requests().len(), 2);
    assert_eq!(f.scheduler.pending_timers(), 0);
}

#[test]
fn close_sends_cleanup_and_ignores_later_messages() {
    let f = Fixture::new();
    f.ready();
    f.host.close();
    f.host.close();

    assert_eq!(f.to_embedded.kinds(), vec![EnvelopeType::Cleanup]);
    assert_eq!(f.host.current_instance(), None);

    f.client.submit_ticket("after", "close").unwrap();
    f.flush();
    assert_eq!(f.recorder.count(ActionKind::TicketSubmitRequest), 0);
    assert_eq!(f.host.stats().after_close, 1);

    assert_eq!(f.events(), vec![HostEvent::Cleanup]);
    assert!(f.client.is_torn_down());
    assert!(f.client.submit_ticket("x", "y").is_err());
}

#[test]
fn embedded_client_filters_host_traffic() {
    let f = Fixture::new();
    let instance = f.client.instance();
    let other = Envelope::new(EnvelopeType::Cleanup, Source::Host, InstanceId(instance.0 + 7))
        .encode()
        .unwrap();
    let echoed = Envelope::new(EnvelopeType::Cleanup, Source::Embedded, instance)
        .encode()
        .unwrap();

    assert_eq!(f.client.receive("https://evil.example.com", &other), None);
    assert_eq!(f.client.receive(ORIGIN, &other), None);
    assert_eq!(f.client.receive(ORIGIN, &echoed), None);
    assert!(!f.client.is_torn_down());

    let stats = f.client.stats();
    assert_eq!(stats.wrong_origin, 1);
    assert_eq!(stats.stale_instance, 1);
    assert_eq!(stats.invalid_source, 1);
}
