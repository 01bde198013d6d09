//! Property tests for bus fan-out.

use parking_lot::Mutex;
use proptest::prelude::*;
use quill_core::{Action, ActionBus, ActionKind, ChatAction, QuillError, RoomId};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
enum Behaviour {
    Ok,
    Fail,
    Panic,
}

fn behaviour() -> impl Strategy<Value = Behaviour> {
    prop_oneof![
        6 => Just(Behaviour::Ok),
        2 => Just(Behaviour::Fail),
        1 => Just(Behaviour::Panic),
    ]
}

fn select(room: u64) -> Action {
    ChatAction::RoomSelect {
        room_id: RoomId(room),
    }
    .into()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every handler runs exactly once per dispatch, in registration order,
    /// whatever its neighbours do.
    #[test]
    fn every_handler_runs_once_in_order(behaviours in prop::collection::vec(behaviour(), 1..12)) {
        let bus = ActionBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for (index, behaviour) in behaviours.iter().copied().enumerate() {
            let log = log.clone();
            bus.register_fn(ActionKind::RoomSelect, move |_| {
                log.lock().push(index);
                match behaviour {
                    Behaviour::Ok => Ok(()),
                    Behaviour::Fail => Err(QuillError::internal("handler failed")),
                    Behaviour::Panic => panic!("handler panicked"),
                }
            });
        }

        let report = bus.dispatch(select(1)).unwrap();
        let expected: Vec<usize> = (0..behaviours.len()).collect();
        prop_assert_eq!(log.lock().clone(), expected);

        let failures = behaviours.iter().filter(|b| !matches!(b, Behaviour::Ok)).count();
        prop_assert_eq!(report.invoked, behaviours.len());
        prop_assert_eq!(report.failed, failures);
    }

    /// Handlers for other kinds are never invoked.
    #[test]
    fn fan_out_is_keyed_by_kind(rooms in prop::collection::vec(1u64..100, 1..8)) {
        let bus = ActionBus::new();
        let other = Arc::new(Mutex::new(0usize));
        {
            let other = other.clone();
            bus.register_fn(ActionKind::MessageSend, move |_| {
                *other.lock() += 1;
                Ok(())
            });
        }
        for room in &rooms {
            bus.dispatch(select(*room)).unwrap();
        }
        prop_assert_eq!(*other.lock(), 0);
        prop_assert_eq!(bus.stats().dispatched, rooms.len() as u64);
    }
}
