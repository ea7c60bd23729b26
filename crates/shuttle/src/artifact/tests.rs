//! Unit tests for the synthesized reader.

use std::any::Any;
use std::sync::{Arc, Mutex};

use mockall::mock;
use rstest::rstest;
use shuttle_wire::WireType;

use super::*;
use crate::cache::ReaderCache;
use crate::intercept::{CallHooks, Continuation, MethodInterceptor};
use crate::reader::ReaderBuilder;
use crate::table::OperationMeta;
use crate::tests::support::{
    BLOCKED_ACCOUNT, Blotter, Journal, Messages, Point, Ticket, TradingDesk,
};

mock! {
    Hooks {}
    impl CallHooks for Hooks {
        fn generator_id(&self) -> &str;
        fn before_call(&self, operation: &OperationMeta, args: &[Value]);
        fn after_call(&self, operation: &OperationMeta, returned: &Returned);
    }
}

/// Interceptor that records operation names and drops the calls it is told to.
struct Gatekeeper {
    blocked: &'static [&'static str],
    seen: Mutex<Vec<String>>,
}

impl Gatekeeper {
    fn blocking(blocked: &'static [&'static str]) -> Self {
        Self {
            blocked,
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl MethodInterceptor for Gatekeeper {
    fn intercept(
        &self,
        operation: &OperationMeta,
        target: &mut dyn Any,
        args: &mut [Value],
        proceed: &Continuation<'_>,
    ) -> Result<Returned, DispatchError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(operation.name().to_owned());
        }
        if self.blocked.contains(&operation.name()) {
            return Ok(Returned::Unit);
        }
        proceed.proceed(target, args)
    }
}

fn desk_reader(wire_type: WireType, interception: Interception) -> (ReaderArtifact, Journal) {
    let journal = Journal::default();
    let artifact = ReaderBuilder::new(wire_type)
        .target(TradingDesk::with_journal(&journal))
        .interception(interception)
        .cache(Arc::new(ReaderCache::new()))
        .build()
        .expect("desk reader builds");
    (artifact, journal)
}

fn calls(journal: &Journal) -> Vec<String> {
    journal.borrow().clone()
}

// ---------------------------------------------------------------------------
// Dispatch by name and id
// ---------------------------------------------------------------------------

#[rstest]
#[case::binary(WireType::Binary)]
#[case::json(WireType::Json)]
fn messages_reach_the_target_in_order(#[case] wire_type: WireType) {
    let (mut artifact, journal) = desk_reader(wire_type, Interception::None);
    let mut messages = Messages::new(wire_type);
    messages.call("ping");
    messages.transfer(7, 250, "rent");
    messages.reference("AB", 3169);
    messages
        .out()
        .write_named("mark", &mut |out| out.object(&Point { x: 3, y: -4 }));

    let mut wire = messages.reader();
    for _ in 0..4 {
        assert!(artifact.read_one(wire.as_mut()));
    }
    assert!(!artifact.read_one(wire.as_mut()), "input is exhausted");

    assert_eq!(
        calls(&journal),
        ["ping", "transfer 7 250 rent", "reference 3169", "mark 3 -4"]
    );
    let desk = artifact.target::<TradingDesk>().expect("desk target");
    assert_eq!(desk.marks, [Point { x: 3, y: -4 }]);
}

#[rstest]
#[case::binary(WireType::Binary)]
#[case::json(WireType::Json)]
fn method_ids_address_the_same_operations(#[case] wire_type: WireType) {
    let (mut artifact, journal) = desk_reader(wire_type, Interception::None);
    let mut messages = Messages::new(wire_type);
    messages.out().write_numbered(2, &mut |out| {
        out.sequence(&mut |args| {
            args.int32(9);
            args.int64(10);
            args.text("fee");
        });
    });
    messages.out().write_numbered(1, &mut |out| out.empty());

    let mut wire = messages.reader();
    assert!(artifact.read_one(wire.as_mut()));
    assert!(artifact.read_one(wire.as_mut()));
    assert_eq!(calls(&journal), ["transfer 9 10 fee", "ping"]);
}

#[rstest]
#[case::binary(WireType::Binary)]
#[case::json(WireType::Json)]
fn unknown_messages_are_skipped(#[case] wire_type: WireType) {
    let (mut artifact, journal) = desk_reader(wire_type, Interception::None);
    let mut messages = Messages::new(wire_type);
    messages
        .out()
        .write_named("rebalance", &mut |out| out.int32(5));
    messages.out().write_numbered(99, &mut |out| out.text("?"));
    messages.call("ping");

    let mut wire = messages.reader();
    assert!(!artifact.read_one(wire.as_mut()), "unknown name");
    assert!(!artifact.read_one(wire.as_mut()), "unknown id");
    assert!(artifact.read_one(wire.as_mut()));
    assert_eq!(calls(&journal), ["ping"]);
}

// ---------------------------------------------------------------------------
// Filter gate
// ---------------------------------------------------------------------------

#[rstest]
#[case::binary(WireType::Binary)]
#[case::json(WireType::Json)]
fn blocked_account_is_ignored_without_losing_the_stream(#[case] wire_type: WireType) {
    let (mut artifact, journal) = desk_reader(wire_type, Interception::None);
    let mut messages = Messages::new(wire_type);
    messages.transfer(42, 1_000, "blocked");
    messages.transfer(7, 5, "allowed");

    let mut wire = messages.reader();
    assert!(artifact.read_one(wire.as_mut()), "suppressed calls count as handled");
    assert!(artifact.read_one(wire.as_mut()));
    assert_eq!(calls(&journal), ["transfer 7 5 allowed"]);
}

// ---------------------------------------------------------------------------
// Chaining
// ---------------------------------------------------------------------------

#[rstest]
#[case::binary(WireType::Binary)]
#[case::json(WireType::Json)]
fn chained_calls_reach_each_result(#[case] wire_type: WireType) {
    let (mut artifact, journal) = desk_reader(wire_type, Interception::None);
    let mut messages = Messages::new(wire_type);
    messages.trade("ada", 77, 10, 101.5);

    let mut wire = messages.reader();
    for _ in 0..3 {
        assert!(artifact.read_one(wire.as_mut()));
    }

    assert_eq!(
        calls(&journal),
        ["begin ada", "ticket 77 by ada", "fill 10@101.5 on 77"]
    );
    assert_eq!(artifact.chain_slot_count(), 2);
    assert_eq!(
        artifact.chain_result::<dyn Blotter>().map(Blotter::trader),
        Some("ada")
    );
    assert_eq!(artifact.chain_result::<dyn Ticket>().map(Ticket::id), Some(77));
}

#[test]
fn later_chain_replaces_the_held_result() {
    let (mut artifact, journal) = desk_reader(WireType::Binary, Interception::None);
    let mut messages = Messages::new(WireType::Binary);
    messages.trade("ada", 1, 1, 1.0);
    messages.trade("grace", 2, 2, 2.0);

    let mut wire = messages.reader();
    for _ in 0..6 {
        assert!(artifact.read_one(wire.as_mut()));
    }
    assert_eq!(
        artifact.chain_result::<dyn Blotter>().map(Blotter::trader),
        Some("grace")
    );
    assert_eq!(journal.borrow().last().map(String::as_str), Some("fill 2@2 on 2"));
}

#[test]
fn chained_operation_without_a_receiver_is_unhandled() {
    let (mut artifact, journal) = desk_reader(WireType::Binary, Interception::None);
    let mut messages = Messages::new(WireType::Binary);
    messages.out().write_named("ticket", &mut |out| out.int64(5));
    messages.call("ping");

    let mut wire = messages.reader();
    assert!(!artifact.read_one(wire.as_mut()));
    assert!(artifact.read_one(wire.as_mut()), "reader recovers");
    assert_eq!(calls(&journal), ["ping"]);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn target_failure_makes_the_message_unhandled() {
    let (mut artifact, _journal) = desk_reader(WireType::Binary, Interception::None);
    let mut messages = Messages::new(WireType::Binary);
    messages.call("halt");

    let mut wire = messages.reader();
    assert!(!artifact.read_one(wire.as_mut()));
}

#[test]
fn mistyped_arguments_make_the_message_unhandled() {
    let (mut artifact, journal) = desk_reader(WireType::Binary, Interception::None);
    let mut messages = Messages::new(WireType::Binary);
    messages.out().write_named("transfer", &mut |out| {
        out.sequence(&mut |args| {
            args.text("seven");
            args.int64(1);
            args.text("memo");
        });
    });
    messages.call("ping");

    let mut wire = messages.reader();
    assert!(!artifact.read_one(wire.as_mut()));
    assert!(artifact.read_one(wire.as_mut()));
    assert_eq!(calls(&journal), ["ping"]);
}

#[rstest]
#[case::binary(WireType::Binary)]
#[case::json(WireType::Json)]
fn failed_single_argument_message_does_not_disturb_the_next(#[case] wire_type: WireType) {
    let (mut artifact, journal) = desk_reader(wire_type, Interception::None);
    let mut messages = Messages::new(wire_type);
    messages
        .out()
        .write_named("reference", &mut |out| out.text("not a number"));
    messages.reference("AB", 3169);
    messages
        .out()
        .write_named("mark", &mut |out| out.text("not a point"));
    messages.call("ping");

    let mut wire = messages.reader();
    assert!(!artifact.read_one(wire.as_mut()));
    assert!(artifact.read_one(wire.as_mut()));
    assert!(!artifact.read_one(wire.as_mut()));
    assert!(artifact.read_one(wire.as_mut()));
    assert!(!artifact.read_one(wire.as_mut()), "input is exhausted");
    assert_eq!(calls(&journal), ["reference 3169", "ping"]);
}

#[rstest]
#[case::binary(WireType::Binary)]
#[case::json(WireType::Json)]
fn target_failure_leaves_the_stream_at_the_next_message(#[case] wire_type: WireType) {
    let (mut artifact, journal) = desk_reader(wire_type, Interception::None);
    let mut messages = Messages::new(wire_type);
    messages.call("halt");
    messages.transfer(3, 9, "after");

    let mut wire = messages.reader();
    assert!(!artifact.read_one(wire.as_mut()));
    assert!(artifact.read_one(wire.as_mut()));
    assert_eq!(calls(&journal), ["transfer 3 9 after"]);
}

#[test]
fn malformed_reference_is_rejected_on_json() {
    let (mut artifact, journal) = desk_reader(WireType::Json, Interception::None);
    let mut messages = Messages::new(WireType::Json);
    messages.reference("\u{e9}", 0);

    let mut wire = messages.reader();
    assert!(!artifact.read_one(wire.as_mut()));
    assert!(calls(&journal).is_empty());
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[rstest]
#[case::binary(WireType::Binary)]
#[case::json(WireType::Json)]
fn history_is_read_instead_of_dispatched(#[case] wire_type: WireType) {
    let (mut artifact, journal) = desk_reader(wire_type, Interception::None);
    let mut history = MessageHistory::new();
    history.add_source(2, 40);
    history.add_timing(1_500);
    let mut messages = Messages::new(wire_type);
    messages
        .out()
        .write_named(HISTORY, &mut |out| out.object(&history));
    messages.call("ping");

    let mut wire = messages.reader();
    assert!(artifact.read_one(wire.as_mut()));
    assert!(artifact.read_one(wire.as_mut()));
    assert_eq!(artifact.history(), &history);
    assert_eq!(calls(&journal), ["ping"]);
}

// ---------------------------------------------------------------------------
// Interception
// ---------------------------------------------------------------------------

#[test]
fn interceptor_may_drop_a_call() {
    let gatekeeper = Arc::new(Gatekeeper::blocking(&["transfer"]));
    let shared: Arc<dyn MethodInterceptor> = gatekeeper.clone();
    let (mut artifact, journal) = desk_reader(WireType::Binary, Interception::Intercept(shared));
    let mut messages = Messages::new(WireType::Binary);
    messages.transfer(7, 1, "dropped");
    messages.call("ping");

    let mut wire = messages.reader();
    assert!(artifact.read_one(wire.as_mut()));
    assert!(artifact.read_one(wire.as_mut()));
    assert_eq!(calls(&journal), ["ping"]);
    assert_eq!(
        *gatekeeper.seen.lock().expect("seen lock"),
        ["transfer", "ping"]
    );
}

#[test]
fn interceptor_result_replaces_the_chained_receiver() {
    let gatekeeper = Gatekeeper::blocking(&["begin"]);
    let (mut artifact, journal) =
        desk_reader(WireType::Binary, Interception::intercept(gatekeeper));
    let mut messages = Messages::new(WireType::Binary);
    messages.trade("ada", 3, 1, 9.0);

    let mut wire = messages.reader();
    assert!(artifact.read_one(wire.as_mut()), "begin is handled by the interceptor");
    assert!(!artifact.read_one(wire.as_mut()), "no blotter was produced");
    assert!(artifact.chain_result::<dyn Blotter>().is_none());
    assert!(calls(&journal).is_empty());
}

#[test]
fn hooks_observe_each_dispatched_call() {
    let mut hooks = MockHooks::new();
    hooks
        .expect_generator_id()
        .return_const(String::from("Audit"));
    hooks
        .expect_before_call()
        .withf(|operation, args| operation.name() == "transfer" && args.len() == 3)
        .times(1)
        .return_const(());
    hooks
        .expect_after_call()
        .withf(|operation, returned| operation.name() == "transfer" && !returned.is_chained())
        .times(1)
        .return_const(());

    let (mut artifact, journal) = desk_reader(WireType::Json, Interception::hooks(hooks));
    let mut messages = Messages::new(WireType::Json);
    messages.transfer(BLOCKED_ACCOUNT, 1, "ignored");
    messages.transfer(8, 2, "seen");

    let mut wire = messages.reader();
    assert!(artifact.read_one(wire.as_mut()));
    assert!(artifact.read_one(wire.as_mut()));
    assert_eq!(calls(&journal), ["transfer 8 2 seen"]);
    assert_eq!(artifact.name(), "TradingDeskJsonAuditMethodReader");
}

#[test]
fn hooks_skip_after_call_when_the_target_fails() {
    let mut hooks = MockHooks::new();
    hooks
        .expect_generator_id()
        .return_const(String::from("Audit"));
    hooks.expect_before_call().times(1).return_const(());
    hooks.expect_after_call().never();

    let (mut artifact, _journal) = desk_reader(WireType::Binary, Interception::hooks(hooks));
    let mut messages = Messages::new(WireType::Binary);
    messages.call("halt");

    let mut wire = messages.reader();
    assert!(!artifact.read_one(wire.as_mut()));
}

// ---------------------------------------------------------------------------
// Metadata and state
// ---------------------------------------------------------------------------

#[test]
fn metadata_describes_every_dispatchable_operation() {
    let (artifact, _journal) = desk_reader(WireType::Binary, Interception::None);
    let metadata = artifact.operation_metadata();

    assert_eq!(
        metadata.names(),
        ["begin", "fill", "halt", "mark", "ping", "reference", "ticket", "transfer"]
    );
    let transfer = metadata.get("transfer").expect("transfer metadata");
    assert_eq!(transfer.method_id(), Some(2));
    assert!(transfer.is_filtered());
    assert_eq!(transfer.params().len(), 3);
    let begin = metadata.get("begin").expect("begin metadata");
    assert_eq!(begin.chains_to(), Some("Blotter"));
    assert_eq!(metadata.get("fill").map(OperationMeta::contract), Some("Ticket"));
}

#[test]
fn targets_are_released_after_reading() {
    let (mut artifact, _journal) = desk_reader(WireType::Binary, Interception::None);
    let mut messages = Messages::new(WireType::Binary);
    messages
        .out()
        .write_named("mark", &mut |out| out.object(&Point { x: 1, y: 1 }));
    let mut wire = messages.reader();
    assert!(artifact.read_one(wire.as_mut()));

    let targets = artifact.into_targets();
    assert_eq!(targets.len(), 1);
    let desk = targets
        .into_iter()
        .next()
        .and_then(|target| target.into_inner::<TradingDesk>().ok())
        .expect("desk comes back");
    assert_eq!(desk.calls(), ["mark 1 1"]);
}
