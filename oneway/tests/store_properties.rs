//! Behaviour tests for the store's ordering and visibility guarantees

use std::sync::Arc;
use std::thread;

use oneway::prelude::*;
use oneway::testing::StoreHarness;
use oneway::{assert_no_output, assert_output};
use parking_lot::Mutex;

#[derive(Debug, Clone, Default, PartialEq)]
struct Ledger {
    total: i64,
    entries: Vec<(usize, usize)>,
}

#[derive(Action, Debug)]
enum LedgerAction {
    Close,
    Audit,
}

#[derive(Change, Debug)]
enum LedgerChange {
    Deposit(i64),
    Withdraw(i64),
    Record { caller: usize, seq: usize },
}

#[derive(Output, Clone, Debug, PartialEq)]
enum LedgerOutput {
    Closed { total: i64 },
}

struct Books;

impl StoreDefinition for Books {
    type State = Ledger;
    type Action = LedgerAction;
    type Change = LedgerChange;
    type Output = LedgerOutput;
    type Effect = Never;

    fn reduce(&self, state: &mut Ledger, action: LedgerAction) -> Reduction<LedgerOutput, Never> {
        match action {
            LedgerAction::Close => Reduction::output(LedgerOutput::Closed { total: state.total }),
            LedgerAction::Audit => Reduction::unchanged(),
        }
    }

    fn fold(&self, state: &mut Ledger, change: LedgerChange) {
        match change {
            LedgerChange::Deposit(n) => state.total += n,
            LedgerChange::Withdraw(n) => state.total -= n,
            LedgerChange::Record { caller, seq } => {
                state.total += 1;
                state.entries.push((caller, seq));
            }
        }
    }
}

fn fold_all(initial: &Ledger, changes: Vec<LedgerChange>) -> Ledger {
    let mut state = initial.clone();
    for change in changes {
        Books.fold(&mut state, change);
    }
    state
}

#[tokio::test]
async fn test_read_after_write() {
    let harness = StoreHarness::new(Books, Ledger::default());

    for n in 1..=10 {
        let prior = harness.state();
        harness.dispatch_change(LedgerChange::Deposit(n));
        assert_eq!(
            harness.state(),
            fold_all(&prior, vec![LedgerChange::Deposit(n)])
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_changes_are_serialized() {
    const CALLERS: usize = 8;
    const PER_CALLER: usize = 200;

    let store = Store::new(Books, Ledger::default());
    let observed = Arc::new(Mutex::new(Vec::new()));
    {
        let observed = Arc::clone(&observed);
        store.observe_state(move |state: &Ledger| observed.lock().push(state.total));
    }

    thread::scope(|scope| {
        for caller in 0..CALLERS {
            let store = store.clone();
            scope.spawn(move || {
                for seq in 0..PER_CALLER {
                    store.dispatch_change(LedgerChange::Record { caller, seq });
                }
            });
        }
    });

    let state = store.state();
    assert_eq!(state.total, (CALLERS * PER_CALLER) as i64);
    assert_eq!(state.entries.len(), CALLERS * PER_CALLER);

    // Each caller's own changes appear in its dispatch order
    for caller in 0..CALLERS {
        let seqs: Vec<usize> = state
            .entries
            .iter()
            .filter(|(c, _)| *c == caller)
            .map(|(_, s)| *s)
            .collect();
        assert_eq!(seqs, (0..PER_CALLER).collect::<Vec<_>>());
    }

    // Notifications arrive in mutation order
    let expected_len = CALLERS * PER_CALLER + 1;
    for _ in 0..500 {
        if observed.lock().len() == expected_len {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    let observed = observed.lock().clone();
    assert_eq!(observed.len(), expected_len);
    assert!(observed.windows(2).all(|w| w[1] == w[0] + 1));
}

#[tokio::test]
async fn test_batch_is_atomic_and_notifies_once() {
    let changes = || {
        vec![
            LedgerChange::Deposit(10),
            LedgerChange::Withdraw(3),
            LedgerChange::Deposit(5),
        ]
    };

    let mut sequential = StoreHarness::new(Books, Ledger::default());
    for change in changes() {
        sequential.dispatch_change(change);
    }
    sequential.settle().await.unwrap();

    let mut batched = StoreHarness::new(Books, Ledger::default());
    batched.dispatch_batch_changes(changes());
    batched.settle().await.unwrap();

    assert_eq!(batched.state(), sequential.state());
    assert_eq!(sequential.drain_states().len(), 4);

    let states = batched.drain_states();
    assert_eq!(states.len(), 2);
    assert_eq!(states[1].total, 12);
}

#[tokio::test]
async fn test_empty_batch_is_a_noop() {
    let mut harness = StoreHarness::new(Books, Ledger::default());
    harness.dispatch_batch_changes(Vec::new());
    harness.settle().await.unwrap();

    assert_eq!(harness.drain_states(), vec![Ledger::default()]);
}

#[tokio::test]
async fn test_late_subscriber_gets_current_snapshot_first() {
    let (delivery, mut queue) = DeliveryContext::manual();
    let store = Store::builder(Books, Ledger::default())
        .deliver_on(delivery)
        .build();

    for n in 1..=5 {
        store.dispatch_change(LedgerChange::Deposit(n));
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = Arc::clone(&seen);
        store.observe_state(move |state: &Ledger| seen.lock().push(state.total));
    }
    store.dispatch_change(LedgerChange::Deposit(100));
    queue.drain();

    assert_eq!(*seen.lock(), vec![15, 115]);
}

#[tokio::test]
async fn test_output_is_not_replayed() {
    let (delivery, mut queue) = DeliveryContext::manual();
    let store = Store::builder(Books, Ledger::default())
        .deliver_on(delivery)
        .build();

    store.dispatch_change(LedgerChange::Deposit(7));
    store.dispatch_action(LedgerAction::Close);
    store.flush().await.unwrap();

    let late = Arc::new(Mutex::new(Vec::new()));
    {
        let late = Arc::clone(&late);
        store.observe_output(move |output: &LedgerOutput| late.lock().push(output.clone()));
    }
    queue.drain();
    assert!(late.lock().is_empty());

    store.dispatch_change(LedgerChange::Deposit(1));
    store.dispatch_action(LedgerAction::Close);
    store.flush().await.unwrap();
    queue.drain();

    let late = late.lock().clone();
    assert_output!(late, LedgerOutput::Closed { total: 8 });
    assert_no_output!(late, LedgerOutput::Closed { total: 7 });
}

#[tokio::test]
async fn test_unchanged_reduction_is_handled_without_notification() {
    let mut harness = StoreHarness::new(Books, Ledger::default());

    harness.dispatch_action(LedgerAction::Audit);
    harness.settle().await.unwrap();

    assert_eq!(harness.drain_states().len(), 1);
    assert!(harness.drain_outputs().is_empty());
}

#[tokio::test]
async fn test_observer_may_dispatch_without_deadlock() {
    let (delivery, mut queue) = DeliveryContext::manual();
    let store = Store::builder(Books, Ledger::default())
        .deliver_on(delivery)
        .build();
    {
        let store_ref = store.clone();
        store.observe_state(move |state: &Ledger| {
            if state.total == 1 {
                store_ref.dispatch_change(LedgerChange::Deposit(1));
            }
        });
    }

    store.dispatch_change(LedgerChange::Deposit(1));
    while queue.drain() > 0 {}

    assert_eq!(store.state().total, 2);
}

#[tokio::test]
#[should_panic(expected = "unhandled change")]
async fn test_incomplete_fold_is_fatal_to_caller() {
    struct Partial;

    impl StoreDefinition for Partial {
        type State = i64;
        type Action = Never;
        type Change = LedgerChange;
        type Output = Never;
        type Effect = Never;

        fn reduce(&self, _: &mut i64, action: Never) -> Reduction<Never, Never> {
            match action {}
        }

        fn fold(&self, state: &mut i64, change: LedgerChange) {
            match change {
                LedgerChange::Deposit(n) => *state += n,
                other => panic!("unhandled change: {other:?}"),
            }
        }
    }

    let store = Store::new(Partial, 0);
    store.dispatch_change(LedgerChange::Withdraw(1));
}

const ABORT_CHILD_ENV: &str = "ONEWAY_INCOMPLETE_REDUCER_CHILD";

/// Runs only inside the child process spawned by
/// `test_incomplete_reducer_aborts_process`.
#[tokio::test]
async fn incomplete_reducer_child() {
    if std::env::var_os(ABORT_CHILD_ENV).is_none() {
        return;
    }

    struct Partial;

    impl StoreDefinition for Partial {
        type State = i64;
        type Action = LedgerAction;
        type Change = Never;
        type Output = Never;
        type Effect = Never;

        fn reduce(&self, _: &mut i64, action: LedgerAction) -> Reduction<Never, Never> {
            match action {
                LedgerAction::Audit => Reduction::unchanged(),
                other => unimplemented!("no reduction for {other:?}"),
            }
        }

        fn fold(&self, _: &mut i64, change: Never) {
            match change {}
        }
    }

    let store = Store::new(Partial, 0);
    store.dispatch_action(LedgerAction::Close);
    let _ = store.flush().await;
    // Unreachable when the worker aborts
    std::process::exit(0);
}

#[test]
fn test_incomplete_reducer_aborts_process() {
    let exe = std::env::current_exe().unwrap();
    let status = std::process::Command::new(exe)
        .args(["incomplete_reducer_child", "--exact", "--test-threads=1"])
        .env(ABORT_CHILD_ENV, "1")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .unwrap();

    assert!(!status.success());
}
