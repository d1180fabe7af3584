use std::sync::{Arc, Mutex};

use irq_manager::{
    CallbackPriority, HwPriority, InterruptController, IrqError, IrqLine,
    IrqManager,
};

// ---------------------------------------------------------------------------
// Mock controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControllerOp {
    Enable(IrqLine),
    Disable(IrqLine),
    SetPriority(IrqLine, HwPriority),
}

#[derive(Clone, Default)]
struct ControllerLog(Arc<Mutex<Vec<ControllerOp>>>);

struct MockController {
    log: ControllerLog,
}

impl InterruptController for MockController {
    fn enable(&self, line: IrqLine) {
        self.log.0.lock().unwrap().push(ControllerOp::Enable(line));
    }

    fn disable(&self, line: IrqLine) {
        self.log.0.lock().unwrap().push(ControllerOp::Disable(line));
    }

    fn set_priority(&self, line: IrqLine, priority: HwPriority) {
        self.log
            .0
            .lock()
            .unwrap()
            .push(ControllerOp::SetPriority(line, priority));
    }
}

fn make_manager() -> (IrqManager<MockController, 4>, ControllerLog) {
    let log = ControllerLog::default();
    (IrqManager::new(MockController { log: log.clone() }), log)
}

/// Declares a dispatch-order sink: a process-wide list plus the `fn`
/// callback that appends to it. Each test that inspects dispatch order gets
/// its own sink so tests can run in parallel.
macro_rules! sink {
    ($name:ident, $push:ident) => {
        static $name: Mutex<Vec<u32>> = Mutex::new(Vec::new());

        fn $push(context: u32) {
            $name.lock().unwrap().push(context);
        }
    };
}

const LINE: IrqLine = IrqLine(5);
const OTHER_LINE: IrqLine = IrqLine(9);

// ---------------------------------------------------------------------------
// Dispatch ordering
// ---------------------------------------------------------------------------

sink!(PRIORITY_ORDER, push_priority_order);

#[test]
fn dispatch_runs_highest_priority_first() {
    let (mgr, _) = make_manager();

    // Registered lowest-first; dispatch must still run Highest first.
    mgr.connect(LINE, push_priority_order, 1, CallbackPriority::Low)
        .unwrap();
    mgr.connect(LINE, push_priority_order, 2, CallbackPriority::Highest)
        .unwrap();
    mgr.connect(LINE, push_priority_order, 3, CallbackPriority::Normal)
        .unwrap();

    mgr.dispatch(LINE);
    assert_eq!(*PRIORITY_ORDER.lock().unwrap(), vec![2, 3, 1]);
}

sink!(TIE_ORDER, push_tie_order);

#[test]
fn equal_priorities_dispatch_in_registration_order() {
    let (mgr, _) = make_manager();

    for context in 1..=3 {
        mgr.connect(LINE, push_tie_order, context, CallbackPriority::Normal)
            .unwrap();
    }

    mgr.dispatch(LINE);
    mgr.dispatch(LINE);
    assert_eq!(*TIE_ORDER.lock().unwrap(), vec![1, 2, 3, 1, 2, 3]);
}

sink!(LINE_ISOLATION, push_line_isolation);

#[test]
fn lines_are_independent() {
    let (mgr, _) = make_manager();

    mgr.connect(LINE, push_line_isolation, 1, CallbackPriority::Normal)
        .unwrap();
    mgr.connect(
        OTHER_LINE,
        push_line_isolation,
        2,
        CallbackPriority::Highest,
    )
    .unwrap();

    mgr.dispatch(OTHER_LINE);
    assert_eq!(*LINE_ISOLATION.lock().unwrap(), vec![2]);

    mgr.dispatch(IrqLine(77));
    assert_eq!(LINE_ISOLATION.lock().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Connect / disconnect
// ---------------------------------------------------------------------------

sink!(REMOVAL, push_removal);

#[test]
fn disconnect_removes_exactly_that_callback() {
    let (mgr, _) = make_manager();

    let first = mgr
        .connect(LINE, push_removal, 1, CallbackPriority::Normal)
        .unwrap();
    mgr.connect(LINE, push_removal, 2, CallbackPriority::Normal)
        .unwrap();

    mgr.disconnect(first).unwrap();
    mgr.dispatch(LINE);
    assert_eq!(*REMOVAL.lock().unwrap(), vec![2]);
    assert_eq!(mgr.registered(LINE), 1);
}

fn noop(_context: u32) {}

#[test]
fn disconnect_twice_is_not_found() {
    let (mgr, _) = make_manager();

    let handle =
        mgr.connect(LINE, noop, 0, CallbackPriority::Normal).unwrap();
    mgr.disconnect(handle).unwrap();
    assert_eq!(mgr.disconnect(handle), Err(IrqError::NotFound));
}

#[test]
fn stale_handle_rejected_after_slot_reuse() {
    let (mgr, _) = make_manager();

    let old = mgr.connect(LINE, noop, 0, CallbackPriority::Normal).unwrap();
    mgr.disconnect(old).unwrap();

    // Reuses the freed slot under a new generation.
    let new = mgr.connect(LINE, noop, 1, CallbackPriority::Normal).unwrap();
    assert_eq!(mgr.disconnect(old), Err(IrqError::NotFound));
    mgr.disconnect(new).unwrap();
    assert_eq!(mgr.registered(LINE), 0);
}

#[test]
fn table_full_is_no_resource() {
    let (mgr, _) = make_manager();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            mgr.connect(LINE, noop, i, CallbackPriority::Normal).unwrap()
        })
        .collect();
    assert_eq!(
        mgr.connect(LINE, noop, 9, CallbackPriority::Highest),
        Err(IrqError::NoResource)
    );

    mgr.disconnect(handles[0]).unwrap();
    mgr.connect(LINE, noop, 9, CallbackPriority::Highest).unwrap();
}

#[test]
fn registered_counts_per_line() {
    let (mgr, _) = make_manager();

    mgr.connect(LINE, noop, 0, CallbackPriority::Low).unwrap();
    mgr.connect(LINE, noop, 1, CallbackPriority::High).unwrap();
    mgr.connect(OTHER_LINE, noop, 2, CallbackPriority::Low).unwrap();

    assert_eq!(mgr.registered(LINE), 2);
    assert_eq!(mgr.registered(OTHER_LINE), 1);
    assert_eq!(mgr.registered(IrqLine(77)), 0);
}

// ---------------------------------------------------------------------------
// Controller passthrough
// ---------------------------------------------------------------------------

sink!(PASSTHROUGH, push_passthrough);

#[test]
fn masking_and_hw_priority_do_not_reorder_the_chain() {
    let (mgr, log) = make_manager();

    mgr.connect(LINE, push_passthrough, 1, CallbackPriority::Low).unwrap();
    mgr.connect(LINE, push_passthrough, 2, CallbackPriority::Highest)
        .unwrap();

    mgr.enable(LINE);
    mgr.set_hw_priority(LINE, HwPriority(3));
    mgr.disable(LINE);

    assert_eq!(
        *log.0.lock().unwrap(),
        vec![
            ControllerOp::Enable(LINE),
            ControllerOp::SetPriority(LINE, HwPriority(3)),
            ControllerOp::Disable(LINE),
        ]
    );

    // Hardware-level settings left the dispatch chain alone.
    mgr.dispatch(LINE);
    assert_eq!(*PASSTHROUGH.lock().unwrap(), vec![2, 1]);
}
