//! Property tests for handler-chain execution.

use std::sync::{Arc, Mutex};

use gantry_core::{handler, Context, Handler, HandlerChain, ABORT_INDEX, MAX_CHAIN_LEN};
use http::StatusCode;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Step {
    /// Records its position and returns.
    Plain,
    /// Records its position, runs the rest of the chain, records again.
    Wrap,
    /// Records its position and aborts.
    Abort,
}

type Log = Arc<Mutex<Vec<(usize, &'static str)>>>;

fn build(steps: &[Step], log: &Log) -> HandlerChain {
    let handlers: Vec<Handler> = steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let log = log.clone();
            match step {
                Step::Plain => handler(move |_| log.lock().unwrap().push((i, "run"))),
                Step::Wrap => handler(move |c: &mut Context| {
                    log.lock().unwrap().push((i, "run"));
                    c.advance();
                    log.lock().unwrap().push((i, "resume"));
                }),
                Step::Abort => handler(move |c: &mut Context| {
                    log.lock().unwrap().push((i, "run"));
                    c.abort(StatusCode::FORBIDDEN);
                }),
            }
        })
        .collect();
    HandlerChain::new(handlers)
}

fn runs(log: &Log) -> Vec<usize> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|(_, event)| *event == "run")
        .map(|(i, _)| *i)
        .collect()
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => Just(Step::Plain),
        2 => Just(Step::Wrap),
        1 => Just(Step::Abort),
    ]
}

proptest! {
    #[test]
    fn every_handler_runs_once_in_order(
        steps in prop::collection::vec(prop_oneof![Just(Step::Plain), Just(Step::Wrap)], 0..=MAX_CHAIN_LEN)
    ) {
        let log = Log::default();
        let mut ctx = Context::for_chain(build(&steps, &log));
        ctx.advance();

        prop_assert_eq!(runs(&log), (0..steps.len()).collect::<Vec<_>>());
        prop_assert_eq!(usize::try_from(ctx.cursor()).unwrap(), steps.len());
        prop_assert!(!ctx.is_aborted());
        prop_assert!(!ctx.writer().written());
    }

    #[test]
    fn nothing_after_first_abort_runs(steps in prop::collection::vec(step(), 1..=MAX_CHAIN_LEN)) {
        let log = Log::default();
        let mut ctx = Context::for_chain(build(&steps, &log));
        ctx.advance();

        let expected_last = steps
            .iter()
            .position(|s| matches!(s, Step::Abort))
            .unwrap_or(steps.len() - 1);
        prop_assert_eq!(runs(&log), (0..=expected_last).collect::<Vec<_>>());

        let aborted = steps.iter().any(|s| matches!(s, Step::Abort));
        prop_assert_eq!(ctx.is_aborted(), aborted);
        if aborted {
            prop_assert_eq!(ctx.cursor(), ABORT_INDEX);
            prop_assert_eq!(ctx.writer().status(), 403);
        }
    }

    #[test]
    fn wrappers_resume_in_reverse_order(wraps in 1usize..=MAX_CHAIN_LEN) {
        let log = Log::default();
        let steps = vec![Step::Wrap; wraps];
        let mut ctx = Context::for_chain(build(&steps, &log));
        ctx.advance();

        let resumed: Vec<usize> = log
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, event)| *event == "resume")
            .map(|(i, _)| *i)
            .collect();
        prop_assert_eq!(resumed, (0..wraps).rev().collect::<Vec<_>>());
    }
}

#[test]
fn abort_from_deepest_wrapper_stops_everything() {
    let log = Log::default();
    let mut steps = vec![Step::Wrap; MAX_CHAIN_LEN - 2];
    steps.push(Step::Abort);
    steps.push(Step::Plain);

    let mut ctx = Context::for_chain(build(&steps, &log));
    ctx.advance();

    assert_eq!(runs(&log).len(), MAX_CHAIN_LEN - 1);
    assert!(ctx.is_aborted());
}
