//! Property tests for running and unwinding scripts.
//!
//! 1. n increments resolve to n.
//! 2. Cancelling at position k undoes exactly the k actions before it, newest
//!    first, and never touches anything after it.
//! 3. An `if` runs exactly one branch, a `while` runs until its condition fails.

use duskwolf::script::{Action, Actions, Runner};
use duskwolf::{Fault, RunError};
use futures::executor::block_on;
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

fn inc() -> Action<i32> {
    Runner::action("inc", |v: i32, _| Ok(v + 1)).into()
}

fn logged(i: usize, log: &Log) -> Action<i32> {
    let fwd = log.clone();
    let inv = log.clone();
    Runner::action(format!("step {}", i), move |v: i32, _| {
        fwd.borrow_mut().push(format!("+{}", i));
        Ok(v + 1)
    })
    .inverse(move |_| {
        inv.borrow_mut().push(format!("-{}", i));
        Err(Fault::cancel())
    })
    .into()
}

proptest! {
    #[test]
    fn increments_resolve_to_their_count(n in 0usize..40, init in -100i32..100) {
        let mut runner = Runner::new((0..n).map(|_| inc()).collect());
        prop_assert_eq!(block_on(runner.start(init)).ok(), Some(init + n as i32));
    }
}

proptest! {
    #[test]
    fn cancel_undoes_its_predecessors_newest_first(n in 1usize..12, k in 0usize..12) {
        let k = k % n;
        let log: Log = Rc::default();
        let mut script: Vec<Action<i32>> = (0..n).map(|i| logged(i, &log)).collect();
        script.insert(k, Runner::cancel());

        let result = block_on(Runner::new(script).start(0));
        prop_assert!(matches!(result, Err(RunError::Canceled(_))));

        let mut expected: Vec<String> = (0..k).map(|i| format!("+{}", i)).collect();
        expected.extend((0..k).rev().map(|i| format!("-{}", i)));
        prop_assert_eq!(log.borrow().clone(), expected);
    }
}

proptest! {
    #[test]
    fn if_and_while_follow_their_conditions(init in -20i32..20, limit in -20i32..20) {
        let branch = vec![Actions::if_(move |v: &i32| *v > limit, vec![inc()], vec![inc(), inc()])];
        let got = block_on(Runner::new(branch).start(init)).ok();
        prop_assert_eq!(got, Some(if init > limit { init + 1 } else { init + 2 }));

        let looped = vec![Actions::while_(move |v: &i32| *v < limit, vec![inc()])];
        let got = block_on(Runner::new(looped).start(init)).ok();
        prop_assert_eq!(got, Some(init.max(limit)));
    }
}
