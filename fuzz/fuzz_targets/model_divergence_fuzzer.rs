//! Fuzz target comparing the session driver against the reference model
//!
//! Coverage-guided counterpart of the model-based proptest suite: the fuzzer
//! explores operation sequences and the reference model is the oracle.
//!
//! # Invariants
//!
//! - Every operation has the same result in model and driver
//! - Observable state (snapshot, phase, tracked request, submissions, end
//!   reason) matches after every operation

#![no_main]

use credo_harness::{ModelSession, Operation, RealSession};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|ops: Vec<Operation>| {
    let mut model = ModelSession::new();
    let mut real = RealSession::new();

    for op in &ops {
        let expected = model.apply(op);
        let actual = real.apply(op);

        assert_eq!(expected, actual, "result diverged on {op:?}");
        assert_eq!(model.observe(), real.observe(), "state diverged after {op:?}");
    }
});
