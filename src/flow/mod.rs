//! Guided flows: multi-step wizards with validation gating and a timed
//! submission phase.
//!
//! A flow is a `StepSequence` (configuration) driven by a `FlowController`
//! (state). When the user passes the last step the controller enters
//! `Submitting`, waits out the configured delay, runs the flow's
//! `FlowFinisher`, and broadcasts the outcome once.

pub mod answer;
pub mod controller;
pub mod finisher;
pub mod state;
pub mod step;

pub use answer::{Answer, AnswerSet};
pub use controller::{
    Advance, FlowController, FlowDeps, FlowEvent, FlowSnapshot, PERMISSION_DENIED,
    PERMISSION_GRANTED,
};
pub use finisher::{Completion, FlowFinisher, FlowOutcome};
pub use state::{FlowPhase, FlowState};
pub use step::{Step, StepKind, StepOption, StepSequence};
