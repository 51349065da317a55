//! FlowController owns one flow instance: step index, answers, phase
//! gating, and the timed submission that produces the outcome.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{RwLock, broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::capabilities::{Clock, NotificationPermission, SystemClock};
use crate::error::FlowError;
use crate::store::{KeyValueStore, StoredValue};

use super::answer::{Answer, AnswerSet};
use super::finisher::{FlowFinisher, FlowOutcome};
use super::state::{FlowPhase, FlowState};
use super::step::{Step, StepSequence};

/// Default broadcast channel capacity.
const DEFAULT_EVENT_CAPACITY: usize = 16;

/// Answer values recorded on a permission step.
pub const PERMISSION_GRANTED: &str = "granted";
pub const PERMISSION_DENIED: &str = "denied";

/// External capabilities a controller talks to.
#[derive(Clone)]
pub struct FlowDeps {
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
    /// Only needed by flows with a permission step.
    pub permission: Option<Arc<dyn NotificationPermission>>,
}

impl FlowDeps {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            permission: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_permission(mut self, permission: Arc<dyn NotificationPermission>) -> Self {
        self.permission = Some(permission);
        self
    }
}

/// Outbound signal to the presentation layer. Sent once per flow.
#[derive(Debug, Clone)]
pub enum FlowEvent {
    Completed { flow_id: Uuid, outcome: FlowOutcome },
    /// The finisher hit an invariant violation. The flow stays in
    /// `Submitting` and will not complete.
    Failed { flow_id: Uuid, reason: String },
}

/// Result of an `advance()` intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved forward to the given step index.
    Moved(usize),
    /// The current step is missing a required answer. Nothing changed.
    Blocked,
    /// The last step was passed; submission is scheduled.
    Submitting,
}

/// Serializable view of the flow for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct FlowSnapshot {
    pub flow_id: Uuid,
    pub flow: String,
    pub phase: FlowPhase,
    /// Content step index, or a reserved index past the sequence for the
    /// Loading (`step_count`) and Results (`step_count + 1`) pseudo-steps.
    pub step_index: usize,
    pub step_count: usize,
    pub step: Step,
    pub can_advance: bool,
    pub can_retreat: bool,
    pub answers: AnswerSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<FlowOutcome>,
}

/// Drives one guided flow.
///
/// Intents are expected serially from a single UI loop. State sits behind a
/// lock only because the submission task writes the outcome back.
pub struct FlowController {
    id: Uuid,
    name: String,
    sequence: Arc<StepSequence>,
    finisher: Arc<dyn FlowFinisher>,
    deps: FlowDeps,
    submission_delay: Duration,
    loading_step: Step,
    results_step: Step,
    state: Arc<RwLock<FlowState>>,
    events: broadcast::Sender<FlowEvent>,
    writer: Writer,
    submission: Mutex<Option<JoinHandle<()>>>,
}

impl FlowController {
    /// Must be called from within a tokio runtime: the controller starts
    /// its background writer here.
    pub fn new(
        name: impl Into<String>,
        sequence: Arc<StepSequence>,
        finisher: Arc<dyn FlowFinisher>,
        deps: FlowDeps,
    ) -> Self {
        let (events, _rx) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        let writer = Writer::spawn(Arc::clone(&deps.store));
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            sequence,
            finisher,
            deps,
            submission_delay: Duration::from_secs(2),
            loading_step: Step::loading("Analyzing"),
            results_step: Step::results("Results"),
            state: Arc::new(RwLock::new(FlowState::default())),
            events,
            writer,
            submission: Mutex::new(None),
        }
    }

    pub fn with_submission_delay(mut self, delay: Duration) -> Self {
        self.submission_delay = delay;
        self
    }

    /// Override the pseudo-steps shown while submitting and once complete.
    pub fn with_terminal_steps(mut self, loading: Step, results: Step) -> Self {
        self.loading_step = loading;
        self.results_step = results;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sequence(&self) -> &StepSequence {
        &self.sequence
    }

    /// Subscribe to completion events. Subscribe before the final
    /// `advance()`; events sent earlier are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<FlowEvent> {
        self.events.subscribe()
    }

    pub async fn phase(&self) -> FlowPhase {
        self.state.read().await.phase
    }

    /// Step index as the presentation layer sees it, including the reserved
    /// Loading/Results indices.
    pub async fn current_index(&self) -> usize {
        let state = self.state.read().await;
        self.display_index(&state)
    }

    /// The step to render right now (a pseudo-step once submitting).
    pub async fn current_step(&self) -> Step {
        let state = self.state.read().await;
        self.display_step(&state)
    }

    pub async fn answers(&self) -> AnswerSet {
        self.state.read().await.answers.clone()
    }

    pub async fn outcome(&self) -> Option<FlowOutcome> {
        self.state.read().await.outcome.clone()
    }

    /// Whether the forward action should be enabled.
    pub async fn can_advance(&self) -> bool {
        let state = self.state.read().await;
        state.phase.accepts_input() && self.sequence.is_satisfied(state.current_step, &state.answers)
    }

    pub async fn can_retreat(&self) -> bool {
        let state = self.state.read().await;
        state.phase.accepts_input() && state.current_step > 0
    }

    pub async fn snapshot(&self) -> FlowSnapshot {
        let state = self.state.read().await;
        let accepts = state.phase.accepts_input();
        FlowSnapshot {
            flow_id: self.id,
            flow: self.name.clone(),
            phase: state.phase,
            step_index: self.display_index(&state),
            step_count: self.sequence.step_count(),
            step: self.display_step(&state),
            can_advance: accepts && self.sequence.is_satisfied(state.current_step, &state.answers),
            can_retreat: accepts && state.current_step > 0,
            answers: state.answers.clone(),
            outcome: state.outcome.clone(),
        }
    }

    /// Record an answer for `step_id`. Overwrites any previous answer and
    /// never moves the flow.
    pub async fn set_answer(&self, step_id: &str, answer: Answer) -> Result<(), FlowError> {
        let step = {
            let mut state = self.state.write().await;
            self.check_accepts(&state, "set answer")?;

            let step = self
                .sequence
                .get(step_id)
                .ok_or_else(|| FlowError::UnknownStep(step_id.to_string()))?;
            step.accepts(&answer)?;

            state.answers.insert(step_id, answer.clone());
            debug!(flow = %self.name, step = %step_id, "Answer recorded");
            step
        };

        if step.persist_immediately {
            if let Some(key) = step.storage_key.as_deref() {
                self.writer.write(key, StoredValue::from(&answer));
            }
        }
        Ok(())
    }

    /// Move forward one step, or start submission from the last step.
    ///
    /// A missing required answer is not an error: the call returns
    /// `Advance::Blocked` and leaves everything as it was.
    pub async fn advance(&self) -> Result<Advance, FlowError> {
        if let Some(step) = self.claim_permission_step().await? {
            self.request_permission(step).await;
        }

        let mut state = self.state.write().await;
        self.check_accepts(&state, "advance")?;

        let index = state.current_step;
        if !self.sequence.is_satisfied(index, &state.answers) {
            debug!(flow = %self.name, step = index, "Advance blocked by missing answer");
            return Ok(Advance::Blocked);
        }

        if index < self.sequence.last_index() {
            state.current_step = index + 1;
            debug!(flow = %self.name, step = index + 1, "Advanced");
            return Ok(Advance::Moved(index + 1));
        }

        state.transition_to(FlowPhase::Submitting)?;
        info!(
            flow = %self.name,
            flow_id = %self.id,
            delay_ms = self.submission_delay.as_millis() as u64,
            "Flow submitting"
        );
        drop(state);

        self.submit();
        Ok(Advance::Submitting)
    }

    /// Go back one step. Returns the new index; a no-op at the first step.
    pub async fn retreat(&self) -> Result<usize, FlowError> {
        let mut state = self.state.write().await;
        self.check_accepts(&state, "retreat")?;

        if state.current_step > 0 {
            state.current_step -= 1;
            debug!(flow = %self.name, step = state.current_step, "Retreated");
        }
        Ok(state.current_step)
    }

    /// Wait until every write queued so far has been attempted. Writes are
    /// otherwise fire-and-forget; call this before shutting down.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    /// Abort a pending submission and consume the controller. No event is
    /// sent and nothing further is persisted.
    pub fn dispose(self) {
        // Drop does the work.
    }

    fn check_accepts(&self, state: &FlowState, intent: &str) -> Result<(), FlowError> {
        state.ensure_accepts(intent).inspect_err(|e| {
            warn!(flow = %self.name, error = %e, "Intent rejected");
        })
    }

    fn display_index(&self, state: &FlowState) -> usize {
        match state.phase {
            FlowPhase::InProgress => state.current_step,
            FlowPhase::Submitting => self.sequence.step_count(),
            FlowPhase::Completed => self.sequence.step_count() + 1,
        }
    }

    fn display_step(&self, state: &FlowState) -> Step {
        match state.phase {
            FlowPhase::InProgress => self
                .sequence
                .step_at(state.current_step)
                .cloned()
                .unwrap_or_else(|_| self.loading_step.clone()),
            FlowPhase::Submitting => self.loading_step.clone(),
            FlowPhase::Completed => self.results_step.clone(),
        }
    }

    /// The current step if it still has to ask for permission. Marks the
    /// request as made so it runs at most once per flow.
    async fn claim_permission_step(&self) -> Result<Option<&Step>, FlowError> {
        let mut state = self.state.write().await;
        self.check_accepts(&state, "advance")?;

        let index = state.current_step;
        if state.permission_requested || !self.sequence.is_satisfied(index, &state.answers) {
            return Ok(None);
        }
        let step = self.sequence.step_at(index)?;
        if !step.requests_permission {
            return Ok(None);
        }
        state.permission_requested = true;
        Ok(Some(step))
    }

    /// Ask the capability with no lock held, then record the result.
    async fn request_permission(&self, step: &Step) {
        let granted = match &self.deps.permission {
            Some(permission) => permission.request().await,
            None => {
                warn!(flow = %self.name, "No permission capability configured; treating as denied");
                false
            }
        };
        info!(flow = %self.name, step = %step.id, granted, "Notification permission resolved");

        let value = if granted {
            PERMISSION_GRANTED
        } else {
            PERMISSION_DENIED
        };
        self.state
            .write()
            .await
            .answers
            .insert(step.id.clone(), Answer::choice(value));

        if let Some(key) = step.storage_key.as_deref() {
            self.writer.write(key, StoredValue::Flag(granted));
        }
    }

    /// Spawn the timed submission task. Only the first call schedules
    /// anything.
    fn submit(&self) {
        let mut slot = self
            .submission
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.is_some() {
            return;
        }

        let task = SubmissionTask {
            flow_id: self.id,
            name: self.name.clone(),
            delay: self.submission_delay,
            sequence: Arc::clone(&self.sequence),
            finisher: Arc::clone(&self.finisher),
            clock: Arc::clone(&self.deps.clock),
            state: Arc::clone(&self.state),
            events: self.events.clone(),
            writer: self.writer.clone(),
        };
        *slot = Some(tokio::spawn(task.run()));
    }
}

impl Drop for FlowController {
    fn drop(&mut self) {
        let slot = self
            .submission
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = slot.take() {
            if !handle.is_finished() {
                debug!(flow = %self.name, flow_id = %self.id, "Cancelling pending submission");
            }
            handle.abort();
        }
    }
}

/// Everything the background submission needs, moved into the task.
struct SubmissionTask {
    flow_id: Uuid,
    name: String,
    delay: Duration,
    sequence: Arc<StepSequence>,
    finisher: Arc<dyn FlowFinisher>,
    clock: Arc<dyn Clock>,
    state: Arc<RwLock<FlowState>>,
    events: broadcast::Sender<FlowEvent>,
    writer: Writer,
}

impl SubmissionTask {
    async fn run(self) {
        tokio::time::sleep(self.delay).await;

        let answers = self.state.read().await.answers.clone();
        let completion = match self.finisher.finish(&answers, self.clock.now()) {
            Ok(completion) => completion,
            Err(e) => {
                error!(flow = %self.name, flow_id = %self.flow_id, error = %e, "Flow finisher failed");
                let _ = self.events.send(FlowEvent::Failed {
                    flow_id: self.flow_id,
                    reason: e.to_string(),
                });
                return;
            }
        };

        {
            let mut state = self.state.write().await;
            if let Err(e) = state.transition_to(FlowPhase::Completed) {
                error!(flow = %self.name, error = %e, "Flow could not complete");
                return;
            }
            state.outcome = Some(completion.outcome.clone());
        }

        // Batched write of everything not already persisted on entry. Queued
        // only, so a slow store never delays the notification.
        for step in self.sequence.steps() {
            if !step.kind.is_question() || step.persist_immediately {
                continue;
            }
            let (Some(key), Some(answer)) = (step.storage_key.as_deref(), answers.get(&step.id))
            else {
                continue;
            };
            if !answer.is_empty() {
                self.writer.write(key, StoredValue::from(answer));
            }
        }
        for (key, value) in completion.records {
            self.writer.write(&key, value);
        }

        info!(flow = %self.name, flow_id = %self.flow_id, "Flow completed");
        // Ok if nobody is listening
        let _ = self.events.send(FlowEvent::Completed {
            flow_id: self.flow_id,
            outcome: completion.outcome,
        });
    }
}

enum WriteOp {
    Set(String, StoredValue),
    Flush(oneshot::Sender<()>),
}

/// Detached, in-order writer. Callers queue a value and move on; failures
/// are logged, never surfaced to the flow. Queued writes still land after
/// the controller is dropped.
#[derive(Clone)]
struct Writer {
    tx: mpsc::UnboundedSender<WriteOp>,
}

impl Writer {
    fn spawn(store: Arc<dyn KeyValueStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(op) = rx.recv().await {
                match op {
                    WriteOp::Set(key, value) => {
                        if let Err(e) = store.set(&key, value).await {
                            warn!(key = %key, error = %e, "Failed to persist flow value");
                        }
                    }
                    WriteOp::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });
        Self { tx }
    }

    fn write(&self, key: &str, value: StoredValue) {
        if self.tx.send(WriteOp::Set(key.to_string(), value)).is_err() {
            warn!(key, "Flow writer stopped; value dropped");
        }
    }

    async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(WriteOp::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}
