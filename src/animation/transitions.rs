//! Transition driver: steps a [`TransitionRequest`] through time.
//!
//! Each transition runs as its own async task. Per step it evaluates the
//! easing curve, interpolates, hands the value to the sink and suspends until
//! the next frame deadline. Cancellation is cooperative: the task checks its
//! [`CancellationHandle`] before every delivery and wakes early from its
//! frame delay when cancelled.

use crate::animation::interpolation::{Interpolation, Value};
use crate::animation::tweening::{Sink, SinkError, StepPlan, TransitionRequest};
use crate::runtime::{self, AsyncHandle, AsyncSpawner};
use crate::{Error, Result};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Notify};
use tokio::time::Instant;

/// State of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// How a transition ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Every step ran and the exact end value was delivered
    Completed,
    Cancelled,
    /// The sink failed or panicked; treated like a cancellation
    Failed(String),
}

impl TransitionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TransitionOutcome::Completed)
    }

    /// `Err(Error::Cancelled)` or `Err(Error::Sink(_))` unless completed
    pub fn into_result(self) -> Result<()> {
        match self {
            TransitionOutcome::Completed => Ok(()),
            TransitionOutcome::Cancelled => Err(Error::Cancelled),
            TransitionOutcome::Failed(message) => Err(SinkError::new(message).into()),
        }
    }

    pub fn state(&self) -> TransitionState {
        match self {
            TransitionOutcome::Completed => TransitionState::Completed,
            TransitionOutcome::Cancelled | TransitionOutcome::Failed(_) => {
                TransitionState::Cancelled
            }
        }
    }
}

#[derive(Debug, Default)]
struct CancelSignal {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cooperative cancellation flag shared between a caller and a running transition
#[derive(Debug, Clone, Default)]
pub struct CancellationHandle {
    inner: Arc<CancelSignal>,
}

impl CancellationHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; idempotent and a no-op once the transition has finished
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::AcqRel) {
            self.inner.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Resolves once `cancel` has been called
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Running,
    Finished(TransitionOutcome),
}

/// Handle to an in-flight transition returned by [`TransitionDriver::start`]
pub struct RunningHandle {
    cancellation: CancellationHandle,
    phase: watch::Receiver<Phase>,
    task: Box<dyn AsyncHandle>,
}

impl RunningHandle {
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Whether cancellation was requested, not whether the task has observed it
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        matches!(*self.phase.borrow(), Phase::Finished(_)) || self.task.is_finished()
    }

    pub fn state(&self) -> TransitionState {
        match &*self.phase.borrow() {
            Phase::Running if self.task.is_finished() => TransitionState::Cancelled,
            Phase::Running => TransitionState::Running,
            Phase::Finished(outcome) => outcome.state(),
        }
    }

    pub fn outcome(&self) -> Option<TransitionOutcome> {
        match &*self.phase.borrow() {
            Phase::Finished(outcome) => Some(outcome.clone()),
            Phase::Running => None,
        }
    }

    pub fn cancellation(&self) -> &CancellationHandle {
        &self.cancellation
    }

    /// Wait until the task has stopped delivering values
    pub async fn wait(&self) -> TransitionOutcome {
        let mut phase = self.phase.clone();
        loop {
            if let Phase::Finished(outcome) = &*phase.borrow_and_update() {
                return outcome.clone();
            }
            if phase.changed().await.is_err() {
                // Task dropped without publishing, e.g. aborted by its spawner
                return match &*phase.borrow() {
                    Phase::Finished(outcome) => outcome.clone(),
                    Phase::Running => TransitionOutcome::Cancelled,
                };
            }
        }
    }

    /// Cancel and wait for the task to observe it.
    ///
    /// Returns `Completed` if the transition had already finished normally.
    pub async fn cancel_and_wait(&self) -> TransitionOutcome {
        self.cancel();
        self.wait().await
    }
}

impl fmt::Debug for RunningHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunningHandle")
            .field("state", &self.state())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Starts transitions on a spawner
#[derive(Clone, Default)]
pub struct TransitionDriver {
    spawner: Option<Arc<dyn AsyncSpawner>>,
}

impl TransitionDriver {
    /// Driver using the global runtime
    pub fn new() -> Self {
        Self { spawner: None }
    }

    pub fn with_spawner(spawner: Arc<dyn AsyncSpawner>) -> Self {
        Self {
            spawner: Some(spawner),
        }
    }

    /// Run every synchronous check `start` performs, without starting anything
    pub fn validate(request: &TransitionRequest) -> Result<()> {
        request.spec.validate()?;
        Interpolation::check_compatible(&request.start_value, &request.end_value)?;
        Ok(())
    }

    /// Validate `request` and spawn its step loop.
    ///
    /// Invalid timing, degenerate curves and mismatched or unsupported value
    /// kinds are rejected here, before any value is delivered.
    pub fn start(&self, request: TransitionRequest) -> Result<RunningHandle> {
        Self::validate(&request)?;

        let plan = StepPlan::new(&request.spec);
        log::debug!(
            "starting {} transition: {}ms at {}fps, {} steps, easing {}",
            request.start_value.kind(),
            request.spec.duration_ms,
            request.spec.frames_per_second,
            plan.step_count(),
            if request.use_easing { "on" } else { "off" },
        );

        let cancellation = request.cancellation.clone();
        let (phase_tx, phase_rx) = watch::channel(Phase::Running);
        let job = StepLoop { plan, request };

        let future = Box::pin(async move {
            let outcome = job.run().await;
            phase_tx.send_replace(Phase::Finished(outcome));
        });
        let task = match &self.spawner {
            Some(spawner) => spawner.spawn_boxed(future),
            None => runtime::runtime().spawn_boxed(future),
        };

        Ok(RunningHandle {
            cancellation,
            phase: phase_rx,
            task,
        })
    }
}

impl fmt::Debug for TransitionDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionDriver")
            .field("custom_spawner", &self.spawner.is_some())
            .finish()
    }
}

struct StepLoop {
    plan: StepPlan,
    request: TransitionRequest,
}

impl StepLoop {
    async fn run(mut self) -> TransitionOutcome {
        let origin = Instant::now();
        let cancellation = self.request.cancellation.clone();

        for step in 0..self.plan.step_count() {
            if cancellation.is_cancelled() {
                return Self::cancelled(step);
            }

            let x = self.plan.fraction(step);
            let y = self.request.progress_at(x);
            let value = Interpolation::lerp_unchecked(
                &self.request.start_value,
                &self.request.end_value,
                y,
            );
            log::trace!("step {} x={:.4} y={:.4} -> {:?}", step, x, y, value);
            if let Err(outcome) = deliver(&mut self.request.sink, value) {
                return outcome;
            }

            if cancellation.is_cancelled() {
                return Self::cancelled(step + 1);
            }
            let deadline = origin + self.plan.offset(step + 1);
            tokio::select! {
                _ = runtime::delay_until(deadline) => {}
                _ = cancellation.cancelled() => return Self::cancelled(step + 1),
            }
        }

        if cancellation.is_cancelled() {
            return Self::cancelled(self.plan.step_count());
        }
        let end = self.request.end_value.clone();
        if let Err(outcome) = deliver(&mut self.request.sink, end) {
            return outcome;
        }
        log::debug!("transition completed after {} steps", self.plan.step_count());
        TransitionOutcome::Completed
    }

    fn cancelled(step: usize) -> TransitionOutcome {
        log::debug!("transition cancelled before step {}", step);
        TransitionOutcome::Cancelled
    }
}

/// Hand `value` to the sink, converting errors and panics into a failed outcome
fn deliver(sink: &mut Sink, value: Value) -> std::result::Result<(), TransitionOutcome> {
    match panic::catch_unwind(AssertUnwindSafe(|| sink(value))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => {
            log::warn!("transition sink failed: {}", err);
            Err(TransitionOutcome::Failed(err.to_string()))
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "sink panicked".to_string());
            log::warn!("transition sink panicked: {}", message);
            Err(TransitionOutcome::Failed(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::curve::EasingCurve;
    use crate::animation::tweening::AnimationSpec;
    use crate::core::geo::Color;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    type Log = Arc<Mutex<Vec<(Duration, Value)>>>;

    fn recording_request(
        start: impl Into<Value>,
        end: impl Into<Value>,
        spec: AnimationSpec,
    ) -> (TransitionRequest, Log) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let sink_log = log.clone();
        let origin = Instant::now();
        let request = TransitionRequest::new(start, end, spec, move |value| {
            sink_log.lock().unwrap().push((origin.elapsed(), value));
        });
        (request, log)
    }

    fn scalars(log: &Log) -> Vec<f64> {
        log.lock()
            .unwrap()
            .iter()
            .map(|(_, v)| v.as_scalar().unwrap())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_linear_scalar_lands_exactly() {
        let (request, log) = recording_request(0.0, 100.0, AnimationSpec::linear(100, 100));
        let handle = TransitionDriver::new().start(request.linear()).unwrap();

        assert_eq!(handle.wait().await, TransitionOutcome::Completed);
        assert_eq!(handle.state(), TransitionState::Completed);

        let values = scalars(&log);
        assert_eq!(values.len(), 11);
        for (i, value) in values.iter().enumerate() {
            assert!((value - i as f64 * 10.0).abs() < 1e-9, "{:?}", values);
        }
        assert_eq!(*values.last().unwrap(), 100.0);

        let times: Vec<Duration> = log.lock().unwrap().iter().map(|(t, _)| *t).collect();
        assert_eq!(times[0], Duration::ZERO);
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
        assert!(times[10] >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_color_transition_step_count() {
        let spec = AnimationSpec::new(150, 30, EasingCurve::ease());
        let (request, log) = recording_request(Color::WHITE, Color::BLACK, spec);
        let handle = TransitionDriver::new().start(request).unwrap();
        assert!(handle.wait().await.is_completed());

        let values: Vec<Value> = log.lock().unwrap().iter().map(|(_, v)| v.clone()).collect();
        assert_eq!(values.len(), 6);
        assert_eq!(values[0], Value::Color(Color::WHITE));
        assert_eq!(values[5], Value::Color(Color::BLACK));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_delivery() {
        let (request, log) = recording_request(0.0, 100.0, AnimationSpec::linear(500, 100));
        let handle = TransitionDriver::new().start(request.linear()).unwrap();

        tokio::time::sleep(Duration::from_millis(55)).await;
        let delivered = log.lock().unwrap().len();
        assert_eq!(handle.cancel_and_wait().await, TransitionOutcome::Cancelled);
        assert_eq!(handle.state(), TransitionState::Cancelled);
        assert!(matches!(handle.wait().await.into_result(), Err(Error::Cancelled)));

        tokio::time::sleep(Duration::from_millis(600)).await;
        let values = scalars(&log);
        assert_eq!(values.len(), delivered);
        assert!(!values.contains(&100.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_first_step_delivers_nothing() {
        let (request, log) = recording_request(0.0, 1.0, AnimationSpec::linear(100, 60));
        request.cancellation.cancel();
        let handle = TransitionDriver::new().start(request).unwrap();
        assert_eq!(handle.wait().await, TransitionOutcome::Cancelled);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_completion_is_noop() {
        let (request, log) = recording_request(0.0, 1.0, AnimationSpec::linear(50, 60));
        let handle = TransitionDriver::new().start(request).unwrap();
        assert!(handle.wait().await.is_completed());
        let before = log.lock().unwrap().len();

        assert_eq!(handle.cancel_and_wait().await, TransitionOutcome::Completed);
        assert_eq!(handle.state(), TransitionState::Completed);
        assert_eq!(log.lock().unwrap().len(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_synchronous_rejections() {
        let driver = TransitionDriver::new();

        let (request, _) = recording_request(0.0, 1.0, AnimationSpec::linear(0, 60));
        assert!(matches!(driver.start(request), Err(Error::InvalidSpec(_))));

        let (request, _) = recording_request(0.0, 1.0, AnimationSpec::linear(100, 0));
        assert!(matches!(driver.start(request), Err(Error::InvalidSpec(_))));

        let (request, _) = recording_request(0.0, Color::BLACK, AnimationSpec::linear(100, 60));
        assert!(matches!(
            driver.start(request),
            Err(Error::MismatchedValueKind { .. })
        ));

        let nested = Value::pair(Value::pair(0.0, 1.0), 1.0);
        let (request, _) = recording_request(nested.clone(), nested, AnimationSpec::linear(100, 60));
        assert!(matches!(
            driver.start(request),
            Err(Error::UnsupportedValueKind(_))
        ));

        let degenerate: EasingCurve = serde_json::from_str(r#"{"points":[]}"#).unwrap();
        let spec = AnimationSpec::new(100, 60, degenerate);
        let (request, _) = recording_request(0.0, 1.0, spec);
        assert!(matches!(
            driver.start(request),
            Err(Error::CurveDegenerate(0))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_error_fails_without_landing() {
        let delivered = Arc::new(AtomicUsize::new(0));
        let counter = delivered.clone();
        let request = TransitionRequest::fallible(0.0, 1.0, AnimationSpec::linear(100, 100), move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 3 {
                Err(SinkError::new("control disposed"))
            } else {
                Ok(())
            }
        });
        let handle = TransitionDriver::new().start(request).unwrap();

        assert_eq!(
            handle.wait().await,
            TransitionOutcome::Failed("control disposed".to_string())
        );
        assert_eq!(handle.state(), TransitionState::Cancelled);
        assert_eq!(delivered.load(Ordering::SeqCst), 4);
        assert!(matches!(
            handle.wait().await.into_result(),
            Err(Error::Sink(SinkError(message))) if message == "control disposed"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_panic_is_contained() {
        let driver = TransitionDriver::new();
        let request = TransitionRequest::new(0.0, 1.0, AnimationSpec::linear(100, 60), |_| {
            panic!("boom");
        });
        let failing = driver.start(request).unwrap();

        let (request, log) = recording_request(0.0, 1.0, AnimationSpec::linear(100, 60));
        let sibling = driver.start(request).unwrap();

        assert_eq!(failing.wait().await, TransitionOutcome::Failed("boom".to_string()));
        assert!(sibling.wait().await.is_completed());
        assert_eq!(scalars(&log).last().copied(), Some(1.0));
    }

    struct CountingSpawner(AtomicUsize);

    impl AsyncSpawner for CountingSpawner {
        fn spawn_boxed(
            &self,
            future: futures::future::BoxFuture<'static, ()>,
        ) -> Box<dyn AsyncHandle> {
            self.0.fetch_add(1, Ordering::SeqCst);
            runtime::spawners::tokio_impl::TokioSpawner.spawn_boxed(future)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_spawner_runs_transitions() {
        let spawner = Arc::new(CountingSpawner(AtomicUsize::new(0)));
        let driver = TransitionDriver::with_spawner(spawner.clone());
        let (request, _) = recording_request(0.0, 1.0, AnimationSpec::linear(20, 60));
        let handle = driver.start(request).unwrap();
        assert!(handle.wait().await.is_completed());
        assert_eq!(spawner.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_task_reports_cancelled() {
        let (request, log) = recording_request(0.0, 1.0, AnimationSpec::linear(1000, 10));
        let handle = TransitionDriver::new().start(request).unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        handle.task.cancel();

        assert_eq!(handle.wait().await, TransitionOutcome::Cancelled);
        assert_eq!(handle.state(), TransitionState::Cancelled);
        assert_eq!(scalars(&log), vec![0.0]);
    }
}
