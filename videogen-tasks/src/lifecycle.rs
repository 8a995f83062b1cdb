use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::consts::{STANDARD_POLL_INTERVAL, THROTTLED_POLL_INTERVAL};
use crate::models::ProviderAdapter;
use crate::normalizer::{classify, describe};
use crate::registry::TaskRegistry;
use crate::types::{GenerationRequest, Outcome, TaskId, TaskState};
use crate::VideoGenError;

/// Wait step between polls. Injected so tests can run without wall-clock delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}

/// Delay before the next poll, per non-terminal state
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaitPolicy {
    /// After `Pending` or `Running`
    pub standard_interval: Duration,
    /// After `Throttled`
    pub throttled_interval: Duration,
    /// Give up after this many fetches. `None` polls until a terminal state.
    pub max_polls: Option<u32>,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            standard_interval: STANDARD_POLL_INTERVAL,
            throttled_interval: THROTTLED_POLL_INTERVAL,
            max_polls: None,
        }
    }
}

impl WaitPolicy {
    /// `None` for terminal states
    pub fn wait_for(&self, state: &TaskState) -> Option<Duration> {
        match state {
            TaskState::Pending | TaskState::Running { .. } => Some(self.standard_interval),
            TaskState::Throttled => Some(self.throttled_interval),
            TaskState::Succeeded { .. } | TaskState::Failed { .. } => None,
        }
    }
}

/// Drives tasks from creation to a terminal outcome
///
/// Each `poll_until_terminal` call is an independent future; any number may run
/// concurrently. The only state they share is the [`TaskRegistry`].
pub struct LifecycleController {
    adapter: Arc<dyn ProviderAdapter>,
    registry: Arc<TaskRegistry>,
    sleeper: Arc<dyn Sleeper>,
    policy: WaitPolicy,
}

impl LifecycleController {
    pub fn new(adapter: Arc<dyn ProviderAdapter>) -> Self {
        Self {
            adapter,
            registry: Arc::new(TaskRegistry::new()),
            sleeper: Arc::new(TokioSleeper),
            policy: WaitPolicy::default(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_registry(mut self, registry: Arc<TaskRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn adapter(&self) -> &Arc<dyn ProviderAdapter> {
        &self.adapter
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    pub fn wait_policy(&self) -> &WaitPolicy {
        &self.policy
    }

    pub async fn create_task(&self, request: &GenerationRequest) -> Result<TaskId, VideoGenError> {
        let id = self.adapter.submit(request).await?;
        log::info!(
            "Created {} task {id} with model {}",
            self.adapter.provider(),
            self.adapter.model_id()
        );
        Ok(id)
    }

    /// Poll `id` until it succeeds, fails or is cancelled
    ///
    /// Fetches are strictly sequential. Transport and decoding errors end the
    /// poll immediately; they are not retried.
    pub async fn poll_until_terminal(&self, id: &TaskId) -> Result<Outcome, VideoGenError> {
        let tracked = self.registry.track(id.clone());
        let mut polls: u32 = 0;

        loop {
            if tracked.is_cancelled() {
                log::warn!("Stopped polling task {id}: cancelled");
                return Err(VideoGenError::Cancelled(id.clone()));
            }
            if let Some(max_polls) = self.policy.max_polls {
                if polls >= max_polls {
                    log::warn!("Stopped polling task {id} after {polls} polls");
                    return Err(VideoGenError::PollLimitExceeded {
                        id: id.clone(),
                        polls,
                    });
                }
            }

            polls += 1;
            let status = self.adapter.fetch_status(id).await.inspect_err(|e| {
                log::error!("Polling task {id} failed: {e}");
            })?;
            log::debug!("Poll #{polls}: {}", describe(&status));

            let Some(wait) = self.policy.wait_for(&status.state) else {
                let outcome = classify(&status, self.adapter.output_kind());
                match &outcome {
                    Ok(outcome) => log::info!("Task {id} succeeded: {}", outcome.video_url()),
                    Err(e) => log::warn!("Task {id} failed: {e}"),
                }
                return outcome;
            };

            tokio::select! {
                biased;
                _ = tracked.cancelled() => {}
                _ = self.sleeper.sleep(wait) => {}
            }
        }
    }

    /// Create a task and wait for its outcome
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Outcome, VideoGenError> {
        let id = self.create_task(request).await?;
        self.poll_until_terminal(&id).await
    }

    /// Request cancellation of the poll tracked for `id`. No-op if none is.
    pub fn cancel(&self, id: &TaskId) {
        if !self.registry.cancel(id) {
            log::debug!("Cancel requested for untracked task {id}");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::types::{OutputKind, TaskStatus, VideoGenProvider};

    /// Records requested waits and returns immediately
    #[derive(Default)]
    pub struct RecordingSleeper {
        waits: Mutex<Vec<Duration>>,
        on_sleep: Mutex<Option<Box<dyn FnMut(usize) + Send>>>,
    }

    impl RecordingSleeper {
        pub fn new() -> Self {
            Self::default()
        }

        /// Run `hook` with the zero-based index of every sleep, before it returns
        pub fn on_sleep(self, hook: impl FnMut(usize) + Send + 'static) -> Self {
            *self.on_sleep.lock().unwrap() = Some(Box::new(hook));
            self
        }

        pub fn waits(&self) -> Vec<Duration> {
            self.waits.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            let index = {
                let mut waits = self.waits.lock().unwrap();
                waits.push(duration);
                waits.len() - 1
            };
            if let Some(hook) = self.on_sleep.lock().unwrap().as_mut() {
                hook(index);
            }
            tokio::task::yield_now().await;
        }
    }

    type Script = VecDeque<Result<TaskState, VideoGenError>>;

    /// Adapter replaying scripted states. Tasks without a script of their own
    /// share the default one.
    ///
    /// Every fetch yields once while it is in flight and counts overlapping
    /// fetches for the same id.
    pub struct ScriptedAdapter {
        script: Mutex<Script>,
        per_task: Mutex<HashMap<TaskId, Script>>,
        fetches: AtomicUsize,
        submits: AtomicUsize,
        in_flight: Mutex<HashMap<TaskId, usize>>,
        overlapping: AtomicUsize,
        peak_in_flight: AtomicUsize,
        kind: OutputKind,
    }

    impl ScriptedAdapter {
        pub fn new(states: Vec<TaskState>) -> Self {
            Self {
                script: Mutex::new(states.into_iter().map(Ok).collect()),
                per_task: Mutex::default(),
                fetches: AtomicUsize::new(0),
                submits: AtomicUsize::new(0),
                in_flight: Mutex::default(),
                overlapping: AtomicUsize::new(0),
                peak_in_flight: AtomicUsize::new(0),
                kind: OutputKind::VideoUrl,
            }
        }

        pub fn then_error(self, err: VideoGenError) -> Self {
            self.script.lock().unwrap().push_back(Err(err));
            self
        }

        pub fn with_task(self, id: &str, states: Vec<TaskState>) -> Self {
            self.per_task
                .lock()
                .unwrap()
                .insert(TaskId::from(id), states.into_iter().map(Ok).collect());
            self
        }

        pub fn with_kind(mut self, kind: OutputKind) -> Self {
            self.kind = kind;
            self
        }

        pub fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }

        pub fn submits(&self) -> usize {
            self.submits.load(Ordering::SeqCst)
        }

        /// Fetches that started while another fetch for the same id was in flight
        pub fn overlapping_fetches(&self) -> usize {
            self.overlapping.load(Ordering::SeqCst)
        }

        /// Most fetches in flight at once, across all ids
        pub fn peak_in_flight(&self) -> usize {
            self.peak_in_flight.load(Ordering::SeqCst)
        }

        fn enter(&self, id: &TaskId) {
            let mut in_flight = self.in_flight.lock().unwrap();
            let count = in_flight.entry(id.clone()).or_insert(0);
            *count += 1;
            if *count > 1 {
                self.overlapping.fetch_add(1, Ordering::SeqCst);
            }
            let total = in_flight.values().sum();
            self.peak_in_flight.fetch_max(total, Ordering::SeqCst);
        }

        fn leave(&self, id: &TaskId) {
            let mut in_flight = self.in_flight.lock().unwrap();
            if let Some(count) = in_flight.get_mut(id) {
                *count -= 1;
                if *count == 0 {
                    in_flight.remove(id);
                }
            }
        }
    }

    #[async_trait]
    impl ProviderAdapter for ScriptedAdapter {
        fn provider(&self) -> VideoGenProvider {
            VideoGenProvider::Runway
        }

        fn model_id(&self) -> &str {
            "scripted"
        }

        fn output_kind(&self) -> OutputKind {
            self.kind
        }

        async fn submit(&self, request: &GenerationRequest) -> Result<TaskId, VideoGenError> {
            self.validate(request)?;
            let n = self.submits.fetch_add(1, Ordering::SeqCst);
            Ok(TaskId::new(format!("scripted-{n}")))
        }

        async fn fetch_status(&self, id: &TaskId) -> Result<TaskStatus, VideoGenError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.enter(id);
            tokio::task::yield_now().await;
            self.leave(id);

            let next = match self.per_task.lock().unwrap().get_mut(id) {
                Some(script) => script.pop_front(),
                None => self.script.lock().unwrap().pop_front(),
            };

            let state = next.expect("fetched past the end of the script")?;
            Ok(TaskStatus::new(id.clone(), state))
        }
    }
}
