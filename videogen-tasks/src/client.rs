use std::sync::Arc;

use crate::config::{ConfigFromEnv, ProviderConfig};
use crate::lifecycle::{LifecycleController, Sleeper, WaitPolicy};
use crate::models::{build_adapter, ProviderAdapter};
use crate::normalizer::describe;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{GenerationRequest, Outcome, TaskId, TaskStatus, VideoGenProvider};
use crate::VideoGenError;

/// Entry point for creating and following video generation tasks
pub struct VideoGenClient {
    controller: LifecycleController,
}

impl VideoGenClient {
    pub fn new(adapter: Arc<dyn ProviderAdapter>) -> Self {
        Self {
            controller: LifecycleController::new(adapter),
        }
    }

    /// Client for `provider` configured from `{PREFIX}_*` environment variables
    pub fn from_env(provider: VideoGenProvider) -> Result<Self, VideoGenError> {
        let config = provider.config_from_env()?;
        Ok(Self::from_config(
            provider,
            config,
            Arc::new(ReqwestTransport::new()),
        ))
    }

    pub fn from_config(
        provider: VideoGenProvider,
        config: ProviderConfig,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self::new(build_adapter(provider, config, transport))
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.controller = self.controller.with_sleeper(sleeper);
        self
    }

    pub fn with_wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.controller = self.controller.with_wait_policy(policy);
        self
    }

    pub fn provider(&self) -> VideoGenProvider {
        self.controller.adapter().provider()
    }

    /// Validate `request` and submit it. No network call is made for an invalid request.
    pub async fn create_task(&self, request: &GenerationRequest) -> Result<TaskId, VideoGenError> {
        self.controller.create_task(request).await
    }

    /// Wait for `id` to reach a terminal state
    ///
    /// Polls every 5 seconds, or 10 while the provider reports the task as
    /// throttled. Resolves to [`VideoGenError::Cancelled`] if [`Self::cancel`]
    /// is called for `id` in the meantime, or if another poll for the same id
    /// starts.
    pub async fn poll_until_terminal(&self, id: &TaskId) -> Result<Outcome, VideoGenError> {
        self.controller.poll_until_terminal(id).await
    }

    /// [`Self::create_task`] followed by [`Self::poll_until_terminal`]
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Outcome, VideoGenError> {
        self.controller.generate(request).await
    }

    /// Stop polling `id`. Does not cancel the task on the provider.
    pub fn cancel(&self, id: &TaskId) {
        self.controller.cancel(id)
    }

    pub fn describe_status(&self, status: &TaskStatus) -> String {
        describe(status)
    }

    /// Fetch the current status once, without tracking or waiting
    pub async fn fetch_status(&self, id: &TaskId) -> Result<TaskStatus, VideoGenError> {
        self.controller.adapter().fetch_status(id).await
    }

    pub fn is_tracked(&self, id: &TaskId) -> bool {
        self.controller.registry().is_tracked(id)
    }

    pub fn tracked_count(&self) -> usize {
        self.controller.registry().tracked_count()
    }
}
