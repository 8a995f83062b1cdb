use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::consts::{RUNWAY_API_VERSION, RUNWAY_VERSION_HEADER};
use crate::image::image_reference;
use crate::models::{endpoint, ProviderAdapter};
use crate::transport::{HttpRequest, Transport};
use crate::types::{
    AspectRatio, GenerationMeta, GenerationRequest, OutputKind, TaskId, TaskState, TaskStatus,
    VideoGenProvider,
};
use crate::VideoGenError;

/// Runway image-to-video. Every call carries the pinned API version header.
pub struct RunwayAdapter {
    config: ProviderConfig,
    transport: Arc<dyn Transport>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageToVideoBody<'a> {
    model: &'a str,
    prompt_image: String,
    prompt_text: &'a str,
    ratio: &'static str,
    duration: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

#[derive(Deserialize)]
struct CreateResponse {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum RunwayTaskStatus {
    Pending,
    Throttled,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunwayTask {
    id: String,
    status: RunwayTaskStatus,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    output: Option<Vec<String>>,
    #[serde(default)]
    failure: Option<String>,
    #[serde(default)]
    failure_code: Option<String>,
}

impl RunwayTask {
    fn into_status(self) -> TaskStatus {
        let state = match self.status {
            RunwayTaskStatus::Pending => TaskState::Pending,
            RunwayTaskStatus::Throttled => TaskState::Throttled,
            RunwayTaskStatus::Running => TaskState::Running {
                progress: self.progress,
            },
            RunwayTaskStatus::Succeeded => TaskState::Succeeded {
                outputs: self.output.unwrap_or_default(),
            },
            RunwayTaskStatus::Failed => TaskState::Failed {
                reason: self
                    .failure
                    .unwrap_or_else(|| "Unknown failure".to_string()),
                code: self.failure_code,
            },
            RunwayTaskStatus::Cancelled => TaskState::Failed {
                reason: self
                    .failure
                    .unwrap_or_else(|| "Task was cancelled on the provider".to_string()),
                code: Some(self.failure_code.unwrap_or_else(|| "CANCELLED".to_string())),
            },
        };

        TaskStatus {
            id: TaskId::new(self.id),
            created_at: self.created_at,
            state,
            meta: GenerationMeta::default(),
        }
    }
}

fn ratio(aspect_ratio: AspectRatio) -> &'static str {
    match aspect_ratio {
        AspectRatio::Widescreen => "1280:720",
        AspectRatio::Portrait => "720:1280",
        AspectRatio::Square => "960:960",
    }
}

impl RunwayAdapter {
    pub fn new(config: ProviderConfig, transport: Arc<dyn Transport>) -> Self {
        log::debug!(
            "Runway adapter ready: model={}, api_key={}",
            config.model,
            config.masked_api_key()
        );
        Self { config, transport }
    }

    fn authorized(&self, request: HttpRequest) -> HttpRequest {
        request
            .bearer(&self.config.api_key)
            .header(RUNWAY_VERSION_HEADER, RUNWAY_API_VERSION)
    }
}

#[async_trait]
impl ProviderAdapter for RunwayAdapter {
    fn provider(&self) -> VideoGenProvider {
        VideoGenProvider::Runway
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::VideoUrl
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<TaskId, VideoGenError> {
        self.validate(request)?;

        if request.watermark {
            log::debug!("Runway does not support watermark control; flag ignored");
        }

        let body = ImageToVideoBody {
            model: &self.config.model,
            prompt_image: image_reference(&request.image)?,
            prompt_text: &request.prompt,
            ratio: ratio(request.aspect_ratio),
            duration: request.duration.seconds(),
            seed: request.seed,
        };

        let url = endpoint(&self.config.base_url, &["image_to_video"])?;
        let http_request = self
            .authorized(HttpRequest::post_json(url, &body)?)
            .timeout(self.config.create_timeout);

        let created: CreateResponse = self.transport.send(http_request).await?.decode()?;
        Ok(TaskId::new(created.id))
    }

    async fn fetch_status(&self, id: &TaskId) -> Result<TaskStatus, VideoGenError> {
        let url = endpoint(&self.config.base_url, &["tasks", id.as_str()])?;
        let http_request = self
            .authorized(HttpRequest::get(url))
            .timeout(self.config.request_timeout);

        let task: RunwayTask = self.transport.send(http_request).await?.decode()?;
        Ok(task.into_status())
    }
}
