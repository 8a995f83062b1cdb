use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::image::image_reference;
use crate::models::{endpoint, ProviderAdapter};
use crate::transport::{HttpRequest, Transport};
use crate::types::{
    GenerationMeta, GenerationRequest, OutputKind, TaskId, TaskState, TaskStatus,
    VideoGenProvider,
};
use crate::VideoGenError;

const TASKS_PATH: [&str; 3] = ["contents", "generations", "tasks"];

/// Seedance on ModelArk. Generation parameters travel as inline prompt
/// commands rather than as separate body fields.
pub struct SeedanceAdapter {
    config: ProviderConfig,
    transport: Arc<dyn Transport>,
}

#[derive(Serialize)]
struct CreateTaskBody<'a> {
    model: &'a str,
    content: Vec<ContentItem>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentItem {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct CreateResponse {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum SeedanceTaskStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

#[derive(Deserialize)]
struct VideoContent {
    video_url: String,
}

#[derive(Deserialize)]
struct TaskErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: Option<u64>,
}

#[derive(Deserialize)]
struct SeedanceTask {
    id: String,
    #[serde(default)]
    model: Option<String>,
    status: SeedanceTaskStatus,
    #[serde(default)]
    content: Option<VideoContent>,
    #[serde(default)]
    error: Option<TaskErrorBody>,
    /// Unix seconds
    #[serde(default)]
    created_at: Option<i64>,
    #[serde(default)]
    seed: Option<i64>,
    #[serde(default)]
    resolution: Option<String>,
    #[serde(default)]
    ratio: Option<String>,
    #[serde(default)]
    duration: Option<u32>,
    #[serde(default)]
    usage: Option<Usage>,
}

impl SeedanceTask {
    fn into_status(self) -> TaskStatus {
        let (reason, code) = match self.error {
            Some(err) => (err.message, err.code),
            None => (None, None),
        };

        let state = match self.status {
            SeedanceTaskStatus::Queued => TaskState::Pending,
            SeedanceTaskStatus::Running => TaskState::Running { progress: None },
            SeedanceTaskStatus::Succeeded => TaskState::Succeeded {
                outputs: self.content.map(|c| c.video_url).into_iter().collect(),
            },
            SeedanceTaskStatus::Failed => TaskState::Failed {
                reason: reason.unwrap_or_else(|| "Unknown failure".to_string()),
                code,
            },
            SeedanceTaskStatus::Cancelled => TaskState::Failed {
                reason: reason.unwrap_or_else(|| "Task was cancelled on the provider".to_string()),
                code: Some(code.unwrap_or_else(|| "cancelled".to_string())),
            },
        };

        TaskStatus {
            id: TaskId::new(self.id),
            created_at: self
                .created_at
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
            state,
            meta: GenerationMeta {
                model: self.model,
                resolution: self.resolution,
                ratio: self.ratio,
                duration_seconds: self.duration,
                seed: self.seed,
                total_tokens: self.usage.and_then(|u| u.total_tokens),
            },
        }
    }
}

/// Prompt text with the generation parameters appended as `--flag value` commands
fn prompt_with_commands(request: &GenerationRequest) -> String {
    let mut text = format!(
        "{} --dur {} --rt {}",
        request.prompt.trim(),
        request.duration.seconds(),
        request.aspect_ratio
    );
    if let Some(seed) = request.seed {
        text.push_str(&format!(" --seed {seed}"));
    }
    text.push_str(&format!(" --wm {}", request.watermark));
    text
}

impl SeedanceAdapter {
    pub fn new(config: ProviderConfig, transport: Arc<dyn Transport>) -> Self {
        log::debug!(
            "Seedance adapter ready: model={}, api_key={}",
            config.model,
            config.masked_api_key()
        );
        Self { config, transport }
    }
}

#[async_trait]
impl ProviderAdapter for SeedanceAdapter {
    fn provider(&self) -> VideoGenProvider {
        VideoGenProvider::Seedance
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::GenerationRecord
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<TaskId, VideoGenError> {
        self.validate(request)?;

        let body = CreateTaskBody {
            model: &self.config.model,
            content: vec![
                ContentItem::Text {
                    text: prompt_with_commands(request),
                },
                ContentItem::ImageUrl {
                    image_url: ImageUrl {
                        url: image_reference(&request.image)?,
                    },
                },
            ],
        };

        let url = endpoint(&self.config.base_url, &TASKS_PATH)?;
        let http_request = HttpRequest::post_json(url, &body)?
            .bearer(&self.config.api_key)
            .timeout(self.config.create_timeout);

        let created: CreateResponse = self.transport.send(http_request).await?.decode()?;
        Ok(TaskId::new(created.id))
    }

    async fn fetch_status(&self, id: &TaskId) -> Result<TaskStatus, VideoGenError> {
        let [a, b, c] = TASKS_PATH;
        let url = endpoint(&self.config.base_url, &[a, b, c, id.as_str()])?;
        let http_request = HttpRequest::get(url)
            .bearer(&self.config.api_key)
            .timeout(self.config.request_timeout);

        let task: SeedanceTask = self.transport.send(http_request).await?.decode()?;
        Ok(task.into_status())
    }
}
