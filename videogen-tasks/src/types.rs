use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use crate::consts::MAX_SEED;
use crate::VideoGenError;

/// Identifier assigned by the provider when a task is created
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum VideoGenProvider {
    Runway,
    Seedance,
}

/// Source image for image-to-video generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ImageInput {
    /// Publicly reachable image, passed to the provider as-is
    Url(Url),
    /// Encoded image bytes (PNG, JPEG, WebP), re-encoded as a JPEG data URI before sending
    Bytes(Vec<u8>),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum VideoDuration {
    #[default]
    #[strum(serialize = "5s")]
    Short,
    #[strum(serialize = "10s")]
    Long,
}

impl VideoDuration {
    pub fn seconds(&self) -> u8 {
        match self {
            VideoDuration::Short => 5,
            VideoDuration::Long => 10,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum AspectRatio {
    #[default]
    #[strum(serialize = "16:9")]
    Widescreen,
    #[strum(serialize = "9:16")]
    Portrait,
    #[strum(serialize = "1:1")]
    Square,
}

/// A provider-agnostic generation request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub image: ImageInput,
    #[serde(default)]
    pub duration: VideoDuration,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default)]
    pub watermark: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, image: ImageInput) -> Self {
        Self {
            prompt: prompt.into(),
            image,
            duration: VideoDuration::default(),
            aspect_ratio: AspectRatio::default(),
            watermark: false,
            seed: None,
        }
    }

    pub fn with_duration(mut self, duration: VideoDuration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_watermark(mut self, watermark: bool) -> Self {
        self.watermark = watermark;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks that do not depend on the provider
    pub fn validate(&self) -> Result<(), VideoGenError> {
        if self.prompt.trim().is_empty() {
            return Err(VideoGenError::InvalidInput(
                "Prompt cannot be empty".to_string(),
            ));
        }
        if let Some(seed) = self.seed {
            if seed > MAX_SEED {
                return Err(VideoGenError::SeedOutOfRange(seed));
            }
        }
        Ok(())
    }
}

/// Provider state of a task, normalized across adapters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Display)]
pub enum TaskState {
    Pending,
    Throttled,
    Running {
        /// Fraction in 0..=1, when the provider reports it
        progress: Option<f64>,
    },
    Succeeded {
        outputs: Vec<String>,
    },
    Failed {
        reason: String,
        code: Option<String>,
    },
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded { .. } | TaskState::Failed { .. })
    }
}

/// Extra fields some providers return alongside the status
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationMeta {
    pub model: Option<String>,
    pub resolution: Option<String>,
    pub ratio: Option<String>,
    pub duration_seconds: Option<u32>,
    pub seed: Option<i64>,
    pub total_tokens: Option<u64>,
}

/// One status fetch. Never reused across poll iterations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub id: TaskId,
    pub created_at: Option<DateTime<Utc>>,
    pub state: TaskState,
    #[serde(default)]
    pub meta: GenerationMeta,
}

impl TaskStatus {
    pub fn new(id: TaskId, state: TaskState) -> Self {
        Self {
            id,
            created_at: None,
            state,
            meta: GenerationMeta::default(),
        }
    }
}

/// Which [`Outcome`] shape an adapter produces on success
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputKind {
    VideoUrl,
    GenerationRecord,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub task_id: TaskId,
    pub video_url: Url,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub meta: GenerationMeta,
}

/// Result of a task that reached `Succeeded` with a usable output
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    VideoUrl(Url),
    GenerationRecord(GenerationRecord),
}

impl Outcome {
    pub fn video_url(&self) -> &Url {
        match self {
            Outcome::VideoUrl(url) => url,
            Outcome::GenerationRecord(record) => &record.video_url,
        }
    }
}
