pub mod runway;
pub mod seedance;

pub use runway::RunwayAdapter;
pub use seedance::SeedanceAdapter;

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::config::{ConfigFromEnv, ProviderConfig};
use crate::consts::{RUNWAY_BASE_URL, RUNWAY_DEFAULT_MODEL, SEEDANCE_BASE_URL, SEEDANCE_DEFAULT_MODEL};
use crate::types::{
    AspectRatio, GenerationRequest, OutputKind, TaskId, TaskStatus, VideoGenProvider,
};
use crate::transport::Transport;
use crate::VideoGenError;

const ALL_ASPECT_RATIOS: &[AspectRatio] = &[
    AspectRatio::Widescreen,
    AspectRatio::Portrait,
    AspectRatio::Square,
];

/// Core trait for a remote video generation provider
///
/// Adapters translate a [`GenerationRequest`] into the provider's wire format and
/// normalize its task responses into [`TaskStatus`]. They never retry: a failed
/// call surfaces to the caller as-is.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> VideoGenProvider;

    /// Model the adapter submits to
    fn model_id(&self) -> &str;

    /// Shape of the [`crate::Outcome`] produced on success
    fn output_kind(&self) -> OutputKind;

    fn supported_aspect_ratios(&self) -> &'static [AspectRatio] {
        ALL_ASPECT_RATIOS
    }

    /// Validate the request locally. Runs before any network call.
    fn validate(&self, request: &GenerationRequest) -> Result<(), VideoGenError> {
        request.validate()?;
        if !self.supported_aspect_ratios().contains(&request.aspect_ratio) {
            return Err(VideoGenError::InvalidInput(format!(
                "{} does not support aspect ratio {}",
                self.provider(),
                request.aspect_ratio
            )));
        }
        Ok(())
    }

    /// Create the remote task
    async fn submit(&self, request: &GenerationRequest) -> Result<TaskId, VideoGenError>;

    /// Fetch the current status of a task
    async fn fetch_status(&self, id: &TaskId) -> Result<TaskStatus, VideoGenError>;
}

impl ConfigFromEnv for VideoGenProvider {
    fn env_prefix(&self) -> &'static str {
        match self {
            VideoGenProvider::Runway => "RUNWAY",
            VideoGenProvider::Seedance => "SEEDANCE",
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            VideoGenProvider::Runway => RUNWAY_BASE_URL,
            VideoGenProvider::Seedance => SEEDANCE_BASE_URL,
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            VideoGenProvider::Runway => RUNWAY_DEFAULT_MODEL,
            VideoGenProvider::Seedance => SEEDANCE_DEFAULT_MODEL,
        }
    }
}

/// Build the adapter variant for `provider`
pub fn build_adapter(
    provider: VideoGenProvider,
    config: ProviderConfig,
    transport: Arc<dyn Transport>,
) -> Arc<dyn ProviderAdapter> {
    match provider {
        VideoGenProvider::Runway => Arc::new(RunwayAdapter::new(config, transport)),
        VideoGenProvider::Seedance => Arc::new(SeedanceAdapter::new(config, transport)),
    }
}

/// `base_url` with `segments` appended, each percent-encoded as one path segment
///
/// A missing trailing slash on the base keeps its last segment. Empty, `.` and
/// `..` segments are rejected so provider ids cannot change the route.
pub(crate) fn endpoint(base_url: &Url, segments: &[&str]) -> Result<Url, VideoGenError> {
    if let Some(bad) = segments
        .iter()
        .find(|s| matches!(**s, "" | "." | ".."))
    {
        return Err(VideoGenError::InvalidInput(format!(
            "Invalid path segment {bad:?} for {base_url}"
        )));
    }

    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| VideoGenError::InvalidInput(format!("Base URL {base_url} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        for base in ["https://api.example.com/api/v3/", "https://api.example.com/api/v3"] {
            let base = Url::parse(base).unwrap();
            assert_eq!(
                endpoint(&base, &["contents", "generations", "tasks", "abc"])
                    .unwrap()
                    .as_str(),
                "https://api.example.com/api/v3/contents/generations/tasks/abc"
            );
        }
    }

    #[test]
    fn test_endpoint_encodes_ids_as_one_segment() {
        let base = Url::parse("https://api.example.com/v1/").unwrap();

        let url = endpoint(&base, &["tasks", "a?b#c"]).unwrap();
        assert_eq!(url.path(), "/v1/tasks/a%3Fb%23c");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);

        let url = endpoint(&base, &["tasks", "../../admin"]).unwrap();
        assert_eq!(url.path(), "/v1/tasks/..%2F..%2Fadmin");
    }

    #[test]
    fn test_endpoint_rejects_dot_segments() {
        let base = Url::parse("https://api.example.com/v1/").unwrap();
        for id in ["", ".", ".."] {
            let err = endpoint(&base, &["tasks", id]).unwrap_err();
            assert!(matches!(err, VideoGenError::InvalidInput(_)), "{id:?}");
        }
    }

    #[test]
    fn test_build_adapter_picks_variant() {
        let config = ProviderConfig::new(
            "key_0123456789abcdef",
            Url::parse("https://api.example.com/").unwrap(),
            "some-model",
        );
        let transport: Arc<dyn Transport> = Arc::new(crate::transport::ReqwestTransport::new());

        let runway = build_adapter(VideoGenProvider::Runway, config.clone(), transport.clone());
        assert_eq!(runway.provider(), VideoGenProvider::Runway);
        assert_eq!(runway.output_kind(), OutputKind::VideoUrl);
        assert_eq!(runway.model_id(), "some-model");

        let seedance = build_adapter(VideoGenProvider::Seedance, config, transport);
        assert_eq!(seedance.provider(), VideoGenProvider::Seedance);
        assert_eq!(seedance.output_kind(), OutputKind::GenerationRecord);
    }

    #[test]
    fn test_env_prefixes() {
        assert_eq!(VideoGenProvider::Runway.env_prefix(), "RUNWAY");
        assert_eq!(VideoGenProvider::Seedance.env_prefix(), "SEEDANCE");
    }
}
