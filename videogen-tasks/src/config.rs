use std::fmt;
use std::time::Duration;

use url::Url;

use crate::consts::{DEFAULT_CREATE_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};
use crate::VideoGenError;

/// Connection settings for one provider
#[derive(Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: Url,
    pub model: String,
    /// Timeout for the task creation call
    pub create_timeout: Duration,
    /// Timeout for every other call
    pub request_timeout: Duration,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>, base_url: Url, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url,
            model: model.into(),
            create_timeout: DEFAULT_CREATE_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// API key safe for logs: first and last four characters only
    pub fn masked_api_key(&self) -> String {
        mask_secret(&self.api_key)
    }
}

// Never print the key, even in debug output
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.masked_api_key())
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .field("create_timeout", &self.create_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

/// Helper trait for building a [`ProviderConfig`] from environment variables
///
/// Reads `{PREFIX}_API_KEY` (required), `{PREFIX}_BASE_URL`, `{PREFIX}_MODEL`,
/// `{PREFIX}_CREATE_TIMEOUT_SECS` and `{PREFIX}_REQUEST_TIMEOUT_SECS`.
pub trait ConfigFromEnv {
    fn env_prefix(&self) -> &'static str;

    fn default_base_url(&self) -> &'static str;

    fn default_model(&self) -> &'static str;

    fn config_from_env(&self) -> Result<ProviderConfig, VideoGenError> {
        self.config_from_lookup(|key| std::env::var(key).ok())
    }

    fn config_from_lookup(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ProviderConfig, VideoGenError> {
        let prefix = self.env_prefix();
        let var = |name: &str| lookup(&format!("{prefix}_{name}")).filter(|v| !v.is_empty());

        let api_key = var("API_KEY").ok_or_else(|| {
            VideoGenError::InvalidInput(format!("{prefix}_API_KEY is not set"))
        })?;

        let base_url = var("BASE_URL").unwrap_or_else(|| self.default_base_url().to_string());
        let base_url = Url::parse(&base_url).map_err(|e| {
            VideoGenError::InvalidInput(format!("Invalid {prefix}_BASE_URL {base_url}: {e}"))
        })?;

        let model = var("MODEL").unwrap_or_else(|| self.default_model().to_string());

        let secs = |name: &str| -> Result<Option<Duration>, VideoGenError> {
            var(name)
                .map(|v| {
                    v.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                        VideoGenError::InvalidInput(format!("Invalid {prefix}_{name}: {e}"))
                    })
                })
                .transpose()
        };

        let mut config = ProviderConfig::new(api_key, base_url, model);
        if let Some(timeout) = secs("CREATE_TIMEOUT_SECS")? {
            config.create_timeout = timeout;
        }
        if let Some(timeout) = secs("REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = timeout;
        }

        log::info!(
            "Loaded {prefix} config: model={}, base_url={}, api_key={}",
            config.model,
            config.base_url,
            config.masked_api_key()
        );

        Ok(config)
    }
}
