use std::time::Duration;

// Polling
pub const STANDARD_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const THROTTLED_POLL_INTERVAL: Duration = Duration::from_secs(10);

// Request validation
pub const MAX_SEED: u64 = 999_999_999;
pub const MAX_IMAGE_BASE64_BYTES: usize = 3 * 1024 * 1024;
pub const JPEG_QUALITY: u8 = 90;

// Transport
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_CREATE_TIMEOUT: Duration = Duration::from_secs(30);

// Runway
pub const RUNWAY_BASE_URL: &str = "https://api.dev.runwayml.com/v1/";
pub const RUNWAY_API_VERSION: &str = "2024-11-06";
pub const RUNWAY_VERSION_HEADER: &str = "X-Runway-Version";
pub const RUNWAY_DEFAULT_MODEL: &str = "gen4_turbo";

// Seedance
pub const SEEDANCE_BASE_URL: &str = "https://ark.ap-southeast.bytepluses.com/api/v3/";
pub const SEEDANCE_DEFAULT_MODEL: &str = "seedance-1-0-pro-250528";
