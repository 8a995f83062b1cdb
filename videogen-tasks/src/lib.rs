pub mod client;
pub mod config;
pub mod consts;
pub mod error;
pub mod image;
pub mod lifecycle;
pub mod models;
pub mod normalizer;
pub mod registry;
pub mod transport;
pub mod types;

pub use client::VideoGenClient;
pub use config::{ConfigFromEnv, ProviderConfig};
pub use error::{ErrorKind, ProtocolError, VideoGenError};
pub use lifecycle::{LifecycleController, Sleeper, TokioSleeper, WaitPolicy};
pub use models::{build_adapter, ProviderAdapter, RunwayAdapter, SeedanceAdapter};
pub use normalizer::{classify, describe};
pub use registry::{TaskRegistry, TrackedPollGuard};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use types::{
    AspectRatio, GenerationMeta, GenerationRecord, GenerationRequest, ImageInput, Outcome,
    OutputKind, TaskId, TaskState, TaskStatus, VideoDuration, VideoGenProvider,
};
