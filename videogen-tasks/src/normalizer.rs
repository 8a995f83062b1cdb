//! Turns terminal task statuses into outcomes, and any status into a log line

use url::Url;

use crate::types::{GenerationRecord, Outcome, OutputKind, TaskState, TaskStatus};
use crate::VideoGenError;

/// Resolve a terminal status
///
/// `Succeeded` yields an [`Outcome`] built from the first output, in the shape
/// given by `kind`. `Failed`, and `Succeeded` without a usable output, yield an
/// error. Non-terminal statuses are rejected with [`VideoGenError::NotTerminal`].
pub fn classify(status: &TaskStatus, kind: OutputKind) -> Result<Outcome, VideoGenError> {
    match &status.state {
        TaskState::Succeeded { outputs } => {
            let first = outputs
                .first()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| VideoGenError::MissingOutput(status.id.clone()))?;

            let video_url = Url::parse(first).map_err(|e| {
                VideoGenError::DecodingFailed(format!("Invalid output URL {first}: {e}"))
            })?;

            Ok(match kind {
                OutputKind::VideoUrl => Outcome::VideoUrl(video_url),
                OutputKind::GenerationRecord => Outcome::GenerationRecord(GenerationRecord {
                    task_id: status.id.clone(),
                    video_url,
                    created_at: status.created_at,
                    meta: status.meta.clone(),
                }),
            })
        }
        TaskState::Failed { reason, code } => Err(VideoGenError::JobFailed {
            reason: reason.clone(),
            code: code.clone(),
        }),
        TaskState::Pending | TaskState::Throttled | TaskState::Running { .. } => {
            Err(VideoGenError::NotTerminal(status.id.clone()))
        }
    }
}

/// One-line human readable summary of any status. Presentation only.
pub fn describe(status: &TaskStatus) -> String {
    let created = status
        .created_at
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown time".to_string());

    let detail = match &status.state {
        TaskState::Pending => "pending".to_string(),
        TaskState::Throttled => "throttled by provider".to_string(),
        TaskState::Running { progress: Some(p) } => {
            format!("running, {}% complete", percent(*p))
        }
        TaskState::Running { progress: None } => "running".to_string(),
        TaskState::Succeeded { outputs } if outputs.is_empty() => {
            "succeeded with no outputs".to_string()
        }
        TaskState::Succeeded { outputs } => {
            format!("succeeded, outputs: {}", outputs.join(", "))
        }
        TaskState::Failed {
            reason,
            code: Some(code),
        } => format!("failed: {reason} (code {code})"),
        TaskState::Failed { reason, code: None } => format!("failed: {reason}"),
    };

    format!("Task {} (created {created}): {detail}", status.id)
}

fn percent(fraction: f64) -> u8 {
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u8
}
