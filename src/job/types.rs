//! Job records, their status machine, and the polling projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Where a job is in its pipeline.
///
/// Valid paths: `Pending → Synthesizing → Mixing → Completed`, with a
/// failure edge from `Synthesizing` or `Mixing` to `Failed`. `Completed`
/// and `Failed` are terminal; no state is ever revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Synthesizing,
    Mixing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Terminal states never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Synthesizing => "synthesizing",
            JobStatus::Mixing => "mixing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Everything needed to create a job; all fields immutable afterwards.
#[derive(Debug, Clone)]
pub struct JobSpec {
    /// Non-empty, pre-trimmed script text.
    pub script: String,
    /// Voice store id of the cloned voice to read in.
    pub voice_id: String,
    /// Optional delivery hint (tone, speed, emotion).
    pub style_instruction: Option<String>,
    /// File name of an uploaded background-music blob, if any.
    pub bgm_file: Option<String>,
    /// Background-music volume in [0.0, 1.0].
    pub bgm_volume: f32,
}

/// One request to produce a finished podcast artifact.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    pub script: String,
    pub voice_id: String,
    pub style_instruction: Option<String>,
    pub bgm_file: Option<String>,
    pub bgm_volume: f32,
    /// Artifact file name; present iff status == Completed.
    pub output_file: Option<String>,
    /// Failure diagnostic; present iff status == Failed.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Fresh pending job with a new id.
    pub fn new(spec: JobSpec) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            status: JobStatus::Pending,
            script: spec.script,
            voice_id: spec.voice_id,
            style_instruction: spec.style_instruction,
            bgm_file: spec.bgm_file,
            bgm_volume: spec.bgm_volume,
            output_file: None,
            error: None,
            created_at: Utc::now(),
        }
    }

    /// Pending → Synthesizing.
    pub fn begin_synthesis(&mut self) {
        if !self.status.is_terminal() {
            self.status = JobStatus::Synthesizing;
        }
    }

    /// Synthesizing → Mixing.
    pub fn begin_mix(&mut self) {
        if !self.status.is_terminal() {
            self.status = JobStatus::Mixing;
        }
    }

    /// Record the artifact and finish. Status and `output_file` move
    /// together; a reader never sees one without the other.
    pub fn complete(&mut self, output_file: String) {
        if !self.status.is_terminal() {
            self.output_file = Some(output_file);
            self.status = JobStatus::Completed;
        }
    }

    /// Record the diagnostic and finish. Status and `error` move together.
    pub fn fail(&mut self, message: String) {
        if !self.status.is_terminal() {
            self.error = Some(message);
            self.status = JobStatus::Failed;
        }
    }

    /// Read-only projection for polling clients.
    pub fn view(&self) -> JobView {
        JobView {
            id: self.id.clone(),
            status: self.status,
            created_at: self.created_at,
            error: match self.status {
                JobStatus::Failed => self.error.clone(),
                _ => None,
            },
        }
    }
}

/// What polling clients see: id, status, creation time, and the failure
/// diagnostic when (and only when) the job failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub id: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> JobSpec {
        JobSpec {
            script: "Hello world".to_string(),
            voice_id: "voice-1".to_string(),
            style_instruction: None,
            bgm_file: None,
            bgm_volume: 0.3,
        }
    }

    #[test]
    fn test_new_job_is_pending_with_unique_id() {
        let a = Job::new(spec());
        let b = Job::new(spec());
        assert_eq!(a.status, JobStatus::Pending);
        assert!(a.output_file.is_none());
        assert!(a.error.is_none());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut job = Job::new(spec());

        job.begin_synthesis();
        assert_eq!(job.status, JobStatus::Synthesizing);

        job.begin_mix();
        assert_eq!(job.status, JobStatus::Mixing);

        job.complete("out.mp3".to_string());
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.output_file.as_deref(), Some("out.mp3"));
        assert!(job.error.is_none());
    }

    #[test]
    fn test_fail_records_message() {
        let mut job = Job::new(spec());
        job.begin_synthesis();
        job.fail("remote quota exceeded".to_string());

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("remote quota exceeded"));
        assert!(job.output_file.is_none());
    }

    #[test]
    fn test_terminal_states_never_transition() {
        let mut done = Job::new(spec());
        done.complete("a.mp3".to_string());
        done.fail("late failure".to_string());
        done.begin_synthesis();
        assert_eq!(done.status, JobStatus::Completed);
        assert!(done.error.is_none());

        let mut failed = Job::new(spec());
        failed.fail("boom".to_string());
        failed.complete("b.mp3".to_string());
        failed.begin_mix();
        assert_eq!(failed.status, JobStatus::Failed);
        assert!(failed.output_file.is_none());
    }

    #[test]
    fn test_status_is_terminal() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Synthesizing.is_terminal());
        assert!(!JobStatus::Mixing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Synthesizing).unwrap(),
            "\"synthesizing\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn test_status_display_matches_wire_format() {
        for status in [
            JobStatus::Pending,
            JobStatus::Synthesizing,
            JobStatus::Mixing,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            let wire = serde_json::to_string(&status).unwrap();
            assert_eq!(wire.trim_matches('"'), status.to_string());
        }
    }

    #[test]
    fn test_view_omits_error_until_failed() {
        let mut job = Job::new(spec());
        let view = job.view();
        assert_eq!(view.status, JobStatus::Pending);
        assert!(view.error.is_none());

        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("error"));
        assert!(json.contains("createdAt"));

        job.fail("synthesis failed".to_string());
        let view = job.view();
        assert_eq!(view.error.as_deref(), Some("synthesis failed"));
        assert!(serde_json::to_string(&view).unwrap().contains("error"));
    }
}
