use super::error::JobError;
use crate::api::JobProgress;

/// Job lifecycle as seen by consumers. Only the tracker writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobState {
    #[default]
    Idle,
    /// The start request is in flight.
    Starting,
    /// Started; progress is being polled.
    Polling,
    Complete,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Starting => "starting",
            JobState::Polling => "polling",
            JobState::Complete => "complete",
            JobState::Failed => "failed",
        }
    }

    /// `Starting` or `Polling`: another `start()` is a no-op.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, JobState::Starting | JobState::Polling)
    }

    /// `Complete` or `Failed`: nothing happens until the next `start()`.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Complete | JobState::Failed)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Published tracker state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobSnapshot {
    pub state: JobState,
    /// Last fetched progress; authoritative after polling stops.
    pub progress: JobProgress,
    /// Error behind a `Failed` state.
    pub error: Option<JobError>,
    pub consecutive_failures: u32,
}

impl JobSnapshot {
    /// `Starting`/`Polling`, or progress short of its measured total. Never while `Failed`.
    pub fn is_vectorizing(&self) -> bool {
        if self.state == JobState::Failed {
            return false;
        }
        self.state.is_active() || self.progress.processed < self.progress.total
    }

    /// A progress bar is worth drawing: polling with a measured workload.
    pub fn show_progress(&self) -> bool {
        self.state == JobState::Polling && self.progress.is_measured()
    }

    /// A "vectorization complete" notice is worth showing.
    pub fn completion_notice(&self) -> bool {
        self.state == JobState::Complete && self.progress.is_measured()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

/// Result of [`super::JobTracker::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// The backend accepted the job and polling began.
    Started { status: String },
    /// A start or poll was already running; nothing was sent.
    AlreadyRunning,
}
