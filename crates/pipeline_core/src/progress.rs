//! Time-driven progress estimate for jobs that report no progress of their own.
//!
//! The simulator only knows how long each step is expected to take. It is a
//! display aid; whether a job actually finished is decided by the next poll.

use std::time::Duration;

/// Interval between progress recomputations.
pub const TICK_INTERVAL: Duration = Duration::from_millis(500);
/// Delay between reaching the estimated end and firing the completion signal.
pub const COMPLETION_DELAY: Duration = Duration::from_secs(1);
/// Highest percentage shown while the estimate is still running.
pub const RUNNING_PERCENT_CAP: f64 = 99.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub label: String,
    pub duration: Duration,
}

impl Step {
    pub fn new(label: impl Into<String>, seconds: u64) -> Self {
        Self {
            label: label.into(),
            duration: Duration::from_secs(seconds),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView {
    pub label: String,
    pub duration: Duration,
    pub status: StepStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub percent: f64,
    pub current_step: usize,
    pub steps: Vec<StepView>,
    pub elapsed: Duration,
    pub remaining: Duration,
    pub finished: bool,
}

impl ProgressSnapshot {
    pub fn elapsed_label(&self) -> String {
        format_clock(self.elapsed)
    }

    pub fn remaining_label(&self) -> String {
        format_clock(self.remaining)
    }

    pub fn current_label(&self) -> Option<&str> {
        self.steps
            .get(self.current_step)
            .map(|step| step.label.as_str())
    }
}

/// Ordered step plan with fixed per-step estimates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSimulator {
    steps: Vec<Step>,
}

impl ProgressSimulator {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Plan shown while a single video post is being produced.
    pub fn video_generation() -> Self {
        Self::new(vec![
            Step::new("Analyzing script content", 3),
            Step::new("Generating video scenes", 8),
            Step::new("Creating visual assets", 12),
            Step::new("Adding voiceover narration", 10),
            Step::new("Synchronizing audio & video", 5),
            Step::new("Adding captions & subtitles", 6),
            Step::new("Rendering final video", 10),
            Step::new("Quality check & optimization", 4),
            Step::new("Video ready for review!", 0),
        ])
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|step| step.duration).sum()
    }

    /// Estimate for a job that started `elapsed` ago.
    pub fn snapshot(&self, elapsed: Duration) -> ProgressSnapshot {
        let total = self.total_duration();
        let finished = elapsed >= total;
        let current_step = self.current_step(elapsed);

        let steps = self
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| StepView {
                label: step.label.clone(),
                duration: step.duration,
                status: if finished || index < current_step {
                    StepStatus::Complete
                } else if index == current_step {
                    StepStatus::InProgress
                } else {
                    StepStatus::Pending
                },
            })
            .collect();

        let percent = if finished {
            100.0
        } else {
            (elapsed.as_secs_f64() / total.as_secs_f64() * 100.0).min(RUNNING_PERCENT_CAP)
        };

        ProgressSnapshot {
            percent,
            current_step,
            steps,
            elapsed,
            remaining: total.saturating_sub(elapsed),
            finished,
        }
    }

    fn current_step(&self, elapsed: Duration) -> usize {
        let mut cumulative = Duration::ZERO;
        for (index, step) in self.steps.iter().enumerate() {
            if elapsed < cumulative + step.duration {
                return index;
            }
            cumulative += step.duration;
        }
        self.steps.len().saturating_sub(1)
    }
}

/// Formats a duration as `minutes:seconds`, truncating fractions.
pub fn format_clock(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}
