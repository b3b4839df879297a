//! Conversion job lifecycle as an explicit state machine.
//!
//! Interactive hosts (a desktop frontend, a long-lived service session, the
//! CLI) walk every conversion through the same lifecycle: a file is chosen,
//! a conversion runs, the result is handed over or the failure shown, and
//! the session resets for the next file. Modelling that as a tagged state
//! enum — rather than a bag of optional fields mutated from callbacks —
//! makes illegal sequences (converting with no file selected, taking output
//! that does not exist) unrepresentable at runtime: each action checks the
//! current state and returns a typed error instead of silently misbehaving.
//!
//! ```text
//!            select                 convert
//!   Idle ───────────▶ FileSelected ─────────▶ Converting
//!    ▲                     ▲                      │
//!    │ take_output/reset   │ select               ├── ok ──▶ Converted
//!    └─────────────────────┴──────────────────────┴─ err ──▶ Failed
//! ```

use crate::config::ConversionConfig;
use crate::convert;
use crate::error::PagemillError;
use crate::output::{ImageOutput, PdfOutput, TableOutput, TextOutput};

/// Which conversion a [`Job`] should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// PDF → plain text.
    Text,
    /// PDF → CSV sheets.
    Tables,
    /// PDF → page images.
    Images,
    /// PDF → grayscale PDF.
    GrayscalePdf,
}

/// The finished product of a conversion, tagged by operation.
#[derive(Debug)]
pub enum JobOutput {
    Text(TextOutput),
    Tables(TableOutput),
    Images(ImageOutput),
    GrayscalePdf(PdfOutput),
}

/// Where a job currently is in its lifecycle.
#[derive(Debug)]
pub enum JobState {
    /// No file chosen yet.
    Idle,
    /// A file (path or URL) has been chosen but not converted.
    FileSelected { input: String },
    /// A conversion is running.
    Converting { input: String },
    /// The conversion finished; output is ready to take.
    Converted { input: String, output: JobOutput },
    /// The conversion failed; the message is kept for display.
    Failed { input: String, error: String },
}

impl JobState {
    /// Short state name for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::FileSelected { .. } => "file-selected",
            JobState::Converting { .. } => "converting",
            JobState::Converted { .. } => "converted",
            JobState::Failed { .. } => "failed",
        }
    }
}

/// One conversion session, driven by discrete actions.
#[derive(Debug)]
pub struct Job {
    state: JobState,
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}

impl Job {
    /// Start an idle job.
    pub fn new() -> Self {
        Self {
            state: JobState::Idle,
        }
    }

    /// Current state, for display.
    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// Choose the input file or URL.
    ///
    /// Allowed from every state except mid-conversion; re-selecting from
    /// `Converted` or `Failed` starts over with the new input ("convert
    /// another file").
    pub fn select(&mut self, input: impl Into<String>) -> Result<(), PagemillError> {
        if matches!(self.state, JobState::Converting { .. }) {
            return Err(PagemillError::InvalidJobTransition {
                state: self.state.name(),
                action: "select a file",
            });
        }
        self.state = JobState::FileSelected {
            input: input.into(),
        };
        Ok(())
    }

    /// Drop any selection or result and return to `Idle`.
    pub fn reset(&mut self) {
        self.state = JobState::Idle;
    }

    /// Run the requested conversion on the selected file.
    ///
    /// Only valid from `FileSelected`. On success the job moves to
    /// `Converted` and a borrow of the output is returned; on failure the
    /// job moves to `Failed` (keeping the rendered message for display) and
    /// the original error is returned.
    pub async fn convert(
        &mut self,
        operation: Operation,
        config: &ConversionConfig,
    ) -> Result<&JobOutput, PagemillError> {
        let input = match &self.state {
            JobState::FileSelected { input } => input.clone(),
            other => {
                return Err(PagemillError::InvalidJobTransition {
                    state: other.name(),
                    action: "convert",
                })
            }
        };

        self.state = JobState::Converting {
            input: input.clone(),
        };

        let result = match operation {
            Operation::Text => convert::to_text(&input, config).await.map(JobOutput::Text),
            Operation::Tables => convert::to_tables(&input, config)
                .await
                .map(JobOutput::Tables),
            Operation::Images => convert::to_images(&input, config)
                .await
                .map(JobOutput::Images),
            Operation::GrayscalePdf => convert::to_grayscale_pdf(&input, config)
                .await
                .map(JobOutput::GrayscalePdf),
        };

        match result {
            Ok(output) => {
                self.state = JobState::Converted { input, output };
                match &self.state {
                    JobState::Converted { output, .. } => Ok(output),
                    _ => unreachable!(),
                }
            }
            Err(e) => {
                self.state = JobState::Failed {
                    input,
                    error: e.to_string(),
                };
                Err(e)
            }
        }
    }

    /// Borrow the finished output, if any.
    pub fn output(&self) -> Option<&JobOutput> {
        match &self.state {
            JobState::Converted { output, .. } => Some(output),
            _ => None,
        }
    }

    /// Take ownership of the finished output; the job returns to `Idle`.
    pub fn take_output(&mut self) -> Result<JobOutput, PagemillError> {
        match std::mem::replace(&mut self.state, JobState::Idle) {
            JobState::Converted { output, .. } => Ok(output),
            other => {
                // Not converted: put the state back untouched.
                let name = other.name();
                self.state = other;
                Err(PagemillError::InvalidJobTransition {
                    state: name,
                    action: "take the output",
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_is_idle() {
        let job = Job::new();
        assert!(matches!(job.state(), JobState::Idle));
        assert!(job.output().is_none());
    }

    #[test]
    fn select_moves_to_file_selected() {
        let mut job = Job::new();
        job.select("report.pdf").unwrap();
        match job.state() {
            JobState::FileSelected { input } => assert_eq!(input, "report.pdf"),
            other => panic!("unexpected state: {}", other.name()),
        }
    }

    #[test]
    fn reselect_replaces_input() {
        let mut job = Job::new();
        job.select("a.pdf").unwrap();
        job.select("b.pdf").unwrap();
        match job.state() {
            JobState::FileSelected { input } => assert_eq!(input, "b.pdf"),
            other => panic!("unexpected state: {}", other.name()),
        }
    }

    #[tokio::test]
    async fn convert_without_selection_is_rejected() {
        let mut job = Job::new();
        let err = job
            .convert(Operation::Text, &ConversionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PagemillError::InvalidJobTransition {
                state: "idle",
                action: "convert"
            }
        ));
        // The failed action must not change the state.
        assert!(matches!(job.state(), JobState::Idle));
    }

    #[tokio::test]
    async fn failed_conversion_moves_to_failed_and_allows_reselect() {
        let mut job = Job::new();
        job.select("/no/such/file.pdf").unwrap();
        let err = job
            .convert(Operation::Text, &ConversionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PagemillError::FileNotFound { .. }));
        match job.state() {
            JobState::Failed { error, .. } => assert!(error.contains("not found")),
            other => panic!("unexpected state: {}", other.name()),
        }
        // "Convert another file" from the failure screen.
        job.select("next.pdf").unwrap();
        assert!(matches!(job.state(), JobState::FileSelected { .. }));
    }

    #[test]
    fn take_output_requires_converted() {
        let mut job = Job::new();
        let err = job.take_output().unwrap_err();
        assert!(matches!(
            err,
            PagemillError::InvalidJobTransition {
                state: "idle",
                action: "take the output"
            }
        ));
        // State preserved after the rejected action.
        assert!(matches!(job.state(), JobState::Idle));

        job.select("doc.pdf").unwrap();
        assert!(job.take_output().is_err());
        assert!(matches!(job.state(), JobState::FileSelected { .. }));
    }

    #[test]
    fn reset_returns_to_idle_from_any_state() {
        let mut job = Job::new();
        job.select("doc.pdf").unwrap();
        job.reset();
        assert!(matches!(job.state(), JobState::Idle));
    }
}
