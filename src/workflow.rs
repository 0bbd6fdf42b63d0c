use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use strum::Display;
use tokio::sync::watch;

use crate::models::assessment::DerivedAssessment;
use crate::models::image::{CandidateFile, ImageSummary};
use crate::models::verification::VerificationResponse;
use crate::services::classifier;
use crate::services::client::{VerificationClient, VerificationRequest, VerifyError};
use crate::services::collection::{AddReport, ImageCollection};
use crate::services::preview::PreviewRegistry;
use crate::services::progress::{ProgressConfig, ProgressSimulator, ProgressSnapshot};

/// Inline message for a submit attempt without images.
pub const NO_IMAGES_MESSAGE: &str = "Please upload at least one image";

/// The one user-facing message for every transport, service or parse failure.
pub const VERIFICATION_FAILED_MESSAGE: &str =
    "Verification failed. Please check your connection and try again.";

/// What the presentation layer may read. Exactly one variant holds at a time.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    Collecting { image_count: usize },
    Submitting { image_count: usize, progress: ProgressSnapshot },
    Succeeded { assessment: Box<DerivedAssessment> },
    Failed { message: String },
}

impl WorkflowState {
    pub fn phase(&self) -> Phase {
        match self {
            WorkflowState::Idle => Phase::Idle,
            WorkflowState::Collecting { .. } => Phase::Collecting,
            WorkflowState::Submitting { .. } => Phase::Submitting,
            WorkflowState::Succeeded { .. } => Phase::Succeeded,
            WorkflowState::Failed { .. } => Phase::Failed,
        }
    }

    pub fn assessment(&self) -> Option<&DerivedAssessment> {
        match self {
            WorkflowState::Succeeded { assessment } => Some(&**assessment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Idle,
    Collecting,
    Submitting,
    Succeeded,
    Failed,
}

/// Result of a [`WorkflowController::submit`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The service returned a verdict.
    Succeeded,
    /// The submission failed; the state carries the user-facing message.
    Failed,
    /// No images were collected. Nothing was sent and the state is unchanged.
    NeedsImages,
    /// A submission is already in flight; this call did nothing.
    Ignored,
}

enum Stage {
    Open,
    Submitting(ProgressSimulator),
    Succeeded(Arc<VerificationResponse>),
    Failed(String),
}

struct Session {
    images: ImageCollection,
    stage: Stage,
}

impl Session {
    fn state(&self) -> WorkflowState {
        match &self.stage {
            Stage::Open if self.images.is_empty() => WorkflowState::Idle,
            Stage::Open => WorkflowState::Collecting {
                image_count: self.images.len(),
            },
            Stage::Submitting(sim) => WorkflowState::Submitting {
                image_count: self.images.len(),
                progress: sim.snapshot(),
            },
            Stage::Succeeded(response) => WorkflowState::Succeeded {
                assessment: Box::new(classifier::classify(response)),
            },
            Stage::Failed(message) => WorkflowState::Failed {
                message: message.clone(),
            },
        }
    }

    fn is_submitting(&self) -> bool {
        matches!(self.stage, Stage::Submitting(_))
    }

    /// Tear down the simulator (if any) and move to `next`.
    fn settle(&mut self, next: Stage) {
        if let Stage::Submitting(mut sim) = std::mem::replace(&mut self.stage, next) {
            sim.stop();
        }
    }
}

/// Drives one verification session: idle, collecting, submitting, settled.
///
/// All methods take `&self` so the rendering layer can read [`state`] while a
/// submission is awaited elsewhere. The session lock is never held across an
/// await point.
///
/// [`state`]: WorkflowController::state
pub struct WorkflowController {
    client: VerificationClient,
    progress: ProgressConfig,
    session: Mutex<Session>,
}

impl WorkflowController {
    pub fn new(client: VerificationClient, progress: ProgressConfig) -> Self {
        Self {
            client,
            progress,
            session: Mutex::new(Session {
                images: ImageCollection::new(PreviewRegistry::new()),
                stage: Stage::Open,
            }),
        }
    }

    /// Current state. A verdict is re-classified on every call.
    pub fn state(&self) -> WorkflowState {
        self.lock().state()
    }

    pub fn images(&self) -> Vec<ImageSummary> {
        self.lock().images.summaries()
    }

    /// Inline `data:` URL for a preview URL listed by [`Self::images`].
    pub fn preview_data_url(&self, preview_url: &str) -> Option<String> {
        self.lock().images.registry().data_url(preview_url)
    }

    /// Number of previews not yet released.
    pub fn outstanding_previews(&self) -> usize {
        self.lock().images.registry().outstanding()
    }

    /// Subscribe to progress changes of the submission in flight, if any.
    pub fn watch_progress(&self) -> Option<watch::Receiver<ProgressSnapshot>> {
        match &self.lock().stage {
            Stage::Submitting(sim) => Some(sim.subscribe()),
            _ => None,
        }
    }

    /// Add files to the collection. A settled session reopens for collecting
    /// and drops its previous result. Ignored while submitting.
    pub fn add_files(&self, files: impl IntoIterator<Item = CandidateFile>) -> AddReport {
        let mut session = self.lock();
        if session.is_submitting() {
            tracing::debug!("Ignoring add while a submission is in flight");
            return AddReport::default();
        }

        let report = session.images.add(files);
        if report.rejected > 0 {
            tracing::info!(
                accepted = report.accepted,
                rejected = report.rejected,
                "Dropped non-image files"
            );
        }
        session.settle(Stage::Open);
        report
    }

    /// Remove one image. Returns `false` for an out-of-range index or while
    /// submitting.
    pub fn remove_image(&self, index: usize) -> bool {
        let mut session = self.lock();
        if session.is_submitting() {
            return false;
        }

        let removed = session.images.remove(index);
        if removed {
            session.settle(Stage::Open);
        }
        removed
    }

    /// Discard images, result and error, returning to `Idle`. A no-op while
    /// a submission is in flight.
    pub fn reset(&self) -> bool {
        let mut session = self.lock();
        if session.is_submitting() {
            return false;
        }

        session.images.clear();
        session.settle(Stage::Open);
        tracing::debug!("Workflow reset");
        true
    }

    /// Submit every collected image as one request.
    ///
    /// The progress simulator runs for exactly as long as the request is in
    /// flight; it is stopped before the settled state becomes visible.
    pub async fn submit(&self) -> SubmitOutcome {
        let request = {
            let mut session = self.lock();
            if session.is_submitting() {
                tracing::debug!("Ignoring submit while a submission is in flight");
                return SubmitOutcome::Ignored;
            }
            if session.images.is_empty() {
                return SubmitOutcome::NeedsImages;
            }

            let request = VerificationRequest::new(session.images.blobs());
            session.settle(Stage::Submitting(ProgressSimulator::start(self.progress)));
            request
        };

        tracing::info!(image_count = request.len(), "Submitting images for verification");

        let mut pending = PendingSubmission {
            session: &self.session,
            armed: true,
        };
        let result = self.client.submit(&request).await;
        pending.armed = false;

        let mut session = self.lock();
        match result {
            Ok(response) => {
                tracing::info!(
                    status = %response.status,
                    risk_level = %response.risk_level,
                    "Verification settled"
                );
                session.settle(Stage::Succeeded(Arc::new(response)));
                SubmitOutcome::Succeeded
            }
            Err(VerifyError::Busy) => {
                // Another holder of the client is mid-request; not user-visible.
                session.settle(Stage::Open);
                SubmitOutcome::Ignored
            }
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind(), "Verification failed");
                session.settle(Stage::Failed(VERIFICATION_FAILED_MESSAGE.to_string()));
                SubmitOutcome::Failed
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        lock_session(&self.session)
    }
}

fn lock_session(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Rolls the session back to collecting if a submit future is dropped before
/// the request settles, so the simulator never outlives its request.
struct PendingSubmission<'a> {
    session: &'a Mutex<Session>,
    armed: bool,
}

impl Drop for PendingSubmission<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("Submission abandoned before settling");
            lock_session(self.session).settle(Stage::Open);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn controller() -> WorkflowController {
        // Nothing listens on the discard port; tests here never reach the network.
        let client = VerificationClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        WorkflowController::new(client, ProgressConfig::default())
    }

    fn image(name: &str) -> CandidateFile {
        CandidateFile::new(name, "image/png", vec![1, 2, 3])
    }

    #[test]
    fn test_starts_idle() {
        assert_eq!(controller().state(), WorkflowState::Idle);
    }

    #[test]
    fn test_add_and_remove_move_between_idle_and_collecting() {
        let controller = controller();

        let report = controller.add_files(vec![
            CandidateFile::new("readme.txt", "text/plain", vec![]),
            image("a.png"),
        ]);
        assert_eq!(report.accepted, 1);
        assert_eq!(controller.state(), WorkflowState::Collecting { image_count: 1 });

        assert!(controller.remove_image(0));
        assert_eq!(controller.state(), WorkflowState::Idle);
        assert_eq!(controller.outstanding_previews(), 0);
    }

    #[test]
    fn test_rejected_only_batch_stays_idle() {
        let controller = controller();
        controller.add_files(vec![CandidateFile::new("a.pdf", "application/pdf", vec![])]);
        assert_eq!(controller.state().phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_empty_submit_changes_nothing() {
        let controller = controller();

        assert_eq!(controller.submit().await, SubmitOutcome::NeedsImages);
        assert_eq!(controller.state(), WorkflowState::Idle);
        assert!(controller.watch_progress().is_none());
    }

    #[test]
    fn test_preview_lookup_goes_through_controller() {
        let controller = controller();
        controller.add_files(vec![image("a.png")]);

        let images = controller.images();
        assert_eq!(images.len(), 1);
        assert_eq!(
            controller.preview_data_url(&images[0].preview_url).as_deref(),
            Some("data:image/png;base64,AQID")
        );

        assert!(controller.reset());
        assert!(controller.preview_data_url(&images[0].preview_url).is_none());
    }

    #[tokio::test]
    async fn test_unreachable_service_settles_failed() {
        let controller = controller();
        controller.add_files(vec![image("a.png")]);

        assert_eq!(controller.submit().await, SubmitOutcome::Failed);
        assert_eq!(
            controller.state(),
            WorkflowState::Failed {
                message: VERIFICATION_FAILED_MESSAGE.to_string()
            }
        );
        assert_eq!(controller.images().len(), 1);

        controller.add_files(vec![image("b.png")]);
        assert_eq!(controller.state(), WorkflowState::Collecting { image_count: 2 });
    }

    #[tokio::test]
    async fn test_dropped_submit_rolls_back() {
        // Accepts connections through the backlog but never answers.
        let silent = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", silent.local_addr().unwrap());
        let client = VerificationClient::new(&base, Duration::from_secs(30)).unwrap();
        let controller = WorkflowController::new(client, ProgressConfig::default());
        controller.add_files(vec![image("a.png")]);

        {
            let submit = controller.submit();
            tokio::pin!(submit);
            // Poll once so the request is issued, then abandon it.
            let _ = futures::poll!(submit.as_mut());
            assert_eq!(controller.state().phase(), Phase::Submitting);
        }

        assert_eq!(controller.state(), WorkflowState::Collecting { image_count: 1 });
        assert!(controller.watch_progress().is_none());
    }
}
