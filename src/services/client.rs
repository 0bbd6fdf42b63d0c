use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};

use crate::models::image::ImageBlob;
use crate::models::verification::{HealthStatus, VerificationResponse};

/// Multipart field name the service expects for each photo.
const IMAGES_FIELD: &str = "images";

/// The ordered set of photos sent in one submission.
#[derive(Debug, Clone, Default)]
pub struct VerificationRequest {
    images: Vec<ImageBlob>,
}

impl VerificationRequest {
    pub fn new(images: Vec<ImageBlob>) -> Self {
        Self { images }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn images(&self) -> &[ImageBlob] {
        &self.images
    }

    fn to_form(&self) -> Result<Form, VerifyError> {
        let mut form = Form::new();
        for image in &self.images {
            let part = Part::bytes(image.data.to_vec())
                .file_name(image.file_name.clone())
                .mime_str(&image.media_type)
                .map_err(VerifyError::Network)?;
            form = form.part(IMAGES_FIELD, part);
        }
        Ok(form)
    }
}

/// Client for the medicine verification service.
///
/// Single-shot: no retries, and at most one submission in flight per client.
pub struct VerificationClient {
    http: Client,
    api_base: String,
    in_flight: AtomicBool,
}

impl VerificationClient {
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, VerifyError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(VerifyError::Network)?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            in_flight: AtomicBool::new(false),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// POST every image as an `images` part to `{api_base}/verify` and parse
    /// the verdict.
    pub async fn submit(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationResponse, VerifyError> {
        if request.is_empty() {
            return Err(VerifyError::Validation);
        }

        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(VerifyError::Busy)?;

        metrics::counter!("verification_submissions_total").increment(1);
        let start = Instant::now();
        let result = self.send(request).await;
        metrics::histogram!("verification_request_seconds").record(start.elapsed().as_secs_f64());

        match &result {
            Ok(response) => tracing::info!(
                image_count = request.len(),
                status = %response.status,
                risk_level = %response.risk_level,
                duration_ms = start.elapsed().as_millis() as u64,
                "Verification response received"
            ),
            Err(e) => {
                metrics::counter!("verification_failures_total", "kind" => e.kind()).increment(1);
                tracing::warn!(
                    image_count = request.len(),
                    error = %e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Verification request failed"
                );
            }
        }

        result
    }

    async fn send(&self, request: &VerificationRequest) -> Result<VerificationResponse, VerifyError> {
        let url = format!("{}/verify", self.api_base);
        tracing::debug!(%url, image_count = request.len(), "Sending verification request");

        let response = self
            .http
            .post(&url)
            .multipart(request.to_form()?)
            .send()
            .await
            .map_err(VerifyError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerifyError::Service(status));
        }

        let body = response.bytes().await.map_err(VerifyError::Network)?;
        serde_json::from_slice(&body).map_err(VerifyError::Parse)
    }

    /// Probe `GET {api_base}/health`. Independent of the submission guard.
    pub async fn health(&self) -> Result<HealthStatus, VerifyError> {
        let response = self
            .http
            .get(format!("{}/health", self.api_base))
            .send()
            .await
            .map_err(VerifyError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerifyError::Service(status));
        }

        let body = response.bytes().await.map_err(VerifyError::Network)?;
        serde_json::from_slice(&body).map_err(VerifyError::Parse)
    }
}

/// Holds the single-submission flag for the lifetime of a request, including
/// when the request future is dropped early.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("At least one image is required")]
    Validation,

    #[error("HTTP request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Verification service returned {0}")]
    Service(StatusCode),

    #[error("Failed to parse verification response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("A verification request is already in flight")]
    Busy,
}

impl VerifyError {
    /// Short, stable label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            VerifyError::Validation => "validation",
            VerifyError::Network(_) => "network",
            VerifyError::Service(_) => "service",
            VerifyError::Parse(_) => "parse",
            VerifyError::Busy => "busy",
        }
    }
}
