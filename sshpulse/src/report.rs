//! Terminal health reporting.
//!
//! The [`HealthReporter`] trait is the single outward-facing seam of a run:
//! exactly one of its two methods is called per pass. The concrete
//! [`KuberhealthyReporter`] delivers the verdict as a JSON status POST to a
//! Kuberhealthy-style reporting endpoint.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

/// Default timeout for delivering a report.
const DEFAULT_REPORT_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the run identifier assigned by the checking framework.
const RUN_UUID_HEADER: &str = "kh-run-uuid";

/// Errors while delivering the terminal report.
///
/// Delivery failures are fatal: there is no fallback path, so the process
/// cannot self-heal by retrying.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The HTTP request could not be sent or completed.
    #[error("report delivery failed: {0}")]
    Http(String),

    /// The reporting endpoint answered with a non-success status.
    #[error("reporting endpoint returned status {status}")]
    Status { status: u16 },
}

/// Trait for delivering the aggregate run outcome.
///
/// Both calls are terminal and fire-and-forget: the orchestrator issues
/// exactly one of them per run, after the full node pass.
pub trait HealthReporter: Send + Sync {
    /// Report that every probed node was reachable.
    fn report_success(&self) -> impl Future<Output = Result<(), ReportError>> + Send;

    /// Report failure with the accumulated per-node messages, in order.
    fn report_failure(
        &self,
        messages: Vec<String>,
    ) -> impl Future<Output = Result<(), ReportError>> + Send;
}

/// Wire format of the status report body.
#[derive(Debug, Serialize)]
struct StatusReport {
    #[serde(rename = "OK")]
    ok: bool,
    #[serde(rename = "Errors")]
    errors: Vec<String>,
}

/// Reporter that POSTs the run verdict to a Kuberhealthy reporting URL.
pub struct KuberhealthyReporter {
    /// Reporting endpoint URL.
    url: String,

    /// Run identifier forwarded in the `kh-run-uuid` header, when assigned.
    run_uuid: Option<String>,

    /// Reusable HTTP client.
    http: reqwest::Client,
}

impl KuberhealthyReporter {
    /// Create a reporter for the given endpoint.
    pub fn new(url: impl Into<String>, run_uuid: Option<String>) -> Result<Self, ReportError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_REPORT_TIMEOUT)
            .build()
            .map_err(|e| ReportError::Http(e.to_string()))?;

        Ok(Self {
            url: url.into(),
            run_uuid,
            http,
        })
    }

    async fn deliver(&self, report: StatusReport) -> Result<(), ReportError> {
        let mut request = self.http.post(&self.url).json(&report);
        if let Some(uuid) = &self.run_uuid {
            request = request.header(RUN_UUID_HEADER, uuid);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ReportError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Status {
                status: status.as_u16(),
            });
        }

        info!(ok = report.ok, errors = report.errors.len(), "report delivered");
        Ok(())
    }
}

impl HealthReporter for KuberhealthyReporter {
    async fn report_success(&self) -> Result<(), ReportError> {
        self.deliver(StatusReport {
            ok: true,
            errors: Vec::new(),
        })
        .await
    }

    async fn report_failure(&self, messages: Vec<String>) -> Result<(), ReportError> {
        self.deliver(StatusReport {
            ok: false,
            errors: messages,
        })
        .await
    }
}
