//! Client side of the two-stage phase protocol: listing, then per-phase detail.

use async_trait::async_trait;
use phases_core::{PhaseDetail, PhaseSummary, TimelineConfig, TimelineError};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

/// Parse the phase listing from a JSON string.
pub fn parse_phase_list_str(body: &str) -> Result<Vec<PhaseSummary>, TimelineError> {
    let value: Value =
        serde_json::from_str(body).map_err(|err| TimelineError::Parse(err.to_string()))?;
    parse_phase_list_value(value)
}

/// Parse the phase listing from a `serde_json::Value`.
///
/// The listing must be an array; order is kept as sent.
pub fn parse_phase_list_value(value: Value) -> Result<Vec<PhaseSummary>, TimelineError> {
    if !value.is_array() {
        return Err(TimelineError::Parse(format!(
            "expected an array of phases, received {}",
            json_kind(&value)
        )));
    }
    serde_json::from_value(value).map_err(|err| TimelineError::Parse(err.to_string()))
}

/// Parse one phase detail payload from a JSON string.
pub fn parse_phase_detail_str(body: &str) -> Result<PhaseDetail, TimelineError> {
    let value: Value =
        serde_json::from_str(body).map_err(|err| TimelineError::Parse(err.to_string()))?;
    if !value.is_object() {
        return Err(TimelineError::Parse(format!(
            "expected a phase detail object, received {}",
            json_kind(&value)
        )));
    }
    serde_json::from_value(value).map_err(|err| TimelineError::Parse(err.to_string()))
}

/// Message carried by an error body such as `{"error": "Not authenticated"}`,
/// or the trimmed body itself.
pub fn error_message_from_body(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Failure of a single backend call. The controller folds every variant into
/// the same path for its tier.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server responded {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid response: {0}")]
    Decode(String),
}

impl From<TimelineError> for SourceError {
    fn from(err: TimelineError) -> Self {
        SourceError::Decode(err.to_string())
    }
}

/// Body of the detail request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DetailRequest<'a> {
    pub phase_key: &'a str,
}

/// Backend seam for the timeline controller.
///
/// Futures are not `Send`: the controller runs on a single-threaded event loop.
#[async_trait(?Send)]
pub trait PhaseSource {
    /// Fetch the ordered phase listing.
    async fn list_phases(&self) -> Result<Vec<PhaseSummary>, SourceError>;

    /// Fetch detail for one phase.
    async fn phase_detail(&self, phase: &PhaseSummary) -> Result<PhaseDetail, SourceError>;
}

/// `PhaseSource` backed by the JSON endpoints of the timeline backend.
pub struct HttpPhaseSource {
    client: Client,
    list_url: String,
    detail_url: String,
}

impl HttpPhaseSource {
    pub fn new(config: &TimelineConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Reuse a preconfigured client, e.g. one carrying a session cookie.
    pub fn with_client(client: Client, config: &TimelineConfig) -> Self {
        Self {
            client,
            list_url: config.phase_list_url(),
            detail_url: config.phase_detail_url(),
        }
    }

    async fn read_body(response: reqwest::Response) -> Result<String, SourceError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                message: error_message_from_body(&body),
            });
        }
        Ok(body)
    }
}

#[async_trait(?Send)]
impl PhaseSource for HttpPhaseSource {
    async fn list_phases(&self) -> Result<Vec<PhaseSummary>, SourceError> {
        debug!(url = %self.list_url, "Requesting phase list");

        let response = self
            .client
            .get(&self.list_url)
            .send()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?;
        let body = Self::read_body(response).await?;
        let phases = parse_phase_list_str(&body)?;

        info!(count = phases.len(), "Phase list received");
        Ok(phases)
    }

    async fn phase_detail(&self, phase: &PhaseSummary) -> Result<PhaseDetail, SourceError> {
        debug!(url = %self.detail_url, phase = %phase.phase_period, "Requesting phase detail");

        let response = self
            .client
            .post(&self.detail_url)
            .json(&DetailRequest {
                phase_key: &phase.phase_period,
            })
            .send()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?;
        let body = Self::read_body(response).await.map_err(|err| {
            debug!(phase = %phase.phase_period, error = %err, "Phase detail request failed");
            err
        })?;

        Ok(parse_phase_detail_str(&body)?)
    }
}
