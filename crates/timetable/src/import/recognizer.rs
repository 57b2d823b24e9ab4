//! HTTP client for the external timetable recognizer.
//!
//! The recognizer takes a timetable image and answers with a JSON list of
//! `{subjectText, dayOfWeek, startTime, endTime, location?, teacher?}`
//! objects. It is called once per import; there are no retries here.

use super::types::{ImportRequest, RawPeriod};
use crate::error::TimetableError;
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use url::Url;

/// Path of the recognition endpoint, relative to the base URL.
const RECOGNIZE_PATH: &str = "recognize_timetable";

/// Configuration for the recognizer client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Base URL of the recognizer service
    pub base_url: String,
    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds (recognition is slow)
    pub request_timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8090/".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
            user_agent: concat!("timetable/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Client for the image recognition service.
pub struct RecognizerClient {
    client: Client,
    endpoint: Url,
}

impl RecognizerClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: &RecognizerConfig) -> Result<Self, TimetableError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TimetableError::Recognizer {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        let endpoint = Url::parse(&config.base_url)?.join(RECOGNIZE_PATH)?;

        Ok(Self { client, endpoint })
    }

    /// The full URL requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Sends an image to the recognizer and returns the periods it found.
    ///
    /// # Arguments
    /// * `request` - Image payload and optional hints
    /// * `existing_subjects` - The caller's subject names, passed along so
    ///   the recognizer can prefer familiar spellings
    ///
    /// # Returns
    /// * `Ok(Vec<RawPeriod>)` - Possibly empty list of recognized periods
    /// * `Err(TimetableError::Recognizer)` - Transport or protocol failure
    pub async fn recognize(
        &self,
        request: &ImportRequest,
        existing_subjects: &[String],
    ) -> Result<Vec<RawPeriod>, TimetableError> {
        let correlation_id = generate_correlation_id();
        let start = Instant::now();

        info!(
            correlation_id = %correlation_id,
            url = %self.endpoint,
            image_digest = %image_digest(&request.image),
            image_len = request.image.len(),
            "Sending timetable image to recognizer"
        );

        let body = json!({
            "image": request.image,
            "mimeType": request.mime_type,
            "hints": request.hints,
            "existingSubjects": existing_subjects,
            "requestedAt": chrono::Utc::now().to_rfc3339(),
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("X-Correlation-Id", &correlation_id)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| {
                error!(
                    correlation_id = %correlation_id,
                    error = %e,
                    "Recognizer request failed"
                );
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let error_text = response.text().await.unwrap_or_default();
            error!(
                correlation_id = %correlation_id,
                status = %status,
                "Recognizer returned an error status"
            );
            return Err(TimetableError::Recognizer {
                message: format!("Recognizer returned status {}: {}", status, error_text),
            });
        }

        let value: Value = response.json().await?;
        let periods = parse_recognizer_response(&value);

        info!(
            correlation_id = %correlation_id,
            periods = periods.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Recognizer finished"
        );

        Ok(periods)
    }
}

/// Extracts raw periods from a recognizer response body.
///
/// Anything other than a JSON list counts as "nothing found". Entries that
/// do not have the expected shape are logged and skipped.
pub fn parse_recognizer_response(value: &Value) -> Vec<RawPeriod> {
    let Some(items) = value.as_array() else {
        warn!("Recognizer response is not a list, treating as empty");
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            serde_json::from_value::<RawPeriod>(item.clone())
                .inspect_err(|e| {
                    warn!(index = index, error = %e, "Skipping malformed recognizer entry");
                })
                .ok()
        })
        .collect()
}

/// Short SHA-256 digest of the image payload, for logs.
fn image_digest(image: &str) -> String {
    let digest = Sha256::digest(image.as_bytes());
    hex::encode(&digest[..8])
}

/// Helper module for hex encoding.
mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Generates a unique correlation ID for request tracing.
fn generate_correlation_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let random: u32 = rand::thread_rng().gen();
    format!("{:x}-{:08x}", timestamp & 0xFFFFFFFF, random)
}
