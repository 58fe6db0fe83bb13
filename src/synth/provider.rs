//! Synthesis gateway to the cloud neural-TTS provider
//!
//! The network call is async (reqwest) but the call sites are worker
//! threads, so the client owns a small tokio runtime and bridges with
//! `block_on`. There is no retry policy: a failed attempt aborts the
//! current play action and the user must trigger a fresh one.

use crate::{Result, VoxError};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable holding the provider region
pub const REGION_ENV: &str = "VOXBOARD_TTS_REGION";

/// Environment variable holding the provider subscription key
pub const API_KEY_ENV: &str = "VOXBOARD_TTS_KEY";

/// Something that can turn (text, voice_id) into encoded audio bytes.
///
/// Implemented by the HTTP gateway in production and by mocks in tests.
pub trait SpeechProvider: Send + Sync {
    fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>>;
}

/// Configuration for the neural-TTS HTTP gateway
#[derive(Clone, Debug)]
pub struct NeuralTtsConfig {
    /// Provider region, e.g. "eastus"
    pub region: String,

    /// Subscription key sent with every request
    pub api_key: String,

    /// Requested encoding of the returned audio
    pub output_format: String,

    /// Whole-request timeout
    pub timeout: Duration,
}

impl Default for NeuralTtsConfig {
    fn default() -> Self {
        Self {
            region: "eastus".to_string(),
            api_key: String::new(),
            output_format: "audio-24khz-48kbitrate-mono-mp3".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl NeuralTtsConfig {
    /// Create a config with explicit credentials
    pub fn new(region: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Read region and key from the environment
    pub fn from_env() -> Result<Self> {
        let region = std::env::var(REGION_ENV)
            .map_err(|_| VoxError::Config(format!("{} is not set", REGION_ENV)))?;
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| VoxError::Config(format!("{} is not set", API_KEY_ENV)))?;
        Ok(Self::new(region, api_key))
    }

    /// Set the requested output encoding
    pub fn with_output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = format.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP client for the cloud neural-TTS endpoint
pub struct NeuralTtsClient {
    config: NeuralTtsConfig,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl NeuralTtsClient {
    /// Create a new gateway client
    pub fn new(config: NeuralTtsConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(VoxError::Config("TTS provider API key is required".into()));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| VoxError::Synthesis(format!("Failed to start runtime: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VoxError::Synthesis(format!("Failed to build HTTP client: {}", e)))?;

        info!("Neural TTS gateway ready (region: {})", config.region);

        Ok(Self {
            config,
            client,
            runtime,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.config.region
        )
    }

    fn ssml(text: &str, voice_id: &str) -> String {
        format!(
            "<speak version='1.0' xml:lang='en-US'><voice name='{}'>{}</voice></speak>",
            escape_xml(voice_id),
            escape_xml(text)
        )
    }
}

impl SpeechProvider for NeuralTtsClient {
    fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>> {
        debug!("Requesting synthesis for {} chars with {}", text.len(), voice_id);
        let body = Self::ssml(text, voice_id);

        // Blocks only the calling worker thread, never the UI thread.
        self.runtime.block_on(async {
            let response = self
                .client
                .post(self.endpoint())
                .header("Ocp-Apim-Subscription-Key", &self.config.api_key)
                .header("Content-Type", "application/ssml+xml")
                .header("X-Microsoft-OutputFormat", &self.config.output_format)
                .body(body)
                .send()
                .await
                .map_err(|e| VoxError::Synthesis(format!("Request failed: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(VoxError::Synthesis(format!(
                    "Provider rejected request: HTTP {}",
                    status
                )));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| VoxError::Synthesis(format!("Failed to read response: {}", e)))?;

            if bytes.is_empty() {
                return Err(VoxError::Synthesis("Provider returned empty audio".into()));
            }

            debug!("Received {} bytes of encoded audio", bytes.len());
            Ok(bytes.to_vec())
        })
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&apos;")
        .replace('"', "&quot;")
}
