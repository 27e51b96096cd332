//! Request/response types for the PCM HTTP endpoint.
//!
//! The endpoint takes `{"frequency", "duration", "sr", "amp"}` and answers
//! `{"pcmData": [...]}` with a gain-scaled pure tone. Only the JSON contract
//! lives here; serving it is left to the host application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dsp::harmonics::Waveform;
use crate::dsp::renderer::{self, RenderOptions};
use crate::error::{SynthError, SynthResult};

fn unit_gain() -> f64 {
    1.0
}

/// Body of a PCM render request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcmRequest {
    /// Tone frequency in Hz.
    pub frequency: f64,
    /// Length in seconds.
    pub duration: f64,
    /// Sample rate in Hz.
    pub sr: u32,
    /// Linear gain; full scale at 1.0.
    #[serde(default = "unit_gain")]
    pub amp: f64,
}

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcmResponse {
    #[serde(rename = "pcmData")]
    pub pcm_data: Vec<i16>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error(transparent)]
    Synth(#[from] SynthError),
}

impl ApiError {
    /// HTTP status code to answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::MalformedJson(_) => 400,
            ApiError::Synth(SynthError::ResourceLimitExceeded { .. }) => 413,
            ApiError::Synth(_) => 400,
        }
    }
}

impl PcmRequest {
    /// Render the requested tone with the default sample ceiling.
    pub fn render(&self) -> SynthResult<PcmResponse> {
        self.render_with_limit(renderer::DEFAULT_MAX_SAMPLES)
    }

    pub fn render_with_limit(&self, max_samples: usize) -> SynthResult<PcmResponse> {
        if !self.frequency.is_finite() || self.frequency <= 0.0 {
            return Err(SynthError::invalid(format!(
                "frequency must be positive, got {}",
                self.frequency
            )));
        }
        let tone = Waveform::pure_tone(self.frequency);
        let options = RenderOptions::gain_scaled(self.amp).with_max_samples(max_samples);
        let pcm_data = renderer::render(tone.components(), self.sr, self.duration, &options)?;
        Ok(PcmResponse { pcm_data })
    }
}

/// Parse a request body, render it and serialize the response body.
pub fn handle_pcm_request(body: &str) -> Result<String, ApiError> {
    let request: PcmRequest = serde_json::from_str(body)?;
    log::trace!(
        "pcm request: {} Hz, {} s at {} Hz, amp {}",
        request.frequency,
        request.duration,
        request.sr,
        request.amp
    );
    let response = request.render()?;
    Ok(serde_json::to_string(&response)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_pure_tone() {
        let body = r#"{"frequency": 2000, "duration": 0.001, "sr": 8000, "amp": 1.0}"#;
        let json = handle_pcm_request(body).unwrap();
        let response: PcmResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(response.pcm_data.len(), 8);
        assert_eq!(response.pcm_data[0], 0);
        assert_eq!(response.pcm_data[1], 32767);
        assert!(json.starts_with(r#"{"pcmData":["#));
    }

    #[test]
    fn amp_defaults_to_unity() {
        let request: PcmRequest =
            serde_json::from_str(r#"{"frequency": 440, "duration": 1, "sr": 44100}"#).unwrap();
        assert_eq!(request.amp, 1.0);
    }

    #[test]
    fn loud_requests_saturate_instead_of_wrapping() {
        let request = PcmRequest {
            frequency: 440.0,
            duration: 0.01,
            sr: 8000,
            amp: 1000.0,
        };
        let pcm = request.render().unwrap().pcm_data;
        assert!(pcm.contains(&i16::MAX));
        assert!(pcm.contains(&i16::MIN));
    }

    #[test]
    fn malformed_json_is_bad_request() {
        let err = handle_pcm_request("{not json").unwrap_err();
        assert!(matches!(err, ApiError::MalformedJson(_)));
        assert_eq!(err.status_code(), 400);

        let err = handle_pcm_request(r#"{"frequency": 440, "duration": 1, "sr": -5}"#).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn synthesis_errors_map_to_status() {
        let err = handle_pcm_request(r#"{"frequency": 0, "duration": 1, "sr": 8000}"#).unwrap_err();
        assert!(matches!(err, ApiError::Synth(SynthError::InvalidArgument(_))));
        assert_eq!(err.status_code(), 400);

        let err =
            handle_pcm_request(r#"{"frequency": 440, "duration": 1e9, "sr": 48000}"#).unwrap_err();
        assert_eq!(err.status_code(), 413);
    }
}
