//! EQ presets — named spectral envelopes stored as JSON.
//!
//! ```json
//! {
//!   "name": "Warm",
//!   "nodes": [{ "x": 20, "y": 1.0 }, { "x": 2000, "y": 0.6 }, { "x": 20000, "y": 0.1 }],
//!   "curves": [0.3, -0.2]
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dsp::envelope::{Envelope, EnvelopeNode};
use crate::error::SynthError;

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("preset is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("preset envelope is invalid: {0}")]
    Invalid(#[from] SynthError),
}

/// A saved EQ curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqPreset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub nodes: Vec<EnvelopeNode>,
    /// One shape per segment; a missing list means straight segments.
    #[serde(default)]
    pub curves: Vec<f64>,
}

impl EqPreset {
    /// Snapshot an envelope under `name`.
    pub fn from_envelope(name: impl Into<String>, envelope: &Envelope) -> Self {
        EqPreset {
            name: Some(name.into()),
            nodes: envelope.nodes().to_vec(),
            curves: envelope.curves().to_vec(),
        }
    }

    /// Parse and validate a preset.
    pub fn from_json(json: &str) -> Result<Self, PresetError> {
        let mut preset: EqPreset = serde_json::from_str(json)?;
        if preset.curves.is_empty() && preset.nodes.len() > 1 {
            preset.curves = vec![0.0; preset.nodes.len() - 1];
        }
        preset.envelope()?;
        Ok(preset)
    }

    pub fn to_json(&self) -> Result<String, PresetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the envelope this preset describes.
    pub fn envelope(&self) -> Result<Envelope, SynthError> {
        Envelope::new(self.nodes.clone(), self.curves.clone())
    }
}
