pub mod api;
pub mod dsp;
pub mod error;
pub mod preset;

pub use dsp::envelope::{CurvePoint, Envelope, EnvelopeNode, Location};
pub use dsp::harmonics::{
    HarmonicComponent, MAX_HARMONICS, Waveform, WaveformType, generate_band_limited,
    generate_harmonics, generate_harmonics_named,
};
pub use dsp::renderer::{Normalization, RenderOptions, pcm_to_f32, render, render_range};
pub use dsp::shape::{ParabolicOffsetShape, RationalGainShape, ShapeFunction};
pub use error::{SynthError, SynthResult};

use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the sonara-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: harmonic series of a waveform as `[{frequency, amplitude}]`.
#[wasm_bindgen]
pub fn create_waveform(waveform_type: &str, base_freq: f64) -> Result<JsValue, JsValue> {
    let waveform = generate_harmonics_named(waveform_type, base_freq)
        .map_err(|e| JsValue::from_str(&format!("{e}")))?;
    serde_wasm_bindgen::to_value(&waveform).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: rational-gain shaping law.
#[wasm_bindgen]
pub fn apply_shape(t: f64, shape: f64) -> f64 {
    dsp::shape::rational_gain(t, shape)
}

/// WASM-exposed: parabolic-offset shaping law.
#[wasm_bindgen]
pub fn apply_shape_offset(t: f64, shape: f64) -> f64 {
    dsp::shape::parabolic_offset(t, shape)
}

fn envelope_from_js(nodes: JsValue, curves: Vec<f64>) -> Result<Envelope, JsValue> {
    let nodes: Vec<EnvelopeNode> =
        serde_wasm_bindgen::from_value(nodes).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    Envelope::new(nodes, curves).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: multiply each harmonic's amplitude by the EQ gain at its
/// frequency.
#[wasm_bindgen]
pub fn apply_eq(waveform: JsValue, nodes: JsValue, curves: Vec<f64>) -> Result<JsValue, JsValue> {
    let waveform: Waveform =
        serde_wasm_bindgen::from_value(waveform).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    let envelope = envelope_from_js(nodes, curves)?;
    serde_wasm_bindgen::to_value(&envelope.apply_gain(&waveform))
        .map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: cap `[{x, y}]` points to the envelope on a log x axis.
#[wasm_bindgen]
pub fn apply_envelope(
    nodes: JsValue,
    curves: Vec<f64>,
    points: JsValue,
) -> Result<JsValue, JsValue> {
    let envelope = envelope_from_js(nodes, curves)?;
    let points: Vec<CurvePoint> =
        serde_wasm_bindgen::from_value(points).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    let capped = envelope.cap(&points).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    serde_wasm_bindgen::to_value(&capped).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: envelope value at `x` as drawn on a log frequency axis.
#[wasm_bindgen]
pub fn envelope_value(nodes: JsValue, curves: Vec<f64>, x: f64) -> Result<f64, JsValue> {
    let envelope = envelope_from_js(nodes, curves)?;
    envelope.value_at(x).map_err(|e| JsValue::from_str(&format!("{e}")))
}

fn render_from_js(
    components: JsValue,
    sample_rate: u32,
    duration: f64,
    gain: f64,
    normalize: bool,
) -> Result<Vec<i16>, JsValue> {
    let waveform: Waveform =
        serde_wasm_bindgen::from_value(components).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    let options = if normalize {
        RenderOptions::sum_normalized().with_gain(gain)
    } else {
        RenderOptions::gain_scaled(gain)
    };
    render(waveform.components(), sample_rate, duration, &options)
        .map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: additive render of `[{frequency, amplitude}]` to int16 PCM.
/// `normalize` selects sum normalization; otherwise the raw sum is scaled
/// by `gain`.
#[wasm_bindgen]
pub fn generate_pcm_data(
    components: JsValue,
    sample_rate: u32,
    duration: f64,
    gain: f64,
    normalize: bool,
) -> Result<Vec<i16>, JsValue> {
    render_from_js(components, sample_rate, duration, gain, normalize)
}

/// WASM-exposed: same as `generate_pcm_data` but as f32 samples in [-1, 1],
/// ready for an AudioBuffer.
#[wasm_bindgen]
pub fn generate_pcm_samples(
    components: JsValue,
    sample_rate: u32,
    duration: f64,
    gain: f64,
    normalize: bool,
) -> Result<Vec<f32>, JsValue> {
    let pcm = render_from_js(components, sample_rate, duration, gain, normalize)?;
    Ok(pcm_to_f32(&pcm))
}
