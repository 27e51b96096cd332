//! PCM renderer — additive synthesis of harmonic components into 16-bit
//! samples.
//!
//! Every sample is computed independently from its index, so a buffer can be
//! rendered in any partition of index ranges and concatenated in order with
//! identical results. With the `parallel` feature, chunks of the output are
//! filled on rayon worker threads.

use std::f64::consts::TAU;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{SynthError, SynthResult};

use super::harmonics::HarmonicComponent;

/// Largest positive i16 magnitude; full-scale output.
pub const FULL_SCALE: f64 = i16::MAX as f64;

/// Default ceiling on samples per render call (ten minutes at 48 kHz).
pub const DEFAULT_MAX_SAMPLES: usize = 48_000 * 60 * 10;

/// Default number of samples per work unit.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// How the summed partials are brought into the int16 range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Normalization {
    /// Divide by the sum of amplitudes. Output cannot clip for `gain <= 1`,
    /// but loudness drops as partials are added.
    #[default]
    SumNormalized,
    /// Scale the raw sum by `gain` only. The caller picks a gain that avoids
    /// clipping; anything beyond full scale saturates.
    GainScaled,
}

/// Per-call render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    pub normalization: Normalization,
    /// Linear output gain, applied after normalization.
    pub gain: f64,
    /// Requests for more samples than this fail with
    /// [`SynthError::ResourceLimitExceeded`].
    pub max_samples: usize,
    /// Samples per work unit when rendering in chunks.
    pub chunk_size: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            normalization: Normalization::SumNormalized,
            gain: 1.0,
            max_samples: DEFAULT_MAX_SAMPLES,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl RenderOptions {
    /// Sum-normalized output at unit gain.
    pub fn sum_normalized() -> Self {
        RenderOptions::default()
    }

    /// Raw sum scaled by `gain`.
    pub fn gain_scaled(gain: f64) -> Self {
        RenderOptions {
            normalization: Normalization::GainScaled,
            gain,
            ..RenderOptions::default()
        }
    }

    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }

    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}

/// Number of samples for `duration` seconds at `sample_rate`, checked
/// against `max_samples` before anything is allocated.
pub fn sample_count(sample_rate: u32, duration: f64, max_samples: usize) -> SynthResult<usize> {
    if sample_rate == 0 {
        return Err(SynthError::invalid("sample rate must be positive"));
    }
    if !duration.is_finite() || duration <= 0.0 {
        return Err(SynthError::invalid(format!(
            "duration must be a positive number of seconds, got {duration}"
        )));
    }
    let count = (sample_rate as f64 * duration).floor();
    if count > max_samples as f64 {
        return Err(SynthError::ResourceLimitExceeded {
            requested: count as u64,
            limit: max_samples,
        });
    }
    Ok(count as usize)
}

/// Precomputed synthesis state shared by every chunk of one render.
struct Additive<'a> {
    components: &'a [HarmonicComponent],
    sample_rate: f64,
    normalization: Normalization,
    divisor: f64,
    gain: f64,
}

impl<'a> Additive<'a> {
    fn new(
        components: &'a [HarmonicComponent],
        sample_rate: u32,
        options: &RenderOptions,
    ) -> SynthResult<Self> {
        if sample_rate == 0 {
            return Err(SynthError::invalid("sample rate must be positive"));
        }
        if !options.gain.is_finite() {
            return Err(SynthError::invalid(format!(
                "gain must be finite, got {}",
                options.gain
            )));
        }
        if let Some(c) = components
            .iter()
            .find(|c| !c.frequency.is_finite() || !c.amplitude.is_finite())
        {
            return Err(SynthError::invalid(format!(
                "harmonic ({}, {}) is not finite",
                c.frequency, c.amplitude
            )));
        }

        let total: f64 = components.iter().map(|c| c.amplitude).sum();
        let divisor = match options.normalization {
            Normalization::SumNormalized if total != 0.0 => total,
            _ => 1.0,
        };

        Ok(Additive {
            components,
            sample_rate: sample_rate as f64,
            normalization: options.normalization,
            divisor,
            gain: options.gain,
        })
    }

    /// Unquantized sum of all partials at sample `index`.
    fn raw(&self, index: usize) -> f64 {
        let t = index as f64 / self.sample_rate;
        self.components
            .iter()
            .map(|c| c.amplitude * (TAU * c.frequency * t).sin())
            .sum()
    }

    fn value(&self, index: usize) -> f64 {
        let raw = self.raw(index);
        match self.normalization {
            Normalization::SumNormalized => raw / self.divisor * FULL_SCALE * self.gain,
            Normalization::GainScaled => raw * FULL_SCALE * self.gain,
        }
    }

    /// Fill `out` with samples starting at absolute index `start`.
    /// Returns how many samples were clipped.
    fn fill(&self, out: &mut [i16], start: usize) -> usize {
        let mut clipped = 0;
        for (offset, slot) in out.iter_mut().enumerate() {
            let (sample, did_clip) = quantize(self.value(start + offset));
            *slot = sample;
            clipped += did_clip as usize;
        }
        clipped
    }
}

/// Round to the nearest integer and saturate to the i16 range.
/// The flag reports whether saturation happened.
fn quantize(value: f64) -> (i16, bool) {
    let rounded = value.round();
    let clamped = rounded.clamp(i16::MIN as f64, i16::MAX as f64);
    (clamped as i16, clamped != rounded)
}

#[cfg(feature = "parallel")]
fn fill_chunks(synth: &Additive<'_>, out: &mut [i16], start: usize, chunk_size: usize) -> usize {
    use rayon::prelude::*;

    out.par_chunks_mut(chunk_size)
        .enumerate()
        .map(|(i, chunk)| synth.fill(chunk, start + i * chunk_size))
        .sum()
}

#[cfg(not(feature = "parallel"))]
fn fill_chunks(synth: &Additive<'_>, out: &mut [i16], start: usize, chunk_size: usize) -> usize {
    out.chunks_mut(chunk_size)
        .enumerate()
        .map(|(i, chunk)| synth.fill(chunk, start + i * chunk_size))
        .sum()
}

fn render_indices(
    synth: &Additive<'_>,
    range: Range<usize>,
    options: &RenderOptions,
) -> Vec<i16> {
    let mut pcm = vec![0i16; range.len()];
    let clipped = fill_chunks(synth, &mut pcm, range.start, options.chunk_size.max(1));
    if clipped > 0 {
        log::warn!(
            "{clipped} of {} samples clipped at gain {}",
            pcm.len(),
            options.gain
        );
    }
    pcm
}

/// Render `duration` seconds of the summed `components` as mono i16 PCM.
///
/// Sample `i` is `Σ a·sin(2π·f·i/sample_rate)`, normalized per
/// [`RenderOptions::normalization`], scaled to full scale, rounded and
/// saturated. The buffer holds `floor(sample_rate · duration)` samples.
pub fn render(
    components: &[HarmonicComponent],
    sample_rate: u32,
    duration: f64,
    options: &RenderOptions,
) -> SynthResult<Vec<i16>> {
    let count = sample_count(sample_rate, duration, options.max_samples)?;
    let synth = Additive::new(components, sample_rate, options)?;
    log::debug!(
        "rendering {count} samples of {} harmonics at {sample_rate} Hz ({:?})",
        components.len(),
        options.normalization
    );
    Ok(render_indices(&synth, 0..count, options))
}

/// Render only the samples whose indices fall in `range`. Concatenating the
/// ranges of a partition gives exactly the output of [`render`].
pub fn render_range(
    components: &[HarmonicComponent],
    sample_rate: u32,
    range: Range<usize>,
    options: &RenderOptions,
) -> SynthResult<Vec<i16>> {
    if range.len() > options.max_samples {
        return Err(SynthError::ResourceLimitExceeded {
            requested: range.len() as u64,
            limit: options.max_samples,
        });
    }
    let synth = Additive::new(components, sample_rate, options)?;
    Ok(render_indices(&synth, range, options))
}

/// Convert i16 PCM to floats in `[-1, 1]` for hosts that play f32 audio.
pub fn pcm_to_f32(samples: &[i16]) -> Vec<f32> {
    samples
        .iter()
        .map(|&s| (s as f32 / FULL_SCALE as f32).max(-1.0))
        .collect()
}
