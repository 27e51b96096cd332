//! Harmonic series generation for the basic periodic waveforms.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SynthError, SynthResult};

/// Number of partials generated for the non-sine waveforms.
pub const MAX_HARMONICS: usize = 15;

/// Upper frequency limit used by [`generate_band_limited`] when the caller
/// has no better bound (roughly the top of human hearing).
pub const DEFAULT_FREQUENCY_CEILING: f64 = 20_000.0;

/// Most partials [`generate_band_limited`] will build. A 20 Hz sawtooth
/// under the default ceiling needs 1000.
pub const MAX_BAND_LIMITED_HARMONICS: usize = 2048;

/// Supported waveform shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveformType {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl WaveformType {
    pub const ALL: [WaveformType; 4] = [
        WaveformType::Sine,
        WaveformType::Square,
        WaveformType::Sawtooth,
        WaveformType::Triangle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WaveformType::Sine => "sine",
            WaveformType::Square => "square",
            WaveformType::Sawtooth => "sawtooth",
            WaveformType::Triangle => "triangle",
        }
    }

    /// Step between consecutive harmonic indices.
    fn step(self) -> usize {
        match self {
            WaveformType::Square | WaveformType::Triangle => 2,
            WaveformType::Sine | WaveformType::Sawtooth => 1,
        }
    }

    /// Harmonic indices used by the fixed-length series.
    fn indices(self) -> impl Iterator<Item = usize> {
        let count = if self == WaveformType::Sine { 1 } else { MAX_HARMONICS };
        (0..count).map(move |i| 1 + i * self.step())
    }

    /// Amplitude of harmonic `n` relative to the fundamental.
    fn amplitude(self, n: usize) -> f64 {
        let n = n as f64;
        match self {
            WaveformType::Sine => 1.0,
            WaveformType::Square | WaveformType::Sawtooth => 1.0 / n,
            WaveformType::Triangle => 1.0 / (n * n),
        }
    }
}

impl fmt::Display for WaveformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses a waveform name, ignoring ASCII case (`"Square"`, `"SINE"`, ...).
impl FromStr for WaveformType {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WaveformType::ALL
            .into_iter()
            .find(|w| w.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SynthError::invalid(format!("unknown waveform type '{s}'")))
    }
}

/// One sinusoidal partial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarmonicComponent {
    /// Frequency in Hz.
    pub frequency: f64,
    pub amplitude: f64,
}

impl HarmonicComponent {
    pub fn new(frequency: f64, amplitude: f64) -> Self {
        HarmonicComponent { frequency, amplitude }
    }
}

/// A spectral description of a periodic signal: partials ordered by
/// increasing frequency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Waveform {
    components: Vec<HarmonicComponent>,
}

impl Waveform {
    pub fn new(components: Vec<HarmonicComponent>) -> Self {
        Waveform { components }
    }

    /// A single partial at `frequency` with unit amplitude.
    pub fn pure_tone(frequency: f64) -> Self {
        Waveform::new(vec![HarmonicComponent::new(frequency, 1.0)])
    }

    pub fn components(&self) -> &[HarmonicComponent] {
        &self.components
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HarmonicComponent> {
        self.components.iter()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Sum of all partial amplitudes.
    pub fn total_amplitude(&self) -> f64 {
        self.components.iter().map(|c| c.amplitude).sum()
    }

    pub fn into_components(self) -> Vec<HarmonicComponent> {
        self.components
    }
}

impl From<Vec<HarmonicComponent>> for Waveform {
    fn from(components: Vec<HarmonicComponent>) -> Self {
        Waveform::new(components)
    }
}

impl FromIterator<HarmonicComponent> for Waveform {
    fn from_iter<I: IntoIterator<Item = HarmonicComponent>>(iter: I) -> Self {
        Waveform::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Waveform {
    type Item = &'a HarmonicComponent;
    type IntoIter = std::slice::Iter<'a, HarmonicComponent>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}

fn check_frequency(name: &str, value: f64) -> SynthResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SynthError::invalid(format!(
            "{name} must be a positive finite frequency, got {value}"
        )))
    }
}

/// Build the harmonic series of `waveform_type` at `fundamental` Hz.
///
/// Sine yields the fundamental alone; square and triangle use the first
/// [`MAX_HARMONICS`] odd harmonics; sawtooth uses harmonics `1..=MAX_HARMONICS`.
pub fn generate_harmonics(waveform_type: WaveformType, fundamental: f64) -> SynthResult<Waveform> {
    check_frequency("fundamental", fundamental)?;
    Ok(waveform_type
        .indices()
        .map(|n| HarmonicComponent::new(n as f64 * fundamental, waveform_type.amplitude(n)))
        .collect())
}

/// Like [`generate_harmonics`] but looks the waveform up by name.
pub fn generate_harmonics_named(name: &str, fundamental: f64) -> SynthResult<Waveform> {
    generate_harmonics(name.parse()?, fundamental)
}

/// Build the harmonic series keeping every partial at or below `ceiling` Hz.
///
/// A fundamental above the ceiling still produces a single unit partial so
/// the caller never gets silence back. Series longer than
/// [`MAX_BAND_LIMITED_HARMONICS`] fail before anything is allocated.
pub fn generate_band_limited(
    waveform_type: WaveformType,
    fundamental: f64,
    ceiling: f64,
) -> SynthResult<Waveform> {
    check_frequency("fundamental", fundamental)?;
    check_frequency("ceiling", ceiling)?;

    if fundamental > ceiling || waveform_type == WaveformType::Sine {
        return Ok(Waveform::pure_tone(fundamental));
    }

    let step = waveform_type.step() as f64;
    let highest = (ceiling / fundamental).floor();
    let count = ((highest + step - 1.0) / step).floor();
    if count > MAX_BAND_LIMITED_HARMONICS as f64 {
        return Err(SynthError::ResourceLimitExceeded {
            requested: count as u64,
            limit: MAX_BAND_LIMITED_HARMONICS,
        });
    }

    Ok((1..)
        .step_by(waveform_type.step())
        .map(|n: usize| (n, n as f64 * fundamental))
        .take_while(|&(_, freq)| freq <= ceiling)
        .take(MAX_BAND_LIMITED_HARMONICS)
        .map(|(n, freq)| HarmonicComponent::new(freq, waveform_type.amplitude(n)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_is_single_partial() {
        let w = generate_harmonics(WaveformType::Sine, 440.0).unwrap();
        assert_eq!(w.components(), &[HarmonicComponent::new(440.0, 1.0)]);
    }

    #[test]
    fn square_first_partials() {
        let w = generate_harmonics(WaveformType::Square, 100.0).unwrap();
        assert_eq!(w.len(), MAX_HARMONICS);
        assert_eq!(w.components()[0], HarmonicComponent::new(100.0, 1.0));
        assert_eq!(w.components()[1].frequency, 300.0);
        assert!((w.components()[1].amplitude - 1.0 / 3.0).abs() < 1e-12);
        let last = w.components().last().unwrap();
        assert_eq!(last.frequency, (2 * MAX_HARMONICS - 1) as f64 * 100.0);
    }

    #[test]
    fn sawtooth_uses_every_harmonic() {
        let w = generate_harmonics(WaveformType::Sawtooth, 50.0).unwrap();
        assert_eq!(w.len(), MAX_HARMONICS);
        for (i, c) in w.iter().enumerate() {
            let n = (i + 1) as f64;
            assert_eq!(c.frequency, n * 50.0);
            assert!((c.amplitude - 1.0 / n).abs() < 1e-12);
        }
    }

    #[test]
    fn triangle_inverse_square_amplitudes() {
        let w = generate_harmonics(WaveformType::Triangle, 200.0).unwrap();
        assert_eq!(w.len(), MAX_HARMONICS);
        for (i, c) in w.iter().enumerate() {
            let n = (2 * i + 1) as f64;
            assert_eq!(c.frequency, n * 200.0);
            assert!((c.amplitude - 1.0 / (n * n)).abs() < 1e-12);
        }
    }

    #[test]
    fn frequencies_are_integer_multiples() {
        let f = 123.456;
        for wt in WaveformType::ALL {
            let w = generate_harmonics(wt, f).unwrap();
            for c in &w {
                let ratio = c.frequency / f;
                assert!(
                    (ratio - ratio.round()).abs() < 1e-9,
                    "{wt}: {} is not a multiple of {f}",
                    c.frequency
                );
            }
        }
    }

    #[test]
    fn rejects_non_positive_fundamental() {
        for f in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                generate_harmonics(WaveformType::Square, f),
                Err(SynthError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn unknown_name_is_an_error() {
        let err = generate_harmonics_named("noise", 100.0).unwrap_err();
        assert!(matches!(err, SynthError::InvalidArgument(_)));
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("SQUARE".parse::<WaveformType>().unwrap(), WaveformType::Square);
        assert_eq!("Triangle".parse::<WaveformType>().unwrap(), WaveformType::Triangle);
        assert_eq!(" sawtooth ".parse::<WaveformType>().unwrap(), WaveformType::Sawtooth);
        for wt in WaveformType::ALL {
            assert_eq!(wt.to_string().parse::<WaveformType>().unwrap(), wt);
        }
    }

    #[test]
    fn band_limited_stops_at_ceiling() {
        let w = generate_band_limited(WaveformType::Square, 1000.0, 20_000.0).unwrap();
        // Odd harmonics 1, 3, ..., 19
        assert_eq!(w.len(), 10);
        assert!(w.iter().all(|c| c.frequency <= 20_000.0));

        let saw = generate_band_limited(WaveformType::Sawtooth, 1000.0, 20_000.0).unwrap();
        assert_eq!(saw.len(), 20);
        assert_eq!(saw.components()[19].frequency, 20_000.0);
    }

    #[test]
    fn band_limited_above_ceiling_is_pure_tone() {
        let w = generate_band_limited(WaveformType::Triangle, 25_000.0, DEFAULT_FREQUENCY_CEILING)
            .unwrap();
        assert_eq!(w, Waveform::pure_tone(25_000.0));
    }

    #[test]
    fn band_limited_refuses_huge_series() {
        for f in [1.0, 0.01, 0.001, 1e-9] {
            let err = generate_band_limited(WaveformType::Sawtooth, f, DEFAULT_FREQUENCY_CEILING)
                .unwrap_err();
            assert!(
                matches!(
                    err,
                    SynthError::ResourceLimitExceeded {
                        limit: MAX_BAND_LIMITED_HARMONICS,
                        ..
                    }
                ),
                "{f} Hz: {err}"
            );
        }
        // 2500 odd harmonics of 4 Hz fit under 20 kHz.
        assert!(generate_band_limited(WaveformType::Square, 4.0, 20_000.0).is_err());
    }

    #[test]
    fn band_limited_allows_series_up_to_the_limit() {
        let w = generate_band_limited(WaveformType::Sawtooth, 10.0, 20_000.0).unwrap();
        assert_eq!(w.len(), 2000);
        // Odd harmonics 1..=4095 of 5 Hz: exactly the limit.
        let w = generate_band_limited(WaveformType::Triangle, 5.0, 20_475.0).unwrap();
        assert_eq!(w.len(), MAX_BAND_LIMITED_HARMONICS);
        assert_eq!(w.components().last().unwrap().frequency, 4095.0 * 5.0);
    }

    #[test]
    fn waveform_serializes_as_plain_array() {
        let w = Waveform::pure_tone(220.0);
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(json, r#"[{"frequency":220.0,"amplitude":1.0}]"#);
        let wt: WaveformType = serde_json::from_str(r#""triangle""#).unwrap();
        assert_eq!(wt, WaveformType::Triangle);
    }
}
