//! DSP — harmonic synthesis and spectral shaping.
//!
//! The pipeline runs leaves first: [`harmonics`] builds a partial series,
//! [`envelope`] optionally reshapes it (using the laws in [`shape`]), and
//! [`renderer`] sums the partials into 16-bit PCM. Everything here is pure;
//! the same code serves the WASM bindings and native callers.

pub mod envelope;
pub mod harmonics;
pub mod renderer;
pub mod shape;
