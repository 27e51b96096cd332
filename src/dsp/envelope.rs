//! Piecewise spectral envelopes.
//!
//! An [`Envelope`] is a list of control nodes joined by shaped segments. It
//! is applied in one of two ways:
//!
//! - **gain** ([`Envelope::apply_gain`]): each harmonic's amplitude is
//!   multiplied by the envelope value at its frequency, interpolated on a
//!   linear frequency axis with the rational shaping law;
//! - **capping** ([`Envelope::cap`]): arbitrary points are limited to the
//!   envelope, interpolated on a logarithmic x axis with the parabolic
//!   offset law. The envelope only ever lowers a point.

use serde::{Deserialize, Serialize};

use crate::error::{SynthError, SynthResult};

use super::harmonics::{HarmonicComponent, Waveform};
use super::shape::{ParabolicOffsetShape, RationalGainShape, ShapeFunction};

/// A control point of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeNode {
    pub x: f64,
    pub y: f64,
}

impl EnvelopeNode {
    pub fn new(x: f64, y: f64) -> Self {
        EnvelopeNode { x, y }
    }
}

/// A point on an arbitrary curve, as consumed by [`Envelope::cap`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub x: f64,
    pub y: f64,
}

impl CurvePoint {
    pub fn new(x: f64, y: f64) -> Self {
        CurvePoint { x, y }
    }
}

/// Where an x coordinate falls relative to the envelope's nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Left of the first node.
    Before,
    /// Inside `[nodes[i].x, nodes[i + 1].x)`.
    Segment(usize),
    /// At or right of the last node.
    After,
}

/// Control nodes plus one shape parameter per segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    nodes: Vec<EnvelopeNode>,
    curves: Vec<f64>,
}

impl Envelope {
    /// Build an envelope, checking that there is at least one node, exactly
    /// one curve per segment, every value is finite, and x never decreases.
    pub fn new(nodes: Vec<EnvelopeNode>, curves: Vec<f64>) -> SynthResult<Self> {
        if nodes.is_empty() {
            return Err(SynthError::invalid("envelope needs at least one node"));
        }
        if curves.len() != nodes.len() - 1 {
            return Err(SynthError::invalid(format!(
                "envelope with {} nodes needs {} curves, got {}",
                nodes.len(),
                nodes.len() - 1,
                curves.len()
            )));
        }
        if let Some(n) = nodes.iter().find(|n| !n.x.is_finite() || !n.y.is_finite()) {
            return Err(SynthError::invalid(format!(
                "envelope node ({}, {}) is not finite",
                n.x, n.y
            )));
        }
        if let Some(c) = curves.iter().find(|c| !c.is_finite()) {
            return Err(SynthError::invalid(format!("curve shape {c} is not finite")));
        }
        if let Some(w) = nodes.windows(2).find(|w| w[1].x < w[0].x) {
            return Err(SynthError::invalid(format!(
                "envelope nodes must be ordered by x ({} follows {})",
                w[1].x, w[0].x
            )));
        }
        Ok(Envelope { nodes, curves })
    }

    /// An envelope with the same value everywhere.
    pub fn constant(y: f64) -> SynthResult<Self> {
        Envelope::new(vec![EnvelopeNode::new(0.0, y)], Vec::new())
    }

    pub fn nodes(&self) -> &[EnvelopeNode] {
        &self.nodes
    }

    pub fn curves(&self) -> &[f64] {
        &self.curves
    }

    fn first(&self) -> EnvelopeNode {
        self.nodes[0]
    }

    fn last(&self) -> EnvelopeNode {
        self.nodes[self.nodes.len() - 1]
    }

    /// Find the segment containing `x`. Segments are half-open and scanned
    /// in order; the first match wins.
    pub fn locate(&self, x: f64) -> Location {
        if x < self.first().x {
            return Location::Before;
        }
        self.nodes
            .windows(2)
            .position(|w| x >= w[0].x && x < w[1].x)
            .map_or(Location::After, Location::Segment)
    }

    /// Envelope gain at frequency `x` on a linear axis. Outside the node
    /// range the nearest boundary node's y is returned unchanged.
    pub fn gain_at(&self, x: f64) -> f64 {
        match self.locate(x) {
            Location::Before => self.first().y,
            Location::After => self.last().y,
            Location::Segment(i) => {
                // A half-open match means the segment has positive width.
                let (start, end) = (self.nodes[i], self.nodes[i + 1]);
                let t = (x - start.x) / (end.x - start.x);
                let curved = RationalGainShape.shape(t, self.curves[i]);
                start.y + (end.y - start.y) * curved
            }
        }
    }

    /// Multiply every harmonic's amplitude by the envelope gain at its
    /// frequency. The input waveform is left untouched.
    pub fn apply_gain(&self, waveform: &Waveform) -> Waveform {
        log::debug!(
            "applying {}-node gain envelope to {} harmonics",
            self.nodes.len(),
            waveform.len()
        );
        waveform
            .iter()
            .map(|c| HarmonicComponent::new(c.frequency, c.amplitude * self.gain_at(c.frequency)))
            .collect()
    }

    /// Cap each point's y at the envelope value for its x.
    ///
    /// Interpolation happens on `ln x`, so every point x must be positive,
    /// and so must the nodes of any segment a point falls in; otherwise a
    /// [`SynthError::Domain`] is returned and nothing is produced. Points
    /// outside the node range pass through unchanged.
    pub fn cap(&self, points: &[CurvePoint]) -> SynthResult<Vec<CurvePoint>> {
        if let Some(p) = points.iter().find(|p| p.x.is_nan() || p.x <= 0.0) {
            return Err(SynthError::domain(format!(
                "capping needs positive x, got {}",
                p.x
            )));
        }

        log::debug!(
            "capping {} points with {}-node envelope",
            points.len(),
            self.nodes.len()
        );
        points
            .iter()
            .map(|p| match self.log_segment(p.x) {
                Some(i) => {
                    let ceiling = self.ceiling_at(i, p.x)?;
                    Ok(CurvePoint::new(p.x, p.y.min(ceiling)))
                }
                None => Ok(*p),
            })
            .collect()
    }

    /// Segment used by the log-axis operations. Unlike [`Envelope::locate`],
    /// a point sitting exactly on the last node belongs to the last segment.
    fn log_segment(&self, x: f64) -> Option<usize> {
        match self.locate(x) {
            Location::Segment(i) => Some(i),
            Location::After if self.nodes.len() > 1 && x == self.last().x => {
                Some(self.nodes.len() - 2)
            }
            _ => None,
        }
    }

    /// Position of `x` inside segment `i` on a log axis, or `None` when the
    /// segment has no width. Fails when the segment starts at or below zero.
    fn log_position(&self, i: usize, x: f64) -> SynthResult<Option<f64>> {
        let (start, end) = (self.nodes[i], self.nodes[i + 1]);
        if start.x <= 0.0 {
            return Err(SynthError::domain(format!(
                "log-axis segment needs positive node x, got {}",
                start.x
            )));
        }
        let log_span = end.x.ln() - start.x.ln();
        if log_span == 0.0 {
            return Ok(None);
        }
        Ok(Some((x.ln() - start.x.ln()) / log_span))
    }

    fn ceiling_at(&self, i: usize, x: f64) -> SynthResult<f64> {
        let (start, end) = (self.nodes[i], self.nodes[i + 1]);
        let Some(t) = self.log_position(i, x)? else {
            return Ok(start.y);
        };
        let linear = start.y + t * (end.y - start.y);
        let offset = ParabolicOffsetShape.shape(t, self.curves[i]);
        Ok(linear - offset * t * (1.0 - t))
    }

    /// The envelope value drawn at `x` on a logarithmic axis, using the
    /// rational shaping law. Clamps to the boundary nodes outside the range;
    /// inside it, the matched segment must start at a positive x.
    pub fn value_at(&self, x: f64) -> SynthResult<f64> {
        let (first, last) = (self.first(), self.last());
        if x <= first.x {
            return Ok(first.y);
        }
        if x >= last.x {
            return Ok(last.y);
        }
        // first.x < x < last.x, so a segment always matches here.
        let Some(i) = self.log_segment(x) else {
            return Ok(last.y);
        };
        let (start, end) = (self.nodes[i], self.nodes[i + 1]);
        let Some(t) = self.log_position(i, x)? else {
            return Ok(start.y);
        };
        Ok(start.y + RationalGainShape.shape(t, self.curves[i]) * (end.y - start.y))
    }
}

#[derive(Deserialize)]
struct RawEnvelope {
    nodes: Vec<EnvelopeNode>,
    #[serde(default)]
    curves: Vec<f64>,
}

impl<'de> Deserialize<'de> for Envelope {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawEnvelope::deserialize(deserializer)?;
        Envelope::new(raw.nodes, raw.curves).map_err(serde::de::Error::custom)
    }
}
