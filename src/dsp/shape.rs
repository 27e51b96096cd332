//! Curve shaping laws used to bend envelope segments.
//!
//! Two laws exist and they are not interchangeable: the rational law warps
//! the interpolation position itself and is used for gain envelopes, while
//! the parabolic law yields an offset subtracted from a straight line and is
//! used when capping curves.

/// Shape parameters are clamped to this magnitude before the rational law is
/// evaluated; at ±1 the formula has a singularity.
pub const SHAPE_LIMIT: f64 = 0.99999;

/// A shaping law: maps a position `t` in `[0, 1]` and a shape parameter to
/// a curved value.
pub trait ShapeFunction {
    fn shape(&self, t: f64, shape: f64) -> f64;
}

/// Monotonic rational warp of `t`; the result stays in `[0, 1]` for `t` in
/// `[0, 1]`. Positive shapes bow the curve upward, negative shapes downward.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RationalGainShape;

impl ShapeFunction for RationalGainShape {
    fn shape(&self, t: f64, shape: f64) -> f64 {
        let s = shape.clamp(-SHAPE_LIMIT, SHAPE_LIMIT);
        if s == 0.0 {
            return t;
        }
        let k = 2.0 * s / (1.0 - s);
        (1.0 + k) * t / (1.0 + k * t)
    }
}

/// Parabola that is zero at `t = 0` and `t = 1` and reaches `shape` at
/// `t = 0.5`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParabolicOffsetShape;

impl ShapeFunction for ParabolicOffsetShape {
    fn shape(&self, t: f64, shape: f64) -> f64 {
        if shape == 0.0 {
            return 0.0;
        }
        shape * 4.0 * (t - t * t)
    }
}

/// Rational-gain law as a free function.
pub fn rational_gain(t: f64, shape: f64) -> f64 {
    RationalGainShape.shape(t, shape)
}

/// Parabolic-offset law as a free function.
pub fn parabolic_offset(t: f64, shape: f64) -> f64 {
    ParabolicOffsetShape.shape(t, shape)
}
