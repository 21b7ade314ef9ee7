//! Piecewise keyframe curves with wrap-around continuity.
//!
//! A [`KeyframeCurve`] maps an input on a periodic domain `[0, period]` to a
//! value by interpolating between the two surrounding keyframes. Inputs
//! outside the domain wrap. Both ends of the domain must carry a key, and the
//! two end keys must hold the same value, so evaluating at `0` and at
//! `period` gives identical results.
//!
//! The time clock uses curves over hours (`period = 24`); the sky palette
//! uses curves over normalized time (`period = 1`).

use std::fmt::Debug;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Tolerance for the wrap-around equality check between the end keys.
pub const WRAP_TOLERANCE: f32 = 1e-5;

/// Errors raised when a keyframe table is inconsistent.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CurveError {
    /// The curve period is not a positive finite number.
    #[error("curve period must be positive and finite, got {period}")]
    InvalidPeriod {
        /// The rejected period.
        period: f32,
    },

    /// Fewer than two keyframes were supplied.
    #[error("curve needs at least 2 keyframes, got {count}")]
    TooFewKeys {
        /// Number of keyframes supplied.
        count: usize,
    },

    /// A key or value is NaN or infinite.
    #[error("keyframe {index} is not finite")]
    NonFinite {
        /// Position of the offending keyframe.
        index: usize,
    },

    /// Keys are not strictly increasing.
    #[error("keyframe {index} does not increase (key {key} after {previous})")]
    NotIncreasing {
        /// Position of the offending keyframe.
        index: usize,
        /// Its key.
        key: f32,
        /// The key before it.
        previous: f32,
    },

    /// The first key is not at 0 or the last key is not at the period.
    #[error("curve must have keys at 0 and {period}, found {first} and {last}")]
    MissingBoundary {
        /// Required last key.
        period: f32,
        /// Actual first key.
        first: f32,
        /// Actual last key.
        last: f32,
    },

    /// The values at 0 and at the period differ.
    #[error("curve value at 0 differs from value at {period}")]
    WrapMismatch {
        /// The curve period.
        period: f32,
    },
}

/// How values between two keyframes are blended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Straight-line blend.
    #[default]
    Linear,
    /// Smoothstep eased blend with zero slope at each key.
    Smooth,
}

impl Interpolation {
    /// Map a linear segment fraction onto this interpolation's easing.
    pub fn ease(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Smooth => t * t * 2.0f32.mul_add(-t, 3.0),
        }
    }
}

/// A value type that keyframe curves can interpolate.
pub trait Interpolate: Copy + Debug + PartialEq {
    /// Blend from `a` to `b` by fraction `t`.
    fn interpolate(a: Self, b: Self, t: f32) -> Self;

    /// Whether every component is finite.
    fn is_finite_value(&self) -> bool;

    /// Largest absolute component difference between two values.
    fn max_difference(a: Self, b: Self) -> f32;
}

impl Interpolate for f32 {
    fn interpolate(a: Self, b: Self, t: f32) -> Self {
        (b - a).mul_add(t, a)
    }

    fn is_finite_value(&self) -> bool {
        self.is_finite()
    }

    fn max_difference(a: Self, b: Self) -> f32 {
        (a - b).abs()
    }
}

impl Interpolate for Vec3 {
    fn interpolate(a: Self, b: Self, t: f32) -> Self {
        a.lerp(b, t)
    }

    fn is_finite_value(&self) -> bool {
        self.is_finite()
    }

    fn max_difference(a: Self, b: Self) -> f32 {
        (a - b).abs().max_element()
    }
}

/// One control point of a curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe<T> {
    /// Input position on the curve's domain.
    pub key: f32,
    /// Output value at `key`.
    pub value: T,
}

impl<T> Keyframe<T> {
    /// Create a keyframe.
    pub const fn new(key: f32, value: T) -> Self {
        Self { key, value }
    }
}

/// A validated periodic keyframe curve.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeCurve<T> {
    keys: Vec<Keyframe<T>>,
    period: f32,
    interpolation: Interpolation,
    /// Shared value of the two end keys.
    wrap_value: T,
}

impl<T: Interpolate> KeyframeCurve<T> {
    /// Validate and build a curve.
    ///
    /// Keys must be finite and strictly increasing, the first key must be
    /// `0`, the last key must be `period`, and the two end values must match
    /// within [`WRAP_TOLERANCE`].
    ///
    /// # Errors
    ///
    /// Returns the first [`CurveError`] found.
    pub fn new(
        keys: Vec<Keyframe<T>>,
        period: f32,
        interpolation: Interpolation,
    ) -> Result<Self, CurveError> {
        if !period.is_finite() || period <= 0.0 {
            return Err(CurveError::InvalidPeriod { period });
        }
        let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
            return Err(CurveError::TooFewKeys { count: keys.len() });
        };
        if keys.len() < 2 {
            return Err(CurveError::TooFewKeys { count: keys.len() });
        }

        for (index, frame) in keys.iter().enumerate() {
            if !frame.key.is_finite() || !frame.value.is_finite_value() {
                return Err(CurveError::NonFinite { index });
            }
        }
        for (offset, pair) in keys.windows(2).enumerate() {
            if let [previous, next] = pair {
                if next.key <= previous.key {
                    return Err(CurveError::NotIncreasing {
                        index: offset.saturating_add(1),
                        key: next.key,
                        previous: previous.key,
                    });
                }
            }
        }

        if first.key.abs() > WRAP_TOLERANCE || (last.key - period).abs() > WRAP_TOLERANCE {
            return Err(CurveError::MissingBoundary {
                period,
                first: first.key,
                last: last.key,
            });
        }
        if T::max_difference(first.value, last.value) > WRAP_TOLERANCE {
            return Err(CurveError::WrapMismatch { period });
        }

        let wrap_value = first.value;
        Ok(Self {
            keys,
            period,
            interpolation,
            wrap_value,
        })
    }

    /// Build a curve from `(key, value)` pairs.
    ///
    /// # Errors
    ///
    /// Same as [`KeyframeCurve::new`].
    pub fn from_pairs(
        pairs: &[(f32, T)],
        period: f32,
        interpolation: Interpolation,
    ) -> Result<Self, CurveError> {
        let keys = pairs
            .iter()
            .map(|&(key, value)| Keyframe::new(key, value))
            .collect();
        Self::new(keys, period, interpolation)
    }

    /// Evaluate the curve at `input`, wrapping it into the domain first.
    ///
    /// A NaN input evaluates at `0`.
    pub fn evaluate(&self, input: f32) -> T {
        let x = if input.is_finite() {
            input.rem_euclid(self.period)
        } else {
            0.0
        };

        let upper = self.keys.partition_point(|frame| frame.key <= x);
        let lower = upper.saturating_sub(1);
        let (Some(prev), Some(next)) = (self.keys.get(lower), self.keys.get(upper)) else {
            // Past the last key, only reachable at exactly `period`.
            return self.wrap_value;
        };

        let span = next.key - prev.key;
        let t = if span > 0.0 { (x - prev.key) / span } else { 0.0 };
        T::interpolate(prev.value, next.value, self.interpolation.ease(t))
    }

    /// The keyframes, sorted by key.
    pub fn keys(&self) -> &[Keyframe<T>] {
        &self.keys
    }

    /// Length of the periodic domain.
    pub const fn period(&self) -> f32 {
        self.period
    }

    /// Interpolation mode between keys.
    pub const fn interpolation(&self) -> Interpolation {
        self.interpolation
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn hours(pairs: &[(f32, f32)]) -> Result<KeyframeCurve<f32>, CurveError> {
        KeyframeCurve::from_pairs(pairs, 24.0, Interpolation::Linear)
    }

    #[test]
    fn linear_interpolation_between_keys() {
        let curve = hours(&[(0.0, 0.0), (12.0, 1.0), (24.0, 0.0)]).unwrap();
        assert_eq!(curve.evaluate(0.0), 0.0);
        assert_eq!(curve.evaluate(6.0), 0.5);
        assert_eq!(curve.evaluate(12.0), 1.0);
        assert_eq!(curve.evaluate(18.0), 0.5);
    }

    #[test]
    fn wrap_continuity_at_domain_ends() {
        let curve = hours(&[(0.0, 0.3), (6.0, 1.0), (24.0, 0.3)]).unwrap();
        assert!((curve.evaluate(0.0) - curve.evaluate(24.0)).abs() < WRAP_TOLERANCE);
        assert!((curve.evaluate(23.999) - curve.evaluate(0.0)).abs() < 1e-3);
    }

    #[test]
    fn inputs_outside_domain_wrap() {
        let curve = hours(&[(0.0, 0.0), (12.0, 1.0), (24.0, 0.0)]).unwrap();
        assert_eq!(curve.evaluate(30.0), curve.evaluate(6.0));
        assert_eq!(curve.evaluate(-6.0), curve.evaluate(18.0));
        assert_eq!(curve.evaluate(f32::NAN), curve.evaluate(0.0));
    }

    #[test]
    fn smooth_interpolation_eases_at_keys() {
        let curve =
            KeyframeCurve::from_pairs(&[(0.0, 0.0), (0.5, 1.0), (1.0, 0.0)], 1.0, Interpolation::Smooth)
                .unwrap();
        assert_eq!(curve.evaluate(0.25), 0.5);
        // Smoothstep stays below the linear ramp in the first half of a rise.
        assert!(curve.evaluate(0.1) < 0.2);
        assert!(curve.evaluate(0.4) > 0.8);
    }

    #[test]
    fn vector_curves_interpolate_per_component() {
        let curve = KeyframeCurve::from_pairs(
            &[(0.0, Vec3::ZERO), (0.5, Vec3::new(1.0, 0.5, 0.0)), (1.0, Vec3::ZERO)],
            1.0,
            Interpolation::Linear,
        )
        .unwrap();
        let mid = curve.evaluate(0.25);
        assert!((mid - Vec3::new(0.5, 0.25, 0.0)).abs().max_element() < 1e-6);
    }

    #[test]
    fn rejects_too_few_keys() {
        assert_eq!(hours(&[]), Err(CurveError::TooFewKeys { count: 0 }));
        assert_eq!(hours(&[(0.0, 1.0)]), Err(CurveError::TooFewKeys { count: 1 }));
    }

    #[test]
    fn rejects_missing_wrap_keys() {
        let result = hours(&[(1.0, 0.0), (24.0, 0.0)]);
        assert!(matches!(result, Err(CurveError::MissingBoundary { .. })));
        let result = hours(&[(0.0, 0.0), (20.0, 0.0)]);
        assert!(matches!(result, Err(CurveError::MissingBoundary { .. })));
    }

    #[test]
    fn rejects_mismatched_wrap_values() {
        let result = hours(&[(0.0, 0.0), (12.0, 1.0), (24.0, 0.5)]);
        assert_eq!(result, Err(CurveError::WrapMismatch { period: 24.0 }));
    }

    #[test]
    fn rejects_unsorted_and_non_finite_keys() {
        let result = hours(&[(0.0, 0.0), (12.0, 1.0), (12.0, 0.5), (24.0, 0.0)]);
        assert!(matches!(result, Err(CurveError::NotIncreasing { index: 2, .. })));
        let result = hours(&[(0.0, 0.0), (12.0, f32::NAN), (24.0, 0.0)]);
        assert_eq!(result, Err(CurveError::NonFinite { index: 1 }));
    }

    #[test]
    fn rejects_bad_period() {
        let result = KeyframeCurve::from_pairs(&[(0.0, 0.0), (1.0, 0.0)], 0.0, Interpolation::Linear);
        assert!(matches!(result, Err(CurveError::InvalidPeriod { .. })));
    }

    #[test]
    fn smoothstep_ease_endpoints() {
        assert_eq!(Interpolation::Smooth.ease(0.0), 0.0);
        assert_eq!(Interpolation::Smooth.ease(1.0), 1.0);
        assert_eq!(Interpolation::Smooth.ease(0.5), 0.5);
        assert_eq!(Interpolation::Linear.ease(2.0), 1.0);
    }
}
