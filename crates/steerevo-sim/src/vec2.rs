use std::f64::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A point or displacement in arena coordinates.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::Sub,
    derive_more::Mul,
    derive_more::Display,
)]
#[display("({x:.2}, {y:.2})")]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `angle` radians from the positive x axis.
    #[must_use]
    pub fn from_angle(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(cos, sin)
    }

    /// Unit vector with a uniformly distributed direction.
    pub fn random_unit<R>(rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::from_angle(rng.random_range(0.0..TAU))
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Returns the unit vector in the same direction, or [`Vec2::ZERO`] for a
    /// zero-length vector.
    #[must_use]
    pub fn normalize_or_zero(self) -> Self {
        let len = self.length();
        if len > 0.0 { self * (1.0 / len) } else { Self::ZERO }
    }

    /// Caps the length at `max`, preserving direction.
    #[must_use]
    pub fn clamp_length(self, max: f64) -> Self {
        if self.length() > max {
            self.normalize_or_zero() * max
        } else {
            self
        }
    }

    #[must_use]
    pub fn map(self, mut f: impl FnMut(f64) -> f64) -> Self {
        Self::new(f(self.x), f(self.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_length_preserves_direction() {
        let v = Vec2::new(3.0, 4.0).clamp_length(1.0);
        assert!((v.length() - 1.0).abs() < 1e-12);
        assert!((v.x - 0.6).abs() < 1e-12);
        assert!((v.y - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_clamp_length_leaves_short_vectors() {
        let v = Vec2::new(0.3, -0.4);
        assert_eq!(v.clamp_length(1.0), v);
    }

    #[test]
    fn test_normalize_zero() {
        assert_eq!(Vec2::ZERO.normalize_or_zero(), Vec2::ZERO);
    }

    #[test]
    fn test_display() {
        assert_eq!(Vec2::new(1.0, -2.5).to_string(), "(1.00, -2.50)");
    }
}
