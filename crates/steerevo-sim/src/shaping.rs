//! Shaping functions shared by task observations and scores.

/// Monotone decreasing reward shaping over a distance.
///
/// Maps `distance = 0` to 1 and decays toward 0 as the distance grows;
/// `scale` is the distance at which the value has halved.
///
/// ```
/// use steerevo_sim::shaping::dropoff;
///
/// assert_eq!(dropoff(0.0, 60.0), 1.0);
/// assert_eq!(dropoff(60.0, 60.0), 0.5);
/// ```
#[must_use]
pub fn dropoff(distance: f64, scale: f64) -> f64 {
    1.0 / (distance / scale + 1.0)
}

/// `sign(x) * sqrt(|x|)`.
///
/// Compresses large magnitudes while keeping the sign and the zero crossing.
#[must_use]
pub fn signed_sqrt(x: f64) -> f64 {
    x.abs().sqrt().copysign(x)
}
