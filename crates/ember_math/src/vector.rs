//! Vector helpers shared by the renderer.
//!
//! `glam::Vec3` already covers the arithmetic. These add the zero-safe and
//! optics operations path tracing needs.

use crate::Vec3;

/// Tolerance for degenerate vectors.
///
/// Used both as a per-component threshold by [`near_zero`] and as a length
/// threshold by [`safe_normalize`].
pub const EPSILON: f32 = 1e-4;

/// True if every component's magnitude is below [`EPSILON`].
#[inline]
pub fn near_zero(v: Vec3) -> bool {
    v.abs().max_element() < EPSILON
}

/// Normalize `v`, returning zero instead of NaN for very short vectors.
#[inline]
pub fn safe_normalize(v: Vec3) -> Vec3 {
    let length = v.length();
    if length < EPSILON || !length.is_finite() {
        Vec3::ZERO
    } else {
        v / length
    }
}

/// Mirror `v` about the normal `n`.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract the unit vector `uv` through a surface with unit normal `n`.
///
/// `eta_ratio` is the ratio of refractive indices (incident over transmitted).
/// Callers are expected to have ruled out total internal reflection.
#[inline]
pub fn refract(uv: Vec3, n: Vec3, eta_ratio: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = eta_ratio * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}
