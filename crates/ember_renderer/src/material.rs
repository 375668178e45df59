//! Surface materials and the scattering protocol.

use crate::hittable::HitRecord;
use crate::sampling::{gen_f32, random_unit_vector};
use ember_math::{near_zero, reflect, refract, safe_normalize, Interval, Ray, Vec3};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Color type alias (linear RGB, typically 0-1)
pub type Color = Vec3;

/// Material parameters that cannot be rendered.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MaterialError {
    #[error("albedo must be finite and non-negative, got {0}")]
    InvalidAlbedo(Color),

    #[error("metal fuzz must be within [0, 1], got {0}")]
    InvalidFuzz(f32),

    #[error("index of refraction must be a positive finite number, got {0}")]
    InvalidIor(f32),
}

/// Accepted range for metal fuzz.
const FUZZ_RANGE: Interval = Interval::new(0.0, 1.0);

/// Outcome of a ray scattering off a surface.
#[derive(Debug, Clone, Copy)]
pub struct ScatterResult {
    /// Per-channel throughput applied to light arriving along `scattered`
    pub attenuation: Color,
    /// The continuation ray, starting at the hit point
    pub scattered: Ray,
}

/// How light interacts with a surface.
///
/// Materials are immutable after construction and shared read-only between
/// every sphere that uses them and every render thread.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Material {
    /// Lambertian (matte) surface.
    Diffuse { albedo: Color },
    /// Specular reflector; `fuzz` of 0 is a perfect mirror, 1 is very rough.
    Metal {
        albedo: Color,
        #[serde(default)]
        fuzz: f32,
    },
    /// Clear refractive material such as glass (1.5) or water (1.33).
    Dielectric { ior: f32 },
}

impl Material {
    pub fn diffuse(albedo: Color) -> Self {
        Material::Diffuse { albedo }
    }

    /// Metal with `fuzz` clamped to [0, 1].
    pub fn metal(albedo: Color, fuzz: f32) -> Self {
        Material::Metal {
            albedo,
            fuzz: FUZZ_RANGE.clamp(fuzz),
        }
    }

    pub fn dielectric(ior: f32) -> Self {
        Material::Dielectric { ior }
    }

    /// Check parameters that come from outside, such as scene files.
    pub fn validate(&self) -> Result<(), MaterialError> {
        let check_albedo = |albedo: Color| {
            if albedo.is_finite() && albedo.min_element() >= 0.0 {
                Ok(())
            } else {
                Err(MaterialError::InvalidAlbedo(albedo))
            }
        };

        match *self {
            Material::Diffuse { albedo } => check_albedo(albedo),
            Material::Metal { albedo, fuzz } => {
                check_albedo(albedo)?;
                if FUZZ_RANGE.contains(fuzz) {
                    Ok(())
                } else {
                    Err(MaterialError::InvalidFuzz(fuzz))
                }
            }
            Material::Dielectric { ior } if ior.is_finite() && ior > 0.0 => Ok(()),
            Material::Dielectric { ior } => Err(MaterialError::InvalidIor(ior)),
        }
    }

    /// Scatter an incoming ray.
    ///
    /// Returns `None` when the ray is absorbed.
    pub fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        match *self {
            Material::Diffuse { albedo } => Some(scatter_diffuse(albedo, rec, rng)),
            Material::Metal { albedo, fuzz } => scatter_metal(albedo, fuzz, ray_in, rec, rng),
            Material::Dielectric { ior } => Some(scatter_dielectric(ior, ray_in, rec, rng)),
        }
    }
}

fn scatter_diffuse(albedo: Color, rec: &HitRecord, rng: &mut dyn RngCore) -> ScatterResult {
    let mut direction = rec.normal + random_unit_vector(rng);

    // Catch degenerate scatter direction
    if near_zero(direction) {
        direction = rec.normal;
    }

    ScatterResult {
        attenuation: albedo,
        scattered: Ray::new(rec.p, direction),
    }
}

fn scatter_metal(
    albedo: Color,
    fuzz: f32,
    ray_in: &Ray,
    rec: &HitRecord,
    rng: &mut dyn RngCore,
) -> Option<ScatterResult> {
    let reflected = reflect(safe_normalize(ray_in.direction()), rec.normal);
    let direction = safe_normalize(reflected + fuzz * random_unit_vector(rng));

    // Fuzz can push the ray below the surface; it is absorbed then.
    if direction.dot(rec.normal) > 0.0 {
        Some(ScatterResult {
            attenuation: albedo,
            scattered: Ray::new(rec.p, direction),
        })
    } else {
        None
    }
}

fn scatter_dielectric(ior: f32, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> ScatterResult {
    let refraction_ratio = if rec.front_face { 1.0 / ior } else { ior };

    let unit_direction = safe_normalize(ray_in.direction());
    let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);

    let direction = if must_reflect(cos_theta, refraction_ratio)
        || reflectance(cos_theta, refraction_ratio) > gen_f32(rng)
    {
        reflect(unit_direction, rec.normal)
    } else {
        refract(unit_direction, rec.normal, refraction_ratio)
    };

    ScatterResult {
        attenuation: Color::ONE,
        scattered: Ray::new(rec.p, direction),
    }
}

/// Total internal reflection test: Snell's law has no solution.
#[inline]
pub(crate) fn must_reflect(cos_theta: f32, refraction_ratio: f32) -> bool {
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    refraction_ratio * sin_theta > 1.0
}

/// Schlick's approximation for reflectance
#[inline]
fn reflectance(cosine: f32, refraction_ratio: f32) -> f32 {
    let r0 = ((1.0 - refraction_ratio) / (1.0 + refraction_ratio)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}
