//! Camera for ray generation.

use crate::sampling::{random_in_unit_disk, sample_square};
use ember_math::{Ray, Vec3};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard ceiling on path length, so recursion depth stays bounded no matter
/// what a scene file asks for.
pub const MAX_DEPTH_LIMIT: u32 = 128;

/// Largest accepted image width or height, in pixels.
pub const MAX_IMAGE_DIMENSION: u32 = 65_536;

/// Errors raised while validating a camera configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("image width must be at least 1 pixel")]
    ZeroWidth,

    #[error("aspect ratio must be a positive finite number, got {0}")]
    InvalidAspectRatio(f32),

    #[error("image width {width} with aspect ratio {aspect_ratio} gives an image height of 0")]
    ZeroHeight { width: u32, aspect_ratio: f32 },

    #[error("image size {width}x{height} exceeds {limit} pixels per side", limit = MAX_IMAGE_DIMENSION)]
    ImageTooLarge { width: u32, height: u32 },

    #[error("samples per pixel must be at least 1")]
    ZeroSamples,

    #[error("max depth must be between 1 and {limit}, got {0}", limit = MAX_DEPTH_LIMIT)]
    InvalidMaxDepth(u32),

    #[error("vertical field of view must be within (0, 180) degrees, got {0}")]
    InvalidFieldOfView(f32),

    #[error("defocus angle must be a non-negative finite number, got {0}")]
    InvalidDefocusAngle(f32),

    #[error("focus distance must be a positive finite number, got {0}")]
    InvalidFocusDistance(f32),

    #[error("look_from and look_at are the same point")]
    DegenerateView,

    #[error("up vector is non-finite or parallel to the view direction")]
    DegenerateUp,
}

/// Result type for camera construction.
pub type CameraResult<T> = Result<T, CameraError>;

/// User-facing camera settings.
///
/// Every field has a default, so scene files only need to list what they
/// change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Image width in pixels
    pub image_width: u32,
    /// Width over height; the height is derived as floor(width / ratio)
    pub aspect_ratio: f32,
    pub samples_per_pixel: u32,
    /// Maximum ray bounce depth
    pub max_depth: u32,
    /// Vertical field of view in degrees
    pub vfov: f32,
    pub look_from: Vec3,
    pub look_at: Vec3,
    /// Camera-relative up direction
    pub vup: Vec3,
    /// Variation angle of rays through each pixel, in degrees; 0 disables depth of field
    pub defocus_angle: f32,
    /// Distance from camera to plane of perfect focus
    pub focus_dist: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            image_width: 400,
            aspect_ratio: 16.0 / 9.0,
            samples_per_pixel: 100,
            max_depth: 50,
            vfov: 90.0,
            look_from: Vec3::ZERO,
            look_at: Vec3::NEG_Z,
            vup: Vec3::Y,
            defocus_angle: 0.0,
            focus_dist: 10.0,
        }
    }
}

impl CameraConfig {
    /// Image height derived from width and aspect ratio.
    pub fn image_height(&self) -> u32 {
        (self.image_width as f32 / self.aspect_ratio).floor() as u32
    }

    /// Check every setting, so bad input fails before any work is scheduled.
    pub fn validate(&self) -> CameraResult<()> {
        if self.image_width == 0 {
            return Err(CameraError::ZeroWidth);
        }
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            return Err(CameraError::InvalidAspectRatio(self.aspect_ratio));
        }
        if self.image_height() == 0 {
            return Err(CameraError::ZeroHeight {
                width: self.image_width,
                aspect_ratio: self.aspect_ratio,
            });
        }
        if self.image_width > MAX_IMAGE_DIMENSION || self.image_height() > MAX_IMAGE_DIMENSION {
            return Err(CameraError::ImageTooLarge {
                width: self.image_width,
                height: self.image_height(),
            });
        }
        if self.samples_per_pixel == 0 {
            return Err(CameraError::ZeroSamples);
        }
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH_LIMIT {
            return Err(CameraError::InvalidMaxDepth(self.max_depth));
        }
        if !(self.vfov > 0.0 && self.vfov < 180.0) {
            return Err(CameraError::InvalidFieldOfView(self.vfov));
        }
        if !(self.defocus_angle.is_finite() && self.defocus_angle >= 0.0) {
            return Err(CameraError::InvalidDefocusAngle(self.defocus_angle));
        }
        if !(self.focus_dist.is_finite() && self.focus_dist > 0.0) {
            return Err(CameraError::InvalidFocusDistance(self.focus_dist));
        }

        let view = self.look_from - self.look_at;
        if !view.is_finite() || view.length_squared() == 0.0 {
            return Err(CameraError::DegenerateView);
        }
        let side = self.vup.cross(view).length_squared();
        if !self.vup.is_finite() || !(side > 0.0 && side.is_finite()) {
            return Err(CameraError::DegenerateUp);
        }

        Ok(())
    }
}

/// Camera for generating rays into the scene.
///
/// Everything here is derived once from a validated [`CameraConfig`] and
/// never changes, so one camera can be shared by all render threads.
#[derive(Debug, Clone)]
pub struct Camera {
    config: CameraConfig,
    image_height: u32,
    pixel_samples_scale: f32,

    center: Vec3,
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
}

impl Camera {
    pub fn new(config: CameraConfig) -> CameraResult<Self> {
        config.validate()?;

        let image_width = config.image_width;
        let image_height = config.image_height();
        let center = config.look_from;

        // Calculate viewport dimensions
        let theta = config.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * config.focus_dist;
        let viewport_width = viewport_height * (image_width as f32 / image_height as f32);

        // Calculate camera basis vectors
        let w = (config.look_from - config.look_at).normalize();
        let u = config.vup.cross(w).normalize();
        let v = w.cross(u);

        // Vectors across the horizontal and down the vertical viewport edges
        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;

        let pixel_delta_u = viewport_u / image_width as f32;
        let pixel_delta_v = viewport_v / image_height as f32;

        let viewport_upper_left = center - config.focus_dist * w - viewport_u / 2.0 - viewport_v / 2.0;
        let pixel00_loc = viewport_upper_left + 0.5 * (pixel_delta_u + pixel_delta_v);

        let defocus_radius = config.focus_dist * (config.defocus_angle / 2.0).to_radians().tan();

        Ok(Self {
            pixel_samples_scale: 1.0 / config.samples_per_pixel as f32,
            image_height,
            center,
            pixel00_loc,
            pixel_delta_u,
            pixel_delta_v,
            defocus_disk_u: u * defocus_radius,
            defocus_disk_v: v * defocus_radius,
            config,
        })
    }

    pub fn image_width(&self) -> u32 {
        self.config.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    pub fn samples_per_pixel(&self) -> u32 {
        self.config.samples_per_pixel
    }

    pub fn max_depth(&self) -> u32 {
        self.config.max_depth
    }

    /// 1 / samples_per_pixel
    pub fn pixel_samples_scale(&self) -> f32 {
        self.pixel_samples_scale
    }

    /// Generate a ray for pixel (i, j) with random sampling.
    ///
    /// The target is jittered within the pixel for antialiasing, and the
    /// origin is spread over the defocus disk when depth of field is on.
    pub fn get_ray(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> Ray {
        let offset = sample_square(rng);

        let pixel_sample = self.pixel00_loc
            + ((i as f32) + offset.x) * self.pixel_delta_u
            + ((j as f32) + offset.y) * self.pixel_delta_v;

        let ray_origin = if self.config.defocus_angle > 0.0 {
            self.defocus_disk_sample(rng)
        } else {
            self.center
        };

        Ray::new(ray_origin, pixel_sample - ray_origin)
    }

    /// Sample a point on the defocus disk.
    fn defocus_disk_sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        let p = random_in_unit_disk(rng);
        self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
    }
}
