//! Ember Renderer - CPU Path Tracing
//!
//! A Monte Carlo path tracer for spheres with diffuse, metal and glass
//! materials. The image is split into tiles that a fixed pool of worker
//! threads renders in parallel; a bilateral filter is available to clean
//! up the result.
//!
//! ```no_run
//! use ember_renderer::{render, Camera, CameraConfig, Material, RenderSettings, Sphere, Vec3, World};
//! use std::sync::Arc;
//!
//! let mut world = World::new();
//! world.add(Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, Arc::new(Material::dielectric(1.5))));
//! world.prepare();
//!
//! let camera = Camera::new(CameraConfig::default()).unwrap();
//! let output = render(&camera, &world, &RenderSettings::default()).unwrap();
//! output.image.save("render.png").unwrap();
//! ```

mod camera;
pub mod denoise;
mod framebuffer;
mod hittable;
mod material;
mod pool;
mod renderer;
pub mod sampling;
mod sphere;
mod tile;

pub use camera::{Camera, CameraConfig, CameraError, CameraResult, MAX_DEPTH_LIMIT, MAX_IMAGE_DIMENSION};
pub use denoise::{bilateral_filter, FilterError};
pub use framebuffer::Framebuffer;
pub use hittable::{HitRecord, Hittable, World};
pub use material::{Color, Material, MaterialError, ScatterResult};
pub use pool::{RenderStats, WorkerPool};
pub use renderer::{
    color_to_rgba, linear_to_gamma, ray_color, render, render_pixel, render_sequential, render_tile, sample_pixel,
    sky_gradient, tile_seed, RenderError, RenderOutput, RenderSettings, TileFailure, T_MIN,
};
pub use sphere::{Primitive, Sphere};
pub use tile::{generate_tiles, order_tiles, Tile, TileOrder, DEFAULT_TILE_SIZE};

/// Re-export Vec3 and common math types from ember_math
pub use ember_math::{Interval, Ray, Vec3};
