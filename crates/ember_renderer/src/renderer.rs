//! Core path tracing renderer.
//!
//! Implements Monte Carlo path tracing with:
//! - Recursive ray tracing bounded by the camera's max depth
//! - Russian roulette termination after the first bounces
//! - Anti-aliasing via multi-sampling
//! - Gamma correction and 8-bit quantization
//!
//! Rendering is tile based. Every tile draws from its own generator seeded
//! by the render seed and the tile index, so a seeded render produces the
//! same pixels whichever worker picks up which tile, in whatever order.

use crate::pool::{RenderStats, WorkerPool};
use crate::sampling::gen_f32;
use crate::tile::{generate_tiles, order_tiles, Tile, TileOrder, DEFAULT_TILE_SIZE};
use crate::{Camera, Color, Framebuffer, Hittable, ScatterResult, World};
use ember_math::{safe_normalize, Interval, Ray};
use image::RgbaImage;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::time::Instant;
use thiserror::Error;

/// Smallest accepted hit distance; keeps scattered rays from re-hitting
/// the surface they start on.
pub const T_MIN: f32 = 0.001;

/// Range of an 8-bit channel before truncation.
const INTENSITY: Interval = Interval::new(0.0, 255.0);

/// Errors that can occur while rendering.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("tile size must be at least 1 pixel")]
    ZeroTileSize,

    #[error("worker count must be at least 1")]
    ZeroWorkers,

    #[error("failed to build render thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("work queue closed before all tiles were queued")]
    QueueClosed,

    #[error("{count} of {total} tiles panicked", count = .failures.len())]
    TilesPanicked { failures: Vec<TileFailure>, total: usize },
}

/// A tile whose rendering panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileFailure {
    /// Raster index of the tile
    pub index: usize,
    /// Panic payload, when it was a string
    pub message: String,
}

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Edge length of the square tiles handed to workers
    pub tile_size: u32,
    /// Worker count; `None` uses all cores but one
    pub workers: Option<usize>,
    /// Render seed; `None` picks a random one
    pub seed: Option<u64>,
    pub tile_order: TileOrder,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            workers: None,
            seed: None,
            tile_order: TileOrder::default(),
        }
    }
}

impl RenderSettings {
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.tile_size == 0 {
            return Err(RenderError::ZeroTileSize);
        }
        if self.workers == Some(0) {
            return Err(RenderError::ZeroWorkers);
        }
        Ok(())
    }
}

/// A finished render.
#[derive(Debug)]
pub struct RenderOutput {
    pub image: RgbaImage,
    pub stats: RenderStats,
    /// Seed actually used, for reproducing the render
    pub seed: u64,
}

/// Compute the color seen by a ray.
///
/// This is the core path tracing function. It traces the ray through
/// the scene, bouncing off surfaces and accumulating attenuation until the
/// path escapes to the sky, is absorbed, or runs out of depth.
pub fn ray_color(ray: &Ray, world: &dyn Hittable, depth: u32, max_depth: u32, rng: &mut dyn RngCore) -> Color {
    // Out of bounces: no more light is gathered
    if depth == 0 {
        return Color::ZERO;
    }

    let Some(rec) = world.hit(ray, Interval::from_min(T_MIN)) else {
        return sky_gradient(ray);
    };

    let Some(ScatterResult { mut attenuation, scattered }) = rec.material.scatter(ray, &rec, rng) else {
        return Color::ZERO;
    };

    // Russian roulette, once the first bounces are done
    if depth < max_depth.saturating_sub(2) {
        let termination = (1.0 - attenuation.max_element()).max(0.0);
        if gen_f32(rng) < termination {
            return Color::ZERO;
        }
        let survival = 1.0 - termination;
        if survival > 0.0 {
            attenuation /= survival;
        }
    }

    attenuation * ray_color(&scattered, world, depth - 1, max_depth, rng)
}

/// Sky background: white at the horizon below, blue overhead.
pub fn sky_gradient(ray: &Ray) -> Color {
    let unit_direction = safe_normalize(ray.direction());
    let a = 0.5 * (unit_direction.y + 1.0);
    let white = Color::new(1.0, 1.0, 1.0);
    let blue = Color::new(0.5, 0.7, 1.0);
    white * (1.0 - a) + blue * a
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Quantize one linear channel to 8 bits.
#[inline]
fn quantize(linear: f32) -> u8 {
    INTENSITY.clamp((255.0 * linear_to_gamma(linear)).floor()) as u8
}

/// Convert a linear color to gamma-corrected 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    [quantize(color.x), quantize(color.y), quantize(color.z), 255]
}

/// Average linear color of a pixel over all its samples.
pub fn sample_pixel(camera: &Camera, world: &dyn Hittable, x: u32, y: u32, rng: &mut dyn RngCore) -> Color {
    let max_depth = camera.max_depth();
    let mut pixel_color = Color::ZERO;

    for _ in 0..camera.samples_per_pixel() {
        let ray = camera.get_ray(x, y, rng);
        pixel_color += ray_color(&ray, world, max_depth, max_depth, rng);
    }

    pixel_color * camera.pixel_samples_scale()
}

/// Render a single pixel with multi-sampling, ready for output.
pub fn render_pixel(camera: &Camera, world: &dyn Hittable, x: u32, y: u32, rng: &mut dyn RngCore) -> [u8; 4] {
    color_to_rgba(sample_pixel(camera, world, x, y, rng))
}

/// Derive a tile's generator seed from the render seed (SplitMix64 finalizer).
pub fn tile_seed(seed: u64, tile_index: usize) -> u64 {
    let mut z = seed ^ (tile_index as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Render every pixel of one tile into the framebuffer, in raster order.
pub fn render_tile(tile: &Tile, camera: &Camera, world: &World, framebuffer: &Framebuffer, seed: u64) {
    let mut rng = StdRng::seed_from_u64(tile_seed(seed, tile.index));
    for (x, y) in tile.pixels() {
        framebuffer.set(x, y, render_pixel(camera, world, x, y, &mut rng));
    }
}

/// Tiles for a render, in the requested order.
fn plan_tiles(camera: &Camera, settings: &RenderSettings, seed: u64) -> Vec<Tile> {
    let (width, height) = (camera.image_width(), camera.image_height());
    let mut tiles = generate_tiles(width, height, settings.tile_size);
    // Separate stream from the tile generators so ordering never shifts pixels.
    let mut order_rng = StdRng::seed_from_u64(!seed);
    order_tiles(&mut tiles, settings.tile_order, width, height, &mut order_rng);
    tiles
}

/// Render the scene on a pool of worker threads.
pub fn render(camera: &Camera, world: &World, settings: &RenderSettings) -> Result<RenderOutput, RenderError> {
    settings.validate()?;

    let seed = settings.seed.unwrap_or_else(rand::random);
    let pool = match settings.workers {
        Some(workers) => WorkerPool::new(workers),
        None => WorkerPool::from_available_parallelism(),
    };
    let tiles = plan_tiles(camera, settings, seed);

    log::info!(
        "Rendering {}x{} @ {} spp, max depth {} ({} tiles, {} workers, seed {})",
        camera.image_width(),
        camera.image_height(),
        camera.samples_per_pixel(),
        camera.max_depth(),
        tiles.len(),
        pool.workers(),
        seed
    );

    let framebuffer = Framebuffer::new(camera.image_width(), camera.image_height());
    let stats = pool.run(tiles, |tile| render_tile(tile, camera, world, &framebuffer, seed))?;

    log::info!("Rendered in {:.2?}", stats.elapsed);

    Ok(RenderOutput {
        image: framebuffer.into_image(),
        stats,
        seed,
    })
}

/// Render the scene on the calling thread.
///
/// Uses the same tiles and seeding as [`render`], so for a fixed seed both
/// produce identical images.
pub fn render_sequential(
    camera: &Camera,
    world: &World,
    settings: &RenderSettings,
) -> Result<RenderOutput, RenderError> {
    settings.validate()?;

    let seed = settings.seed.unwrap_or_else(rand::random);
    let tiles = plan_tiles(camera, settings, seed);
    let framebuffer = Framebuffer::new(camera.image_width(), camera.image_height());

    log::info!(
        "Rendering {}x{} @ {} spp on one thread ({} tiles, seed {})",
        camera.image_width(),
        camera.image_height(),
        camera.samples_per_pixel(),
        tiles.len(),
        seed
    );

    let start = Instant::now();
    for tile in &tiles {
        render_tile(tile, camera, world, &framebuffer, seed);
    }
    let stats = RenderStats {
        tiles: tiles.len(),
        workers: 1,
        elapsed: start.elapsed(),
    };

    log::info!("Rendered in {:.2?}", stats.elapsed);

    Ok(RenderOutput {
        image: framebuffer.into_image(),
        stats,
        seed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CameraConfig, Material, Sphere};
    use ember_math::Vec3;
    use std::sync::Arc;

    fn demo_world() -> World {
        let mut world = World::new();
        world.add(Sphere::new(
            Vec3::new(0.0, -100.5, -1.0),
            100.0,
            Arc::new(Material::diffuse(Color::new(0.8, 0.8, 0.0))),
        ));
        world.add(Sphere::new(
            Vec3::new(0.0, 0.0, -1.2),
            0.5,
            Arc::new(Material::diffuse(Color::new(0.1, 0.2, 0.5))),
        ));
        world.add(Sphere::new(Vec3::new(-1.0, 0.0, -1.0), 0.5, Arc::new(Material::dielectric(1.5))));
        world.add(Sphere::new(
            Vec3::new(1.0, 0.0, -1.0),
            0.5,
            Arc::new(Material::metal(Color::new(0.8, 0.6, 0.2), 0.3)),
        ));
        world
    }

    fn small_camera(width: u32, aspect_ratio: f32) -> Camera {
        Camera::new(CameraConfig {
            image_width: width,
            aspect_ratio,
            samples_per_pixel: 4,
            max_depth: 10,
            vfov: 90.0,
            focus_dist: 1.0,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_sky_gradient_extremes() {
        let down = Ray::new(Vec3::ZERO, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(sky_gradient(&down), Color::new(1.0, 1.0, 1.0));

        let up = Ray::new(Vec3::ZERO, Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(sky_gradient(&up), Color::new(0.5, 0.7, 1.0));
    }

    #[test]
    fn test_miss_returns_sky() {
        let world = World::new();
        let mut rng = StdRng::seed_from_u64(0);

        let down = Ray::new(Vec3::ZERO, Vec3::NEG_Y);
        assert_eq!(ray_color(&down, &world, 10, 10, &mut rng), Color::ONE);

        let up = Ray::new(Vec3::ZERO, Vec3::Y);
        assert_eq!(ray_color(&up, &world, 10, 10, &mut rng), Color::new(0.5, 0.7, 1.0));
    }

    #[test]
    fn test_zero_depth_is_black() {
        let world = demo_world();
        let mut rng = StdRng::seed_from_u64(0);

        for direction in [Vec3::NEG_Z, Vec3::Y, Vec3::NEG_Y] {
            let ray = Ray::new(Vec3::ZERO, direction);
            assert_eq!(ray_color(&ray, &world, 0, 10, &mut rng), Color::ZERO);
        }
    }

    #[test]
    fn test_closed_room_gathers_no_light() {
        // Camera inside a white diffuse sphere: paths never escape.
        let mut world = World::new();
        world.add(Sphere::new(Vec3::ZERO, 10.0, Arc::new(Material::diffuse(Color::ONE))));
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..100 {
            let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
            assert_eq!(ray_color(&ray, &world, 20, 20, &mut rng), Color::ZERO);
        }
    }

    #[test]
    fn test_glass_passes_sky_through() {
        let mut world = World::new();
        world.add(Sphere::new(Vec3::new(0.0, 0.0, -3.0), 1.0, Arc::new(Material::dielectric(1.5))));
        let mut rng = StdRng::seed_from_u64(12);

        for _ in 0..200 {
            let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
            let color = ray_color(&ray, &world, 50, 50, &mut rng);
            // Clear glass never dims, and Russian roulette never kills a
            // path whose attenuation is 1, so every path reaches the sky.
            assert!(color.min_element() >= 0.5 - 1e-5, "color {color:?}");
            assert!(color.max_element() <= 1.0 + 1e-5, "color {color:?}");
        }
    }

    #[test]
    fn test_russian_roulette_is_unbiased() {
        // Half-gray ground under the sky. One bounce sees the sky directly,
        // so with and without roulette the mean radiance must agree.
        let mut world = World::new();
        world.add(Sphere::new(
            Vec3::new(0.0, -1000.0, 0.0),
            999.0,
            Arc::new(Material::diffuse(Color::splat(0.5))),
        ));
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Y);
        let n = 40_000;

        let mean = |max_depth: u32, seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..n).fold(Color::ZERO, |acc, _| acc + ray_color(&ray, &world, 2, max_depth, &mut rng)) / n as f32
        };

        // depth 2 of max 2: no roulette. depth 2 of max 10: roulette on.
        let plain = mean(2, 1);
        let roulette = mean(10, 2);
        assert!((plain - roulette).abs().max_element() < 0.02, "{plain:?} vs {roulette:?}");
    }

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert_eq!(linear_to_gamma(-1.0), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 0.0001);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_color_to_rgba_clamps() {
        assert_eq!(color_to_rgba(Color::new(0.0, 1.0, 4.0)), [0, 255, 255, 255]);
        assert_eq!(color_to_rgba(Color::new(0.25, -2.0, f32::NAN)), [127, 0, 0, 255]);
    }

    #[test]
    fn test_render_pixel_hits_sphere() {
        let camera = small_camera(10, 1.0);
        let world = demo_world();
        let mut rng = StdRng::seed_from_u64(42);

        // Just above center: the top of the blue diffuse sphere, lit by the sky.
        let color = sample_pixel(&camera, &world, 5, 4, &mut rng);
        assert!(color.length() > 0.0);
        assert!(color.z > color.x);
        assert_eq!(render_pixel(&camera, &world, 5, 4, &mut rng)[3], 255);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        // 64x32 with 32px tiles: two tiles for two workers.
        let camera = small_camera(64, 2.0);
        let world = demo_world();
        let settings = RenderSettings {
            tile_size: 32,
            workers: Some(2),
            seed: Some(1234),
            tile_order: TileOrder::Shuffled,
        };

        let parallel = render(&camera, &world, &settings).unwrap();
        let sequential = render_sequential(&camera, &world, &settings).unwrap();

        assert_eq!(parallel.stats.tiles, 2);
        assert_eq!(parallel.stats.workers, 2);
        assert_eq!(parallel.image.dimensions(), (64, 32));
        assert_eq!(parallel.image.as_raw(), sequential.image.as_raw());
    }

    #[test]
    fn test_tile_order_does_not_change_pixels() {
        let camera = small_camera(48, 1.5);
        let world = demo_world();
        let base = RenderSettings {
            tile_size: 8,
            workers: Some(3),
            seed: Some(99),
            tile_order: TileOrder::Shuffled,
        };

        let shuffled = render(&camera, &world, &base).unwrap();
        let centered = render(
            &camera,
            &world,
            &RenderSettings {
                tile_order: TileOrder::CenterOut,
                ..base
            },
        )
        .unwrap();

        assert_eq!(shuffled.image.as_raw(), centered.image.as_raw());
    }

    #[test]
    fn test_invalid_settings_fail_before_rendering() {
        let camera = small_camera(8, 1.0);
        let world = demo_world();

        let zero_tiles = RenderSettings {
            tile_size: 0,
            ..Default::default()
        };
        assert!(matches!(render(&camera, &world, &zero_tiles), Err(RenderError::ZeroTileSize)));

        let zero_workers = RenderSettings {
            workers: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            render(&camera, &world, &zero_workers),
            Err(RenderError::ZeroWorkers)
        ));
    }

    #[test]
    fn test_tile_seeds_differ() {
        assert_ne!(tile_seed(1, 0), tile_seed(1, 1));
        assert_ne!(tile_seed(1, 0), tile_seed(2, 0));
        assert_eq!(tile_seed(5, 7), tile_seed(5, 7));
    }
}
