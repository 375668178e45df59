//! Simple path tracer example.
//!
//! Renders the classic three-spheres scene with a field of small random
//! spheres and saves it as PNG.

use ember_renderer::{render, Camera, CameraConfig, Color, Material, RenderSettings, Sphere, Vec3, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Ember Path Tracer - Simple Example");
    println!("==================================");

    // Build the scene
    let start = std::time::Instant::now();
    let world = build_scene(7);
    println!("Scene built in {:?} ({} objects)", start.elapsed(), world.len());

    let camera = Camera::new(CameraConfig {
        image_width: 800,
        aspect_ratio: 16.0 / 9.0,
        samples_per_pixel: 50,
        max_depth: 10,
        vfov: 20.0,
        look_from: Vec3::new(13.0, 2.0, 3.0),
        look_at: Vec3::ZERO,
        vup: Vec3::Y,
        defocus_angle: 0.6,
        focus_dist: 10.0,
    })?;

    println!(
        "Rendering {}x{} @ {} spp...",
        camera.image_width(),
        camera.image_height(),
        camera.samples_per_pixel()
    );

    let settings = RenderSettings {
        seed: Some(42),
        ..Default::default()
    };
    let output = render(&camera, &world, &settings)?;
    println!("Rendered in {:?} on {} workers", output.stats.elapsed, output.stats.workers);

    let filename = "output.png";
    output.image.save(filename)?;
    println!("Saved to {}", filename);
    Ok(())
}

fn build_scene(seed: u64) -> World {
    let mut world = World::new();

    // Ground
    world.add(Sphere::new(
        Vec3::new(0.0, -1000.0, 0.0),
        1000.0,
        Arc::new(Material::diffuse(Color::splat(0.5))),
    ));

    // Three main spheres
    world.add(Sphere::new(Vec3::new(0.0, 1.0, 0.0), 1.0, Arc::new(Material::dielectric(1.5))));
    world.add(Sphere::new(
        Vec3::new(-4.0, 1.0, 0.0),
        1.0,
        Arc::new(Material::diffuse(Color::new(0.4, 0.2, 0.1))),
    ));
    world.add(Sphere::new(
        Vec3::new(4.0, 1.0, 0.0),
        1.0,
        Arc::new(Material::metal(Color::new(0.7, 0.6, 0.5), 0.0)),
    ));

    // Small random spheres
    let mut rng = StdRng::seed_from_u64(seed);
    let glass = Arc::new(Material::dielectric(1.5));

    for a in -5..5 {
        for b in -5..5 {
            let center = Vec3::new(a as f32 + 0.9 * rng.gen::<f32>(), 0.2, b as f32 + 0.9 * rng.gen::<f32>());

            if (center - Vec3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let choose_mat: f32 = rng.gen();
            let material = if choose_mat < 0.8 {
                let albedo = Color::new(rng.gen(), rng.gen(), rng.gen()) * Color::new(rng.gen(), rng.gen(), rng.gen());
                Arc::new(Material::diffuse(albedo))
            } else if choose_mat < 0.95 {
                let albedo = Color::new(rng.gen_range(0.5..1.0), rng.gen_range(0.5..1.0), rng.gen_range(0.5..1.0));
                Arc::new(Material::metal(albedo, rng.gen_range(0.0..0.5)))
            } else {
                Arc::clone(&glass)
            };
            world.add(Sphere::new(center, 0.2, material));
        }
    }

    world.prepare();
    world
}
