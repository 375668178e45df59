mod cli;
mod scene;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Args;
use ember_renderer::{bilateral_filter, render, render_sequential, Camera, CameraConfig, RenderSettings};
use scene::SceneDescription;
use std::time::Instant;

/// Apply command line overrides on top of the scene's camera.
fn camera_config(args: &Args, scene: &SceneDescription) -> CameraConfig {
    let mut config = scene.camera.clone();
    if let Some(width) = args.width {
        config.image_width = width;
    }
    if let Some(samples) = args.samples {
        config.samples_per_pixel = samples;
    }
    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }
    config
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.into())
        .init();

    let scene = match &args.scene {
        Some(path) => SceneDescription::load(path)
            .with_context(|| format!("Failed to load scene {}", path.display()))?,
        None => {
            log::info!("No scene file given, rendering the demo scene");
            SceneDescription::demo()
        }
    };

    let camera = Camera::new(camera_config(&args, &scene)).context("Invalid camera settings")?;
    let world = scene.build_world().context("Failed to build scene")?;

    let settings = RenderSettings {
        tile_size: args.tile_size,
        workers: args.workers,
        seed: args.seed,
        tile_order: args.tile_order.into(),
    };

    let output = if args.sequential {
        render_sequential(&camera, &world, &settings)
    } else {
        render(&camera, &world, &settings)
    }
    .context("Render failed")?;

    log::info!(
        "{} tiles on {} workers in {:.2?} (seed {})",
        output.stats.tiles,
        output.stats.workers,
        output.stats.elapsed,
        output.seed
    );

    let image = if args.denoise {
        let start = Instant::now();
        let filtered = bilateral_filter(&output.image, args.spatial_sigma, args.range_sigma)
            .context("Denoising failed")?;
        log::info!("Denoised in {:.2?}", start.elapsed());
        filtered
    } else {
        output.image
    };

    image
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    log::info!("Saved {}", args.output.display());

    Ok(())
}
