use clap::{Parser, ValueEnum};
use ember_renderer::{TileOrder, DEFAULT_TILE_SIZE};
use log::LevelFilter;
use std::path::PathBuf;

/// Log levels selectable on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Tile scheduling order
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TileOrderArg {
    Shuffled,
    CenterOut,
    Raster,
}

impl From<TileOrderArg> for TileOrder {
    fn from(order: TileOrderArg) -> Self {
        match order {
            TileOrderArg::Shuffled => TileOrder::Shuffled,
            TileOrderArg::CenterOut => TileOrder::CenterOut,
            TileOrderArg::Raster => TileOrder::Raster,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "ember")]
#[command(about = "Render a sphere scene with the Ember path tracer")]
pub struct Args {
    /// JSON scene file; renders the built-in demo scene when omitted
    #[arg(long)]
    pub scene: Option<PathBuf>,

    /// Output PNG path
    #[arg(short, long, default_value = "render.png")]
    pub output: PathBuf,

    /// Override the scene's image width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Override the scene's samples per pixel
    #[arg(long, short = 's')]
    pub samples: Option<u32>,

    /// Override the scene's maximum bounce depth
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Render seed, for reproducible images
    #[arg(long)]
    pub seed: Option<u64>,

    /// Worker threads (defaults to all cores but one)
    #[arg(long, short = 'j')]
    pub workers: Option<usize>,

    /// Tile edge length in pixels
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE)]
    pub tile_size: u32,

    #[arg(long, value_enum, default_value = "shuffled")]
    pub tile_order: TileOrderArg,

    /// Render on the calling thread only
    #[arg(long)]
    pub sequential: bool,

    /// Run the bilateral filter over the finished image
    #[arg(long)]
    pub denoise: bool,

    /// Bilateral filter spatial sigma, in pixels
    #[arg(long, default_value_t = 1.5)]
    pub spatial_sigma: f32,

    /// Bilateral filter range sigma, on a 0-1 color scale
    #[arg(long, default_value_t = 0.1)]
    pub range_sigma: f32,

    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}
