//! Erodegen CLI - fractal noise terrain shaped by droplet erosion.
//!
//! Generates a height grid in memory and prints a summary of the result.

use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use glam::Vec2;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use erodegen::erosion::{ErosionConfig, VelocityModel};
use erodegen::noise::NoiseConfig;
use erodegen::pipeline::{ErosionStage, HeightmapStage, Pipeline, StageConfig};
use erodegen::terrain::HeightGrid;

/// Fractal noise terrain shaped by droplet erosion.
#[derive(Parser)]
#[command(name = "erodegen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and erode a square heightmap.
    Generate(GenerateArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum VelocityArg {
    /// Signed height difference; climbing accelerates.
    Signed,
    /// Descending accelerates.
    Descent,
}

impl From<VelocityArg> for VelocityModel {
    fn from(arg: VelocityArg) -> Self {
        match arg {
            VelocityArg::Signed => VelocityModel::SignedDrop,
            VelocityArg::Descent => VelocityModel::Descent,
        }
    }
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Grid side length in cells.
    #[arg(short, long, default_value = "256")]
    size: usize,

    /// Random seed for noise and droplet spawns.
    #[arg(long)]
    seed: Option<u64>,

    /// Noise window origin, x.
    #[arg(long, default_value = "0.0")]
    origin_x: f32,

    /// Noise window origin, y.
    #[arg(long, default_value = "0.0")]
    origin_y: f32,

    /// World-space extent of the noise window.
    #[arg(long, default_value = "4.0")]
    scale: f32,

    /// Number of noise octaves.
    #[arg(long, default_value = "4")]
    harmonics: u8,

    /// Amplitude decay per octave.
    #[arg(long, default_value = "0.5")]
    persistence: f32,

    /// Frequency multiplier per octave.
    #[arg(long, default_value = "2.0")]
    lacunarity: f32,

    /// Number of droplets to simulate (0 skips erosion).
    #[arg(short, long, default_value = "50000")]
    drops: u32,

    /// Droplets per frame; 0 runs them all at once.
    #[arg(long, default_value = "0")]
    drops_per_frame: u32,

    /// Direction inertia (0-1).
    #[arg(long, default_value = "0.5")]
    inertia: f32,

    /// Sediment capacity factor.
    #[arg(long, default_value = "5.0")]
    capacity: f32,

    /// Deposition rate (0-1).
    #[arg(long, default_value = "0.3")]
    deposition: f32,

    /// Erosion rate (0-1).
    #[arg(long, default_value = "0.2")]
    erosion: f32,

    /// Evaporation rate (0-1).
    #[arg(long, default_value = "0.05")]
    evaporation: f32,

    /// Erosion brush radius in cells.
    #[arg(long, default_value = "4.0")]
    radius: f32,

    /// Minimum slope used for carrying capacity.
    #[arg(long, default_value = "0.01")]
    min_slope: f32,

    #[arg(long, default_value = "1.0")]
    gravity: f32,

    /// Step budget per droplet.
    #[arg(long, default_value = "100")]
    max_steps: u32,

    /// How droplet speed reacts to height change.
    #[arg(long, value_enum, default_value = "signed")]
    velocity_model: VelocityArg,
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("erodegen=info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => generate(args),
    }
}

fn generate(args: GenerateArgs) {
    // Generate seed if not provided
    let seed = args.seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    });

    println!("Erodegen - Droplet Erosion Terrain");
    println!("==================================");
    println!("Grid: {}x{}", args.size, args.size);
    println!("Seed: {}", seed);

    let noise = NoiseConfig {
        origin: Vec2::new(args.origin_x, args.origin_y),
        scale: args.scale,
        harmonics: args.harmonics,
        persistence: args.persistence,
        lacunarity: args.lacunarity,
        seed: seed as i32,
    };

    let erosion = ErosionConfig {
        inertia: args.inertia,
        capacity: args.capacity,
        deposition_rate: args.deposition,
        erosion_rate: args.erosion,
        evaporation_rate: args.evaporation,
        radius: args.radius,
        min_slope: args.min_slope,
        gravity: args.gravity,
        max_steps: args.max_steps,
        velocity_model: args.velocity_model.into(),
    };

    let mut grid = HeightGrid::square(args.size).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let mut pipeline = Pipeline::new(StageConfig::with_noise(noise));
    pipeline.add_stage(HeightmapStage);
    if args.drops > 0 {
        pipeline.add_stage(
            ErosionStage::new(erosion, args.drops, seed).with_drops_per_frame(args.drops_per_frame),
        );
        println!("Erosion enabled: {} droplets", args.drops);
    } else {
        println!("Erosion: SKIPPED");
    }

    let start = Instant::now();
    pipeline
        .run_with_callbacks(
            &mut grid,
            |name, i, total| {
                println!("  [{}/{}] Starting: {}", i + 1, total, name);
            },
            |name, i, total| {
                println!("  [{}/{}] Completed: {}", i + 1, total, name);
            },
        )
        .unwrap_or_else(|e| {
            eprintln!("Error during generation: {}", e);
            std::process::exit(1);
        });
    println!("Generation completed in {:.2?}", start.elapsed());

    let (min_h, max_h) = grid.height_range();
    println!("Height range: [{:.4}, {:.4}]", min_h, max_h);
    println!("Mean height: {:.4}", grid.mean());
}
