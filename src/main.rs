//! Render sphere scenes described in YAML files
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sphere_tracer::images;
use sphere_tracer::scenes::{Scene, SceneConfig};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every camera of a scene into numbered PPM files
    Render {
        /// YAML scene description
        scene: PathBuf,
        /// Write images here instead of the scene's output_dir
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Seed for a reproducible render, overrides the scene's seed
        #[arg(long)]
        seed: Option<u64>,
        /// Also write a PNG next to each PPM
        #[arg(long)]
        png: bool,
        /// Hide the progress bars
        #[arg(long)]
        quiet: bool,
    },
    /// Convert every PPM in a directory to PNG
    Convert {
        in_dir: PathBuf,
        out_dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Command::Render {
            scene,
            output_dir,
            seed,
            png,
            quiet,
        } => {
            let mut config = SceneConfig::load(&scene)
                .with_context(|| format!("failed to load scene {}", scene.display()))?;
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if seed.is_some() {
                config.seed = seed;
            }
            let scene = Scene::from_config(config)?
                .with_progress(!quiet)
                .with_png(png);
            let written = scene
                .render()
                .with_context(|| format!("failed to render scene {}", scene.name()))?;
            log::info!("Wrote {} image(s)", written.len());
        }
        Command::Convert { in_dir, out_dir } => {
            let written = images::convert_dir(&in_dir, &out_dir)
                .with_context(|| format!("failed to convert {}", in_dir.display()))?;
            log::info!("Converted {} image(s)", written.len());
        }
    }
    Ok(())
}
