/// Bathymetry gridding command line entry point
use bathymetry_gridder::progress::progress_bar;
use bathymetry_gridder::{
    BathymetryGrid, Colormap, GridConfig, GridManifest, IngestStats, TileSink,
};
use clap::{Parser, Subcommand};
use constants::{DEFAULT_COLORMAP, DEFAULT_ZOOM_LEVEL};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bathymetry-gridder", about = "Grid scattered depth soundings")]
struct ClArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Average XYZ soundings into a grid and store it
    Grid {
        /// JSON grid configuration
        #[arg(short, long)]
        config: PathBuf,

        /// Snapshot file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Also render a PNG
        #[arg(long)]
        png: Option<PathBuf>,

        /// Also export populated cells as XYZ text
        #[arg(long)]
        xyz: Option<PathBuf>,

        /// Files or directories of .xyz soundings, ingested in parallel
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Export a stored grid
    Render {
        /// Snapshot written by `grid`
        #[arg(short, long)]
        snapshot: PathBuf,

        #[arg(long)]
        png: Option<PathBuf>,

        #[arg(long)]
        xyz: Option<PathBuf>,

        /// Color scheme to use (jet, viridis, turbo, grayscale)
        #[arg(long, default_value = DEFAULT_COLORMAP)]
        colormap: String,

        #[arg(long, allow_negative_numbers = true)]
        min_z: Option<f64>,

        #[arg(long, allow_negative_numbers = true)]
        max_z: Option<f64>,

        /// Paint empty cells black instead of leaving them transparent
        #[arg(long)]
        opaque: bool,
    },

    /// Split lat/lon soundings into per-tile XYZ files
    Tiles {
        /// Directory receiving the tile files
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, default_value_t = DEFAULT_ZOOM_LEVEL)]
        zoom: u8,

        /// Append to existing tile files instead of replacing them
        #[arg(long)]
        append: bool,

        #[arg(long, default_value = " ")]
        separator: String,

        /// Input lines hold lon before lat
        #[arg(long)]
        inverted: bool,

        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bathymetry_gridder=info")),
        )
        .init();

    match ClArgs::parse().command {
        Command::Grid {
            config,
            output,
            png,
            xyz,
            inputs,
        } => run_grid(&config, &output, png.as_deref(), xyz.as_deref(), &inputs),
        Command::Render {
            snapshot,
            png,
            xyz,
            colormap,
            min_z,
            max_z,
            opaque,
        } => {
            let sidecar = GridManifest::sidecar_path(
                &snapshot,
                &[png.as_deref(), xyz.as_deref()].into_iter().flatten().collect::<Vec<_>>(),
            )?;
            let grid = BathymetryGrid::load(&snapshot)?;
            let colormap: Colormap = colormap.parse()?;
            let mut manifest = GridManifest::describe(&grid);
            manifest.outputs.snapshot = file_name(&snapshot);

            export(
                &grid,
                &mut manifest,
                &colormap,
                (min_z, max_z),
                !opaque,
                png.as_deref(),
                xyz.as_deref(),
            )?;
            manifest.write(&sidecar)?;
            Ok(())
        }
        Command::Tiles {
            output,
            zoom,
            append,
            separator,
            inverted,
            inputs,
        } => {
            let sink = TileSink::new(&output)?
                .with_zoom_level(zoom)
                .with_append(append);

            let pb = progress_bar(0, "files", "Tiling soundings");
            let stats = inputs
                .par_iter()
                .map(|input| sink.process_with_progress(input, &separator, inverted, &pb))
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .fold(IngestStats::default(), |mut total, stats| {
                    total += stats;
                    total
                });
            pb.finish_with_message("Soundings tiled");
            let tiles = sink.open_tiles();
            sink.close()?;

            println!("Tiling complete:");
            println!("  Samples: {} ({} lines skipped)", stats.samples, stats.skipped);
            println!("  Tiles: {} at zoom {} in {}", tiles, sink.zoom_level(), output.display());
            Ok(())
        }
    }
}

/// Build a grid from the configured inputs, store it and export what was asked for.
fn run_grid(
    config_path: &Path,
    output: &Path,
    png: Option<&Path>,
    xyz: Option<&Path>,
    inputs: &[PathBuf],
) -> Result<(), Box<dyn std::error::Error>> {
    let protected: Vec<&Path> = [Some(config_path), png, xyz].into_iter().flatten().collect();
    let sidecar = GridManifest::sidecar_path(output, &protected)?;

    let config = GridConfig::load(config_path)?;
    let grid = config.build_grid()?;
    let colormap = config.colormap()?;

    info!(
        ncols = grid.ncols(),
        nrows = grid.nrows(),
        crs = grid.native_crs(),
        "created grid"
    );

    // Disjoint inputs share the grid; rows are locked independently.
    let pb = progress_bar(0, "files", "Ingesting soundings");
    let stats = inputs
        .par_iter()
        .map(|input| {
            grid.process_with_progress(
                input,
                &config.source_crs,
                config.inverted,
                &config.separator,
                &pb,
            )
        })
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .fold(IngestStats::default(), |mut total, stats| {
            total += stats;
            total
        });
    pb.finish_with_message("Soundings ingested");

    grid.store(output)?;

    let mut manifest = GridManifest::describe(&grid);
    manifest.ingest = Some(stats);
    manifest.outputs.snapshot = file_name(output);

    export(
        &grid,
        &mut manifest,
        &colormap,
        (config.min_z, config.max_z),
        config.transparent,
        png,
        xyz,
    )?;
    manifest.write(&sidecar)?;
    Ok(())
}

/// Write the optional PNG and XYZ exports and record them in the manifest
fn export(
    grid: &BathymetryGrid,
    manifest: &mut GridManifest,
    colormap: &Colormap,
    (min_z, max_z): (Option<f64>, Option<f64>),
    transparent: bool,
    png: Option<&Path>,
    xyz: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(png) = png {
        let (lo, hi) = grid.depth_range().unwrap_or((0.0, 0.0));
        let (min_z, max_z) = (min_z.unwrap_or(lo), max_z.unwrap_or(hi));

        grid.write_image(colormap, min_z, max_z, transparent, png)?;
        manifest.color_scale = Some((min_z, max_z));
        manifest.colormap = Some(colormap.to_string());
        manifest.outputs.image = file_name(png);
        println!("Saved {} ({} colormap, {:.2} to {:.2})", png.display(), colormap, min_z, max_z);
    }

    if let Some(xyz) = xyz {
        let lines = grid.write_xyz(xyz)?;
        manifest.outputs.xyz = file_name(xyz);
        println!("Saved {} ({} cells)", xyz.display(), lines);
    }

    Ok(())
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().to_string())
}
