//! Sunclock CLI - solar illumination over world maps

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use image::ImageFormat;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use sunclock_core::projection::{MapProjection, Projection};
use sunclock_core::{exposure, solar_geometry, CoordinatePair};
use sunclock_display::{
    Clock, DirectoryImageSource, DisplaySurface, FixedClock, Options, RenderOutcome, SurfaceConfig, SystemClock,
};
use sunclock_parallel::ProcessingMode;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "sunclock")]
#[command(author, version, about = "Solar illumination over world maps", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one frame to a PNG file
    Render {
        #[command(flatten)]
        surface: SurfaceArgs,
        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,
        /// Write the whole window (letterboxed) instead of just the map
        #[arg(long)]
        window: bool,
    },
    /// Report the solar exposure at a point
    Inspect {
        /// Projection used to relate surface and geographic coordinates
        #[arg(short, long, default_value = "EQUIRECTANGULAR", value_parser = parse_projection)]
        projection: Projection,
        /// Latitude in degrees
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Longitude in degrees
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
        /// Surface x in [0, 1], left to right
        #[arg(long, requires = "y", conflicts_with = "lat")]
        x: Option<f64>,
        /// Surface y in [0, 1], bottom to top
        #[arg(long, requires = "x", conflicts_with = "lat")]
        y: Option<f64>,
        /// Instant to evaluate (RFC 3339); defaults to now
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,
        /// Print a JSON document instead of text
        #[arg(long)]
        json: bool,
    },
    /// List the available projections
    Projections,
    /// Run the periodic renderer and snapshot each pass
    Watch {
        #[command(flatten)]
        surface: SurfaceArgs,
        /// Directory for frame-NNN.png snapshots
        #[arg(short, long)]
        output: PathBuf,
        /// Number of periodic passes to capture
        #[arg(long, default_value = "3")]
        ticks: u64,
        /// Delay between passes in seconds
        #[arg(long, default_value = "60")]
        interval_secs: f64,
    },
}

/// Options shared by commands that drive a display surface.
#[derive(Args)]
struct SurfaceArgs {
    /// Map projection: EQUIRECTANGULAR, WEB_MERCATOR or CASSINI
    #[arg(short, long, default_value = "EQUIRECTANGULAR", value_parser = parse_projection)]
    projection: Projection,
    /// Maximum light-map tiles along each axis
    #[arg(short, long, default_value = "128")]
    resolution: u32,
    /// Window width in pixels
    #[arg(long, default_value = "1024")]
    width: usize,
    /// Window height in pixels
    #[arg(long, default_value = "512")]
    height: usize,
    /// Directory containing projections/<image> base maps
    #[arg(long)]
    images: Option<PathBuf>,
    /// Render at this instant (RFC 3339) instead of the current time
    #[arg(long, value_parser = parse_instant)]
    at: Option<DateTime<Utc>>,
    /// Tile worker threads (0 = all cores)
    #[arg(long)]
    threads: Option<usize>,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn parse_projection(s: &str) -> std::result::Result<Projection, String> {
    s.parse::<Projection>().map_err(|e| e.to_string())
}

fn parse_instant(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

fn open_surface(args: &SurfaceArgs, interval: Duration) -> Result<(Arc<DisplaySurface>, Arc<Options>)> {
    let images = DirectoryImageSource::new(args.images.clone().unwrap_or_else(|| PathBuf::from(".")));
    let config = SurfaceConfig {
        interval,
        mode: ProcessingMode::from_threads(args.threads),
        ..SurfaceConfig::default()
    };

    let surface = match args.at {
        Some(at) => DisplaySurface::new(images, FixedClock::new(at), config),
        None => DisplaySurface::new(images, SystemClock, config),
    }
    .context("Failed to create display surface")?;
    let surface = Arc::new(surface);

    let options = Arc::new(Options::default());
    options.projection.set(Some(args.projection));
    options.light_resolution.set(args.resolution);
    surface.bind_options(&options).context("Failed to apply options")?;

    Ok((surface, options))
}

fn snapshot(surface: &DisplaySurface, window: bool, path: &Path) -> Result<()> {
    let image = surface.paint(|frame| if window { frame.composite_window() } else { frame.composite() })?;
    if image.width() == 0 || image.height() == 0 {
        bail!("Nothing to write: the map has zero area");
    }
    image
        .save_with_format(path, output_format(path))
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Output format from the file extension, PNG when it is missing or unknown.
fn output_format(path: &Path) -> ImageFormat {
    ImageFormat::from_path(path)
        .ok()
        .filter(|format| format.can_write())
        .unwrap_or(ImageFormat::Png)
}

fn done(name: &str, path: &Path, elapsed: Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

#[derive(Serialize)]
struct InspectReport {
    projection: Projection,
    instant: String,
    surface: CoordinatePair,
    geographic: CoordinatePair,
    exposure: f64,
    solar_altitude_degrees: f64,
    declination_degrees: f64,
    equation_of_time_minutes: f64,
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Render {
            surface: args,
            output,
            window,
        } => {
            let start = Instant::now();
            let (surface, _options) = open_surface(&args, Duration::from_secs(3600))?;

            let pb = spinner("Rendering light map...");
            let outcome = surface.on_resize(args.width, args.height)?;
            pb.finish_and_clear();

            match outcome {
                RenderOutcome::Rendered(stats) => {
                    info!("{} tiles of {} px", stats.tiles, stats.step);
                }
                RenderOutcome::Skipped(reason) => bail!("Nothing rendered: {:?}", reason),
            }

            snapshot(&surface, window, &output)?;
            surface.shutdown();
            done("Light map", &output, start.elapsed());
        }

        Commands::Inspect {
            projection,
            lat,
            lon,
            x,
            y,
            at,
            json,
        } => {
            let instant = at.unwrap_or_else(|| SystemClock.now());
            let (surface, geographic) = match (lat, lon, x, y) {
                (Some(lat), Some(lon), _, _) => {
                    let geographic = CoordinatePair::lat_long(lat, lon);
                    (projection.to_surface(&geographic), geographic)
                }
                (_, _, Some(x), Some(y)) => {
                    let surface = CoordinatePair::new(x, y);
                    let geographic = projection.to_geographic(&surface);
                    (surface, geographic)
                }
                _ => bail!("Give either --lat and --lon, or --x and --y"),
            };

            let geometry = solar_geometry(&geographic, &instant);
            let report = InspectReport {
                projection,
                instant: instant.to_rfc3339(),
                exposure: exposure(&geographic, &instant),
                solar_altitude_degrees: geometry.altitude_degrees(),
                declination_degrees: geometry.declination.to_degrees(),
                equation_of_time_minutes: geometry.equation_of_time,
                surface,
                geographic,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Projection:     {}", report.projection);
                println!("Instant:        {}", report.instant);
                println!("Surface:        {}", report.surface);
                println!("Lat/Long:       {}", report.geographic);
                println!("Exposure:       {:.4}", report.exposure);
                println!("Solar altitude: {:.2}°", report.solar_altitude_degrees);
                println!("Declination:    {:.2}°", report.declination_degrees);
                println!("Eq. of time:    {:.2} min", report.equation_of_time_minutes);
            }
        }

        Commands::Projections => {
            for projection in Projection::ALL {
                let (min, max) = projection.latitude_range();
                println!(
                    "{:<16} {:<22} lat {:>10.6}..{:<10.6} {}",
                    projection.key(),
                    projection.name(),
                    min,
                    max,
                    projection.image_name()
                );
            }
        }

        Commands::Watch {
            surface: args,
            output,
            ticks,
            interval_secs,
        } => {
            if !(interval_secs.is_finite() && interval_secs >= 0.0) {
                bail!("--interval-secs must be a non-negative number");
            }
            std::fs::create_dir_all(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;

            let start = Instant::now();
            let (surface, _options) = open_surface(&args, Duration::from_secs_f64(interval_secs))?;
            surface.on_resize(args.width, args.height)?;
            surface.on_show();

            let pb = ProgressBar::new(ticks);
            let mut seen = surface.scheduled_passes();
            let mut captured = 0;
            while captured < ticks {
                std::thread::sleep(Duration::from_millis(50));
                let passes = surface.scheduled_passes();
                if passes == seen {
                    continue;
                }
                seen = passes;
                captured += 1;

                let path = output.join(format!("frame-{:03}.png", captured));
                snapshot(&surface, false, &path)?;
                pb.inc(1);
                info!("pass {} captured to {}", passes, path.display());
            }
            pb.finish_and_clear();

            surface.on_hide();
            surface.shutdown();
            println!("{} frames saved to: {}", captured, output.display());
            println!("  Processing time: {:.2?}", start.elapsed());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_follows_extension() {
        assert_eq!(output_format(Path::new("map.jpg")), ImageFormat::Jpeg);
        assert_eq!(output_format(Path::new("map.PNG")), ImageFormat::Png);
    }

    #[test]
    fn output_format_defaults_to_png() {
        assert_eq!(output_format(Path::new("map")), ImageFormat::Png);
        assert_eq!(output_format(Path::new("map.unknown")), ImageFormat::Png);
    }
}
