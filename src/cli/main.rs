use anyhow::{Context, Result};
use chrono::DateTime;
use clap::Parser;
use std::path::{Path, PathBuf};

use geotag_exif::session::parse_coordinates;
use geotag_exif::{config, exif, pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "geotag-cli",
    version,
    about = "Stamp GPS coordinates and a capture time into JPEG files"
)]
struct Cli {
    /// Image files or directories to process
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Latitude in decimal degrees (south is negative)
    #[arg(long, allow_hyphen_values = true, requires = "lon", conflicts_with = "coords")]
    lat: Option<f64>,

    /// Longitude in decimal degrees (west is negative)
    #[arg(long, allow_hyphen_values = true, requires = "lat", conflicts_with = "coords")]
    lon: Option<f64>,

    /// Coordinates as "lat,lon"
    #[arg(long, value_name = "LAT,LON", allow_hyphen_values = true)]
    coords: Option<String>,

    /// Capture time as RFC 3339 (default: now, in the configured offset)
    #[arg(long, value_name = "RFC3339")]
    time: Option<String>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Preview changes without writing to files
    #[arg(long)]
    dry_run: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Display JPEG segments and recovered EXIF data and exit
    #[arg(long = "show-exif")]
    show_exif: bool,
}

impl Cli {
    /// Resolve the target position from either `--lat/--lon` or `--coords`.
    fn position(&self) -> Result<(f64, f64)> {
        match (self.lat, self.lon, self.coords.as_deref()) {
            (Some(lat), Some(lon), None) => Ok((lat, lon)),
            (None, None, Some(text)) => {
                parse_coordinates(text).with_context(|| format!("Invalid --coords value '{text}'"))
            }
            _ => anyhow::bail!("Specify a position with --lat/--lon or --coords \"lat,lon\"."),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    if cli.paths.is_empty() {
        anyhow::bail!("No input files or directories specified. Use --help for usage.");
    }

    // Handle --show-exif
    if cli.show_exif {
        let images = pipeline::collect_images(&cli.paths);
        if images.is_empty() {
            anyhow::bail!("No supported image files found in the specified paths.");
        }
        for image_path in &images {
            if let Err(e) = print_full_exif(image_path) {
                log::error!("{}: {e:#}", image_path.display());
            }
        }
        return Ok(());
    }

    let (latitude, longitude) = cli.position()?;

    let mut config = config::Config::load(cli.config.as_deref())?;
    if cli.dry_run {
        config.output.dry_run = true;
    }

    let timestamp = match cli.time.as_deref() {
        Some(text) => DateTime::parse_from_rfc3339(text)
            .with_context(|| format!("Invalid --time value '{text}'"))?,
        None => config.time.now()?,
    };
    let tag = pipeline::GeoTag { latitude, longitude, timestamp };

    let images = pipeline::collect_images(&cli.paths);
    if images.is_empty() {
        anyhow::bail!("No supported image files found in the specified paths.");
    }

    log::info!("Found {} image(s) to process", images.len());
    log::info!("Position: {latitude:.6}, {longitude:.6} at {}", timestamp.to_rfc3339());
    if config.output.dry_run {
        log::info!("DRY RUN, no files will be modified");
    }

    let mut results = Vec::new();
    let total = images.len();

    for (i, image_path) in images.iter().enumerate() {
        log::info!("[{}/{}] Processing: {}", i + 1, total, image_path.display());

        let result = pipeline::process_image(image_path, &tag, &config);

        if let Some(ref err) = result.error {
            log::error!("  Error: {err}");
        } else if result.written {
            log::info!("  Wrote {} bytes ({} before)", result.output_size, result.original_size);
            if let Some(ref backup) = result.backup_path {
                log::info!("  Backup: {}", backup.display());
            }
        } else {
            log::info!("  Would write {} bytes ({} before)", result.output_size, result.original_size);
        }

        results.push(result);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    // Summary
    let success = results.iter().filter(|r| r.error.is_none()).count();
    let failed = total - success;
    log::info!("Done: {success} succeeded, {failed} failed out of {total} images");

    Ok(())
}

// ANSI color codes
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Print the segment layout and recovered EXIF fields for a file.
fn print_full_exif(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).context("Failed to open image file")?;
    let segments = exif::list_segments(&bytes)?;
    let data = exif::read_exif_bytes(&bytes)?;

    println!();
    println!("{BOLD}File:{RESET} {}", path.display());
    println!("{DIM}{}{RESET}", "═".repeat(72));

    println!("  {BOLD}Segments{RESET}");
    println!("  {DIM}{}{RESET}", "─".repeat(70));
    for segment in &segments {
        print_row(
            &format!("FF{:02X} {}", segment.marker, segment.name),
            &format!("{} bytes", segment.length),
        );
    }
    println!();

    if !data.has_exif {
        println!("  {DIM}(no EXIF metadata found){RESET}");
        println!();
        return Ok(());
    }

    println!("  {BOLD}EXIF{RESET}");
    println!("  {DIM}{}{RESET}", "─".repeat(70));
    let date_fields = [
        ("DateTime", data.date_time.as_deref()),
        ("DateTimeOriginal", data.date_time_original.as_deref()),
        ("DateTimeDigitized", data.date_time_digitized.as_deref()),
    ];
    for (tag, val) in date_fields {
        if let Some(v) = val {
            print_row(tag, v);
        }
    }
    if data.has_gps {
        if let Some(lat) = data.gps_latitude {
            print_row("GPSLatitude", &format!("{lat:.6}"));
        }
        if let Some(lon) = data.gps_longitude {
            print_row("GPSLongitude", &format!("{lon:.6}"));
        }
        if let Some(ref time) = data.gps_time_stamp {
            let parts: Vec<String> = time.iter().map(|(n, d)| format!("{n}/{d}")).collect();
            print_row("GPSTimeStamp", &parts.join(" "));
        }
        if let Some(ref date) = data.gps_date_stamp {
            print_row("GPSDateStamp", date);
        }
    } else {
        print_row("GPS", "(none)");
    }
    println!();

    Ok(())
}

/// Print a single row in the EXIF display table.
fn print_row(tag: &str, val: &str) {
    println!("  {:<22} : {val}", tag);
}
