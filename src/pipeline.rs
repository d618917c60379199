use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::exif::write_geotag_with;

/// Supported image extensions.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// Position and capture time to stamp into an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTag {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<FixedOffset>,
}

/// The result of geotagging a single image file.
#[derive(Debug, Serialize)]
pub struct ProcessResult {
    pub path: PathBuf,
    /// `true` once the file on disk holds the new metadata.
    pub written: bool,
    pub original_size: usize,
    pub output_size: usize,
    pub backup_path: Option<PathBuf>,
    pub error: Option<String>,
}

/// Collect JPEG files from the given paths.
///
/// Accepts a mix of file paths and directory paths. Directories are walked
/// recursively (following symlinks). Only `.jpg`/`.jpeg` files are included.
///
/// # Example
///
/// ```rust,no_run
/// use geotag_exif::pipeline::collect_images;
/// use std::path::PathBuf;
///
/// let images = collect_images(&[
///     PathBuf::from("photo.jpg"),       // single file
///     PathBuf::from("./photos/"),        // entire directory
/// ]);
/// println!("Found {} images", images.len());
/// ```
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_supported_image(path) {
                images.push(path.clone());
            } else {
                log::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let p = entry.path();
                if p.is_file() && is_supported_image(p) {
                    images.push(p.to_path_buf());
                }
            }
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    images
}

/// Check if a path names a JPEG file.
pub fn is_supported_image(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(has_jpeg_suffix)
        .unwrap_or(false)
}

/// Case-insensitive `.jpg`/`.jpeg` suffix check on a bare file name.
///
/// A name that is only the suffix (`.jpg`) still counts.
pub fn has_jpeg_suffix(name: &str) -> bool {
    let name = name.to_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| name.strip_suffix(*ext).is_some_and(|stem| stem.ends_with('.')))
}

/// Create a backup of the original file.
fn backup_file(path: &Path) -> Result<PathBuf> {
    let backup_path = path.with_extension(format!(
        "{}.bak",
        path.extension().unwrap_or_default().to_string_lossy()
    ));

    if !backup_path.exists() {
        std::fs::copy(path, &backup_path).context("Failed to create backup")?;
        log::debug!("Backup created: {}", backup_path.display());
    }

    Ok(backup_path)
}

/// Geotag a single JPEG file in place.
///
/// The file is read, the new EXIF segment is spliced in, and unless the
/// config asks for a dry run the original is (optionally) backed up and then
/// overwritten. Failures are reported in [`ProcessResult::error`]; the file is
/// never left half-written by a splice error.
///
/// # Example
///
/// ```rust,no_run
/// use geotag_exif::config::Config;
/// use geotag_exif::pipeline::{process_image, GeoTag};
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::default();
/// let tag = GeoTag {
///     latitude: -6.2088,
///     longitude: 106.8456,
///     timestamp: config.time.now()?,
/// };
/// let result = process_image(Path::new("photo.jpg"), &tag, &config);
/// if let Some(err) = result.error {
///     eprintln!("{err}");
/// }
/// # Ok(())
/// # }
/// ```
pub fn process_image(path: &Path, tag: &GeoTag, config: &Config) -> ProcessResult {
    let mut result = ProcessResult {
        path: path.to_path_buf(),
        written: false,
        original_size: 0,
        output_size: 0,
        backup_path: None,
        error: None,
    };

    let original = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            result.error = Some(format!("Failed to read file: {e}"));
            return result;
        }
    };
    result.original_size = original.len();

    let output = match write_geotag_with(
        &original,
        tag.latitude,
        tag.longitude,
        &tag.timestamp,
        &config.layout,
    ) {
        Ok(bytes) => bytes,
        Err(e) => {
            result.error = Some(format!("Failed to embed EXIF: {e}"));
            return result;
        }
    };
    result.output_size = output.len();

    if config.output.dry_run {
        return result;
    }

    if config.output.backup_originals {
        match backup_file(path) {
            Ok(backup) => result.backup_path = Some(backup),
            Err(e) => log::warn!("Failed to backup {}: {e}", path.display()),
        }
    }

    match std::fs::write(path, &output) {
        Ok(()) => result.written = true,
        Err(e) => result.error = Some(format!("Failed to write file: {e}")),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif::read_exif;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn sample_jpeg() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(8, 8, image::Rgb([90, 90, 200]));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Jpeg).unwrap();
        buf.into_inner()
    }

    fn tag() -> GeoTag {
        GeoTag {
            latitude: -6.2088,
            longitude: 106.8456,
            timestamp: FixedOffset::east_opt(7 * 3600)
                .unwrap()
                .with_ymd_and_hms(2024, 1, 15, 10, 30, 0)
                .unwrap(),
        }
    }

    // ── is_supported_image ───────────────────────────────────────────

    #[test]
    fn supported_image_extensions() {
        assert!(is_supported_image(Path::new("photo.jpg")));
        assert!(is_supported_image(Path::new("photo.JPEG")));
        assert!(is_supported_image(Path::new("IMG_0001.Jpg")));
    }

    #[test]
    fn unsupported_image_extensions() {
        assert!(!is_supported_image(Path::new("photo.png")));
        assert!(!is_supported_image(Path::new("photo.heic")));
        assert!(!is_supported_image(Path::new("readme.txt")));
        assert!(!is_supported_image(Path::new("noext")));
        assert!(!is_supported_image(Path::new("photojpg")));
    }

    #[test]
    fn bare_suffix_counts_as_jpeg() {
        assert!(has_jpeg_suffix(".jpg"));
        assert!(has_jpeg_suffix(".JPEG"));
        assert!(is_supported_image(Path::new("/tmp/.jpg")));
        assert!(!has_jpeg_suffix("jpg"));
        assert!(!has_jpeg_suffix("photo.jpg.txt"));
    }

    // ── collect_images ───────────────────────────────────────────────

    #[test]
    fn collect_images_single_file() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("test.jpg");
        fs::write(&jpg, b"fake").unwrap();

        let images = collect_images(&[jpg.clone()]);
        assert_eq!(images, vec![jpg]);
    }

    #[test]
    fn collect_images_skips_unsupported() {
        let dir = TempDir::new().unwrap();
        let png = dir.path().join("image.png");
        fs::write(&png, b"fake").unwrap();

        assert!(collect_images(&[png]).is_empty());
    }

    #[test]
    fn collect_images_directory_recursive() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        fs::write(dir.path().join("a.jpg"), b"fake").unwrap();
        fs::write(sub.join("b.JPEG"), b"fake").unwrap();
        fs::write(sub.join("c.png"), b"fake").unwrap();

        let images = collect_images(&[dir.path().to_path_buf()]);
        assert_eq!(images.len(), 2);
    }

    #[test]
    fn collect_images_nonexistent_path() {
        let images = collect_images(&[PathBuf::from("/nonexistent/path")]);
        assert!(images.is_empty());
    }

    // ── process_image ────────────────────────────────────────────────

    #[test]
    fn process_writes_in_place_with_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        let original = sample_jpeg();
        fs::write(&path, &original).unwrap();

        let result = process_image(&path, &tag(), &Config::default());
        assert!(result.error.is_none(), "{:?}", result.error);
        assert!(result.written);

        let backup = result.backup_path.unwrap();
        assert_eq!(backup, dir.path().join("photo.jpg.bak"));
        assert_eq!(fs::read(&backup).unwrap(), original);

        let data = read_exif(&path).unwrap();
        assert!(data.has_gps);
        assert!((data.gps_latitude.unwrap() + 6.2088).abs() < 1e-6);
        assert_eq!(result.output_size, fs::read(&path).unwrap().len());
    }

    #[test]
    fn dry_run_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        let original = sample_jpeg();
        fs::write(&path, &original).unwrap();

        let mut config = Config::default();
        config.output.dry_run = true;
        let result = process_image(&path, &tag(), &config);

        assert!(result.error.is_none());
        assert!(!result.written);
        assert!(result.output_size > 0);
        assert!(result.backup_path.is_none());
        assert_eq!(fs::read(&path).unwrap(), original);
    }

    #[test]
    fn not_a_jpeg_reports_error_and_keeps_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.jpg");
        fs::write(&path, b"not really a jpeg").unwrap();

        let result = process_image(&path, &tag(), &Config::default());
        assert_eq!(result.error.as_deref(), Some("Failed to embed EXIF: not a valid JPEG"));
        assert!(!result.written);
        assert_eq!(fs::read(&path).unwrap(), b"not really a jpeg");
        assert!(!dir.path().join("fake.jpg.bak").exists());
    }

    #[test]
    fn missing_file_reports_error() {
        let result = process_image(Path::new("/nonexistent/photo.jpg"), &tag(), &Config::default());
        assert!(result.error.unwrap().starts_with("Failed to read file"));
    }
}
