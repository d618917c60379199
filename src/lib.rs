//! # geotag-exif
//!
//! Stamp GPS coordinates and a capture time into JPEG files. A small
//! little-endian TIFF/EXIF blob (IFD0 + GPS IFD) is synthesized and spliced
//! into the JPEG as its leading APP1 segment; the image data itself is never
//! decoded.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chrono::{FixedOffset, TimeZone};
//! use geotag_exif::exif::write_geotag;
//!
//! fn main() -> anyhow::Result<()> {
//!     let jpeg = std::fs::read("photo.jpg")?;
//!     let taken = FixedOffset::east_opt(7 * 3600)
//!         .unwrap()
//!         .with_ymd_and_hms(2024, 1, 15, 10, 30, 0)
//!         .unwrap();
//!
//!     let tagged = write_geotag(&jpeg, -6.2088, 106.8456, &taken)?;
//!     std::fs::write("photo_tagged.jpg", tagged)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Batch Usage
//!
//! ```rust,no_run
//! use geotag_exif::config::Config;
//! use geotag_exif::pipeline::{collect_images, process_image, GeoTag};
//! use std::path::PathBuf;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load(Some("config.json".as_ref()))?;
//!     let tag = GeoTag {
//!         latitude: 48.8584,
//!         longitude: 2.2945,
//!         timestamp: config.time.now()?,
//!     };
//!
//!     for path in collect_images(&[PathBuf::from("./photos")]) {
//!         let result = process_image(&path, &tag, &config);
//!         if let Some(ref err) = result.error {
//!             eprintln!("Error processing {}: {err}", path.display());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`exif`]: DMS conversion, EXIF blob construction, JPEG splicing, read-back
//! - [`error`]: [`FormatError`](error::FormatError) for inputs that cannot be spliced
//! - [`config`]: Layout, time zone, and output settings
//! - [`pipeline`]: File collection and in-place geotagging
//! - [`session`]: Per-chat state machine for a conversational front-end

pub mod config;
pub mod error;
pub mod exif;
pub mod pipeline;
pub mod session;
