//! Calibrate thermal orthomosaics to surface temperature.
//!
//! Thermal GeoTIFFs from the H20T camera are rescaled with an
//! affine equation fitted against an Apogee MI-210
//! radiometer. The coefficients depend on the survey zone and
//! the hour of the flight.
//!
//! The crate is organised as a short pipeline:
//!
//! 1. [`CoefficientTable`] maps a `(zone, time)` key to a
//! [`CoefficientPair`]. Unknown keys fall back to the
//! identity pair.
//!
//! 2. [`raster::decode`] reads band 1 of a GeoTIFF as `f32`
//! samples plus its [`RasterMetadata`].
//!
//! 3. [`CalibrationEngine::transform`] applies
//! `gain * t + offset` to every sample, clips the result to
//! `[0, 70]` °C and computes 2–98 percentile display ranges
//! for previews.
//!
//! 4. [`raster::encode`] writes the calibrated band as an `f32`
//! GeoTIFF with the original georeferencing.
//!
//! [`pipeline::calibrate`] runs all of it on an in-memory
//! buffer.
//!
//! # Usage
//!
//! ```rust
//! # fn test_compile(source: &[u8]) -> thermical::Result<()> {
//! use thermical::{pipeline, resolve_zone, CoefficientTable, Province, Region, TimeOfDay};
//!
//! let table = CoefficientTable::builtin();
//! let zone = resolve_zone(Region::Lambayeque, Some(Province::Ferrenafe), None, None);
//! let time: TimeOfDay = "12:00".parse()?;
//!
//! let output = pipeline::calibrate(&table, zone, time, source)?;
//! assert_eq!(output.file_name, "Capote_12:00:00_calibrada.tif");
//! # Ok(())
//! # }
//! ```
//!
//! Previews can be rendered from the result with
//! [`preview::render_png`].

pub mod calibration;
pub mod coefficients;
pub mod error;
pub mod location;
pub mod pipeline;
pub mod preview;
pub mod raster;
pub mod stats;

#[cfg(feature = "cli")]
pub mod cli;

pub use crate::calibration::{Calibration, CalibrationEngine, DisplayRange, DisplayRanges};
pub use crate::coefficients::{CoefficientPair, CoefficientTable, TimeOfDay};
pub use crate::error::{Error, Result};
pub use crate::location::{resolve_zone, District, Province, Region, Zone};
pub use crate::raster::{RasterImage, RasterMetadata};
