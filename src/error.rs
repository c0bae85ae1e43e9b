//! Error type shared by the library modules.

use thiserror::Error;

/// Errors surfaced to the caller of the calibration pipeline.
///
/// An unmapped `(zone, time)` key is deliberately *not* an
/// error; see [`CoefficientTable::lookup`][crate::CoefficientTable::lookup].
#[derive(Debug, Error)]
pub enum Error {
    /// The input could not be parsed as a TIFF / GeoTIFF raster.
    #[error("could not parse raster: {0}")]
    Format(String),

    /// The raster parsed, but the requested band is missing.
    #[error("raster has no band {band}")]
    Band { band: usize },

    /// The calibrated raster could not be written.
    #[error("could not encode raster: {0}")]
    Encode(String),

    /// The preview image could not be written.
    #[error("could not encode preview: {0}")]
    Preview(#[from] png::EncodingError),

    #[error("invalid time of day `{0}`: expected a full hour between 09:00 and 15:00")]
    InvalidTime(String),

    #[error("unknown {level} `{name}`")]
    UnknownLocation { level: &'static str, name: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
