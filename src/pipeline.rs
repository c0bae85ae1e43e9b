//! The calibration pipeline: lookup, decode, transform,
//! encode.

use std::path::Path;

use tracing::{info, warn};

use crate::{
    calibration::{Calibration, CalibrationEngine},
    coefficients::{CoefficientPair, CoefficientTable, TimeOfDay},
    error::Result,
    location::Zone,
    raster::{self, RasterImage, RasterMetadata},
};

/// MIME type of the calibrated raster.
pub const OUTPUT_MIME_TYPE: &str = "image/tiff";

/// Extensions accepted for the source raster.
pub const INPUT_EXTENSIONS: [&str; 2] = ["tif", "tiff"];

/// Whether `path` has a `.tif` / `.tiff` extension.
pub fn has_raster_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            INPUT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// `{zone}_{time}`, with `None` standing in for an
/// unselected zone.
fn file_stem(zone: Option<Zone>, time: TimeOfDay) -> String {
    format!("{}_{}", zone.map(Zone::name).unwrap_or("None"), time)
}

/// `{zone}_{time}_calibrada.tif`
pub fn output_file_name(zone: Option<Zone>, time: TimeOfDay) -> String {
    format!("{}_calibrada.tif", file_stem(zone, time))
}

/// `{zone}_{time}_{stage}.png`, e.g. `Capote_12:00:00_original.png`.
pub fn preview_file_name(zone: Option<Zone>, time: TimeOfDay, stage: &str) -> String {
    format!("{}_{}.png", file_stem(zone, time), stage)
}

/// Outputs of one pipeline run.
#[derive(Debug, Clone)]
pub struct CalibrationOutput {
    pub zone: Option<Zone>,
    pub time: TimeOfDay,
    pub calibration: Calibration,
    pub metadata: RasterMetadata,
    /// Encoded single-band `f32` GeoTIFF.
    pub raster: Vec<u8>,
    pub file_name: String,
}

impl CalibrationOutput {
    pub fn pair(&self) -> CoefficientPair {
        self.calibration.pair
    }
}

/// Calibrate a GeoTIFF for `(zone, time)`.
///
/// An unknown key silently selects the identity pair (see
/// [`CoefficientTable::lookup`]). Decode failures are
/// returned as is, without partial output.
pub fn calibrate(
    table: &CoefficientTable,
    zone: Option<Zone>,
    time: TimeOfDay,
    source: &[u8],
) -> Result<CalibrationOutput> {
    let pair = table.lookup(zone, time);
    if zone.and_then(|z| table.get(z, time)).is_none() {
        warn!(?zone, %time, "no coefficients for selection, values pass through uncalibrated");
    }

    let RasterImage { samples, metadata } = raster::decode(source)?;
    let calibration = CalibrationEngine::new(pair).transform(&samples);
    let raster = raster::encode(&calibration.calibrated, &metadata)?;

    info!(
        ?zone,
        %time,
        gain = pair.gain,
        offset = pair.offset,
        width = metadata.width,
        height = metadata.height,
        "calibrated raster"
    );

    Ok(CalibrationOutput {
        zone,
        time,
        calibration,
        metadata: metadata.as_written(),
        raster,
        file_name: output_file_name(zone, time),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names() {
        let noon = TimeOfDay::from_hour(12).unwrap();
        assert_eq!(
            output_file_name(Some(Zone::Capote), noon),
            "Capote_12:00:00_calibrada.tif"
        );
        assert_eq!(
            output_file_name(Some(Zone::LaMolina), TimeOfDay::from_hour(9).unwrap()),
            "La Molina_09:00:00_calibrada.tif"
        );
        assert_eq!(output_file_name(None, noon), "None_12:00:00_calibrada.tif");
    }

    #[test]
    fn preview_names_share_the_stem() {
        let noon = TimeOfDay::from_hour(12).unwrap();
        assert_eq!(
            preview_file_name(Some(Zone::Capote), noon, "original"),
            "Capote_12:00:00_original.png"
        );
        assert_eq!(
            preview_file_name(Some(Zone::Capote), noon, "calibrada"),
            "Capote_12:00:00_calibrada.png"
        );
        assert_eq!(
            preview_file_name(None, noon, "original"),
            "None_12:00:00_original.png"
        );
    }

    #[test]
    fn extensions() {
        assert!(has_raster_extension(Path::new("ortho.tif")));
        assert!(has_raster_extension(Path::new("dir/ortho.TIFF")));
        assert!(!has_raster_extension(Path::new("ortho.png")));
        assert!(!has_raster_extension(Path::new("ortho")));
    }

    #[test]
    fn garbage_input_is_an_error() {
        let table = CoefficientTable::builtin();
        let time = TimeOfDay::from_hour(10).unwrap();
        assert!(matches!(
            calibrate(&table, Some(Zone::Picsi), time, b"GIF89a"),
            Err(crate::Error::Format(_))
        ));
    }
}
