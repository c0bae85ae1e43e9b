//! Apply calibration coefficients to a temperature raster.
//!
//! The transform is the affine correction
//! `calibrated = gain * raw + offset`, evaluated in `f32`
//! for every sample independently and clipped to
//! [`VALID_RANGE`]. The clip is a clamp of the output to
//! physically plausible surface temperatures for the
//! sensor, not an error condition.
//!
//! Alongside the calibrated values, [`CalibrationEngine::transform`]
//! reports a display range (2nd to 98th percentile) for the
//! original and the calibrated raster. Display ranges only
//! drive the colour scale of the previews.
//!
//! # Non-finite samples
//!
//! NaN propagates: it stays NaN through the transform and the
//! clip, and is ignored when computing percentiles. `±inf`
//! is clamped to the bounds of [`VALID_RANGE`].

use ndarray::{Array2, ArrayBase, Data, Ix2};
use serde_derive::*;

use crate::coefficients::CoefficientPair;

/// Plausible surface temperatures in degrees Celsius.
pub const VALID_RANGE: (f32, f32) = (0., 70.);

/// Percentiles used for the preview colour scale.
pub const DISPLAY_PERCENTILES: (f64, f64) = (2., 98.);

#[inline]
pub fn clip_to_valid_range(t: f32) -> f32 {
    t.clamp(VALID_RANGE.0, VALID_RANGE.1)
}

/// Colour scale bounds for a preview.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct DisplayRange {
    pub min: f32,
    pub max: f32,
}

impl DisplayRange {
    /// The [`DISPLAY_PERCENTILES`] of an array. `None` if the
    /// array has no non-NaN samples.
    pub fn of_array<S>(array: &ArrayBase<S, Ix2>) -> Option<Self>
    where
        S: Data<Elem = f32>,
    {
        let mut values: Vec<f32> = array.iter().copied().filter(|v| !v.is_nan()).collect();
        values.sort_unstable_by(|a, b| a.total_cmp(b));
        Some(DisplayRange {
            min: percentile_of_sorted(&values, DISPLAY_PERCENTILES.0)?,
            max: percentile_of_sorted(&values, DISPLAY_PERCENTILES.1)?,
        })
    }
}

/// Display ranges for both stages.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct DisplayRanges {
    pub original: Option<DisplayRange>,
    pub calibrated: Option<DisplayRange>,
}

/// `q`-th percentile (`0..=100`) of sorted values.
///
/// Interpolates linearly between the two closest ranks, as
/// numpy's default `percentile` does.
pub fn percentile_of_sorted(sorted: &[f32], q: f64) -> Option<f32> {
    let last = sorted.len().checked_sub(1)?;
    let rank = (q / 100.).clamp(0., 1.) * last as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(last);
    let frac = rank - lo as f64;

    let (a, b) = (sorted[lo] as f64, sorted[hi] as f64);
    let val = if frac < 0.5 {
        a + (b - a) * frac
    } else {
        b - (b - a) * (1. - frac)
    };
    Some(val as f32)
}

/// Result of calibrating one raster.
#[derive(Debug, Clone)]
pub struct Calibration {
    pub pair: CoefficientPair,
    /// Original samples clipped to [`VALID_RANGE`], for
    /// preview only.
    pub original_preview: Array2<f32>,
    pub calibrated: Array2<f32>,
    pub display: DisplayRanges,
}

/// Applies one coefficient pair to rasters.
///
/// The engine only knows the pair it is handed; resolving
/// which pair to use is the job of
/// [`CoefficientTable`][crate::CoefficientTable].
#[derive(Debug, Clone, Copy)]
pub struct CalibrationEngine {
    pair: CoefficientPair,
}

impl CalibrationEngine {
    pub fn new(pair: CoefficientPair) -> Self {
        CalibrationEngine { pair }
    }

    pub fn pair(&self) -> CoefficientPair {
        self.pair
    }

    /// The affine correction, without clipping.
    pub fn temperature_transform(&self) -> impl Fn(f32) -> f32 {
        let CoefficientPair { gain, offset } = self.pair;
        move |raw| gain * raw + offset
    }

    /// Calibrate a single sample.
    pub fn calibrate(&self, raw: f32) -> f32 {
        clip_to_valid_range(self.temperature_transform()(raw))
    }

    /// Calibrate every sample of `image`.
    pub fn transform<S>(&self, image: &ArrayBase<S, Ix2>) -> Calibration
    where
        S: Data<Elem = f32>,
    {
        let mut original_preview = image.to_owned();
        original_preview.par_mapv_inplace(clip_to_valid_range);

        let t = self.temperature_transform();
        let mut calibrated = image.to_owned();
        calibrated.par_mapv_inplace(|raw| clip_to_valid_range(t(raw)));

        let display = DisplayRanges {
            original: DisplayRange::of_array(&original_preview),
            calibrated: DisplayRange::of_array(&calibrated),
        };

        Calibration {
            pair: self.pair,
            original_preview,
            calibrated,
            display,
        }
    }
}

/// Calibrate `image` with an explicit `gain` and `offset`.
pub fn transform<S>(image: &ArrayBase<S, Ix2>, gain: f32, offset: f32) -> Calibration
where
    S: Data<Elem = f32>,
{
    CalibrationEngine::new(CoefficientPair::new(gain, offset)).transform(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-3, "{} != {}", a, b);
    }

    #[test]
    fn capote_noon() {
        let engine = CalibrationEngine::new(CoefficientPair::new(0.9244, 10.019));
        let out = engine.transform(&array![[20f32, 30.], [40., 50.]]);
        let expected = array![[28.507f32, 37.751], [46.995, 56.239]];
        for (&got, &want) in out.calibrated.iter().zip(expected.iter()) {
            assert_close(got, want);
        }
        assert_eq!(out.original_preview, array![[20f32, 30.], [40., 50.]]);
    }

    #[test]
    fn clips_to_valid_range() {
        let engine = CalibrationEngine::new(CoefficientPair::IDENTITY);
        assert_eq!(engine.calibrate(1000.), 70.);
        assert_eq!(engine.calibrate(-40.), 0.);
        assert_eq!(engine.calibrate(f32::INFINITY), 70.);
        assert_eq!(engine.calibrate(f32::NEG_INFINITY), 0.);
        assert!(engine.calibrate(f32::NAN).is_nan());

        let out = transform(&array![[1000f32, -5.], [35., 70.]], 1., 0.);
        assert_eq!(out.calibrated, array![[70f32, 0.], [35., 70.]]);
    }

    #[test]
    fn percentile_interpolates() {
        let sorted = [1f32, 2., 3., 4., 5.];
        assert_close(percentile_of_sorted(&sorted, 2.).unwrap(), 1.08);
        assert_close(percentile_of_sorted(&sorted, 98.).unwrap(), 4.92);
        assert_eq!(percentile_of_sorted(&sorted, 0.), Some(1.));
        assert_eq!(percentile_of_sorted(&sorted, 100.), Some(5.));
        assert_eq!(percentile_of_sorted(&sorted, 50.), Some(3.));
        assert_eq!(percentile_of_sorted(&[7.], 98.), Some(7.));
        assert_eq!(percentile_of_sorted(&[], 50.), None);
    }

    #[test]
    fn display_ranges_use_clipped_values() {
        let engine = CalibrationEngine::new(CoefficientPair::IDENTITY);
        let out = engine.transform(&array![[-100f32, 10.], [20., 500.]]);
        // clipped: [0, 10, 20, 70]
        let original = out.display.original.unwrap();
        assert_close(original.min, 0.6);
        assert_close(original.max, 67.0);
        assert_eq!(out.display.calibrated, out.display.original);
    }

    #[test]
    fn display_range_skips_nan() {
        let range = DisplayRange::of_array(&array![[f32::NAN, 1.], [2., f32::NAN]]).unwrap();
        assert_close(range.min, 1.02);
        assert_close(range.max, 1.98);
        assert_eq!(DisplayRange::of_array(&array![[f32::NAN]]), None);
    }
}
