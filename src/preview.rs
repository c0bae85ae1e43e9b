//! Render temperature arrays as false-colour PNG previews.
//!
//! Samples are mapped linearly from a [`DisplayRange`] onto
//! an approximation of matplotlib's `inferno` colour map;
//! values outside the range saturate at either end. NaN
//! samples are drawn black.

use std::io::Write;

use itertools::Itertools;
use ndarray::{ArrayBase, Data, Ix2};

use crate::{calibration::DisplayRange, error::Result};

/// `inferno`, sampled at nine evenly spaced stops.
const INFERNO: [[u8; 3]; 9] = [
    [0, 0, 4],
    [31, 12, 72],
    [85, 15, 109],
    [136, 34, 106],
    [186, 54, 85],
    [227, 89, 51],
    [249, 140, 10],
    [249, 201, 50],
    [252, 255, 164],
];

/// Colour of `t` in `[0, 1]`.
pub fn inferno(t: f32) -> [u8; 3] {
    if t.is_nan() {
        return [0, 0, 0];
    }
    let segments = (INFERNO.len() - 1) as f32;
    let pos = t.clamp(0., 1.) * segments;
    let idx = (pos.floor() as usize).min(INFERNO.len() - 2);
    let frac = pos - idx as f32;

    let (lo, hi) = (INFERNO[idx], INFERNO[idx + 1]);
    let mut out = [0; 3];
    for (c, (&a, &b)) in out.iter_mut().zip(lo.iter().zip(hi.iter())) {
        *c = (a as f32 + (b as f32 - a as f32) * frac).round() as u8;
    }
    out
}

/// Position of `val` within `range`, in `[0, 1]`.
fn normalize(val: f32, range: DisplayRange) -> f32 {
    let span = range.max - range.min;
    if span > 0. {
        ((val - range.min) / span).clamp(0., 1.)
    } else if val.is_nan() {
        val
    } else {
        0.
    }
}

/// Row-major RGB8 pixels of `array`.
///
/// Without a range (no finite samples) every pixel is black.
pub fn colorize<S>(array: &ArrayBase<S, Ix2>, range: Option<DisplayRange>) -> Vec<u8>
where
    S: Data<Elem = f32>,
{
    match range {
        Some(range) => array
            .iter()
            .flat_map(|&val| inferno(normalize(val, range)))
            .collect(),
        None => vec![0; 3 * array.len()],
    }
}

/// Write `array` as an 8-bit RGB PNG.
pub fn write_png<S, W>(array: &ArrayBase<S, Ix2>, range: Option<DisplayRange>, writer: W) -> Result<()>
where
    S: Data<Elem = f32>,
    W: Write,
{
    let (ht, wid) = array.dim();
    let mut png_writer = {
        let mut encoder = png::Encoder::new(writer, wid as u32, ht as u32);
        encoder.set_color(png::ColorType::RGB);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.write_header()?
    };
    png_writer.write_image_data(&colorize(array, range))?;
    Ok(())
}

/// [`write_png`] into a new buffer.
pub fn render_png<S>(array: &ArrayBase<S, Ix2>, range: Option<DisplayRange>) -> Result<Vec<u8>>
where
    S: Data<Elem = f32>,
{
    let mut buffer = vec![];
    write_png(array, range, &mut buffer)?;
    Ok(buffer)
}

/// Colour bar legend: `steps` evenly spaced temperatures of
/// `range` with their colours, lowest first.
pub fn legend(range: DisplayRange, steps: usize) -> Vec<(f32, [u8; 3])> {
    let last = steps.saturating_sub(1).max(1) as f32;
    (0..steps)
        .map(|i| i as f32 / last)
        .map(|t| (range.min + t * (range.max - range.min), inferno(t)))
        .collect_vec()
}
