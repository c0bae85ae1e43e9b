//! Helpers for the accompanying binary.
//!
//! APIs here shouldn't be considered stable / used as a
//! library.

use std::{fs::read, path::Path};

use anyhow::{ensure, Context, Result};
pub use clap::{App, Arg};
pub use inflector::Inflector;
use ndarray::{ArrayBase, Data, Ix2};
use serde_derive::*;
use tracing_subscriber::EnvFilter;

use crate::{
    calibration::DisplayRange,
    pipeline::{has_raster_extension, INPUT_EXTENSIONS},
    preview::legend,
    stats::Stats,
};

/// Stops in the colour bar legend of each stage.
pub const LEGEND_STEPS: usize = 6;

#[macro_export]
macro_rules! args_parser {
    ($name:expr) => {{
        $crate::cli::App::new($name)
            .version(clap::crate_version!())
            .author(clap::crate_authors!())
    }};
}

#[macro_export]
macro_rules! arg {
    ($name:expr) => {{
        use $crate::cli::Inflector;
        $crate::cli::Arg::with_name($name).value_name(&$name.to_screaming_snake_case())
    }};
}

#[macro_export]
macro_rules! opt {
    ($name:expr) => {{
        use $crate::cli::Inflector;
        $crate::cli::Arg::with_name($name)
            .long(&$name.to_kebab_case())
            .value_name(&$name.to_screaming_snake_case())
    }};
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Read a source raster, checking its extension first.
pub fn read_source(path: &Path) -> Result<Vec<u8>> {
    ensure!(
        has_raster_extension(path),
        "{:?}: expected one of the extensions {:?}",
        path,
        INPUT_EXTENSIONS
    );
    read(path).with_context(|| format!("reading {:?}", path))
}

/// `name` with `:` replaced on platforms that forbid it in
/// file names.
pub fn portable_file_name(name: &str) -> String {
    if cfg!(windows) {
        name.replace(':', "-")
    } else {
        name.to_string()
    }
}

/// Summary of one stage (original or calibrated) of a run.
#[derive(Serialize, Debug, Clone)]
pub struct StageSummary {
    pub stats: Stats,
    pub display_range: Option<DisplayRange>,
    /// Colour bar: temperature and RGB colour, lowest first.
    /// Empty without a display range.
    pub legend: Vec<(f32, [u8; 3])>,
}

impl StageSummary {
    pub fn of<S>(array: &ArrayBase<S, Ix2>, display_range: Option<DisplayRange>) -> Self
    where
        S: Data<Elem = f32>,
    {
        StageSummary {
            stats: Stats::of_array(array),
            display_range,
            legend: display_range
                .map(|range| legend(range, LEGEND_STEPS))
                .unwrap_or_default(),
        }
    }
}
