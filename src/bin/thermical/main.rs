mod args;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use serde_derive::*;
use tracing::info;

use thermical::{
    cli::{init_tracing, portable_file_name, read_source, StageSummary},
    pipeline::{self, preview_file_name, OUTPUT_MIME_TYPE},
    preview, CoefficientPair, CoefficientTable, RasterMetadata, TimeOfDay, Zone,
};

use crate::args::Args;

fn main() -> Result<()> {
    init_tracing();
    let args = Args::from_cmd_line()?;

    let table = CoefficientTable::builtin();
    let zone = thermical::resolve_zone(args.region, args.province, args.district, args.zone);

    let source = read_source(&args.input)?;
    let output = pipeline::calibrate(&table, zone, args.time, &source)
        .with_context(|| format!("calibrating {:?}", args.input))?;

    fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {:?}", args.output))?;
    let raster_path = args.output.join(portable_file_name(&output.file_name));
    fs::write(&raster_path, &output.raster)
        .with_context(|| format!("writing {:?}", raster_path))?;
    info!(path = ?raster_path, "wrote calibrated raster");

    let calibration = &output.calibration;
    let mut previews = vec![];
    if args.previews {
        for (stage, array, range) in [
            (
                "original",
                &calibration.original_preview,
                calibration.display.original,
            ),
            (
                "calibrada",
                &calibration.calibrated,
                calibration.display.calibrated,
            ),
        ]
        .iter()
        {
            let name = preview_file_name(zone, args.time, stage);
            let path = args.output.join(portable_file_name(&name));
            let writer = fs::File::create(&path)
                .with_context(|| format!("creating {:?}", path))?;
            preview::write_png(*array, *range, std::io::BufWriter::new(writer))?;
            previews.push(path);
        }
    }

    let (original, calibrated) = rayon::join(
        || StageSummary::of(&calibration.original_preview, calibration.display.original),
        || StageSummary::of(&calibration.calibrated, calibration.display.calibrated),
    );

    #[derive(Debug, Serialize)]
    struct OutputJson<'a> {
        input: &'a PathBuf,
        output: &'a PathBuf,
        mime_type: &'static str,
        previews: Vec<PathBuf>,
        zone: Option<Zone>,
        time: TimeOfDay,
        coefficients: CoefficientPair,
        original: StageSummary,
        calibrated: StageSummary,
        raster: &'a RasterMetadata,
    }

    serde_json::to_writer_pretty(
        std::io::stdout().lock(),
        &OutputJson {
            input: &args.input,
            output: &raster_path,
            mime_type: OUTPUT_MIME_TYPE,
            previews,
            zone,
            time: args.time,
            coefficients: output.pair(),
            original,
            calibrated,
            raster: &output.metadata,
        },
    )?;
    println!();

    Ok(())
}
