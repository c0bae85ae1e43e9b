use anyhow::Result;
use clap::value_t_or_exit;
use std::path::PathBuf;
use thermical::{arg, args_parser, opt, District, Province, Region, TimeOfDay, Zone};

pub struct Args {
    pub input: PathBuf,
    pub output: PathBuf,
    pub region: Region,
    pub province: Option<Province>,
    pub district: Option<District>,
    pub zone: Option<Zone>,
    pub time: TimeOfDay,
    pub previews: bool,
}

impl Args {
    pub fn from_cmd_line() -> Result<Args> {
        let matches = args_parser!("thermical")
            .about("Calibrate a thermal GeoTIFF for a survey zone and hour.")
            .arg(
                opt!("region")
                    .short("r")
                    .required(true)
                    .help("Region: Lambayeque or Lima"),
            )
            .arg(
                opt!("province")
                    .short("p")
                    .help("Province (Lambayeque): Ferreñafe or Chiclayo"),
            )
            .arg(
                opt!("district")
                    .short("d")
                    .help("District (Chiclayo): Chongoyape or Picsi"),
            )
            .arg(
                opt!("zone")
                    .short("z")
                    .help("Zone, if the level above offers more than one"),
            )
            .arg(
                opt!("time")
                    .short("t")
                    .required(true)
                    .help("Hour of the flight, 9:00 to 15:00"),
            )
            .arg(
                opt!("output")
                    .short("o")
                    .help(
                        "Output directory.  Default is the current directory.  \
                         Files are named {zone}_{HH:MM:SS}_calibrada.tif; on \
                         Windows the colons become dashes",
                    ),
            )
            .arg(
                opt!("previews")
                    .takes_value(false)
                    .help("Also write PNG previews of the original and calibrated rasters"),
            )
            .arg(
                arg!("input")
                    .required(true)
                    .help("Thermal GeoTIFF (.tif / .tiff)"),
            )
            .get_matches();

        let input = value_t_or_exit!(matches, "input", PathBuf);
        let output = matches
            .is_present("output")
            .then(|| value_t_or_exit!(matches, "output", PathBuf))
            .unwrap_or_else(|| PathBuf::from("."));

        let region = matches.value_of("region").unwrap_or_default().parse()?;
        let province = matches.value_of("province").map(str::parse).transpose()?;
        let district = matches.value_of("district").map(str::parse).transpose()?;
        let zone = matches.value_of("zone").map(str::parse).transpose()?;
        let time = matches.value_of("time").unwrap_or_default().parse()?;

        Ok(Args {
            input,
            output,
            region,
            province,
            district,
            zone,
            time,
            previews: matches.is_present("previews"),
        })
    }
}
