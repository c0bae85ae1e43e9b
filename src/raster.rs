//! Read and write single-band GeoTIFF rasters in memory.
//!
//! [`decode`] reads band 1 of a TIFF / GeoTIFF as `f32`
//! samples together with the [`RasterMetadata`] needed to
//! write it back: dimensions, source sample type,
//! compression, the GeoTIFF georeferencing tags and the GDAL
//! nodata / metadata strings. Other bands are ignored.
//!
//! [`encode`] writes one `f32` band with the same metadata
//! into an in-memory buffer. `decode(&encode(s, m)?)?` yields
//! `s` and [`RasterMetadata::as_written`]: the sample type
//! becomes [`SampleType::F32`] and the storage layout becomes
//! striped, chunky and unpredicted.
//!
//! The source [`StorageLayout`] (tile size, predictor,
//! planar configuration) is recorded but not reproduced,
//! since the `tiff` encoder only writes plain strips. A tiled
//! or predicted orthomosaic therefore comes back striped,
//! with its compression kept.
//!
//! No GDAL dependency; the container is handled by the
//! `tiff` crate and the GeoTIFF tags are carried as raw
//! values, so any spatial reference survives untouched.

use std::io::{Cursor, Read, Seek, Write};

use ndarray::{Array2, ArrayBase, Data, Ix2};
use serde_derive::*;
use tiff::{
    decoder::{ifd::Value, Decoder, DecodingResult},
    encoder::{
        colortype::Gray32Float, Compression, DeflateLevel, DirectoryEncoder, TiffEncoder,
        TiffKind,
    },
    tags::Tag,
    TiffError,
};
use tracing::debug;

use crate::error::{Error, Result};

// GeoTIFF tags
const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GEO_DOUBLE_PARAMS: u16 = 34736;
const GEO_ASCII_PARAMS: u16 = 34737;

// GDAL private tags
const GDAL_METADATA: u16 = 42112;
const GDAL_NODATA: u16 = 42113;

/// Band read by [`decode`] (1-based, GDAL convention).
pub const BAND: usize = 1;

/// Sample type of the source raster.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SampleType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

/// Compression of the strip / tile data.
///
/// Schemes the encoder cannot produce are recorded as
/// [`RasterCompression::None`] when decoding.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RasterCompression {
    None,
    Lzw,
    Deflate,
    PackBits,
}

impl RasterCompression {
    fn from_tag_value(code: u16) -> Self {
        match code {
            1 => RasterCompression::None,
            5 => RasterCompression::Lzw,
            8 | 32946 => RasterCompression::Deflate,
            32773 => RasterCompression::PackBits,
            other => {
                debug!(compression = other, "compression not supported for writing");
                RasterCompression::None
            }
        }
    }

    fn for_encoder(self) -> Compression {
        match self {
            RasterCompression::None => Compression::Uncompressed,
            RasterCompression::Lzw => Compression::Lzw,
            RasterCompression::Deflate => Compression::Deflate(DeflateLevel::Fast),
            RasterCompression::PackBits => Compression::Packbits,
        }
    }
}

/// Differencing applied before compression (`Predictor` tag).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Predictor {
    None,
    Horizontal,
    FloatingPoint,
}

impl Predictor {
    fn from_tag_value(code: u16) -> Self {
        match code {
            2 => Predictor::Horizontal,
            3 => Predictor::FloatingPoint,
            _ => Predictor::None,
        }
    }
}

/// How samples of several bands are interleaved.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanarConfig {
    Chunky,
    Planar,
}

impl PlanarConfig {
    fn from_tag_value(code: u16) -> Self {
        match code {
            2 => PlanarConfig::Planar,
            _ => PlanarConfig::Chunky,
        }
    }
}

/// Storage layout of the source raster.
///
/// Read for reporting only; [`encode`] always writes
/// [`StorageLayout::STRIPPED`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageLayout {
    /// `(TileWidth, TileLength)` of a tiled raster.
    pub tiles: Option<(u32, u32)>,
    pub predictor: Predictor,
    pub planar: PlanarConfig,
}

impl StorageLayout {
    /// Layout produced by [`encode`].
    pub const STRIPPED: StorageLayout = StorageLayout {
        tiles: None,
        predictor: Predictor::None,
        planar: PlanarConfig::Chunky,
    };

    fn read<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Self> {
        let tile_width = find_tag(decoder, Tag::TileWidth.to_u16(), Value::into_u32)?;
        let tile_length = find_tag(decoder, Tag::TileLength.to_u16(), Value::into_u32)?;
        let predictor = find_tag(decoder, Tag::Predictor.to_u16(), Value::into_u16)?;
        let planar = find_tag(decoder, Tag::PlanarConfiguration.to_u16(), Value::into_u16)?;

        Ok(StorageLayout {
            tiles: tile_width.zip(tile_length),
            predictor: predictor.map_or(Predictor::None, Predictor::from_tag_value),
            planar: planar.map_or(PlanarConfig::Chunky, PlanarConfig::from_tag_value),
        })
    }
}

/// Raw GeoTIFF georeferencing tags.
///
/// Values are kept exactly as stored so that the spatial
/// reference and the raster-to-model transform are
/// reproduced bit for bit.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct GeoReference {
    pub pixel_scale: Option<Vec<f64>>,
    pub tiepoints: Option<Vec<f64>>,
    pub transformation: Option<Vec<f64>>,
    pub geo_key_directory: Option<Vec<u16>>,
    pub geo_double_params: Option<Vec<f64>>,
    pub geo_ascii_params: Option<String>,
}

impl GeoReference {
    /// A raster without any georeferencing.
    pub fn is_empty(&self) -> bool {
        *self == GeoReference::default()
    }

    fn read<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Self> {
        Ok(GeoReference {
            pixel_scale: find_tag(decoder, MODEL_PIXEL_SCALE, Value::into_f64_vec)?,
            tiepoints: find_tag(decoder, MODEL_TIEPOINT, Value::into_f64_vec)?,
            transformation: find_tag(decoder, MODEL_TRANSFORMATION, Value::into_f64_vec)?,
            geo_key_directory: find_tag(decoder, GEO_KEY_DIRECTORY, Value::into_u16_vec)?,
            geo_double_params: find_tag(decoder, GEO_DOUBLE_PARAMS, Value::into_f64_vec)?,
            geo_ascii_params: find_tag(decoder, GEO_ASCII_PARAMS, Value::into_string)?,
        })
    }

    fn write<W: Write + Seek, K: TiffKind>(&self, dir: &mut DirectoryEncoder<W, K>) -> Result<()> {
        let doubles = [
            (MODEL_PIXEL_SCALE, &self.pixel_scale),
            (MODEL_TIEPOINT, &self.tiepoints),
            (MODEL_TRANSFORMATION, &self.transformation),
            (GEO_DOUBLE_PARAMS, &self.geo_double_params),
        ];
        for (code, values) in doubles.iter() {
            if let Some(values) = values {
                dir.write_tag(tag(*code), values.as_slice())
                    .map_err(encode_error)?;
            }
        }
        if let Some(keys) = &self.geo_key_directory {
            dir.write_tag(tag(GEO_KEY_DIRECTORY), keys.as_slice())
                .map_err(encode_error)?;
        }
        if let Some(ascii) = &self.geo_ascii_params {
            dir.write_tag(tag(GEO_ASCII_PARAMS), ascii.as_str())
                .map_err(encode_error)?;
        }
        Ok(())
    }
}

/// Everything about a raster except its samples.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RasterMetadata {
    pub width: u32,
    pub height: u32,
    pub sample_type: SampleType,
    pub compression: RasterCompression,
    /// `GDAL_NODATA` as stored (an ASCII number).
    pub nodata: Option<String>,
    /// `GDAL_METADATA` XML.
    pub gdal_metadata: Option<String>,
    pub geo: GeoReference,
    pub layout: StorageLayout,
}

impl RasterMetadata {
    /// The metadata [`decode`] reports for the output of
    /// [`encode`] with `self`.
    pub fn as_written(&self) -> Self {
        RasterMetadata {
            sample_type: SampleType::F32,
            layout: StorageLayout::STRIPPED,
            ..self.clone()
        }
    }
}

/// Band 1 of a raster and its metadata.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub samples: Array2<f32>,
    pub metadata: RasterMetadata,
}

impl RasterImage {
    /// Encode the samples with this image's metadata.
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode(&self.samples, &self.metadata)
    }
}

fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

fn format_error(e: TiffError) -> Error {
    Error::Format(e.to_string())
}

fn encode_error(e: TiffError) -> Error {
    Error::Encode(e.to_string())
}

fn find_tag<R, T, F>(decoder: &mut Decoder<R>, code: u16, convert: F) -> Result<Option<T>>
where
    R: Read + Seek,
    F: FnOnce(Value) -> Result<T, TiffError>,
{
    decoder
        .find_tag(tag(code))
        .and_then(|value| value.map(convert).transpose())
        .map_err(format_error)
}

/// Decode band 1 and the metadata of a TIFF / GeoTIFF.
///
/// Fails with [`Error::Format`] if the bytes are not a
/// readable TIFF, and with [`Error::Band`] if the image has
/// no first band.
pub fn decode(bytes: &[u8]) -> Result<RasterImage> {
    let mut decoder = Decoder::new(Cursor::new(bytes)).map_err(format_error)?;
    let (width, height) = decoder.dimensions().map_err(format_error)?;

    let bands: u16 = find_tag(&mut decoder, Tag::SamplesPerPixel.to_u16(), Value::into_u16)?
        .unwrap_or(1);
    let compression = find_tag(&mut decoder, Tag::Compression.to_u16(), Value::into_u16)?
        .map(RasterCompression::from_tag_value)
        .unwrap_or(RasterCompression::None);

    let layout = StorageLayout::read(&mut decoder)?;
    let geo = GeoReference::read(&mut decoder)?;
    let nodata = find_tag(&mut decoder, GDAL_NODATA, Value::into_string)?;
    let gdal_metadata = find_tag(&mut decoder, GDAL_METADATA, Value::into_string)?;

    let (sample_type, values) = samples_as_f32(decoder.read_image().map_err(format_error)?)?;
    debug!(
        width,
        height,
        bands,
        ?sample_type,
        ?compression,
        ?layout,
        georeferenced = !geo.is_empty(),
        "decoded raster"
    );
    if bands > 1 {
        debug!(bands, "reading band {} only", BAND);
    }

    let band = extract_first_band(
        values,
        width as usize,
        height as usize,
        bands as usize,
        layout.planar,
    )?;
    let samples = Array2::from_shape_vec((height as usize, width as usize), band)
        .map_err(|e| Error::Format(e.to_string()))?;

    Ok(RasterImage {
        samples,
        metadata: RasterMetadata {
            width,
            height,
            sample_type,
            compression,
            nodata,
            gdal_metadata,
            geo,
            layout,
        },
    })
}

fn samples_as_f32(result: DecodingResult) -> Result<(SampleType, Vec<f32>)> {
    fn widen<T: Into<f32>>(v: Vec<T>) -> Vec<f32> {
        v.into_iter().map(Into::into).collect()
    }

    use DecodingResult::*;
    Ok(match result {
        U8(v) => (SampleType::U8, widen(v)),
        U16(v) => (SampleType::U16, widen(v)),
        I8(v) => (SampleType::I8, widen(v)),
        I16(v) => (SampleType::I16, widen(v)),
        U32(v) => (SampleType::U32, v.into_iter().map(|x| x as f32).collect()),
        U64(v) => (SampleType::U64, v.into_iter().map(|x| x as f32).collect()),
        I32(v) => (SampleType::I32, v.into_iter().map(|x| x as f32).collect()),
        I64(v) => (SampleType::I64, v.into_iter().map(|x| x as f32).collect()),
        F32(v) => (SampleType::F32, v),
        F64(v) => (SampleType::F64, v.into_iter().map(|x| x as f32).collect()),
        #[allow(unreachable_patterns)]
        _ => return Err(Error::Format("unsupported sample format".into())),
    })
}

/// Pick the first band out of decoded samples.
///
/// Chunky data interleaves bands per pixel; planar data
/// stores band 1 as the leading plane.
fn extract_first_band(
    values: Vec<f32>,
    width: usize,
    height: usize,
    bands: usize,
    planar: PlanarConfig,
) -> Result<Vec<f32>> {
    let pixels = width * height;
    if bands == 0 {
        return Err(Error::Band { band: BAND });
    }

    let band: Vec<f32> = if bands == 1 {
        values
    } else if planar == PlanarConfig::Planar {
        values.into_iter().take(pixels).collect()
    } else {
        values.into_iter().step_by(bands).take(pixels).collect()
    };

    if band.len() < pixels {
        return Err(Error::Band { band: BAND });
    }
    Ok(band)
}

/// Encode `samples` as a single `f32` band with `metadata`.
///
/// `metadata.sample_type` is ignored: the output is always
/// [`SampleType::F32`]. The image is assembled in memory and
/// the buffer is handed over to the caller.
pub fn encode<S>(samples: &ArrayBase<S, Ix2>, metadata: &RasterMetadata) -> Result<Vec<u8>>
where
    S: Data<Elem = f32>,
{
    let (width, height) = (metadata.width, metadata.height);
    if samples.dim() != (height as usize, width as usize) {
        return Err(Error::Encode(format!(
            "samples are {:?} but metadata declares {}x{}",
            samples.dim(),
            height,
            width
        )));
    }
    if width == 0 || height == 0 {
        return Err(Error::Encode("raster has no pixels".into()));
    }

    let data: Vec<f32> = samples.iter().copied().collect();
    let mut buffer = Cursor::new(Vec::with_capacity(4 * data.len()));

    {
        let mut encoder = TiffEncoder::new(&mut buffer)
            .map_err(encode_error)?
            .with_compression(metadata.compression.for_encoder());
        let mut image = encoder
            .new_image::<Gray32Float>(width, height)
            .map_err(encode_error)?;

        let dir = image.encoder();
        metadata.geo.write(&mut *dir)?;
        if let Some(nodata) = &metadata.nodata {
            dir.write_tag(tag(GDAL_NODATA), nodata.as_str())
                .map_err(encode_error)?;
        }
        if let Some(xml) = &metadata.gdal_metadata {
            dir.write_tag(tag(GDAL_METADATA), xml.as_str())
                .map_err(encode_error)?;
        }
        image.write_data(&data).map_err(encode_error)?;
    }

    debug!(width, height, bytes = buffer.get_ref().len(), "encoded raster");
    Ok(buffer.into_inner())
}
