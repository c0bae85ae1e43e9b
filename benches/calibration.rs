use criterion::*;
use ndarray::Array2;
use thermical::{
    pipeline,
    raster::{self, RasterCompression, RasterMetadata, SampleType, StorageLayout},
    CalibrationEngine, CoefficientTable, TimeOfDay, Zone,
};

// H20T thermal frame
const WIDTH: usize = 640;
const HEIGHT: usize = 512;

fn synthetic_frame() -> Array2<f32> {
    Array2::from_shape_fn((HEIGHT, WIDTH), |(r, c)| {
        15. + 30. * ((r * WIDTH + c) % 997) as f32 / 997.
    })
}

fn metadata(compression: RasterCompression) -> RasterMetadata {
    RasterMetadata {
        width: WIDTH as u32,
        height: HEIGHT as u32,
        sample_type: SampleType::F32,
        compression,
        nodata: None,
        gdal_metadata: None,
        geo: Default::default(),
        layout: StorageLayout::STRIPPED,
    }
}

fn calibration(c: &mut Criterion) {
    let frame = synthetic_frame();
    let table = CoefficientTable::builtin();
    let noon = TimeOfDay::from_hour(12).unwrap();

    c.bench_function("transform", |b| {
        let engine = CalibrationEngine::new(table.lookup(Some(Zone::Capote), noon));
        b.iter(|| engine.transform(black_box(&frame)))
    });

    c.bench_function("encode", |b| {
        let meta = metadata(RasterCompression::None);
        b.iter(|| raster::encode(black_box(&frame), &meta).unwrap())
    });

    c.bench_function("encode_lzw", |b| {
        let meta = metadata(RasterCompression::Lzw);
        b.iter(|| raster::encode(black_box(&frame), &meta).unwrap())
    });

    c.bench_function("pipeline", |b| {
        let source = raster::encode(&frame, &metadata(RasterCompression::None)).unwrap();
        b.iter(|| pipeline::calibrate(&table, Some(Zone::Picsi), noon, black_box(&source)).unwrap())
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = calibration
}

criterion_main!(benches);
