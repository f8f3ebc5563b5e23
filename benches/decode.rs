// Benchmark for segment decoding
// Run with: cargo bench --bench decode

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hwsens_core::image::{ReadingSpec, SegmentImageBuilder, SensorSpec};
use hwsens_core::{decode_segment, InMemoryProvider, ReadingType, SnapshotReader};

/// A segment shaped like a typical desktop: a few dozen sensors, readings
/// spread across them
fn image(sensors: u32, readings_per_sensor: u32) -> Vec<u8> {
    let mut builder = SegmentImageBuilder::new().poll_time(1_700_000_000);
    for s in 0..sensors {
        builder = builder.sensor(SensorSpec::new(0xF000_0000 + s, 0, &format!("Sensor {}", s)));
        for r in 0..readings_per_sensor {
            builder = builder.reading(
                ReadingSpec::new(ReadingType::Temperature, s, r, &format!("Reading {}", r))
                    .unit("°C")
                    .values(40.0 + f64::from(r), 30.0, 90.0, 50.0),
            );
        }
    }
    builder.build()
}

fn benchmark_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_segment");

    for (sensors, per_sensor) in [(8u32, 10u32), (40, 25), (120, 40)].iter() {
        let bytes = image(*sensors, *per_sensor);
        let len = bytes.len() as u64;
        group.bench_with_input(
            BenchmarkId::from_parameter(sensors * per_sensor),
            &bytes,
            |b, bytes| b.iter(|| decode_segment(black_box(bytes), len)),
        );
    }

    group.finish();
}

fn benchmark_snapshot(c: &mut Criterion) {
    let reader = SnapshotReader::new(InMemoryProvider::new(image(40, 25)));
    c.bench_function("snapshot_read_1000_readings", |b| {
        b.iter(|| black_box(reader.read()))
    });
}

criterion_group!(benches, benchmark_decode, benchmark_snapshot);
criterion_main!(benches);
