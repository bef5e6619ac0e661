use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use visionhal::{ByteOrder, ChannelOrder, ImageBuffer, PixelFormat, demosaic, pack, unpack};

fn mono12_buffer(width: u32, height: u32) -> ImageBuffer {
    let pixels = (width * height) as usize;
    let mut bytes = Vec::with_capacity(pixels * 2);
    for i in 0..pixels {
        let sample = ((i * 97 + 13) % 4096) as u16;
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    ImageBuffer::from_bytes(bytes, width, height, PixelFormat::Mono12, 1, 0)
        .expect("bench geometry is valid")
}

fn bayer_buffer(width: u32, height: u32) -> ImageBuffer {
    let pixels = (width * height) as usize;
    let mut bytes = Vec::with_capacity(pixels * 2);
    for i in 0..pixels {
        let sample = ((i * 31 + 7) % 4096) as u16;
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    ImageBuffer::from_bytes(bytes, width, height, PixelFormat::BayerRg12, 1, 0)
        .expect("bench geometry is valid")
}

fn benchmark_pack_unpack(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_unpack_mono12");

    let sizes = [(320, 240, "320x240"), (640, 480, "640x480"), (1280, 960, "1280x960")];

    for (width, height, label) in sizes {
        let unpacked = mono12_buffer(width, height);
        let packed = pack(&unpacked, ByteOrder::LittleEndian).expect("packable");

        group.bench_with_input(BenchmarkId::new("pack", label), &unpacked, |b, buffer| {
            b.iter(|| pack(black_box(buffer), ByteOrder::LittleEndian).expect("packable"));
        });
        group.bench_with_input(BenchmarkId::new("unpack", label), &packed, |b, buffer| {
            b.iter(|| unpack(black_box(buffer), ByteOrder::LittleEndian).expect("unpackable"));
        });
    }

    group.finish();
}

fn benchmark_demosaic(c: &mut Criterion) {
    let mut group = c.benchmark_group("demosaic_bayer12");

    let sizes = [(320, 240, "320x240"), (640, 480, "640x480"), (1280, 960, "1280x960")];

    for (width, height, label) in sizes {
        let bayer = bayer_buffer(width, height);
        group.bench_with_input(BenchmarkId::from_parameter(label), &bayer, |b, buffer| {
            b.iter(|| demosaic(black_box(buffer), ChannelOrder::Rgb).expect("bayer input"));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_pack_unpack, benchmark_demosaic);
criterion_main!(benches);
