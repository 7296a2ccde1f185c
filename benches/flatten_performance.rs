use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gprs_rust::gprs_common_rs::decoder::{LayoutDecoder, Schema, StructDecoder};
use gprs_rust::gprs_common_rs::flatten::Flattener;
use gprs_rust::gprs_common_rs::packet::core::packet_input::{to_hex_tokens, PacketInput};
use gprs_rust::gprs_common_rs::packet::models::FieldTree;
use gprs_rust::gprs_common_rs::service::GprsService;
use gprs_rust::gprs_common_rs::utils::GprsConfig;

const DIAG2: [u8; 32] = [
    0x02, 0x07, 0x02, 0x01, 0x02, 0x03, 0x04, 0x05, 0x26, 0x35, 0x30, 0x39, 0xEC, 0x31, 0x88, 0x05,
    0x00, 0x64, 0x00, 0xC8, 0x01, 0x2C, 0x01, 0x90, 0x01, 0xF4, 0x02, 0x58, 0x02, 0xBC, 0x03, 0x20,
];

fn bitmap_tree(width: usize) -> FieldTree {
    let presence: Vec<bool> = (0..width).map(|i| i % 3 != 0).collect();
    let values: Vec<bool> = (0..width).map(|i| i % 2 == 0).collect();
    let data = FieldTree::new()
        .with_bits("relay_presence_bits", &presence)
        .with_bits("relay_value_bits", &values)
        .with_uint("port", 5000);
    FieldTree::new()
        .with_uint("type", 2)
        .with_uint("ref", 1)
        .with_tree("type_class", FieldTree::new().with_uint("code", 7).with_tree("data", data))
}

fn benchmark_flatten_bitmaps(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten_bitmap");
    let flattener = Flattener::new();

    for width in [8, 64, 512] {
        let tree = bitmap_tree(width);
        group.bench_with_input(BenchmarkId::new("flatten", width), &tree, |b, tree| {
            b.iter(|| black_box(flattener.flatten(black_box(tree))))
        });
    }

    group.finish();
}

fn benchmark_decode(c: &mut Criterion) {
    let decoder = LayoutDecoder::new();
    c.bench_function("decode_diag2", |b| {
        b.iter(|| black_box(decoder.decode(black_box(&DIAG2), Schema::command())))
    });
}

fn benchmark_end_to_end(c: &mut Criterion) {
    let service = GprsService::from_config(&GprsConfig::default()).unwrap();
    let text = to_hex_tokens(&DIAG2);

    c.bench_function("process_bytes", |b| {
        b.iter(|| black_box(service.process_bytes(black_box(&DIAG2))))
    });
    c.bench_function("process_hex_tokens", |b| {
        b.iter(|| black_box(service.process(PacketInput::from(black_box(text.as_str())))))
    });
}

criterion_group!(benches, benchmark_flatten_bitmaps, benchmark_decode, benchmark_end_to_end);
criterion_main!(benches);
