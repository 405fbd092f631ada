extern crate candb;

use candb::{parse_dbc, ParseFrame};
use criterion::{black_box, criterion_group, criterion_main, Criterion as Bencher};

static SAMPLE: &str = include_str!("../tests/data/sample.dbc");

fn bench_parse_network(b: &mut Bencher) {
    b.bench_function("bench_parse_network", move |b| {
        b.iter(|| black_box(parse_dbc(SAMPLE)))
    });
}

fn bench_decode_signal(b: &mut Bencher) {
    let network = parse_dbc(SAMPLE).network;
    let signal = network.signal(2364539904, "Engine_Speed").unwrap().clone();
    let frame: [u8; 8] = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];

    b.bench_function("bench_decode_signal", move |b| {
        b.iter(|| black_box(signal.parse_frame(&frame[..]).unwrap()))
    });
}

fn bench_decode_signal_closure(b: &mut Bencher) {
    let network = parse_dbc(SAMPLE).network;
    let parse = network.signal(2364539904, "Engine_Speed").unwrap().parser();
    static FRAME: [u8; 8] = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];

    b.bench_function("bench_decode_signal_closure", move |b| {
        b.iter(|| black_box(parse(&FRAME[..]).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_parse_network,
    bench_decode_signal,
    bench_decode_signal_closure,
);

criterion_main!(benches);
