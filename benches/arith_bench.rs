use arith_coder::{decode, encode, ArithmeticDecoder, ArithmeticEncoder, FrequencyTable};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

fn text_like(len: usize) -> Vec<u8> {
    let words: [&[u8]; 8] = [
        b"the ", b"arithmetic ", b"coder ", b"narrows ", b"an ", b"interval ", b"per ", b"symbol. ",
    ];
    let mut rng = StdRng::seed_from_u64(7);
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        out.extend_from_slice(words[(rng.next_u32() % 8) as usize]);
    }
    out.truncate(len);
    out
}

fn random(len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(11);
    let mut out = vec![0u8; len];
    rng.fill_bytes(&mut out);
    out
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    for (name, input) in [("text", text_like(64 * 1024)), ("random", random(64 * 1024))] {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("encode", name), &input, |b, input| {
            b.iter(|| encode(input).unwrap())
        });

        let blob = encode(&input).unwrap();
        group.bench_with_input(BenchmarkId::new("decode", name), &blob, |b, blob| {
            b.iter(|| decode(blob).unwrap())
        });
    }
    group.finish();
}

fn bench_coder_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("coder");
    let input = text_like(64 * 1024);
    let cum = FrequencyTable::build(&input).cumulative();
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("encode", |b| {
        b.iter(|| {
            let mut encoder = ArithmeticEncoder::new(&cum, Vec::with_capacity(input.len()));
            encoder.encode_bytes(&input).unwrap();
            encoder.finish().unwrap()
        })
    });

    let mut encoder = ArithmeticEncoder::new(&cum, Vec::new());
    encoder.encode_bytes(&input).unwrap();
    let body = encoder.finish().unwrap();

    group.bench_function("decode", |b| {
        b.iter(|| {
            let mut decoder = ArithmeticDecoder::new(&cum, body.as_slice()).unwrap();
            let mut out = Vec::with_capacity(input.len());
            decoder.decode_to_end(&mut out).unwrap();
            out
        })
    });
    group.finish();
}

criterion_group!(benches, bench_codec, bench_coder_only);
criterion_main!(benches);
