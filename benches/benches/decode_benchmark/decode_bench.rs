//! Бенчмарки разбора CFG и декодирования DAT.
//!
//! Данные генерируются в памяти: 16 аналоговых и 32 дискретных канала,
//! 20 000 выборок.

use std::{hint::black_box, io::Cursor, path::Path};

use byteorder::{LittleEndian, WriteBytesExt};
use comtrade_core::{body::decode_record_body, parse_header_str, ReaderConfig};
use comtrade_types::{DataFileType, Record, TextEncoding};
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};

const ANALOG: usize = 16;
const DIGITAL: usize = 32;
const SAMPLES: usize = 20_000;

fn cfg_text(file_type: &str) -> String {
    let mut cfg = format!("Bench,DFR,1999\n{},{ANALOG}A,{DIGITAL}D\n", ANALOG + DIGITAL);
    let names = ["IA", "IB", "IC", "IN"];
    for i in 0..ANALOG {
        let name = names[i % names.len()];
        cfg.push_str(&format!("{},{name}{},,,,0.001,0,0,-32767,32767,1000,1,S\n", i + 1, i / 4));
    }
    for d in 0..DIGITAL {
        cfg.push_str(&format!("{},DI{},,,0\n", d + 1, d + 1));
    }
    cfg.push_str(&format!(
        "50\n1\n4000,{SAMPLES}\n01/01/2024,00:00:00.000000\n01/01/2024,00:00:00.050000\n{file_type}\n"
    ));
    cfg
}

fn record(file_type: &str) -> Record {
    parse_header_str(&cfg_text(file_type), TextEncoding::Utf8).unwrap()
}

fn binary_dat(rng: &mut StdRng) -> Vec<u8> {
    let mut buf = Vec::new();
    for n in 0..SAMPLES {
        buf.write_u32::<LittleEndian>(n as u32 + 1).unwrap();
        buf.write_u32::<LittleEndian>(n as u32 * 250).unwrap();
        for _ in 0..ANALOG {
            buf.write_i16::<LittleEndian>(rng.gen_range(-32767..=32767)).unwrap();
        }
        for _ in 0..DIGITAL / 16 {
            buf.write_u16::<LittleEndian>(rng.gen()).unwrap();
        }
    }
    buf
}

fn ascii_dat(rng: &mut StdRng) -> Vec<u8> {
    let mut text = String::new();
    for n in 0..SAMPLES {
        text.push_str(&format!("{},{}", n + 1, n * 250));
        for _ in 0..ANALOG {
            text.push_str(&format!(",{}", rng.gen_range(-32767..=32767)));
        }
        for _ in 0..DIGITAL {
            text.push_str(if rng.gen_bool(0.1) { ",1" } else { ",0" });
        }
        text.push('\n');
    }
    text.into_bytes()
}

fn bench_header(c: &mut Criterion) {
    let _ = env_logger::builder().is_test(true).try_init();
    let cfg = cfg_text("BINARY");

    c.bench_function("parse_header/16A_32D", |b| {
        b.iter(|| parse_header_str(black_box(&cfg), TextEncoding::Utf8).unwrap())
    });
}

fn bench_decode(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(60255);
    let config = ReaderConfig::default();

    let binary = binary_dat(&mut rng);
    let ascii = ascii_dat(&mut rng);
    let binary_record = record("BINARY");
    let ascii_record = record("ASCII");

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Elements(SAMPLES as u64));

    group.bench_function("binary/20k", |b| {
        b.iter(|| {
            decode_record_body(
                &binary_record,
                Cursor::new(black_box(&binary)),
                Path::new("bench.dat"),
                DataFileType::Binary,
                &config,
                None,
            )
            .unwrap()
        })
    });
    group.bench_function("ascii/20k", |b| {
        b.iter(|| {
            decode_record_body(
                &ascii_record,
                Cursor::new(black_box(&ascii)),
                Path::new("bench.dat"),
                DataFileType::Ascii,
                &config,
                None,
            )
            .unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_header, bench_decode);
criterion_main!(benches);
