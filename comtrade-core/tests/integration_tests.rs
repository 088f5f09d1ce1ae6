use std::{
    fs,
    path::{Path, PathBuf},
};

use byteorder::{LittleEndian, WriteBytesExt};
use comtrade_core::{
    detect_encoding, detect_file_encoding, parse_header, parse_header_with, read_comtrade,
    ComtradeError, DataFileType, DecodeError, LazyRecord, LeapSecond, ParseError, Phase,
    ReaderConfig, Revision, TextEncoding, TimeOffset,
};
use tempfile::{tempdir, TempDir};

// ===========================================================================
// Helpers — CFG/DAT пары во временном каталоге
// ===========================================================================

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_pair(
    dir: &TempDir,
    base: &str,
    cfg: &[u8],
    dat: &[u8],
) -> PathBuf {
    let cfg_path = dir.path().join(format!("{base}.cfg"));
    fs::write(&cfg_path, cfg).unwrap();
    fs::write(dir.path().join(format!("{base}.dat")), dat).unwrap();
    cfg_path
}

/// CFG с тремя токовыми каналами без фаз и единиц, 18 дискретными и
/// заданным типом файла.
fn three_phase_cfg(
    file_type: &str,
    samples: usize,
) -> String {
    let mut cfg = String::from("Substation 7,DFR-1,1999\n21,3A,18D\n");
    for (i, name) in ["IA", "IB", "IC"].iter().enumerate() {
        cfg.push_str(&format!(
            "{},{name},,Line1,,0.01,-0.5,0,-32767,32767,600,5,S\n",
            i + 1
        ));
    }
    for d in 1..=18 {
        cfg.push_str(&format!("{d},DI{d},,,0\n"));
    }
    cfg.push_str(&format!(
        "50\n1\n4000,{samples}\n15/06/2024,14:30:25.000000\n15/06/2024,14:30:25.100000\n{file_type}\n"
    ));
    cfg
}

/// Строки бинарного DAT: 3 аналоговых значения + 2 слова дискретных.
fn binary_rows<F>(
    samples: usize,
    mut write_analog: F,
) -> Vec<u8>
where
    F: FnMut(&mut Vec<u8>, usize, usize),
{
    let mut buf = Vec::new();
    for n in 0..samples {
        buf.write_u32::<LittleEndian>(n as u32 + 1).unwrap();
        buf.write_u32::<LittleEndian>(n as u32 * 250).unwrap();
        for ch in 0..3 {
            write_analog(&mut buf, n, ch);
        }
        buf.write_u16::<LittleEndian>(0b1000_0000_0000_0001).unwrap();
        buf.write_u16::<LittleEndian>(0x0001).unwrap();
    }
    buf
}

// ===========================================================================
// Заголовок
// ===========================================================================

#[test]
fn test_channel_counts_match_declaration() {
    init_logger();
    let dir = tempdir().unwrap();
    let cfg = write_pair(&dir, "rec", three_phase_cfg("BINARY", 0).as_bytes(), b"");

    let r = parse_header(&cfg).unwrap();

    assert_eq!(r.analog_count(), 3);
    assert_eq!(r.digital_count(), 18);
    assert_eq!(r.cfg_path, cfg);
    assert_eq!(r.encoding, TextEncoding::Utf8);
}

#[test]
fn test_phase_and_unit_inference_on_parse() {
    init_logger();
    let dir = tempdir().unwrap();
    let cfg = write_pair(&dir, "rec", three_phase_cfg("BINARY", 0).as_bytes(), b"");

    let r = parse_header(&cfg).unwrap();

    let phases: Vec<_> = r.analog.iter().map(|c| c.phase).collect();
    assert_eq!(phases, vec![Phase::A, Phase::B, Phase::C]);
    assert!(r.analog.iter().all(|c| c.unit == "A"));
    assert!(r.analog.iter().all(|c| c.phase_label.is_empty()));
}

#[test]
fn test_multi_rate_header() {
    init_logger();
    let dir = tempdir().unwrap();
    let cfg = "S,D,1999\n1,1A,0D\n1,UA,A,,V,1,0,0,0,1\n50\n3\n1000,50\n4000,150\n1000,200\n\
               01/01/2024,00:00:00.000\n01/01/2024,00:00:00.000\nASCII\n";
    let cfg = write_pair(&dir, "mr", cfg.as_bytes(), b"");

    let r = parse_header(&cfg).unwrap();

    assert_eq!(r.total_samples, 200);
    assert_eq!(r.sampling_rate, 4000.0);

    let t = r.sample_times_ms();
    assert_eq!(t.len(), 200);
    assert_eq!(t[49], 49.0);
    assert_eq!(t[50], 49.25);
    assert_eq!(r.sample_index_at(49.25), 50);
}

#[test]
fn test_rev1991_defaults() {
    init_logger();
    let dir = tempdir().unwrap();
    let cfg = "Old,Rec,1991\n1,0A,1D\n1,TRIP,0\n60\n1\n1200,10\n\n\nASCII\n";
    let cfg = write_pair(&dir, "old", cfg.as_bytes(), b"");

    let r = parse_header(&cfg).unwrap();

    assert_eq!(r.revision, Revision::Rev1991);
    assert_eq!(r.time_multiplier, 1.0);
    assert_eq!(r.time_code, TimeOffset::ZERO);
    assert_eq!(r.local_code, TimeOffset::ZERO);
    assert_eq!(r.leap_second, LeapSecond::None);
}

#[test]
fn test_rev2013_optional_lines() {
    init_logger();
    let dir = tempdir().unwrap();
    let cfg = "Station,Device,2013\n1,1A,0D\n1,IA,A,,A,1,0,0,-32767,32767,100,1,S\n50\n1\n1000,1\n\
               01/01/2024,00:00:00.000\n01/01/2024,00:00:00.000\nASCII\n1.0\n+08:00,+00:00\n1,1";
    let cfg = write_pair(&dir, "new", cfg.as_bytes(), b"1,0,42\n");

    let r = read_comtrade(&cfg).unwrap();

    assert_eq!(r.time_code.minutes, 480);
    assert_eq!(r.leap_second, LeapSecond::Add);
    assert!(r.leap_second_quality);
    assert_eq!(r.analog[0].samples, vec![42.0]);
}

#[test]
fn test_gbk_header() {
    init_logger();
    let dir = tempdir().unwrap();

    // "中文站" в GBK
    let mut cfg = vec![0xD6, 0xD0, 0xCE, 0xC4, 0xD5, 0xBE];
    cfg.extend_from_slice(b",DFR,1999\n0,0A,0D\n50\n1\n1000,0\n\n\nBINARY\n");
    let cfg = write_pair(&dir, "gbk", &cfg, b"");

    assert_eq!(detect_file_encoding(&cfg, 4096).unwrap(), TextEncoding::Gbk);

    let r = parse_header(&cfg).unwrap();
    assert_eq!(r.encoding, TextEncoding::Gbk);
    assert_eq!(r.station_name, "中文站");
}

#[test]
fn test_forced_encoding_overrides_detection() {
    init_logger();
    let dir = tempdir().unwrap();
    let cfg = write_pair(&dir, "f", b"S,D,1999\n0,0A,0D\n50\n1\n1000,0\n\n\nBINARY\n", b"");

    let config = ReaderConfig::default().with_encoding(TextEncoding::Gbk);
    let r = parse_header_with(&cfg, &config).unwrap();

    assert_eq!(r.encoding, TextEncoding::Gbk);
    assert_eq!(r.station_name, "S");
}

#[test]
fn test_detect_encoding_properties() {
    assert_eq!(detect_encoding(&[]), TextEncoding::Utf8);
    assert_eq!(detect_encoding(b"\xEF\xBB\xBFStation"), TextEncoding::Utf8);
    assert_eq!(
        detect_encoding(&[0xD6, 0xD0, 0xCE, 0xC4]),
        TextEncoding::Gbk
    );
}

#[test]
fn test_missing_cfg_is_io_error() {
    let dir = tempdir().unwrap();
    let err = parse_header(dir.path().join("nope.cfg")).unwrap_err();

    assert!(matches!(err, ParseError::Io(_)));
}

// ===========================================================================
// Тело
// ===========================================================================

#[test]
fn test_binary_scaled_round_trip() {
    init_logger();
    let dir = tempdir().unwrap();
    let raw = |n: usize, ch: usize| (n as i16 * 100) - (ch as i16 * 7);
    let dat = binary_rows(4, |buf, n, ch| buf.write_i16::<LittleEndian>(raw(n, ch)).unwrap());
    let cfg = write_pair(&dir, "bin", three_phase_cfg("BINARY", 4).as_bytes(), &dat);

    let r = read_comtrade(&cfg).unwrap();

    for (ch, channel) in r.analog.iter().enumerate() {
        assert_eq!(channel.samples.len(), 4);
        for n in 0..4 {
            let expected = raw(n, ch) as f64 * 0.01 + -0.5;
            assert_eq!(channel.samples[n], expected);
        }
    }

    assert_eq!(r.digital[0].samples, vec![1; 4]);
    assert_eq!(r.digital[15].samples, vec![1; 4]);
    assert_eq!(r.digital[16].samples, vec![1; 4]);
    assert_eq!(r.digital[17].samples, vec![0; 4]);
    assert!(r.digital.iter().all(|d| !d.has_transition()));
}

#[test]
fn test_binary32_scaled() {
    init_logger();
    let dir = tempdir().unwrap();
    let dat = binary_rows(2, |buf, n, _| {
        buf.write_i32::<LittleEndian>(70_000 * (n as i32 + 1)).unwrap()
    });
    let cfg = write_pair(&dir, "b32", three_phase_cfg("BINARY32", 2).as_bytes(), &dat);

    let r = read_comtrade(&cfg).unwrap();

    assert_eq!(r.data_file_type, Some(DataFileType::Binary32));
    assert_eq!(r.analog[0].samples, vec![70_000.0 * 0.01 - 0.5, 140_000.0 * 0.01 - 0.5]);
    assert_eq!(r.analog[0].sample_max, 140_000.0 * 0.01 - 0.5);
}

#[test]
fn test_float32_stored_unscaled() {
    init_logger();
    let dir = tempdir().unwrap();
    let values = [1.5f32, -2.25, 1e6];
    let dat = binary_rows(3, |buf, n, _| buf.write_f32::<LittleEndian>(values[n]).unwrap());
    let cfg = write_pair(&dir, "f32", three_phase_cfg("FLOAT32", 3).as_bytes(), &dat);

    let r = read_comtrade(&cfg).unwrap();

    assert_eq!(r.analog[1].samples, vec![1.5, -2.25, 1e6]);
    assert_eq!(r.analog[1].sample_min, -2.25);
}

#[test]
fn test_ascii_body() {
    init_logger();
    let dir = tempdir().unwrap();
    let cfg = "S,D,1999\n2,1A,1D\n1,VA,A,,kV,0.5,1,0,0,1\n1,TRIP,,,0\n50\n1\n1000,3\n\n\nascii\n";
    let dat = "1, 0, 10, 0\n2\t1000\t20\t1\n\n3,2000,-4,0\n";
    let cfg = write_pair(&dir, "asc", cfg.as_bytes(), dat.as_bytes());

    let r = read_comtrade(&cfg).unwrap();

    assert_eq!(r.analog[0].samples, vec![6.0, 11.0, -1.0]);
    assert_eq!((r.analog[0].sample_min, r.analog[0].sample_max), (-1.0, 11.0));
    assert_eq!(r.digital[0].samples, vec![0, 1, 0]);
    assert!(r.digital[0].has_transition());
}

#[test]
fn test_uppercase_extension_resolves_dat() {
    init_logger();
    let dir = tempdir().unwrap();
    let cfg_path = dir.path().join("REC.CFG");
    fs::write(&cfg_path, "S,D,1999\n1,1A,0D\n1,X,,,,1,0,0,0,1\n50\n1\n1000,1\n\n\nASCII\n").unwrap();
    fs::write(dir.path().join("REC.DAT"), "1,0,3\n").unwrap();

    let r = read_comtrade(&cfg_path).unwrap();

    assert_eq!(r.dat_path(), dir.path().join("REC.DAT"));
    assert_eq!(r.analog[0].samples, vec![3.0]);
}

#[test]
fn test_truncated_binary_file() {
    init_logger();
    let dir = tempdir().unwrap();
    let mut dat = binary_rows(3, |buf, _, _| buf.write_i16::<LittleEndian>(1).unwrap());
    dat.truncate(dat.len() - 1);
    let cfg = write_pair(&dir, "short", three_phase_cfg("BINARY", 3).as_bytes(), &dat);

    let err = read_comtrade(&cfg).unwrap_err();

    match err {
        ComtradeError::Decode(DecodeError::Truncated { path, sample, total }) => {
            assert_eq!(path, dir.path().join("short.dat"));
            assert_eq!(sample, 2);
            assert_eq!(total, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_malformed_ascii_names_file_and_line() {
    init_logger();
    let dir = tempdir().unwrap();
    let cfg = "S,D,1999\n1,1A,0D\n1,X,,,,1,0,0,0,1\n50\n1\n1000,2\n\n\nASCII\n";
    let cfg = write_pair(&dir, "bad", cfg.as_bytes(), b"1,0,1\n2,1,abc\n");

    let err = read_comtrade(&cfg).unwrap_err();
    let message = err.to_string();

    assert!(message.contains("bad.dat:2"), "{message}");
    assert!(message.contains("'abc'"), "{message}");
}

#[test]
fn test_unsupported_file_type_is_decode_error() {
    init_logger();
    let dir = tempdir().unwrap();
    let cfg = "S,D,1999\n0,0A,0D\n50\n1\n1000,0\n\n\nINT16\n";
    let cfg = write_pair(&dir, "u", cfg.as_bytes(), b"");

    assert!(parse_header(&cfg).is_ok());
    assert!(matches!(
        read_comtrade(&cfg),
        Err(ComtradeError::Decode(DecodeError::UnsupportedFileType(_)))
    ));
}

// ===========================================================================
// Отложенная загрузка
// ===========================================================================

#[test]
fn test_lazy_header_leaves_samples_empty() {
    init_logger();
    let dir = tempdir().unwrap();
    let dat = binary_rows(2, |buf, _, _| buf.write_i16::<LittleEndian>(0).unwrap());
    let cfg = write_pair(&dir, "lazy", three_phase_cfg("BINARY", 2).as_bytes(), &dat);

    let lazy = LazyRecord::open(&cfg).unwrap();

    assert!(!lazy.is_loaded());
    assert!(lazy.header().analog.iter().all(|c| c.samples.is_empty()));
    assert!(lazy.header().digital.iter().all(|c| c.samples.is_empty()));
}

#[test]
fn test_lazy_load_is_idempotent() {
    init_logger();
    let dir = tempdir().unwrap();
    let dat = binary_rows(5, |buf, n, _| buf.write_i16::<LittleEndian>(n as i16).unwrap());
    let cfg = write_pair(&dir, "idem", three_phase_cfg("BINARY", 5).as_bytes(), &dat);
    let lazy = LazyRecord::open(&cfg).unwrap();

    let first = lazy.ensure_body_loaded().unwrap().clone();
    fs::remove_file(dat_path(&cfg)).unwrap();
    let second = lazy.ensure_body_loaded().unwrap();

    assert_eq!(&first, second);
    assert_eq!(lazy.decode_count(), 1);
}

fn dat_path(cfg: &Path) -> PathBuf {
    cfg.with_extension("dat")
}
