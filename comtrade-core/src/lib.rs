//! Библиотека чтения записей COMTRADE
//!
//! Разбор CFG/DAT пар осциллограмм аварийных событий по IEC 60255-24 /
//! IEEE C37.111 (редакции 1991, 1999, 2013).
//!
//! # Быстрый старт
//!
//! ```no_run
//! use comtrade_core::{parse_header, read_comtrade, LazyRecord};
//!
//! // Только заголовок
//! let header = parse_header("fault.cfg")?;
//! println!("{}: {} каналов", header.station_name, header.analog_count());
//!
//! // Тело по требованию
//! let lazy = LazyRecord::open("fault.cfg")?;
//! let record = lazy.ensure_body_loaded()?;
//! println!("IA max = {}", record.analog[0].sample_max);
//!
//! // Всё сразу
//! let record = read_comtrade("fault.cfg")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod ascii;
pub mod binary;
pub mod body;
pub mod config;
pub mod encoding;
pub mod header;
pub mod inference;
pub mod lazy;
pub mod timestamp;

use std::path::Path;

pub use body::{decode_body, decode_body_from};
pub use comtrade_types::*;
pub use config::*;
pub use encoding::{decode_text, detect_encoding, detect_file_encoding};
pub use header::{parse_header, parse_header_str, parse_header_with};
pub use lazy::{ensure_body_loaded, LazyRecord};

/// Версия библиотеки.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Читает заголовок и тело записи.
pub fn read_comtrade<P: AsRef<Path>>(path: P) -> ComtradeResult<Record> {
    read_comtrade_with(path, &ReaderConfig::default())
}

/// Как [`read_comtrade`] с заданной конфигурацией.
///
/// Массивы выборок при разборе заголовка не выделяются: декодер собирает
/// тело отдельно и затем устанавливает его в запись.
pub fn read_comtrade_with<P: AsRef<Path>>(
    path: P,
    config: &ReaderConfig,
) -> ComtradeResult<Record> {
    let mut record = parse_header_with(path, &config.header_only())?;
    decode_body(&mut record, config, None)?;

    Ok(record)
}
