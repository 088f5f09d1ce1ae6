//! Декодирование DAT файла в выборки каналов.

use std::{
    fs::File,
    io::Read,
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};

use comtrade_types::{DataFileType, DecodeError, Record, RecordBody};
use log::{debug, info};

use crate::{
    ascii::decode_ascii_rows,
    binary::decode_binary_rows,
    config::ReaderConfig,
};

/// Проверка флага отмены раз в `every` строк.
#[inline]
pub(crate) fn check_cancel(
    cancel: Option<&AtomicBool>,
    row: usize,
    every: usize,
) -> Result<(), DecodeError> {
    match cancel {
        Some(flag) if row % every.max(1) == 0 && flag.load(Ordering::Relaxed) => {
            Err(DecodeError::Cancelled)
        }
        _ => Ok(()),
    }
}

fn file_type_of(record: &Record) -> Result<DataFileType, DecodeError> {
    record
        .data_file_type
        .ok_or_else(|| DecodeError::UnsupportedFileType(record.data_file_token.clone()))
}

/// Загружает тело записи из DAT файла рядом с CFG.
///
/// Повторный вызов для уже загруженной записи ничего не читает. При ошибке
/// запись не изменяется.
pub fn decode_body(
    record: &mut Record,
    config: &ReaderConfig,
    cancel: Option<&AtomicBool>,
) -> Result<(), DecodeError> {
    if record.is_body_loaded() {
        debug!("{}: body already loaded", record.cfg_path.display());
        return Ok(());
    }

    let file_type = file_type_of(record)?;
    let path = record.dat_path();
    let file = File::open(&path)?;

    // Длина бинарного файла известна заранее
    if let Some(row_size) = file_type.row_size(record.analog_count(), record.digital_count()) {
        let len = file.metadata()?.len() as usize;
        let complete_rows = len / row_size;

        if complete_rows < record.total_samples {
            return Err(DecodeError::Truncated {
                path,
                sample: complete_rows,
                total: record.total_samples,
            });
        }
    }

    decode_body_from(record, file, &path, config, cancel)
}

/// Загружает тело записи из произвольного источника.
///
/// `source` используется только в сообщениях об ошибках.
pub fn decode_body_from<R: Read>(
    record: &mut Record,
    reader: R,
    source: &Path,
    config: &ReaderConfig,
    cancel: Option<&AtomicBool>,
) -> Result<(), DecodeError> {
    if record.is_body_loaded() {
        return Ok(());
    }

    let file_type = file_type_of(record)?;
    let body = decode_record_body(record, reader, source, file_type, config, cancel)?;
    record.install_body(body)?;

    info!(
        "{}: decoded {} samples ({}), {}A/{}D",
        source.display(),
        record.total_samples,
        file_type,
        record.analog_count(),
        record.digital_count()
    );

    Ok(())
}

/// Выбор декодера по типу файла данных.
pub fn decode_record_body<R: Read>(
    record: &Record,
    reader: R,
    source: &Path,
    file_type: DataFileType,
    config: &ReaderConfig,
    cancel: Option<&AtomicBool>,
) -> Result<RecordBody, DecodeError> {
    match file_type {
        DataFileType::Ascii => decode_ascii_rows(reader, record, source, config, cancel),
        _ => decode_binary_rows(reader, record, file_type, source, config, cancel),
    }
}
