use std::{
    io::{BufReader, ErrorKind, Read},
    path::Path,
    sync::atomic::AtomicBool,
};

use byteorder::{ByteOrder, LittleEndian};
use comtrade_types::{
    digital_word_count, DataFileType, DecodeError, Record, RecordBody, DIGITAL_WORD_BITS,
    ROW_PREFIX_SIZE,
};

use super::AnalogWidth;
use crate::{body::check_cancel, config::ReaderConfig};

pub fn read_u16_le(
    buf: &[u8],
    off: &mut usize,
) -> u16 {
    let v = LittleEndian::read_u16(&buf[*off..]);
    *off += 2;
    v
}

pub fn read_u32_le(
    buf: &[u8],
    off: &mut usize,
) -> u32 {
    let v = LittleEndian::read_u32(&buf[*off..]);
    *off += 4;
    v
}

/// Читает одно аналоговое значение (без масштабирования).
pub fn read_analog(
    buf: &[u8],
    off: &mut usize,
    width: AnalogWidth,
) -> f64 {
    let (v, len) = match width {
        AnalogWidth::I16 => (LittleEndian::read_i16(&buf[*off..]) as f64, 2),
        AnalogWidth::I32 => (LittleEndian::read_i32(&buf[*off..]) as f64, 4),
        AnalogWidth::F32 => (LittleEndian::read_f32(&buf[*off..]) as f64, 4),
    };
    *off += len;
    v
}

/// Состояние дискретного канала `channel` (с 0) в словах строки.
///
/// Биты идут от младшего: канал 0 — бит 0 первого слова, канал 16 — бит 0
/// второго.
#[inline]
pub fn digital_bit(
    words: &[u16],
    channel: usize,
) -> u8 {
    let word = words[channel / DIGITAL_WORD_BITS];
    ((word >> (channel % DIGITAL_WORD_BITS)) & 1) as u8
}

/// Декодирует `total_samples` строк бинарного DAT.
///
/// Запись не изменяется: результат собирается в [`RecordBody`].
/// Нехватка байт в строке → [`DecodeError::Truncated`] с номером этой
/// строки (с 0). Для ASCII возвращает [`DecodeError::UnsupportedFileType`].
pub fn decode_binary_rows<R: Read>(
    reader: R,
    record: &Record,
    file_type: DataFileType,
    source: &Path,
    config: &ReaderConfig,
    cancel: Option<&AtomicBool>,
) -> Result<RecordBody, DecodeError> {
    let (width, row_len) = AnalogWidth::for_file_type(file_type)
        .zip(file_type.row_size(record.analog_count(), record.digital_count()))
        .ok_or_else(|| DecodeError::UnsupportedFileType(file_type.as_str().to_string()))?;
    let scaled = file_type.is_scaled();
    let total = record.total_samples;
    let words_per_row = digital_word_count(record.digital_count());

    let mut reader = BufReader::new(reader);
    let mut row = vec![0u8; row_len];
    let mut words = vec![0u16; words_per_row];
    let mut body = RecordBody::with_capacity(record.analog_count(), record.digital_count(), total);

    for sample in 0..total {
        check_cancel(cancel, sample, config.cancel_check_rows)?;

        if let Err(e) = reader.read_exact(&mut row) {
            return Err(match e.kind() {
                ErrorKind::UnexpectedEof => DecodeError::Truncated {
                    path: source.to_path_buf(),
                    sample,
                    total,
                },
                _ => e.into(),
            });
        }

        // Номер выборки и метка времени не используются
        let mut off = ROW_PREFIX_SIZE;

        for (ch, samples) in record.analog.iter().zip(&mut body.analog) {
            let raw = read_analog(&row, &mut off, width);
            samples.push(if scaled { ch.scale(raw) } else { raw });
        }

        for w in words.iter_mut() {
            *w = read_u16_le(&row, &mut off);
        }
        for (d, samples) in body.digital.iter_mut().enumerate() {
            samples.push(digital_bit(&words, d));
        }
    }

    Ok(body)
}
