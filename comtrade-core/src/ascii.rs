//! ASCII DAT файлы: одна выборка на строку,
//! `n,timestamp,A1..Ak,D1..Dm`.
//!
//! Разделители — запятая, пробел и табуляция; подряд идущие разделители
//! считаются одним. Пустые строки пропускаются.

use std::{
    io::{BufRead, BufReader, Read},
    path::Path,
    sync::atomic::AtomicBool,
};

use comtrade_types::{DecodeError, Record, RecordBody};

use crate::{body::check_cancel, config::ReaderConfig};

/// Номер выборки и метка времени перед значениями каналов.
const ASCII_PREFIX_TOKENS: usize = 2;

fn is_separator(c: char) -> bool {
    matches!(c, ',' | ' ' | '\t')
}

/// Токены строки ASCII DAT.
pub fn split_tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split(is_separator).filter(|t| !t.is_empty())
}

/// Декодирует `total_samples` непустых строк ASCII DAT.
///
/// Аналоговые значения масштабируются `raw * a + b`, дискретные
/// приводятся к 0/1.
pub fn decode_ascii_rows<R: Read>(
    reader: R,
    record: &Record,
    source: &Path,
    config: &ReaderConfig,
    cancel: Option<&AtomicBool>,
) -> Result<RecordBody, DecodeError> {
    let total = record.total_samples;
    let expected = ASCII_PREFIX_TOKENS + record.analog_count() + record.digital_count();

    let mut reader = BufReader::new(reader);
    let mut body = RecordBody::with_capacity(record.analog_count(), record.digital_count(), total);
    let mut line = String::new();
    let mut line_no = 0usize;

    let mut sample = 0;
    while sample < total {
        check_cancel(cancel, sample, config.cancel_check_rows)?;

        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(DecodeError::Truncated {
                path: source.to_path_buf(),
                sample,
                total,
            });
        }
        line_no += 1;

        let tokens: Vec<&str> = split_tokens(line.trim_end()).collect();
        if tokens.is_empty() {
            continue;
        }
        if tokens.len() < expected {
            return Err(DecodeError::ShortRow {
                path: source.to_path_buf(),
                line: line_no,
                expected,
                found: tokens.len(),
            });
        }

        let malformed = |token: &str| DecodeError::MalformedSample {
            path: source.to_path_buf(),
            line: line_no,
            token: token.to_string(),
        };

        let (analog_tokens, digital_tokens) =
            tokens[ASCII_PREFIX_TOKENS..].split_at(record.analog_count());

        for ((ch, samples), token) in record
            .analog
            .iter()
            .zip(&mut body.analog)
            .zip(analog_tokens)
        {
            let raw: f64 = token.parse().map_err(|_| malformed(*token))?;
            samples.push(ch.scale(raw));
        }

        for (samples, token) in body.digital.iter_mut().zip(digital_tokens) {
            let state: i64 = token.parse().map_err(|_| malformed(*token))?;
            samples.push(u8::from(state != 0));
        }

        sample += 1;
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use comtrade_types::{AnalogChannel, DigitalChannel};

    use super::*;

    fn record(total: usize) -> Record {
        let mut r = Record::new("rec.cfg");
        r.total_samples = total;

        let mut ia = AnalogChannel::new(1, "IA");
        ia.multiplier = 0.1;
        ia.offset = 2.0;
        r.analog.push(ia);
        r.analog.push(AnalogChannel::new(2, "UA"));
        r.digital.push(DigitalChannel::new(1, "TRIP"));
        r
    }

    fn decode(
        text: &str,
        total: usize,
    ) -> Result<RecordBody, DecodeError> {
        decode_ascii_rows(
            Cursor::new(text.as_bytes().to_vec()),
            &record(total),
            Path::new("rec.dat"),
            &ReaderConfig::default(),
            None,
        )
    }

    #[test]
    fn test_split_tokens_collapses_separators() {
        let tokens: Vec<_> = split_tokens("1, 0,\t10 ,, -5   1").collect();
        assert_eq!(tokens, vec!["1", "0", "10", "-5", "1"]);
    }

    #[test]
    fn test_decode_scaled_values() {
        let body = decode("1,0,10,-5,0\r\n2,1000,20,7,1\r\n", 2).unwrap();

        assert_eq!(body.analog[0].values, vec![3.0, 4.0]);
        assert_eq!(body.analog[1].values, vec![-5.0, 7.0]);
        assert_eq!(body.analog[1].min, -5.0);
        assert_eq!(body.digital[0], vec![0, 1]);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let body = decode("\n1,0,0,0,0\n\n   \n2,1,0,0,5\n", 2).unwrap();

        // Ненулевое дискретное значение → 1
        assert_eq!(body.digital[0], vec![0, 1]);
    }

    #[test]
    fn test_malformed_token_names_line() {
        let err = decode("1,0,0,0,0\n2,1,1.2.3,0,0\n", 2).unwrap_err();

        match err {
            DecodeError::MalformedSample { path, line, token } => {
                assert_eq!(path, Path::new("rec.dat"));
                assert_eq!(line, 2);
                assert_eq!(token, "1.2.3");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_row() {
        let err = decode("1,0,10\n", 1).unwrap_err();

        assert!(matches!(
            err,
            DecodeError::ShortRow {
                line: 1,
                expected: 5,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_too_few_lines_is_truncated() {
        let err = decode("1,0,0,0,0\n", 3).unwrap_err();

        assert!(matches!(
            err,
            DecodeError::Truncated {
                sample: 1,
                total: 3,
                ..
            }
        ));
    }
}
