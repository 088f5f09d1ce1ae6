//! Определение кодировки CFG файла.
//!
//! Порядок проверок:
//! 1. BOM UTF-8 (`EF BB BF`), UTF-16LE (`FF FE`), UTF-16BE (`FE FF`);
//! 2. строгая проверка UTF-8 (чистый ASCII тоже проходит);
//! 3. иначе — GBK, типичная кодировка старых китайских регистраторов.
//!
//! Детектор никогда не возвращает ошибку: неоднозначность разрешается в
//! пользу наиболее вероятной кодировки.

use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};

use comtrade_types::TextEncoding;
use log::{debug, warn};

const BOM_UTF8: [u8; 3] = [0xEF, 0xBB, 0xBF];
const BOM_UTF16_LE: [u8; 2] = [0xFF, 0xFE];
const BOM_UTF16_BE: [u8; 2] = [0xFE, 0xFF];

/// Определяет кодировку по байтам CFG файла (целиком или префиксу).
pub fn detect_encoding(bytes: &[u8]) -> TextEncoding {
    if bytes.len() < 2 {
        return TextEncoding::Utf8;
    }

    if bytes.starts_with(&BOM_UTF8) {
        return TextEncoding::Utf8;
    }
    if bytes.starts_with(&BOM_UTF16_LE) {
        return TextEncoding::Utf16Le;
    }
    if bytes.starts_with(&BOM_UTF16_BE) {
        return TextEncoding::Utf16Be;
    }

    if is_valid_utf8_prefix(bytes) {
        TextEncoding::Utf8
    } else {
        TextEncoding::Gbk
    }
}

/// Строгая проверка UTF-8. Последовательность, обрезанная концом буфера,
/// считается допустимой: детектору обычно передаётся префикс файла.
fn is_valid_utf8_prefix(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}

/// Кодировка `encoding_rs`, соответствующая [`TextEncoding`].
pub fn encoding_for(encoding: TextEncoding) -> &'static encoding_rs::Encoding {
    match encoding {
        TextEncoding::Utf8 => encoding_rs::UTF_8,
        TextEncoding::Utf16Le => encoding_rs::UTF_16LE,
        TextEncoding::Utf16Be => encoding_rs::UTF_16BE,
        TextEncoding::Gbk => encoding_rs::GBK,
    }
}

/// Декодирует текст CFG, удаляя BOM.
///
/// Недопустимые последовательности заменяются на U+FFFD с предупреждением в
/// лог.
pub fn decode_text(
    bytes: &[u8],
    encoding: TextEncoding,
) -> String {
    let (text, used, had_errors) = encoding_for(encoding).decode(bytes);

    if had_errors {
        warn!(
            "CFG text is not valid {}: malformed sequences replaced",
            used.name()
        );
    }

    text.into_owned()
}

/// Читает до `sniff_len` байт файла и определяет кодировку.
pub fn detect_file_encoding(
    path: &Path,
    sniff_len: usize,
) -> io::Result<TextEncoding> {
    let mut buf = Vec::with_capacity(sniff_len);
    File::open(path)?
        .take(sniff_len as u64)
        .read_to_end(&mut buf)?;

    let encoding = detect_encoding(&buf);
    debug!("{}: detected {encoding} from {} bytes", path.display(), buf.len());

    Ok(encoding)
}
