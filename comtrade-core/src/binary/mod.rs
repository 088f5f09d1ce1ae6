//! Бинарные DAT файлы (BINARY, BINARY32, FLOAT32).
//!
//! Строка файла:
//!
//! ```text
//! u32 sample | u32 timestamp | analog × (i16 | i32 | f32) | u16 × ceil(D/16)
//! ```
//!
//! Все поля little-endian.

pub mod read;

pub use read::*;

use comtrade_types::DataFileType;

/// Представление аналогового значения в строке бинарного DAT.
///
/// Размеры полей и масштабирование определяет [`DataFileType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalogWidth {
    /// BINARY
    I16,
    /// BINARY32
    I32,
    /// FLOAT32, значения хранятся без масштабирования
    F32,
}

impl AnalogWidth {
    /// `None` для ASCII.
    pub fn for_file_type(file_type: DataFileType) -> Option<Self> {
        match file_type {
            DataFileType::Ascii => None,
            DataFileType::Binary => Some(AnalogWidth::I16),
            DataFileType::Binary32 => Some(AnalogWidth::I32),
            DataFileType::Float32 => Some(AnalogWidth::F32),
        }
    }
}
