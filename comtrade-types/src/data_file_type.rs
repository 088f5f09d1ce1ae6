use serde::Serialize;

/// Размер полей номера выборки и метки времени в строке бинарного DAT.
pub const ROW_PREFIX_SIZE: usize = 8;

/// Число дискретных каналов, упакованных в одно 16-битное слово.
pub const DIGITAL_WORD_BITS: usize = 16;

/// Формат файла данных (поле `ft` CFG файла)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DataFileType {
    /// Текстовые строки, значения через запятую
    Ascii,
    /// Аналоговые значения — i16, little-endian
    Binary,
    /// Аналоговые значения — i32, little-endian
    Binary32,
    /// Аналоговые значения — IEEE-754 f32, масштаб не применяется
    Float32,
}

impl DataFileType {
    /// Разбирает токен типа файла (регистронезависимо).
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "ASCII" => Some(DataFileType::Ascii),
            "BINARY" => Some(DataFileType::Binary),
            "BINARY32" => Some(DataFileType::Binary32),
            "FLOAT32" => Some(DataFileType::Float32),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataFileType::Ascii => "ASCII",
            DataFileType::Binary => "BINARY",
            DataFileType::Binary32 => "BINARY32",
            DataFileType::Float32 => "FLOAT32",
        }
    }

    /// Размер одного аналогового значения в байтах (`None` для ASCII).
    pub fn analog_size(&self) -> Option<usize> {
        match self {
            DataFileType::Ascii => None,
            DataFileType::Binary => Some(2),
            DataFileType::Binary32 | DataFileType::Float32 => Some(4),
        }
    }

    /// Применяются ли коэффициенты `a`, `b` к хранимым значениям.
    pub fn is_scaled(&self) -> bool {
        !matches!(self, DataFileType::Float32)
    }

    /// Размер одной строки бинарного DAT в байтах.
    pub fn row_size(
        &self,
        analog_count: usize,
        digital_count: usize,
    ) -> Option<usize> {
        self.analog_size().map(|size| {
            ROW_PREFIX_SIZE + analog_count * size + digital_word_count(digital_count) * 2
        })
    }
}

/// Количество 16-битных слов для `digital_count` дискретных каналов.
pub fn digital_word_count(digital_count: usize) -> usize {
    digital_count.div_ceil(DIGITAL_WORD_BITS)
}

impl std::fmt::Display for DataFileType {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
