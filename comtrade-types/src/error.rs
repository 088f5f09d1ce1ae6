use std::path::PathBuf;

use thiserror::Error;

/// Результат для операций чтения COMTRADE (заголовок + данные).
pub type ComtradeResult<T> = std::result::Result<T, ComtradeError>;

/// Ошибки разбора CFG файла.
///
/// Всегда фатальны для заголовка конкретного файла; повторный разбор не
/// выполняется.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Ошибки ввода/вывода при чтении CFG
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Файл закончился раньше, чем ожидалось
    #[error("CFG line {line}: missing {expected}")]
    MissingLine { line: usize, expected: String },

    /// В строке меньше полей, чем требует формат
    #[error("CFG line {line}: expected at least {expected} fields, found {found}")]
    ShortLine {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// Нечисловое значение в числовом поле
    #[error("CFG line {line}: invalid {field} '{value}'")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },

    /// Строка с количеством каналов не содержит `NNA`/`NND`
    #[error("CFG line {line}: invalid channel counts: {reason}")]
    InvalidChannelCounts { line: usize, reason: String },

    /// Общее число каналов не равно сумме аналоговых и дискретных
    #[error("channel count mismatch: total={total}, analog={analog}, digital={digital}")]
    ChannelCountMismatch {
        total: usize,
        analog: usize,
        digital: usize,
    },
}

/// Ошибки декодирования DAT файла.
///
/// Фатальны для тела конкретного файла, но никогда не изменяют уже
/// загруженную запись.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Ошибки ввода/вывода при чтении DAT
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Файл короче, чем следует из заголовка
    #[error("{}: truncated data at sample {sample} of {total}", path.display())]
    Truncated {
        path: PathBuf,
        sample: usize,
        total: usize,
    },

    /// Нечисловой токен в ASCII файле
    #[error("{}:{line}: malformed sample value '{token}'", path.display())]
    MalformedSample {
        path: PathBuf,
        line: usize,
        token: String,
    },

    /// В строке ASCII файла не хватает значений каналов
    #[error("{}:{line}: expected {expected} values, found {found}", path.display())]
    ShortRow {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    /// Неизвестный тип файла данных в CFG
    #[error("unsupported data file type: '{0}'")]
    UnsupportedFileType(String),

    /// Декодированное тело не соответствует описанию каналов
    #[error("decoded body does not match record: {0}")]
    BodyMismatch(String),

    /// Декодирование прервано флагом отмены
    #[error("decode cancelled")]
    Cancelled,
}

/// Общая ошибка чтения записи COMTRADE.
#[derive(Debug, Error)]
pub enum ComtradeError {
    #[error("CFG error: {0}")]
    Parse(#[from] ParseError),

    #[error("DAT error: {0}")]
    Decode(#[from] DecodeError),
}

impl ParseError {
    /// Удобные конструкторы
    pub fn missing<S: Into<String>>(
        line: usize,
        expected: S,
    ) -> Self {
        Self::MissingLine {
            line,
            expected: expected.into(),
        }
    }

    pub fn invalid_number<S: Into<String>>(
        line: usize,
        field: &'static str,
        value: S,
    ) -> Self {
        Self::InvalidNumber {
            line,
            field,
            value: value.into(),
        }
    }
}

impl DecodeError {
    pub fn body_mismatch<S: Into<String>>(s: S) -> Self {
        Self::BodyMismatch(s.into())
    }
}
