use comtrade_types::TextEncoding;

/// Размер префикса CFG, по которому определяется кодировка.
pub const DEFAULT_SNIFF_LEN: usize = 4096;

/// Как часто (в строках DAT) проверяется флаг отмены.
pub const DEFAULT_CANCEL_CHECK_ROWS: usize = 1024;

/// Параметры чтения CFG/DAT пары.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderConfig {
    /// Принудительная кодировка CFG (None = автоопределение)
    pub encoding: Option<TextEncoding>,
    /// Сколько байт CFG анализировать при автоопределении кодировки
    pub sniff_len: usize,
    /// Выделять массивы выборок при разборе заголовка
    pub allocate_samples: bool,
    /// Период опроса флага отмены при декодировании (строк)
    pub cancel_check_rows: usize,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl ReaderConfig {
    /// Конфигурация для отложенной загрузки: массивы выборок не выделяются
    /// до первого обращения к данным.
    pub fn lazy() -> Self {
        Self {
            allocate_samples: false,
            ..Self::default()
        }
    }

    /// Та же конфигурация без выделения массивов при разборе заголовка.
    /// Используется, когда тело декодируется сразу следом.
    pub fn header_only(&self) -> Self {
        Self {
            allocate_samples: false,
            ..self.clone()
        }
    }

    pub fn with_encoding(
        mut self,
        encoding: TextEncoding,
    ) -> Self {
        self.encoding = Some(encoding);
        self
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для ReaderConfig
////////////////////////////////////////////////////////////////////////////////

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            encoding: None,
            sniff_len: DEFAULT_SNIFF_LEN,
            allocate_samples: true,
            cancel_check_rows: DEFAULT_CANCEL_CHECK_ROWS,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
