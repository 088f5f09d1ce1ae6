use serde::Serialize;

/// Кодировка текста CFG файла.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum TextEncoding {
    /// UTF-8 (с BOM или без), в том числе чистый ASCII
    #[default]
    Utf8,
    /// UTF-16 little-endian (BOM `FF FE`)
    Utf16Le,
    /// UTF-16 big-endian (BOM `FE FF`)
    Utf16Be,
    /// GBK — устаревшая двухбайтовая кодовая страница для китайского текста
    Gbk,
}

impl TextEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Utf16Le => "UTF-16LE",
            TextEncoding::Utf16Be => "UTF-16BE",
            TextEncoding::Gbk => "GBK",
        }
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
