//! Отложенная загрузка тела записи.
//!
//! [`LazyRecord`] разбирает только CFG; DAT читается при первом вызове
//! [`LazyRecord::ensure_body_loaded`]. Одновременные вызовы из нескольких
//! потоков приводят ровно к одному декодированию: остальные ждут на общем
//! мьютексе и после его захвата видят уже загруженную запись. Ошибка или
//! отмена оставляет запись незагруженной, вызов можно повторить.

use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex, OnceLock, PoisonError,
    },
};

use comtrade_types::{DecodeError, ParseError, Record};
use log::debug;

use crate::{body::decode_body, config::ReaderConfig, header::parse_header_with};

/// Запись COMTRADE с телом, загружаемым по требованию.
#[derive(Debug)]
pub struct LazyRecord {
    /// Заголовок без выборок
    header: Record,
    config: ReaderConfig,
    /// Полная запись после успешной загрузки
    loaded: OnceLock<Record>,
    /// Не более одного декодирования одновременно
    gate: Mutex<()>,
    /// Сколько раз реально запускалось декодирование
    decodes: AtomicUsize,
}

impl LazyRecord {
    /// Разбирает CFG, не выделяя массивы выборок.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        Self::open_with(path, ReaderConfig::lazy())
    }

    pub fn open_with<P: AsRef<Path>>(
        path: P,
        config: ReaderConfig,
    ) -> Result<Self, ParseError> {
        let header = parse_header_with(path, &config.header_only())?;

        Ok(Self::from_header(header, config))
    }

    /// Оборачивает уже разобранный заголовок.
    pub fn from_header(
        header: Record,
        config: ReaderConfig,
    ) -> Self {
        Self {
            header,
            config,
            loaded: OnceLock::new(),
            gate: Mutex::new(()),
            decodes: AtomicUsize::new(0),
        }
    }

    pub fn header(&self) -> &Record {
        &self.header
    }

    /// Загруженная запись, либо заголовок, если тело ещё не читалось.
    pub fn record(&self) -> &Record {
        self.loaded.get().unwrap_or(&self.header)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    pub fn decode_count(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }

    /// Загружает тело, если оно ещё не загружено. Идемпотентно.
    pub fn ensure_body_loaded(&self) -> Result<&Record, DecodeError> {
        self.ensure_body_loaded_with(None)
    }

    /// Как [`ensure_body_loaded`](Self::ensure_body_loaded), с флагом
    /// отмены. После отмены запись остаётся незагруженной.
    pub fn ensure_body_loaded_with(
        &self,
        cancel: Option<&AtomicBool>,
    ) -> Result<&Record, DecodeError> {
        if let Some(record) = self.loaded.get() {
            return Ok(record);
        }

        // Мьютекс не охраняет данных, отравление можно игнорировать
        let _guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(record) = self.loaded.get() {
            debug!("{}: body loaded by another caller", self.header.cfg_path.display());
            return Ok(record);
        }

        let mut record = self.header.clone();
        self.decodes.fetch_add(1, Ordering::SeqCst);
        decode_body(&mut record, &self.config, cancel)?;

        Ok(self.loaded.get_or_init(|| record))
    }

    /// Забирает запись (загруженную или только заголовок).
    pub fn into_record(self) -> Record {
        match self.loaded.into_inner() {
            Some(record) => record,
            None => self.header,
        }
    }
}

/// Свободная форма [`LazyRecord::ensure_body_loaded`].
pub fn ensure_body_loaded(lazy: &LazyRecord) -> Result<&Record, DecodeError> {
    lazy.ensure_body_loaded()
}

#[cfg(test)]
mod tests {
    use std::{fs, thread};

    use tempfile::tempdir;

    use super::*;

    const CFG: &str = "S,D,1999\n2,1A,1D\n1,IA,,,A,1,0,0,0,1\n1,TRIP,,,0\n50\n1\n1000,3\n\n\nASCII\n";
    const DAT: &str = "1,0,5,0\n2,1,6,1\n3,2,7,0\n";

    fn write_pair(dir: &Path) -> std::path::PathBuf {
        let cfg = dir.join("rec.cfg");
        fs::write(&cfg, CFG).unwrap();
        fs::write(dir.join("rec.dat"), DAT).unwrap();
        cfg
    }

    #[test]
    fn test_open_is_header_only() {
        let dir = tempdir().unwrap();
        let lazy = LazyRecord::open(write_pair(dir.path())).unwrap();

        assert!(!lazy.is_loaded());
        assert_eq!(lazy.decode_count(), 0);
        assert!(lazy.record().analog[0].samples.is_empty());
        assert_eq!(lazy.record().total_samples, 3);
    }

    #[test]
    fn test_second_load_does_not_reread() {
        let dir = tempdir().unwrap();
        let cfg = write_pair(dir.path());
        let lazy = LazyRecord::open(&cfg).unwrap();

        let first = lazy.ensure_body_loaded().unwrap().analog[0].samples.clone();
        fs::remove_file(dir.path().join("rec.dat")).unwrap();
        let second = ensure_body_loaded(&lazy).unwrap().analog[0].samples.clone();

        assert_eq!(first, vec![5.0, 6.0, 7.0]);
        assert_eq!(first, second);
        assert_eq!(lazy.decode_count(), 1);
    }

    #[test]
    fn test_concurrent_callers_decode_once() {
        let dir = tempdir().unwrap();
        let lazy = LazyRecord::open(write_pair(dir.path())).unwrap();

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let record = lazy.ensure_body_loaded().unwrap();
                    assert_eq!(record.digital[0].samples, vec![0, 1, 0]);
                });
            }
        });

        assert_eq!(lazy.decode_count(), 1);
        assert!(lazy.is_loaded());
    }

    #[test]
    fn test_cancel_then_retry() {
        let dir = tempdir().unwrap();
        let lazy = LazyRecord::open(write_pair(dir.path())).unwrap();
        let cancel = AtomicBool::new(true);

        let err = lazy.ensure_body_loaded_with(Some(&cancel)).unwrap_err();
        assert!(matches!(err, DecodeError::Cancelled));
        assert!(!lazy.is_loaded());

        cancel.store(false, Ordering::Relaxed);
        let record = lazy.ensure_body_loaded_with(Some(&cancel)).unwrap();

        assert!(record.is_body_loaded());
        assert_eq!(lazy.decode_count(), 2);
    }

    #[test]
    fn test_failed_load_is_retryable() {
        let dir = tempdir().unwrap();
        let cfg = dir.path().join("rec.cfg");
        fs::write(&cfg, CFG).unwrap();

        let lazy = LazyRecord::open(&cfg).unwrap();
        assert!(matches!(lazy.ensure_body_loaded(), Err(DecodeError::Io(_))));

        fs::write(dir.path().join("rec.dat"), DAT).unwrap();
        assert!(lazy.ensure_body_loaded().is_ok());

        let record = lazy.into_record();
        assert!(record.is_body_loaded());
    }
}
