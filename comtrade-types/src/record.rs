use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::{
    AnalogChannel, DataFileType, DecodeError, DigitalChannel, LeapSecond, Revision, TextEncoding,
    TimeOffset,
};

/// Участок записи с постоянной частотой дискретизации.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplingSegment {
    /// Частота дискретизации, Гц
    pub rate: f64,
    /// Номер последней выборки участка
    pub end_sample: usize,
}

/// Запись COMTRADE: описание из CFG и (после загрузки) данные из DAT.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Путь к CFG файлу (пустой, если заголовок разобран из строки)
    pub cfg_path: PathBuf,
    pub station_name: String,
    pub recording_device_id: String,
    pub revision: Revision,
    /// Частота сети, Гц
    pub line_frequency: u32,
    /// Максимальная частота дискретизации среди участков
    pub sampling_rate: f64,
    /// Общее число выборок (максимальный `end_sample`)
    pub total_samples: usize,
    pub segments: Vec<SamplingSegment>,
    /// Время срабатывания (первая строка дат в CFG)
    pub trigger_time: NaiveDateTime,
    /// Время начала записи
    pub start_time: NaiveDateTime,
    /// `None`, если токен типа файла не распознан
    pub data_file_type: Option<DataFileType>,
    /// Токен типа файла как он записан в CFG
    pub data_file_token: String,
    pub encoding: TextEncoding,
    /// Множитель меток времени DAT (2013)
    pub time_multiplier: f64,
    /// Смещение меток времени относительно UTC (2013)
    pub time_code: TimeOffset,
    /// Смещение местного времени относительно меток (2013)
    pub local_code: TimeOffset,
    pub leap_second: LeapSecond,
    pub leap_second_quality: bool,
    pub analog: Vec<AnalogChannel>,
    pub digital: Vec<DigitalChannel>,
    #[serde(skip)]
    body_loaded: bool,
}

/// Декодированные значения одного аналогового канала.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalogSamples {
    pub values: Vec<f64>,
    pub min: f64,
    pub max: f64,
}

/// Полностью декодированное тело записи, готовое к установке в [`Record`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBody {
    pub analog: Vec<AnalogSamples>,
    pub digital: Vec<Vec<u8>>,
}

impl AnalogSamples {
    pub fn with_capacity(capacity: usize) -> Self {
        AnalogSamples {
            values: Vec::with_capacity(capacity),
            min: 0.0,
            max: 0.0,
        }
    }

    /// Добавляет значение, обновляя текущие минимум и максимум.
    #[inline]
    pub fn push(
        &mut self,
        value: f64,
    ) {
        if self.values.is_empty() {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.values.push(value);
    }
}

impl RecordBody {
    pub fn with_capacity(
        analog_count: usize,
        digital_count: usize,
        samples: usize,
    ) -> Self {
        RecordBody {
            analog: (0..analog_count)
                .map(|_| AnalogSamples::with_capacity(samples))
                .collect(),
            digital: (0..digital_count)
                .map(|_| Vec::with_capacity(samples))
                .collect(),
        }
    }
}

impl Record {
    pub fn new(cfg_path: impl Into<PathBuf>) -> Self {
        Record {
            cfg_path: cfg_path.into(),
            station_name: String::new(),
            recording_device_id: String::new(),
            revision: Revision::default(),
            line_frequency: 50,
            sampling_rate: 0.0,
            total_samples: 0,
            segments: Vec::new(),
            trigger_time: NaiveDateTime::default(),
            start_time: NaiveDateTime::default(),
            data_file_type: None,
            data_file_token: String::new(),
            encoding: TextEncoding::default(),
            time_multiplier: 1.0,
            time_code: TimeOffset::ZERO,
            local_code: TimeOffset::ZERO,
            leap_second: LeapSecond::None,
            leap_second_quality: false,
            analog: Vec::new(),
            digital: Vec::new(),
            body_loaded: false,
        }
    }

    pub fn analog_count(&self) -> usize {
        self.analog.len()
    }

    pub fn digital_count(&self) -> usize {
        self.digital.len()
    }

    pub fn is_body_loaded(&self) -> bool {
        self.body_loaded
    }

    /// Путь к DAT файлу: расширение CFG заменяется на `dat` (`DAT`, если
    /// расширение CFG записано заглавными буквами).
    pub fn dat_path(&self) -> PathBuf {
        dat_path_for(&self.cfg_path)
    }

    /// Выделяет (обнулённые) массивы выборок длиной `total_samples`.
    pub fn allocate_samples(&mut self) {
        let n = self.total_samples;

        for ch in &mut self.analog {
            ch.samples = vec![0.0; n];
        }
        for ch in &mut self.digital {
            ch.samples = vec![0; n];
        }
    }

    /// Устанавливает декодированное тело. Единственное место, где запись
    /// переходит в состояние "данные загружены".
    ///
    /// Размеры проверяются до изменения записи: при ошибке запись остаётся
    /// нетронутой.
    pub fn install_body(
        &mut self,
        body: RecordBody,
    ) -> Result<(), DecodeError> {
        if body.analog.len() != self.analog.len() || body.digital.len() != self.digital.len() {
            return Err(DecodeError::body_mismatch(format!(
                "channels: body {}A/{}D, record {}A/{}D",
                body.analog.len(),
                body.digital.len(),
                self.analog.len(),
                self.digital.len(),
            )));
        }

        let n = self.total_samples;
        let analog_ok = body.analog.iter().all(|s| s.values.len() == n);
        let digital_ok = body.digital.iter().all(|s| s.len() == n);

        if !analog_ok || !digital_ok {
            return Err(DecodeError::body_mismatch(format!(
                "every channel must hold {n} samples"
            )));
        }

        for (ch, samples) in self.analog.iter_mut().zip(body.analog) {
            ch.samples = samples.values;
            ch.sample_min = samples.min;
            ch.sample_max = samples.max;
        }
        for (ch, samples) in self.digital.iter_mut().zip(body.digital) {
            ch.samples = samples;
        }
        self.body_loaded = true;

        Ok(())
    }

    /// Ось времени в миллисекундах для каждой выборки.
    ///
    /// Для нескольких участков время накапливается шагом `1000 / rate`
    /// текущего участка. Участки с нулевой частотой времени не добавляют.
    pub fn sample_times_ms(&self) -> Vec<f64> {
        let n = self.total_samples;

        if self.segments.len() <= 1 {
            if self.sampling_rate <= 0.0 {
                return vec![0.0; n];
            }
            return (0..n)
                .map(|i| 1000.0 * i as f64 / self.sampling_rate)
                .collect();
        }

        let mut times = vec![0.0; n];
        let mut t = 0.0;
        let mut start = 0;

        for seg in &self.segments {
            let end = seg.end_sample.min(n);
            let step = if seg.rate > 0.0 { 1000.0 / seg.rate } else { 0.0 };

            for (k, slot) in times.iter_mut().enumerate().take(end).skip(start) {
                t = if k > 0 { t + step } else { 0.0 };
                *slot = t;
            }
            start = start.max(end);
        }

        times
    }

    /// Номер выборки для момента времени `ms` (миллисекунды от начала).
    ///
    /// Результат ограничен диапазоном `[0, total_samples - 1]`.
    pub fn sample_index_at(
        &self,
        ms: f64,
    ) -> usize {
        let last = self.total_samples.saturating_sub(1);

        if self.segments.len() <= 1 {
            let idx = (ms * self.sampling_rate / 1000.0).round();
            if idx <= 0.0 || idx.is_nan() {
                return 0;
            }
            return (idx as usize).min(last);
        }

        self.sample_times_ms()
            .iter()
            .position(|&t| t >= ms)
            .unwrap_or(last)
    }
}

/// Путь к DAT файлу для заданного CFG.
pub fn dat_path_for(cfg_path: &Path) -> PathBuf {
    let upper = cfg_path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_uppercase()));

    cfg_path.with_extension(if upper { "DAT" } else { "dat" })
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
