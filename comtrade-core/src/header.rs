//! Разбор CFG файла COMTRADE.
//!
//! Грамматика построчная, порядок строк фиксирован:
//!
//! ```text
//! station_name,rec_dev_id[,rev_year]
//! TT,##A,##D
//! An,ch_id,ph,ccbm,uu,a,b,skew,min,max[,primary,secondary,PS]   × ##A
//! Dn,ch_id,ph,ccbm,y  |  Dn,ch_id,y                             × ##D
//! lf
//! nrates
//! samp,endsamp                                                  × nrates
//! dd/mm/yyyy,hh:mm:ss.ssssss                                    (trigger)
//! dd/mm/yyyy,hh:mm:ss.ssssss                                    (start)
//! ft
//! timemult                                                      (2013)
//! time_code,local_code                                          (2013)
//! tmq_code,leapsec                                              (2013)
//! ```

use std::{fs, path::Path, str::FromStr};

use comtrade_types::{
    AnalogChannel, DataFileType, DigitalChannel, LeapSecond, ParseError, Phase, Record, Revision,
    SamplingSegment, ScalingIdentifier, TextEncoding,
};
use log::{debug, info, warn};

use crate::{
    config::ReaderConfig,
    encoding::{decode_text, detect_encoding},
    inference::infer_phases_and_units,
    timestamp::{parse_time_offset, parse_timestamp_or_default, DateOrder},
};

/// Минимальное число полей в строке аналогового канала.
pub const ANALOG_MIN_FIELDS: usize = 10;

/// Число полей строки аналогового канала вместе с `primary,secondary,PS`.
pub const ANALOG_FULL_FIELDS: usize = 13;

/// Минимальное число полей в строке дискретного канала.
pub const DIGITAL_MIN_FIELDS: usize = 2;

/// Разбирает CFG файл с параметрами по умолчанию.
pub fn parse_header<P: AsRef<Path>>(path: P) -> Result<Record, ParseError> {
    parse_header_with(path, &ReaderConfig::default())
}

/// Разбирает CFG файл. Кодировка определяется автоматически, если не
/// задана в `config`.
pub fn parse_header_with<P: AsRef<Path>>(
    path: P,
    config: &ReaderConfig,
) -> Result<Record, ParseError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;

    let encoding = match config.encoding {
        Some(forced) => forced,
        None => detect_encoding(&bytes[..bytes.len().min(config.sniff_len)]),
    };
    debug!("{}: reading CFG as {encoding}", path.display());

    let text = decode_text(&bytes, encoding);
    let mut record = parse_cfg_text(&text, path)?;
    record.encoding = encoding;

    if config.allocate_samples {
        record.allocate_samples();
    }

    info!(
        "{}: {} rev {}, {}A/{}D, {} samples @ {} Hz, {}",
        path.display(),
        record.station_name,
        record.revision,
        record.analog_count(),
        record.digital_count(),
        record.total_samples,
        record.sampling_rate,
        record.data_file_token,
    );

    Ok(record)
}

/// Разбирает уже декодированный текст CFG. Путь к CFG остаётся пустым,
/// поэтому тело такой записи читается только через
/// [`decode_body_from`](crate::body::decode_body_from).
pub fn parse_header_str(
    text: &str,
    encoding: TextEncoding,
) -> Result<Record, ParseError> {
    let mut record = parse_cfg_text(text, Path::new(""))?;
    record.encoding = encoding;
    record.allocate_samples();

    Ok(record)
}

////////////////////////////////////////////////////////////////////////////////
// Курсор по строкам
////////////////////////////////////////////////////////////////////////////////

/// Построчное чтение с номерами строк (с 1) для сообщений об ошибках.
struct CfgLines<'a> {
    lines: std::str::Lines<'a>,
    line_no: usize,
}

impl<'a> CfgLines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
            line_no: 0,
        }
    }

    fn next_line(&mut self) -> Option<&'a str> {
        let line = self.lines.next()?;
        self.line_no += 1;
        Some(line)
    }

    /// Обязательная строка; `what` попадает в [`ParseError::MissingLine`].
    fn expect(
        &mut self,
        what: impl FnOnce() -> String,
    ) -> Result<&'a str, ParseError> {
        self.next_line()
            .ok_or_else(|| ParseError::missing(self.line_no + 1, what()))
    }

    /// Необязательная строка: `None` на конце файла или пустой строке.
    fn optional(&mut self) -> Option<&'a str> {
        self.next_line().filter(|l| !l.trim().is_empty())
    }
}

fn fields(line: &str) -> Vec<&str> {
    line.split(',').map(str::trim).collect()
}

fn require_fields(
    fields: &[&str],
    line: usize,
    expected: usize,
) -> Result<(), ParseError> {
    if fields.len() < expected {
        return Err(ParseError::ShortLine {
            line,
            expected,
            found: fields.len(),
        });
    }
    Ok(())
}

fn parse_strict<T: FromStr>(
    value: &str,
    line: usize,
    field: &'static str,
) -> Result<T, ParseError> {
    value
        .trim()
        .parse()
        .map_err(|_| ParseError::invalid_number(line, field, value))
}

fn parse_or<T: FromStr>(
    value: Option<&&str>,
    default: T,
) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

////////////////////////////////////////////////////////////////////////////////
// Разбор
////////////////////////////////////////////////////////////////////////////////

fn parse_cfg_text(
    text: &str,
    cfg_path: &Path,
) -> Result<Record, ParseError> {
    let mut lines = CfgLines::new(text);
    let mut record = Record::new(cfg_path);

    // 1. Станция, устройство, редакция
    let station = lines.expect(|| "station line".into())?;
    let order = parse_station_line(station, &mut record);

    // 2. Количество каналов
    let counts = lines.expect(|| "channel counts".into())?;
    let (analog_count, digital_count) = parse_channel_counts(counts, lines.line_no)?;
    debug!("Channel counts: {analog_count}A/{digital_count}D");

    // 3. Аналоговые каналы
    record.analog.reserve(analog_count);
    for i in 0..analog_count {
        let line = lines.expect(|| format!("analog channel {}", i + 1))?;
        record
            .analog
            .push(parse_analog_channel(line, i + 1, lines.line_no)?);
    }

    // 4. Дискретные каналы
    record.digital.reserve(digital_count);
    for i in 0..digital_count {
        let line = lines.expect(|| format!("digital channel {}", i + 1))?;
        record
            .digital
            .push(parse_digital_channel(line, i + 1, lines.line_no)?);
    }

    // 5. Частота сети
    let lf = lines.expect(|| "line frequency".into())?;
    let frequency: f64 = parse_strict(lf, lines.line_no, "line frequency")?;
    record.line_frequency = frequency as u32;

    // 6–7. Участки дискретизации
    let nrates_line = lines.expect(|| "number of sampling rates".into())?;
    let nrates: usize = parse_strict(nrates_line, lines.line_no, "nrates")?;

    for k in 0..nrates.max(1) {
        let line = lines.expect(|| format!("sampling rate {}", k + 1))?;
        let f = fields(line);
        require_fields(&f, lines.line_no, 2)?;

        let segment = SamplingSegment {
            rate: parse_strict(f[0], lines.line_no, "sampling rate")?,
            end_sample: parse_strict(f[1], lines.line_no, "end sample")?,
        };
        record.sampling_rate = record.sampling_rate.max(segment.rate);
        record.total_samples = record.total_samples.max(segment.end_sample);
        record.segments.push(segment);
    }
    debug!(
        "{} sampling segment(s), {} samples, max rate {} Hz",
        record.segments.len(),
        record.total_samples,
        record.sampling_rate
    );

    // 8. Метки времени
    let trigger = lines.expect(|| "trigger timestamp".into())?;
    record.trigger_time = parse_timestamp_or_default(trigger, order);
    let start = lines.expect(|| "start timestamp".into())?;
    record.start_time = parse_timestamp_or_default(start, order);

    // 9. Тип файла данных
    let ft = lines.expect(|| "data file type".into())?;
    record.data_file_token = ft.trim().to_string();
    record.data_file_type = DataFileType::from_token(ft);
    if record.data_file_type.is_none() {
        warn!("Unknown data file type '{}'", record.data_file_token);
    }

    // 10. Необязательные строки 2013
    if record.revision == Revision::Rev2013 {
        parse_rev2013_tail(&mut lines, &mut record);
    }

    infer_phases_and_units(&mut record.analog);

    Ok(record)
}

/// Первая строка. Возвращает порядок полей даты для меток времени.
fn parse_station_line(
    line: &str,
    record: &mut Record,
) -> DateOrder {
    let f = fields(line);

    record.station_name = f.first().map(|s| s.to_string()).unwrap_or_default();
    record.recording_device_id = f.get(1).map(|s| s.to_string()).unwrap_or_default();

    record.revision = match f.get(2).filter(|s| !s.is_empty()) {
        None => Revision::Rev1999,
        Some(token) => match token.parse::<u32>() {
            Ok(year @ (1991 | 1999 | 2013)) => Revision::from_year(year),
            _ => {
                warn!("Unrecognised revision '{token}', assuming 1999");
                Revision::Rev1999
            }
        },
    };

    if line.to_ascii_uppercase().contains("RTDS") {
        debug!("RTDS header, trying month-first timestamps");
        DateOrder::MonthFirst
    } else {
        DateOrder::DayFirst
    }
}

/// Число перед суффиксом `A`/`D` (`12A`, `4D`, регистр не важен).
fn count_with_suffix(
    fields: &[&str],
    suffix: char,
) -> Option<Result<usize, String>> {
    fields.iter().skip(1).find_map(|f| {
        let last = f.chars().last()?;
        if !last.eq_ignore_ascii_case(&suffix) {
            return None;
        }
        let digits = f[..f.len() - last.len_utf8()].trim();
        Some(digits.parse::<usize>().map_err(|_| f.to_string()))
    })
}

fn parse_channel_counts(
    line: &str,
    line_no: usize,
) -> Result<(usize, usize), ParseError> {
    let f = fields(line);

    let invalid = |reason: String| ParseError::InvalidChannelCounts {
        line: line_no,
        reason,
    };

    let total: usize = f[0]
        .parse()
        .map_err(|_| invalid(format!("total '{}' is not a number", f[0])))?;

    let analog = match count_with_suffix(&f, 'A') {
        Some(Ok(n)) => n,
        Some(Err(token)) => return Err(invalid(format!("bad analog count '{token}'"))),
        None => return Err(invalid("no analog count (##A)".into())),
    };
    let digital = match count_with_suffix(&f, 'D') {
        Some(Ok(n)) => n,
        Some(Err(token)) => return Err(invalid(format!("bad digital count '{token}'"))),
        None => return Err(invalid("no digital count (##D)".into())),
    };

    if total != analog + digital {
        return Err(ParseError::ChannelCountMismatch {
            total,
            analog,
            digital,
        });
    }

    Ok((analog, digital))
}

fn parse_analog_channel(
    line: &str,
    index: usize,
    line_no: usize,
) -> Result<AnalogChannel, ParseError> {
    let f = fields(line);
    require_fields(&f, line_no, ANALOG_MIN_FIELDS)?;

    let mut ch = AnalogChannel::new(index, f[1]);
    ch.phase = Phase::from_label(f[2]);
    ch.phase_label = f[2].to_string();
    ch.component = f[3].to_string();
    ch.unit = f[4].to_string();
    ch.multiplier = parse_strict(f[5], line_no, "multiplier a")?;
    ch.offset = parse_strict(f[6], line_no, "offset b")?;
    ch.skew = parse_or(f.get(7), 0.0);
    ch.min = parse_or(f.get(8), 0.0);
    ch.max = parse_or(f.get(9), 0.0);

    // primary,secondary,PS учитываются только вместе
    if f.len() >= ANALOG_FULL_FIELDS {
        ch.primary = parse_or(f.get(10), 1.0);
        ch.secondary = parse_or(f.get(11), 1.0);
        ch.scaling = ScalingIdentifier::from_token(f[12]);
    }

    Ok(ch)
}

fn parse_digital_channel(
    line: &str,
    index: usize,
    line_no: usize,
) -> Result<DigitalChannel, ParseError> {
    let f = fields(line);
    require_fields(&f, line_no, DIGITAL_MIN_FIELDS)?;

    let mut ch = DigitalChannel::new(index, f[1]);

    // Dn,ch_id,y (1991) либо Dn,ch_id,ph,ccbm,y
    let state = if f.len() == 3 {
        f.get(2)
    } else {
        ch.phase_label = f.get(2).map(|s| s.to_string()).unwrap_or_default();
        ch.phase = Phase::from_label(&ch.phase_label);
        ch.component = f.get(3).map(|s| s.to_string()).unwrap_or_default();
        f.get(4)
    };
    ch.normal_state = u8::from(parse_or(state, 0i64) != 0);

    Ok(ch)
}

/// Строки `timemult`, `time_code,local_code`, `tmq_code,leapsec`.
///
/// Каждая следующая читается, только если предыдущая присутствует.
fn parse_rev2013_tail(
    lines: &mut CfgLines<'_>,
    record: &mut Record,
) {
    let Some(timemult) = lines.optional() else {
        return;
    };
    match timemult.trim().parse::<f64>() {
        Ok(v) => record.time_multiplier = v,
        Err(_) => warn!("Invalid timemult '{}', using 1.0", timemult.trim()),
    }

    let Some(codes) = lines.optional() else {
        return;
    };
    let f = fields(codes);
    record.time_code = parse_time_offset(f[0]);
    record.local_code = f.get(1).map_or_else(Default::default, |s| parse_time_offset(s));

    let Some(leap) = lines.optional() else {
        return;
    };
    let f = fields(leap);
    if let Ok(indicator) = f[0].parse::<u8>() {
        record.leap_second = LeapSecond::from_u8(indicator);
    }
    record.leap_second_quality = parse_or(f.get(1), 0i64) == 1;

    debug!(
        "2013 fields: timemult={}, time_code={}, local_code={}, leapsec={:?}",
        record.time_multiplier, record.time_code, record.local_code, record.leap_second
    );
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
