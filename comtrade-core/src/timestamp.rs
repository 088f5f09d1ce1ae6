//! Разбор меток времени CFG (`dd/mm/yyyy,hh:mm:ss.ssssss`) и смещений UTC.
//!
//! Регистраторы пишут даты по-разному, поэтому форматы перебираются по
//! списку. Ошибка разбора не фатальна: возвращается значение по умолчанию.

use chrono::NaiveDateTime;
use comtrade_types::TimeOffset;
use log::warn;

/// Порядок полей даты в метке времени.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateOrder {
    /// `dd/mm/yyyy` — по стандарту
    #[default]
    DayFirst,
    /// `mm/dd/yyyy` — пишут симуляторы RTDS
    MonthFirst,
}

/// Форматы стандарта: микро-, милли- или без дробной части секунд.
const DAY_FIRST_FORMATS: &[&str] = &[
    "%d/%m/%Y,%H:%M:%S%.f",
    "%d/%m/%Y,%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

const MONTH_FIRST_FORMATS: &[&str] = &["%m/%d/%Y,%H:%M:%S%.f"];

/// Год из двух цифр. `%Y` тоже принимает `95`, но как год 95, поэтому
/// эти форматы выбираются по длине поля года, а не по порядку в списке.
const DAY_FIRST_SHORT_YEAR: &[&str] = &["%d/%m/%y,%H:%M:%S%.f", "%d/%m/%y,%H:%M:%S"];

const MONTH_FIRST_SHORT_YEAR: &[&str] = &["%m/%d/%y,%H:%M:%S%.f"];

/// Последняя попытка — распространённые "свободные" записи.
const FALLBACK_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d,%H:%M:%S%.f",
    "%d.%m.%Y %H:%M:%S%.f",
];

/// Разбирает метку времени. `None`, если ни один формат не подошёл.
pub fn parse_timestamp(
    line: &str,
    order: DateOrder,
) -> Option<NaiveDateTime> {
    let normalized = normalize(line);

    let (day_first, month_first) = if has_two_digit_year(&normalized) {
        (DAY_FIRST_SHORT_YEAR, MONTH_FIRST_SHORT_YEAR)
    } else {
        (DAY_FIRST_FORMATS, MONTH_FIRST_FORMATS)
    };

    let preferred: &[&str] = match order {
        DateOrder::MonthFirst => month_first,
        DateOrder::DayFirst => &[],
    };

    preferred
        .iter()
        .chain(day_first)
        .chain(FALLBACK_FORMATS)
        .find_map(|fmt| NaiveDateTime::parse_from_str(&normalized, fmt).ok())
}

/// Как [`parse_timestamp`], но при неудаче возвращает
/// `NaiveDateTime::default()` и пишет предупреждение.
pub fn parse_timestamp_or_default(
    line: &str,
    order: DateOrder,
) -> NaiveDateTime {
    parse_timestamp(line, order).unwrap_or_else(|| {
        warn!("Unparsable CFG timestamp '{}', using default", line.trim());
        NaiveDateTime::default()
    })
}

/// Разбирает смещение `±hh:mm` (допускается `±h`). Пустое, нераспознанное
/// или превышающее [`TimeOffset::MAX_HOURS`] значение → ноль.
pub fn parse_time_offset(token: &str) -> TimeOffset {
    let token = token.trim();
    if token.is_empty() {
        return TimeOffset::ZERO;
    }

    let negative = token.starts_with('-');
    let body = token.trim_start_matches(['+', '-']);
    let mut parts = body.split(':');

    let hours = parts.next().and_then(|h| h.trim().parse::<u32>().ok());
    let minutes = match parts.next() {
        Some(m) => m.trim().parse::<u32>().ok(),
        None => Some(0),
    };

    hours
        .zip(minutes)
        .and_then(|(h, m)| TimeOffset::from_hm(negative, h, m))
        .unwrap_or_else(|| {
            warn!("Invalid time offset '{token}', using +00:00");
            TimeOffset::ZERO
        })
}

/// Третье поле даты `xx/xx/yy` состоит ровно из двух цифр.
fn has_two_digit_year(normalized: &str) -> bool {
    let date = normalized.split(',').next().unwrap_or_default();

    date.split('/')
        .nth(2)
        .is_some_and(|y| y.len() == 2 && y.bytes().all(|b| b.is_ascii_digit()))
}

/// Убирает пробелы вокруг запятой и по краям.
fn normalize(line: &str) -> String {
    line.trim()
        .split(',')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(",")
}
