use serde::Serialize;

/// Редакция стандарта, которой соответствует CFG файл.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Revision {
    /// IEEE C37.111-1991
    Rev1991,
    /// IEEE C37.111-1999 (по умолчанию, если год не указан)
    #[default]
    Rev1999,
    /// IEC 60255-24:2013 / IEEE C37.111-2013
    Rev2013,
}

/// Индикатор високосной секунды (2013, поле `leapsec`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[repr(u8)]
pub enum LeapSecond {
    /// Високосная секунда не добавлялась
    #[default]
    None = 0,
    /// Добавлена
    Add = 1,
    /// Вычтена
    Subtract = 2,
    /// Источник времени не способен это определить
    Unknown = 3,
}

/// Смещение времени относительно UTC с точностью до минуты.
///
/// Хранится в минутах; `+05:30` → 330, `-05:00` → -300.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TimeOffset {
    pub minutes: i32,
}

impl Revision {
    /// Разбирает год редакции. Неизвестный год → 1999.
    pub fn from_year(year: u32) -> Self {
        match year {
            1991 => Revision::Rev1991,
            2013 => Revision::Rev2013,
            _ => Revision::Rev1999,
        }
    }

    pub fn year(&self) -> u32 {
        match self {
            Revision::Rev1991 => 1991,
            Revision::Rev1999 => 1999,
            Revision::Rev2013 => 2013,
        }
    }
}

impl LeapSecond {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => LeapSecond::None,
            1 => LeapSecond::Add,
            2 => LeapSecond::Subtract,
            _ => LeapSecond::Unknown,
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl TimeOffset {
    pub const ZERO: TimeOffset = TimeOffset { minutes: 0 };

    /// Наибольшее допустимое смещение по модулю, в часах.
    pub const MAX_HOURS: u32 = 24;

    /// Смещение из часов и минут. `None`, если `hours` больше
    /// [`MAX_HOURS`](Self::MAX_HOURS) или `minutes` не меньше 60.
    pub fn from_hm(
        negative: bool,
        hours: u32,
        minutes: u32,
    ) -> Option<Self> {
        if hours > Self::MAX_HOURS || minutes >= 60 {
            return None;
        }

        let total = hours
            .checked_mul(60)
            .and_then(|m| m.checked_add(minutes))
            .and_then(|m| i32::try_from(m).ok())?;

        Some(TimeOffset {
            minutes: if negative { -total } else { total },
        })
    }

    pub fn as_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.minutes as i64)
    }
}

impl std::fmt::Display for Revision {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.year())
    }
}

impl std::fmt::Display for TimeOffset {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let sign = if self.minutes < 0 { '-' } else { '+' };
        let abs = self.minutes.unsigned_abs();

        write!(f, "{sign}{:02}:{:02}", abs / 60, abs % 60)
    }
}
