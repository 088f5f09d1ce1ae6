use serde::Serialize;

/// Фаза канала (ABCN).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Phase {
    A,
    B,
    C,
    /// Нейтраль / нулевая последовательность
    N,
    /// Фаза не указана
    #[default]
    Unspecified,
}

/// К какой стороне измерительного трансформатора приведены значения.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ScalingIdentifier {
    /// Первичная сторона (`P`)
    Primary,
    /// Вторичная сторона (`S`, по умолчанию)
    #[default]
    Secondary,
}

/// Аналоговый канал: описание из CFG и декодированные выборки.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalogChannel {
    /// Номер канала (с 1, в порядке объявления)
    pub index: usize,
    /// Идентификатор канала `ch_id`
    pub name: String,
    /// Фаза, выведенная из `ph` или эвристикой
    pub phase: Phase,
    /// Исходное значение поля `ph`
    pub phase_label: String,
    /// Контролируемый элемент цепи `ccbm`
    pub component: String,
    /// Единица измерения `uu`
    pub unit: String,
    /// Множитель `a`
    pub multiplier: f64,
    /// Смещение `b`
    pub offset: f64,
    /// Сдвиг по времени относительно начала периода выборки, мкс
    pub skew: f64,
    /// Объявленный минимум сырых значений
    pub min: f64,
    /// Объявленный максимум сырых значений
    pub max: f64,
    /// Номинал первичной стороны трансформатора
    pub primary: f64,
    /// Номинал вторичной стороны трансформатора
    pub secondary: f64,
    pub scaling: ScalingIdentifier,
    #[serde(skip)]
    pub samples: Vec<f64>,
    /// Минимум декодированных значений
    pub sample_min: f64,
    /// Максимум декодированных значений
    pub sample_max: f64,
}

/// Дискретный (статусный) канал.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigitalChannel {
    pub index: usize,
    pub name: String,
    pub phase: Phase,
    pub phase_label: String,
    pub component: String,
    /// Нормальное состояние входа (0 или 1)
    pub normal_state: u8,
    #[serde(skip)]
    pub samples: Vec<u8>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Phase {
    /// Первая из букв A, B, C, N, найденная в метке (регистронезависимо).
    pub fn from_label(label: &str) -> Self {
        let upper = label.to_ascii_uppercase();

        if upper.contains('A') {
            Phase::A
        } else if upper.contains('B') {
            Phase::B
        } else if upper.contains('C') {
            Phase::C
        } else if upper.contains('N') {
            Phase::N
        } else {
            Phase::Unspecified
        }
    }

    pub fn is_unspecified(&self) -> bool {
        *self == Phase::Unspecified
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::A => "A",
            Phase::B => "B",
            Phase::C => "C",
            Phase::N => "N",
            Phase::Unspecified => "",
        }
    }
}

impl ScalingIdentifier {
    /// `P`/`p` → первичная сторона, всё остальное — вторичная.
    pub fn from_token(token: &str) -> Self {
        if token.trim().eq_ignore_ascii_case("P") {
            ScalingIdentifier::Primary
        } else {
            ScalingIdentifier::Secondary
        }
    }
}

impl AnalogChannel {
    pub fn new(
        index: usize,
        name: impl Into<String>,
    ) -> Self {
        AnalogChannel {
            index,
            name: name.into(),
            phase: Phase::Unspecified,
            phase_label: String::new(),
            component: String::new(),
            unit: String::new(),
            multiplier: 1.0,
            offset: 0.0,
            skew: 0.0,
            min: 0.0,
            max: 0.0,
            primary: 1.0,
            secondary: 1.0,
            scaling: ScalingIdentifier::Secondary,
            samples: Vec::new(),
            sample_min: 0.0,
            sample_max: 0.0,
        }
    }

    /// Переводит сырое значение в инженерные единицы: `raw * a + b`.
    #[inline]
    pub fn scale(
        &self,
        raw: f64,
    ) -> f64 {
        raw * self.multiplier + self.offset
    }

    pub fn is_primary(&self) -> bool {
        self.scaling == ScalingIdentifier::Primary
    }
}

impl DigitalChannel {
    pub fn new(
        index: usize,
        name: impl Into<String>,
    ) -> Self {
        DigitalChannel {
            index,
            name: name.into(),
            phase: Phase::Unspecified,
            phase_label: String::new(),
            component: String::new(),
            normal_state: 0,
            samples: Vec::new(),
        }
    }

    /// `true`, если хотя бы одна выборка отличается от первой.
    pub fn has_transition(&self) -> bool {
        match self.samples.split_first() {
            Some((first, rest)) => rest.iter().any(|s| s != first),
            None => false,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
