//! Восстановление фаз и единиц измерения аналоговых каналов по именам.
//!
//! Многие регистраторы оставляют поля `ph` и `uu` пустыми, но называют
//! каналы по шаблону `IA, IB, IC, IN` или `UA, UB, UC, U0`. Эвристика
//! работает в два прохода: сначала по каналам строится список
//! [`ChannelPatch`], затем патчи применяются к записи. Заполняются только
//! пустые поля.

use comtrade_types::{AnalogChannel, Phase};
use log::debug;

/// Состояние поиска тройки фаз A/B/C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseScan {
    #[default]
    Idle,
    /// Предыдущий канал содержит `A` в имени
    SawA,
    /// Предыдущие два канала похожи на A, B
    SawAB,
    /// Тройка A/B/C только что назначена
    AssignedAbc,
}

/// Что именно дописать в канал.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchKind {
    Phase(Phase),
    Unit(&'static str),
}

/// Исправление одного аналогового канала (индекс в `Record::analog`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPatch {
    pub channel: usize,
    pub kind: PatchKind,
}

/// Род величины, определённый по имени канала.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantity {
    Current,
    Voltage,
}

////////////////////////////////////////////////////////////////////////////////
// Проход 1: фазы
////////////////////////////////////////////////////////////////////////////////

/// Позиция буквы в имени (регистронезависимо), в символах.
fn letter_pos(
    name: &str,
    letter: char,
) -> Option<usize> {
    name.chars().position(|c| c.eq_ignore_ascii_case(&letter))
}

/// Фаза не распознана. Сырая метка `ph` (например `X` или `0`) не
/// учитывается.
fn has_empty_phase(ch: &AnalogChannel) -> bool {
    ch.phase.is_unspecified()
}

/// Проход по каналам с явным автоматом [`PhaseScan`].
///
/// Тройка признаётся, если `B` во втором имени стоит там же, где `A` в
/// первом, а `C` в третьем там же, где `B` во втором (`IA, IB, IC`).
/// Следующий за тройкой канал с `N` или `0` в имени получает фазу N.
pub fn infer_phase_patches(channels: &[AnalogChannel]) -> Vec<ChannelPatch> {
    let mut patches = Vec::new();
    let mut state = PhaseScan::Idle;

    for (i, ch) in channels.iter().enumerate() {
        let empty = has_empty_phase(ch);
        let prev = i.checked_sub(1).map(|p| channels[p].name.as_str());

        state = match state {
            PhaseScan::Idle | PhaseScan::AssignedAbc
                if empty && letter_pos(&ch.name, 'A').is_some() =>
            {
                PhaseScan::SawA
            }
            PhaseScan::SawA
                if empty
                    && prev.is_some_and(|p| letter_pos(&ch.name, 'B') == letter_pos(p, 'A')) =>
            {
                PhaseScan::SawAB
            }
            PhaseScan::SawAB
                if empty
                    && prev.is_some_and(|p| letter_pos(&ch.name, 'C') == letter_pos(p, 'B')) =>
            {
                for (offset, phase) in [(2, Phase::A), (1, Phase::B), (0, Phase::C)] {
                    patches.push(ChannelPatch {
                        channel: i - offset,
                        kind: PatchKind::Phase(phase),
                    });
                }
                PhaseScan::AssignedAbc
            }
            PhaseScan::AssignedAbc
                if empty
                    && (letter_pos(&ch.name, 'N').is_some() || ch.name.contains('0')) =>
            {
                patches.push(ChannelPatch {
                    channel: i,
                    kind: PatchKind::Phase(Phase::N),
                });
                PhaseScan::Idle
            }
            _ => PhaseScan::Idle,
        };
    }

    patches
}

////////////////////////////////////////////////////////////////////////////////
// Проход 2: единицы
////////////////////////////////////////////////////////////////////////////////

fn contains_ci(
    name: &str,
    needle: &str,
) -> bool {
    name.to_ascii_uppercase().contains(needle)
}

fn is_current_like(name: &str) -> bool {
    contains_ci(name, "I") || contains_ci(name, "CT") || contains_ci(name, "TA")
}

fn is_voltage_like(name: &str) -> bool {
    contains_ci(name, "V") || contains_ci(name, "U") || contains_ci(name, "PT")
}

fn unit_for(
    quantity: Quantity,
    ch: &AnalogChannel,
) -> &'static str {
    match (quantity, ch.is_primary()) {
        (Quantity::Current, false) => "A",
        (Quantity::Current, true) => "kA",
        (Quantity::Voltage, false) => "V",
        (Quantity::Voltage, true) => "kV",
    }
}

/// Единицы для тройки A/B/C (и следующего за ней N) с пустой единицей у C.
///
/// `phases` — фазы каналов после применения первого прохода.
pub fn infer_unit_patches(
    channels: &[AnalogChannel],
    phases: &[Phase],
) -> Vec<ChannelPatch> {
    let mut patches = Vec::new();

    for j in 2..channels.len() {
        if phases[j - 2..=j] != [Phase::A, Phase::B, Phase::C] {
            continue;
        }
        if !channels[j].unit.trim().is_empty() {
            continue;
        }

        let triplet = &channels[j - 2..=j];
        // Имя вида `BUS_IA` подходит под оба признака, напряжение важнее
        let quantity = if triplet.iter().all(|c| is_voltage_like(&c.name)) {
            Quantity::Voltage
        } else if triplet.iter().all(|c| is_current_like(&c.name)) {
            Quantity::Current
        } else {
            continue;
        };

        let neutral = (j + 1 < channels.len() && phases[j + 1] == Phase::N).then_some(j + 1);

        for k in (j - 2..=j).chain(neutral) {
            if channels[k].unit.trim().is_empty() {
                patches.push(ChannelPatch {
                    channel: k,
                    kind: PatchKind::Unit(unit_for(quantity, &channels[k])),
                });
            }
        }
    }

    patches
}

////////////////////////////////////////////////////////////////////////////////
// Применение
////////////////////////////////////////////////////////////////////////////////

/// Применяет патчи. Непустые поля не перезаписываются.
pub fn apply_patches(
    channels: &mut [AnalogChannel],
    patches: &[ChannelPatch],
) {
    for patch in patches {
        let Some(ch) = channels.get_mut(patch.channel) else {
            continue;
        };

        match &patch.kind {
            PatchKind::Phase(phase) => {
                // Исходная метка `ph` не изменяется
                if has_empty_phase(ch) {
                    ch.phase = *phase;
                }
            }
            PatchKind::Unit(unit) => {
                if ch.unit.trim().is_empty() {
                    ch.unit = (*unit).to_string();
                }
            }
        }
    }
}

/// Оба прохода эвристики над каналами записи.
pub fn infer_phases_and_units(channels: &mut [AnalogChannel]) {
    let phase_patches = infer_phase_patches(channels);
    apply_patches(channels, &phase_patches);

    let phases: Vec<Phase> = channels.iter().map(|c| c.phase).collect();
    let unit_patches = infer_unit_patches(channels, &phases);
    apply_patches(channels, &unit_patches);

    if !phase_patches.is_empty() || !unit_patches.is_empty() {
        debug!(
            "Inferred {} phase and {} unit tags from channel names",
            phase_patches.len(),
            unit_patches.len()
        );
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
