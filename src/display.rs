//! Turns readings into status-line text.

use crate::{
    poller::{Reading, SlotReading},
    settings::Unit,
};
use tempbar_core::catalog;

/// Shown for a slot with no data: unassigned, or a key this machine lacks.
pub const PLACEHOLDER: &str = "--";
/// Shown for a slot whose read failed.
pub const ERROR_GLYPH: &str = "!!";

/// The value part of a slot.
pub fn format_value(reading: &Reading, unit: Unit) -> String {
    match reading {
        Reading::Value(celsius) => format!("{:.1}{}", unit.convert(*celsius), unit.suffix()),
        Reading::Unassigned => PLACEHOLDER.to_string(),
        Reading::Failed(err) if err.is_not_found() => PLACEHOLDER.to_string(),
        Reading::Failed(_) => ERROR_GLYPH.to_string(),
    }
}

/// The catalog name for the slot's sensor, or its raw key.
pub fn slot_label(slot: &SlotReading) -> String {
    match slot.key {
        None => format!("Slot {}", slot.slot + 1),
        Some(key) => catalog::lookup(key).map_or_else(|| key.to_string(), |s| s.name.to_string()),
    }
}

/// One line for the whole status bar, e.g. `CPU Proximity 44.0°C | GPU Proximity --`.
pub fn status_line(readings: &[SlotReading], unit: Unit) -> String {
    readings
        .iter()
        .map(|slot| format!("{} {}", slot_label(slot), format_value(&slot.reading, unit)))
        .collect::<Vec<_>>()
        .join(" | ")
}
