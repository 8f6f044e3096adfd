//! Keyboard handling for the status view.

use crate::{bus::Change, settings::Settings};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tempbar_core::{Sensor, SensorKey};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    Change(Change),
    None,
}

pub fn handle_key(key: KeyEvent, settings: &Settings, available: &[Sensor]) -> Action {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
        KeyCode::Char('l') => Action::Change(Change::Layout(settings.layout.toggled())),
        KeyCode::Char('u') => Action::Change(Change::Unit(settings.unit.toggled())),
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            if index >= settings.layout.slot_count() {
                return Action::None;
            }

            Action::Change(Change::Slot {
                index,
                key: next_assignment(settings.slot(index), available).map(|k| k.to_string()),
            })
        }
        _ => Action::None,
    }
}

/// Cycles a slot through the available sensors, then back to empty.
pub fn next_assignment(current: Option<SensorKey>, available: &[Sensor]) -> Option<SensorKey> {
    let position = current.and_then(|key| available.iter().position(|s| s.key == key));

    match position {
        None => available.first(),
        Some(i) => available.get(i + 1),
    }
    .map(|s| s.key)
}
