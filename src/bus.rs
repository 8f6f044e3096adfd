//! Settings changes and the subscribers that react to them.

use crate::settings::{
    check_interval, parse_key, Layout, Settings, SettingsError, Unit, MAX_SLOTS,
};

/// A single edit to [`Settings`].
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Layout(Layout),
    /// Assigns `key` to `index`, or clears the slot.
    Slot { index: usize, key: Option<String> },
    Unit(Unit),
    Interval(f64),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn Fn(&Settings, &Change)>;

/// Applies changes and notifies subscribers, in the order they subscribed.
#[derive(Default)]
pub struct SettingsBus {
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
}

impl SettingsBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, f: impl Fn(&Settings, &Change) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(f)));
        id
    }

    /// Returns whether `id` was subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    /// Validates and applies `change`, then notifies every subscriber. Rejected changes leave
    /// `settings` untouched and notify nobody.
    pub fn apply(&self, settings: &mut Settings, change: Change) -> Result<(), SettingsError> {
        match &change {
            Change::Layout(layout) => settings.layout = *layout,
            Change::Slot { index, key } => {
                if *index >= MAX_SLOTS {
                    return Err(SettingsError::InvalidSlot(*index));
                }
                if let Some(key) = key {
                    parse_key(key)?;
                }
                if settings.slots.len() <= *index {
                    settings.slots.resize(index + 1, None);
                }
                settings.slots[*index] = key.clone();
            }
            Change::Unit(unit) => settings.unit = *unit,
            Change::Interval(secs) => {
                check_interval(*secs)?;
                settings.interval_secs = *secs;
            }
        }

        log::debug!("settings changed: {:?}", change);
        for (_, subscriber) in &self.subscribers {
            subscriber(settings, &change);
        }
        Ok(())
    }
}
