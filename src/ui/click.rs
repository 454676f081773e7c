//! Buttons and repeating click recognition.
//!
//! A window handler declares which buttons it wants in `click_config`; the host
//! builds one `ClickRecognizer` per subscription. Time is passed in explicitly so
//! recognizers are deterministic under test.
//!
//! Repeating single click semantics:
//! - pressing fires one click immediately
//! - while held, another click fires every `repeat_interval` after the press
//! - releasing stops the repeats; nothing fires on release

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Physical buttons of the device.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ButtonId {
    Back,
    Up,
    Select,
    Down,
}

/// Click subscriptions declared by a window handler.
#[derive(Debug, Clone, Default)]
pub struct ClickConfig {
    repeating: BTreeMap<ButtonId, Duration>,
}

impl ClickConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `button` to single clicks that repeat every `repeat_interval` while held.
    pub fn single_repeating_click_subscribe(&mut self, button: ButtonId, repeat_interval: Duration) {
        self.repeating.insert(button, repeat_interval);
    }

    pub fn repeat_interval(&self, button: ButtonId) -> Option<Duration> {
        self.repeating.get(&button).copied()
    }

    pub fn buttons(&self) -> impl Iterator<Item = ButtonId> + '_ {
        self.repeating.keys().copied()
    }
}

/// Press/hold state machine for one subscribed button.
#[derive(Debug, Clone)]
pub struct ClickRecognizer {
    repeat_interval: Duration,
    next_fire: Option<Instant>,
}

impl ClickRecognizer {
    pub fn new(repeat_interval: Duration) -> Self {
        Self {
            repeat_interval,
            next_fire: None,
        }
    }

    pub fn is_held(&self) -> bool {
        self.next_fire.is_some()
    }

    /// Button went down. Returns the number of clicks to deliver (0 if already held).
    pub fn press(&mut self, now: Instant) -> u32 {
        if self.is_held() {
            return 0;
        }
        self.next_fire = Some(now + self.repeat_interval);
        1
    }

    /// Repeats that came due by `now` while the button was held.
    pub fn poll(&mut self, now: Instant) -> u32 {
        // A zero interval would never catch up; treat it as "no repeat".
        if self.repeat_interval.is_zero() {
            return 0;
        }
        let Some(mut next) = self.next_fire else {
            return 0;
        };
        let mut fired = 0;
        while next <= now {
            fired += 1;
            next += self.repeat_interval;
        }
        self.next_fire = Some(next);
        fired
    }

    /// Button went up. Repeats due before `now` are still reported.
    pub fn release(&mut self, now: Instant) -> u32 {
        let fired = self.poll(now);
        self.next_fire = None;
        fired
    }

    /// When the next repeat is due, if the button is held.
    pub fn deadline(&self) -> Option<Instant> {
        if self.repeat_interval.is_zero() {
            return None;
        }
        self.next_fire
    }
}

/// All recognizers of the top window, keyed by button.
#[derive(Debug, Clone, Default)]
pub struct ClickDispatcher {
    recognizers: BTreeMap<ButtonId, ClickRecognizer>,
}

impl ClickDispatcher {
    pub fn from_config(config: &ClickConfig) -> Self {
        let recognizers = config
            .buttons()
            .filter_map(|button| {
                let interval = config.repeat_interval(button)?;
                Some((button, ClickRecognizer::new(interval)))
            })
            .collect();
        Self { recognizers }
    }

    pub fn handles(&self, button: ButtonId) -> bool {
        self.recognizers.contains_key(&button)
    }

    pub fn button_down(&mut self, button: ButtonId, now: Instant) -> u32 {
        self.recognizers
            .get_mut(&button)
            .map_or(0, |r| r.press(now))
    }

    pub fn button_up(&mut self, button: ButtonId, now: Instant) -> u32 {
        self.recognizers
            .get_mut(&button)
            .map_or(0, |r| r.release(now))
    }

    /// Repeats due by `now`, per button, in button order.
    pub fn poll(&mut self, now: Instant) -> Vec<(ButtonId, u32)> {
        self.recognizers
            .iter_mut()
            .filter_map(|(&button, r)| {
                let n = r.poll(now);
                (n > 0).then_some((button, n))
            })
            .collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.recognizers.values().filter_map(|r| r.deadline()).min()
    }
}
