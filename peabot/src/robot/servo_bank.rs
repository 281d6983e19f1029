/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Simulated PCA9685 servo bank.
//!
//! Converts a 0–100 % position into PWM ticks inside each channel's limits and
//! keeps the last value written per channel.  Real I²C output is not part of
//! this crate; every write is traced with its expander pin instead.

use std::sync::{Mutex, PoisonError};

use tracing::{info, trace, warn};

use super::ActuatorDriver;
use crate::config::{Config, ServoChannel};

pub struct ServoBank {
    channels: Vec<ServoChannel>,
    pin_base: u16,
    max_pwm: u16,
    hertz: u16,
    /// Last PWM tick value written per channel; `None` until first write.
    ticks: Mutex<Vec<Option<u16>>>,
}

impl ServoBank {
    pub fn new(config: &Config) -> Self {
        let channels = config.servo_channels();
        let ticks = Mutex::new(vec![None; channels.len()]);
        let pca = &config.pca9685;
        info!(
            channels = channels.len(),
            pin_base = pca.pin_base,
            max_pwm = pca.max_pwm,
            hertz = pca.hertz,
            "servo bank ready"
        );
        Self {
            channels,
            pin_base: pca.pin_base,
            max_pwm: pca.max_pwm,
            hertz: pca.hertz,
            ticks,
        }
    }

    /// Pulse width in microseconds that `ticks` produces at the configured
    /// PWM frequency.
    pub fn pulse_width_us(&self, ticks: u16) -> f64 {
        let period_us = 1_000_000.0 / f64::from(self.hertz.max(1));
        period_us * f64::from(ticks) / f64::from(self.max_pwm.max(1))
    }

    /// PWM tick value for `position` (percent of travel) on `channel`.
    pub fn to_ticks(&self, channel: &ServoChannel, position: f64) -> u16 {
        let percent = position.clamp(0.0, 100.0) / 100.0;
        let span = f64::from(channel.max) - f64::from(channel.min);
        let raw = (f64::from(channel.min) + span * percent).round() as u16;
        raw.max(channel.min).min(channel.max).min(self.max_pwm)
    }

    /// Snapshot of the last tick value written per channel.
    pub fn ticks(&self) -> Vec<Option<u16>> {
        self.ticks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ActuatorDriver for ServoBank {
    fn set_actuator(&self, index: usize, position: f64) {
        let Some(channel) = self.channels.get(index) else {
            warn!(index, "servo index out of range, write ignored");
            return;
        };
        if !position.is_finite() {
            warn!(index, position, "non-finite servo position, write ignored");
            return;
        }

        let value = self.to_ticks(channel, position);
        let mut ticks = self.ticks.lock().unwrap_or_else(PoisonError::into_inner);
        if ticks[index] != Some(value) {
            trace!(
                index,
                pin = self.pin_base.saturating_add(channel.pin),
                position,
                ticks = value,
                pulse_us = self.pulse_width_us(value),
                "servo write"
            );
            ticks[index] = Some(value);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
