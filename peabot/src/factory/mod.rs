/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Keyframe factories: turn a motion command into a [`Keyframe`].
//!
//! The scheduler only knows the [`KeyframeFactory`] trait.  [`GaitFactory`] is
//! the built-in pattern library for the 8-channel quadruped layout described
//! in [`crate::robot`].
//!
//! # Gait model
//! Walk, turn and strafe are built from *half-cycles*.  In each half-cycle one
//! diagonal pair swings while the other carries the body; `reverse` picks
//! which pair swings, so alternating `reverse` yields a continuous gait:
//!
//! ```text
//!            0 ............ knee_pad_b ........ 1-knee_pad_a ..... 1
//! swing knee   held lifted    |  lowering        |  planted
//! stance knee  planted                           |  lifting for hand-over
//! hips         ───────────── eased sweep over the whole half ──────────
//! ```
//!
//! Every half-cycle ends exactly where the mirrored half-cycle starts.

use tracing::debug;

use crate::config::GaitConfig;
use crate::keyframe::{Keyframe, KeyframeKind, Payload, ServoPos};
use crate::robot::{channel_role, Diagonal, Joint, Leg, LAYOUT_CHANNELS};
use crate::scheduler::error::FactoryError;

/// Neutral servo position (percent of travel).
pub const NEUTRAL: f64 = 50.0;


// ── Factory seam ──────────────────────────────────────────────────────────────

/// Builds keyframes for the scheduler.
///
/// `channels` is the configured servo count; a returned keyframe that drives
/// servos must carry exactly that many channels.
pub trait KeyframeFactory: Send + Sync {
    fn build(
        &self,
        kind: KeyframeKind,
        channels: usize,
        payload: Payload,
        reverse: bool,
    ) -> Result<Keyframe, FactoryError>;
}

// ── GaitFactory ───────────────────────────────────────────────────────────────

/// Built-in motion patterns, parameterised by [`GaitConfig`].
#[derive(Debug, Clone)]
pub struct GaitFactory {
    gait: GaitConfig,
}

impl GaitFactory {
    pub fn new(gait: GaitConfig) -> Self {
        Self { gait }
    }

    fn reset(&self, channels: usize, payload: Payload) -> Result<Keyframe, FactoryError> {
        let kind = KeyframeKind::Reset;
        if payload != Payload::None {
            return Err(FactoryError::PayloadMismatch { kind, payload });
        }
        require_channels(kind, channels)?;
        Ok(Keyframe::new(
            self.gait.pose_time,
            vec![ServoPos::hold(NEUTRAL); channels],
        ))
    }

    fn delay(&self, payload: Payload) -> Result<Keyframe, FactoryError> {
        let kind = KeyframeKind::Delay;
        match payload {
            Payload::Seconds(s) if s.is_finite() && s >= 0.0 => Ok(Keyframe::delay(s)),
            Payload::Seconds(_) => Err(FactoryError::OutOfRange {
                kind,
                reason: "delay must be a non-negative number of seconds",
            }),
            other => Err(FactoryError::PayloadMismatch { kind, payload: other }),
        }
    }

    fn elevate(&self, channels: usize, payload: Payload) -> Result<Keyframe, FactoryError> {
        let kind = KeyframeKind::Elevate;
        let level = level(kind, payload)?;
        require_channels(kind, channels)?;

        let knee = 100.0 * level;
        Ok(Keyframe::new(
            self.gait.pose_time,
            layout(channels, |_, joint| match joint {
                Joint::Hip => ServoPos::hold(NEUTRAL),
                Joint::Knee => ServoPos::hold(knee),
            }),
        ))
    }

    fn extend(&self, channels: usize, payload: Payload) -> Result<Keyframe, FactoryError> {
        let kind = KeyframeKind::Extend;
        let level = level(kind, payload)?;
        require_channels(kind, channels)?;

        let spread = NEUTRAL * level;
        Ok(Keyframe::new(
            self.gait.pose_time,
            layout(channels, |leg, joint| match joint {
                Joint::Hip => ServoPos::hold(NEUTRAL + spread * side(leg)),
                Joint::Knee => ServoPos::hold(NEUTRAL),
            }),
        ))
    }

    /// One walk / turn / strafe half-cycle.
    fn half_cycle(
        &self,
        kind: KeyframeKind,
        channels: usize,
        payload: Payload,
        reverse: bool,
    ) -> Result<Keyframe, FactoryError> {
        let direction = match payload {
            Payload::Steps(0) => {
                return Err(FactoryError::OutOfRange {
                    kind,
                    reason: "step count must be non-zero",
                })
            }
            Payload::Steps(n) if n.unsigned_abs() > self.gait.max_steps => {
                return Err(FactoryError::OutOfRange {
                    kind,
                    reason: "step count exceeds gait.max_steps",
                })
            }
            Payload::Steps(n) => f64::from(n.signum()),
            other => return Err(FactoryError::PayloadMismatch { kind, payload: other }),
        };
        if channels < LAYOUT_CHANNELS {
            return Err(FactoryError::UnsupportedLayout {
                kind,
                channels,
                required: LAYOUT_CHANNELS,
            });
        }

        let swing_pair = if reverse { Diagonal::B } else { Diagonal::A };
        let gait = &self.gait;
        let lifted = NEUTRAL + gait.knee_delta;

        let channels = layout(channels, |leg, joint| {
            let swinging = leg.diagonal() == swing_pair;
            let sweep = |delta: f64| {
                if swinging {
                    ServoPos::new(gait.hip_easing, NEUTRAL - delta, NEUTRAL + delta)
                } else {
                    ServoPos::new(gait.hip_easing, NEUTRAL + delta, NEUTRAL - delta)
                }
            };

            match (kind, joint) {
                (KeyframeKind::Strafe, Joint::Hip) => ServoPos::hold(NEUTRAL),
                (KeyframeKind::Strafe, Joint::Knee) => {
                    sweep(gait.knee_delta * direction * side(leg))
                }
                (KeyframeKind::Turn, Joint::Hip) => sweep(gait.hip_delta * direction * side(leg)),
                (_, Joint::Hip) => sweep(gait.hip_delta * direction),
                (_, Joint::Knee) if swinging => ServoPos::new(gait.knee_easing, lifted, NEUTRAL)
                    .with_padding(gait.knee_pad_b, gait.knee_pad_a),
                (_, Joint::Knee) => ServoPos::new(gait.knee_easing, NEUTRAL, lifted)
                    .with_padding(1.0 - gait.knee_pad_a, 0.0),
            }
        });

        Ok(Keyframe::new(gait.step_time, channels))
    }
}

impl KeyframeFactory for GaitFactory {
    fn build(
        &self,
        kind: KeyframeKind,
        channels: usize,
        payload: Payload,
        reverse: bool,
    ) -> Result<Keyframe, FactoryError> {
        let keyframe = match kind {
            KeyframeKind::Reset => self.reset(channels, payload),
            KeyframeKind::Delay => self.delay(payload),
            KeyframeKind::Elevate => self.elevate(channels, payload),
            KeyframeKind::Extend => self.extend(channels, payload),
            KeyframeKind::Walk | KeyframeKind::Turn | KeyframeKind::Strafe => {
                self.half_cycle(kind, channels, payload, reverse)
            }
        }?;

        debug!(
            kind = %kind,
            payload = %payload,
            reverse,
            duration = keyframe.duration,
            "keyframe built"
        );
        Ok(keyframe)
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn require_channels(kind: KeyframeKind, channels: usize) -> Result<(), FactoryError> {
    if channels == 0 {
        Err(FactoryError::ZeroChannels { kind })
    } else {
        Ok(())
    }
}

fn level(kind: KeyframeKind, payload: Payload) -> Result<f64, FactoryError> {
    match payload {
        Payload::Level(l) if (0.0..=1.0).contains(&l) => Ok(l),
        Payload::Level(_) => Err(FactoryError::OutOfRange {
            kind,
            reason: "level must be within [0, 1]",
        }),
        other => Err(FactoryError::PayloadMismatch { kind, payload: other }),
    }
}

/// `-1.0` for left legs, `+1.0` for right legs.
fn side(leg: Leg) -> f64 {
    if leg.is_left() {
        -1.0
    } else {
        1.0
    }
}

/// Fills `channels` entries; indices outside the named layout hold neutral.
fn layout(channels: usize, mut role: impl FnMut(Leg, Joint) -> ServoPos) -> Vec<ServoPos> {
    (0..channels)
        .map(|i| match channel_role(i) {
            Some((leg, joint)) => role(leg, joint),
            None => ServoPos::hold(NEUTRAL),
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
