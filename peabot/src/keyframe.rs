/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Core animation data structures.
//!
//! ```text
//! command ──(Payload)──► KeyframeFactory ──► Keyframe ──► animation queue ──► servos
//!                                              │
//!                                              └──► LastPose (source of the next transition)
//! ```
//!
//! # Ownership model
//! A [`Keyframe`] is built by a factory, moved into the scheduler's queue and
//! dropped when it completes or when the queue is cleared.  Its channel array
//! is an owned `Vec`, so there is nothing to free by hand.

use std::fmt;

use crate::easing::EasingKind;

// ── Keyframe kind ─────────────────────────────────────────────────────────────

/// Which motion pattern a keyframe is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyframeKind {
    Reset,
    Delay,
    Elevate,
    Walk,
    Extend,
    Turn,
    Strafe,
}

impl KeyframeKind {
    pub fn name(self) -> &'static str {
        match self {
            KeyframeKind::Reset => "reset",
            KeyframeKind::Delay => "delay",
            KeyframeKind::Elevate => "elevate",
            KeyframeKind::Walk => "walk",
            KeyframeKind::Extend => "extend",
            KeyframeKind::Turn => "turn",
            KeyframeKind::Strafe => "strafe",
        }
    }
}

impl fmt::Display for KeyframeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Payload ───────────────────────────────────────────────────────────────────

/// Argument carried by a motion command.
///
/// The factory for each [`KeyframeKind`] accepts exactly one payload shape and
/// rejects everything else.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Payload {
    #[default]
    None,
    /// Delay length in seconds.
    Seconds(f64),
    /// Normalised level in `[0, 1]` (elevation, extension).
    Level(f64),
    /// Signed step count; the sign selects the direction.
    Steps(i32),
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::None => f.write_str("none"),
            Payload::Seconds(s) => write!(f, "{s}s"),
            Payload::Level(l) => write!(f, "level {l}"),
            Payload::Steps(n) => write!(f, "{n} steps"),
        }
    }
}

// ── ServoPos ──────────────────────────────────────────────────────────────────

/// Motion of one servo channel within a keyframe.
///
/// `begin_pad` / `end_pad` are fractions of the keyframe duration during which
/// the channel holds its start / end position.  Their sum should be at most
/// `1.0`; the position mapper tolerates violations.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ServoPos {
    pub easing: EasingKind,
    pub start_pos: f64,
    pub end_pos: f64,
    pub begin_pad: f64,
    pub end_pad: f64,
}

impl ServoPos {
    /// Channel moving from `start_pos` to `end_pos` over the whole keyframe.
    pub fn new(easing: EasingKind, start_pos: f64, end_pos: f64) -> Self {
        Self {
            easing,
            start_pos,
            end_pos,
            begin_pad: 0.0,
            end_pad: 0.0,
        }
    }

    /// Channel that stays at `pos` for the whole keyframe.
    pub fn hold(pos: f64) -> Self {
        Self::new(EasingKind::Linear, pos, pos)
    }

    pub fn with_padding(mut self, begin_pad: f64, end_pad: f64) -> Self {
        self.begin_pad = begin_pad;
        self.end_pad = end_pad;
        self
    }
}

// ── Keyframe ──────────────────────────────────────────────────────────────────

/// A timed animation unit.
///
/// `channels` has one entry per configured servo unless `is_delay` is set, in
/// which case it is usually empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Keyframe {
    /// Duration in seconds.
    pub duration: f64,
    pub is_delay: bool,
    pub channels: Vec<ServoPos>,
}

impl Keyframe {
    pub fn new(duration: f64, channels: Vec<ServoPos>) -> Self {
        Self {
            duration,
            is_delay: false,
            channels,
        }
    }

    /// A pause with no channel data.
    pub fn delay(duration: f64) -> Self {
        Self {
            duration,
            is_delay: true,
            channels: Vec::new(),
        }
    }

    /// `true` if the scheduler should drive servos while this keyframe runs.
    pub fn drives_servos(&self) -> bool {
        !self.is_delay && !self.channels.is_empty()
    }

    /// Overwrite `self` with `next` the way LastPose tracks scheduled poses.
    ///
    /// A keyframe without channel data (a plain delay) does not move the
    /// robot, so the previous channel data is kept.
    pub fn record(&mut self, next: &Keyframe) {
        self.duration = next.duration;
        self.is_delay = next.is_delay;
        if !next.channels.is_empty() {
            self.channels.clone_from(&next.channels);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
