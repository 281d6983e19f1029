/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Servo channel layout and the actuator driver seam.
//!
//! Channels are addressed by index `leg * 2 + joint`:
//!
//! | index | channel |
//! |---|---|
//! | 0 / 1 | front left hip / knee |
//! | 2 / 3 | front right hip / knee |
//! | 4 / 5 | back left hip / knee |
//! | 6 / 7 | back right hip / knee |
//!
//! Positions handed to an [`ActuatorDriver`] are percentages of a servo's
//! travel; the driver owns the conversion to hardware units.

pub mod servo_bank;

pub use servo_bank::ServoBank;

use std::fmt;

// ── Layout ────────────────────────────────────────────────────────────────────

/// Leg of the quadruped, in channel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    FrontLeft = 0,
    FrontRight = 1,
    BackLeft = 2,
    BackRight = 3,
}

impl Leg {
    pub const ALL: [Leg; 4] = [Leg::FrontLeft, Leg::FrontRight, Leg::BackLeft, Leg::BackRight];

    pub fn is_left(self) -> bool {
        matches!(self, Leg::FrontLeft | Leg::BackLeft)
    }

    /// Diagonal pair used by the trot gait: FL+BR move together, FR+BL move
    /// together.
    pub fn diagonal(self) -> Diagonal {
        match self {
            Leg::FrontLeft | Leg::BackRight => Diagonal::A,
            Leg::FrontRight | Leg::BackLeft => Diagonal::B,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Leg::FrontLeft => "front_left",
            Leg::FrontRight => "front_right",
            Leg::BackLeft => "back_left",
            Leg::BackRight => "back_right",
        }
    }
}

/// One of the two diagonal leg pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagonal {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joint {
    Hip = 0,
    Knee = 1,
}

impl Joint {
    fn name(self) -> &'static str {
        match self {
            Joint::Hip => "hip",
            Joint::Knee => "knee",
        }
    }
}

/// Number of channels covered by the named layout.
pub const LAYOUT_CHANNELS: usize = 8;

/// Channel index of `leg` / `joint`.
pub fn channel(leg: Leg, joint: Joint) -> usize {
    leg as usize * 2 + joint as usize
}

/// Reverse of [`channel`] for indices inside the named layout.
pub fn channel_role(index: usize) -> Option<(Leg, Joint)> {
    let leg = *Leg::ALL.get(index / 2)?;
    let joint = if index % 2 == 0 { Joint::Hip } else { Joint::Knee };
    Some((leg, joint))
}

/// Maps a configuration name such as `back_left_knee` to its channel index.
pub fn channel_index(name: &str) -> Option<usize> {
    (0..LAYOUT_CHANNELS).find(|&i| channel_name(i).as_deref() == Some(name))
}

pub fn channel_name(index: usize) -> Option<String> {
    channel_role(index).map(|(leg, joint)| format!("{}_{}", leg.name(), joint.name()))
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Driver seam ───────────────────────────────────────────────────────────────

/// Output side of the scheduler: one absolute position per channel per tick.
///
/// Implementations must not block; they are called from the scheduler thread
/// once per tick for every channel.
pub trait ActuatorDriver: Send + Sync {
    fn set_actuator(&self, index: usize, position: f64);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
