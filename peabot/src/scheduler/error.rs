/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the keyframe pipeline.
//!
//! Three error enums model the three failure layers:
//!
//! * [`FactoryError`]: a command payload could not be turned into a keyframe
//!   (recoverable: the command is dropped).
//! * [`TransitionError`]: no bridging keyframe could be synthesized
//!   (degraded: the destination keyframe is still queued).
//! * [`SchedulerError`]: the scheduler worker itself could not be started
//!   (fatal at startup).

use thiserror::Error;

use crate::keyframe::{KeyframeKind, Payload};

// ── Keyframe construction ─────────────────────────────────────────────────────

/// Why a factory refused to build a keyframe.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FactoryError {
    /// The payload shape does not belong to this kind of keyframe.
    #[error("{kind} keyframe cannot be built from payload '{payload}'")]
    PayloadMismatch { kind: KeyframeKind, payload: Payload },

    /// The payload has the right shape but an unusable value.
    #[error("{kind} payload out of range: {reason}")]
    OutOfRange {
        kind: KeyframeKind,
        reason: &'static str,
    },

    /// A keyframe with servo data was requested for zero channels.
    #[error("{kind} keyframe requested for zero servo channels")]
    ZeroChannels { kind: KeyframeKind },

    /// The gait pattern needs the quadruped layout and the configured channel
    /// count does not provide it.
    #[error("{kind} pattern needs at least {required} channels, robot has {channels}")]
    UnsupportedLayout {
        kind: KeyframeKind,
        channels: usize,
        required: usize,
    },
}

// ── Transition synthesis ──────────────────────────────────────────────────────

/// Why no transition keyframe could be synthesized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// LastPose has no channel data yet (nothing was scheduled before).
    #[error("source pose has no channel data")]
    EmptySource,

    /// The destination keyframe carries no channel data.
    #[error("destination keyframe has no channel data")]
    EmptyDestination,

    #[error("channel count mismatch: source has {source_len}, destination has {destination_len}")]
    ChannelMismatch {
        source_len: usize,
        destination_len: usize,
    },
}

// ── Worker lifecycle ──────────────────────────────────────────────────────────

/// Errors returned by [`KeyframeScheduler::start()`](super::KeyframeScheduler::start).
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("keyframe scheduler is already running")]
    AlreadyRunning,

    /// The OS refused to create the scheduler thread.
    #[error("could not spawn keyframe scheduler thread: {0}")]
    Spawn(#[source] std::io::Error),
}
