/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Transition synthesis between the last scheduled pose and a new keyframe.
//!
//! The bridge keeps servos continuous: each channel travels from where the
//! source keyframe ends to where the destination keyframe starts.  Easing and
//! padding follow a fixed policy ([`TRANSITION_EASING`], no padding) instead of
//! being copied from either endpoint.

use crate::easing::EasingKind;
use crate::keyframe::{Keyframe, ServoPos};

use super::error::TransitionError;

/// Easing applied to every transition channel.
pub const TRANSITION_EASING: EasingKind = EasingKind::Linear;

/// Builds the keyframe that bridges `source` → `destination` over `duration`
/// seconds.
///
/// # Errors
/// Fails when either side has no channel data or the channel counts differ.
pub fn synthesize(
    source: &Keyframe,
    destination: &Keyframe,
    duration: f64,
) -> Result<Keyframe, TransitionError> {
    if source.channels.is_empty() {
        return Err(TransitionError::EmptySource);
    }
    if destination.channels.is_empty() {
        return Err(TransitionError::EmptyDestination);
    }
    if source.channels.len() != destination.channels.len() {
        return Err(TransitionError::ChannelMismatch {
            source_len: source.channels.len(),
            destination_len: destination.channels.len(),
        });
    }

    let channels = source
        .channels
        .iter()
        .zip(&destination.channels)
        .map(|(from, to)| ServoPos::new(TRANSITION_EASING, from.end_pos, to.start_pos))
        .collect();

    Ok(Keyframe::new(duration, channels))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(ends: &[(f64, f64)]) -> Keyframe {
        Keyframe::new(
            1.0,
            ends.iter()
                .map(|&(s, e)| ServoPos::new(EasingKind::CubicInOut, s, e).with_padding(0.2, 0.3))
                .collect(),
        )
    }

    #[test]
    fn bridges_source_end_to_destination_start() {
        let source = pose(&[(0.0, 20.0), (10.0, 60.0)]);
        let destination = pose(&[(80.0, 90.0), (60.0, 10.0)]);

        let bridge = synthesize(&source, &destination, 0.5).unwrap();

        assert_eq!(bridge.duration, 0.5);
        assert!(!bridge.is_delay);
        assert_eq!(bridge.channels.len(), 2);
        assert_eq!((bridge.channels[0].start_pos, bridge.channels[0].end_pos), (20.0, 80.0));
        assert_eq!((bridge.channels[1].start_pos, bridge.channels[1].end_pos), (60.0, 60.0));
    }

    #[test]
    fn uses_default_policy_not_endpoint_easing() {
        let bridge = synthesize(&pose(&[(0.0, 1.0)]), &pose(&[(2.0, 3.0)]), 0.5).unwrap();
        let ch = bridge.channels[0];
        assert_eq!(ch.easing, TRANSITION_EASING);
        assert_eq!((ch.begin_pad, ch.end_pad), (0.0, 0.0));
    }

    #[test]
    fn empty_source_fails() {
        let err = synthesize(&Keyframe::default(), &pose(&[(1.0, 2.0)]), 0.5).unwrap_err();
        assert_eq!(err, TransitionError::EmptySource);
    }

    #[test]
    fn empty_destination_fails() {
        let err = synthesize(&pose(&[(1.0, 2.0)]), &Keyframe::delay(1.0), 0.5).unwrap_err();
        assert_eq!(err, TransitionError::EmptyDestination);
    }

    #[test]
    fn mismatched_channel_counts_fail() {
        let err = synthesize(&pose(&[(1.0, 2.0)]), &pose(&[(1.0, 2.0), (3.0, 4.0)]), 0.5)
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::ChannelMismatch { source_len: 1, destination_len: 2 }
        );
    }
}
