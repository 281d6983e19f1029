/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Position mapping: where a channel should be at a given time in a keyframe.
//!
//! Pure functions only: no queue, clock or driver access.
//!
//! ```text
//!  0          begin                        duration-end     duration
//!  |--begin_pad--|=========== window ===========|--end_pad--|
//!   hold start         eased start → end             hold end
//! ```
//!
//! A window of zero or negative length (pads summing to ≥ 1, or a zero
//! duration) never divides: progress jumps from 0 to 1 at `begin`.

use crate::easing::ease;
use crate::keyframe::ServoPos;

/// Normalised progress of a channel through its moving window, in `[0, 1]`.
pub fn progress(elapsed: f64, duration: f64, begin_pad: f64, end_pad: f64) -> f64 {
    if !elapsed.is_finite() || !duration.is_finite() {
        return 1.0;
    }

    let begin = duration * begin_pad;
    let end = duration * end_pad;
    let window = duration - begin - end;

    if window <= 0.0 || !window.is_finite() {
        return if elapsed >= begin { 1.0 } else { 0.0 };
    }

    let percent = (elapsed - begin) / window;
    if percent.is_nan() {
        return 1.0;
    }
    percent.clamp(0.0, 1.0)
}

/// Position of `servo` at `elapsed` seconds into a keyframe of `duration`.
pub fn map_position(elapsed: f64, duration: f64, servo: &ServoPos) -> f64 {
    let percent = progress(elapsed, duration, servo.begin_pad, servo.end_pad);
    let modifier = ease(servo.easing, percent);
    servo.start_pos + (servo.end_pos - servo.start_pos) * modifier
}

// ── Tests ─────────────────────────────────────────────────────────────────────
