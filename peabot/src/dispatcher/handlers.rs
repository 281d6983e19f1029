/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-event handlers, run synchronously on the dispatcher thread.
//!
//! | Event | Keyframes queued |
//! |---|---|
//! | `Reset` | one `Reset` |
//! | `Delay` | one `Delay` |
//! | `Elevate` / `Extend` | one of the same kind |
//! | `Walk` / `Turn` / `Strafe` with `Steps(n)` | `2·|n|` half-cycles, alternating diagonal phase |

use tracing::debug;

use crate::keyframe::{KeyframeKind, Payload};
use crate::scheduler::KeyframeScheduler;

use super::{Event, EventKind};

/// Runs the handler for `event` and returns how many keyframe commands the
/// scheduler accepted (transitions not counted).
pub fn handle(scheduler: &KeyframeScheduler, event: Event) -> usize {
    match event.kind {
        EventKind::Reset => single(scheduler, KeyframeKind::Reset, event.payload),
        EventKind::Delay => single(scheduler, KeyframeKind::Delay, event.payload),
        EventKind::Elevate => single(scheduler, KeyframeKind::Elevate, event.payload),
        EventKind::Extend => single(scheduler, KeyframeKind::Extend, event.payload),
        EventKind::Walk => gait(scheduler, KeyframeKind::Walk, event.payload),
        EventKind::Turn => gait(scheduler, KeyframeKind::Turn, event.payload),
        EventKind::Strafe => gait(scheduler, KeyframeKind::Strafe, event.payload),
    }
}

fn single(scheduler: &KeyframeScheduler, kind: KeyframeKind, payload: Payload) -> usize {
    usize::from(scheduler.enqueue_keyframe(kind, payload, false, false))
}

/// Queues two half-cycles per step.  Every second half-cycle mirrors the
/// diagonal pair, and only the first one is bridged from LastPose: the rest
/// already start where their predecessor ends.
fn gait(scheduler: &KeyframeScheduler, kind: KeyframeKind, payload: Payload) -> usize {
    let Payload::Steps(steps) = payload else {
        // Let the factory reject and log the mismatched payload.
        return single(scheduler, kind, payload);
    };
    if steps == 0 {
        debug!(kind = %kind, "zero steps, nothing queued");
        return 0;
    }

    let half_cycles = steps.unsigned_abs().saturating_mul(2);
    let mut queued = 0;
    for i in 0..half_cycles {
        let reverse = i % 2 == 1;
        let skip_transitions = i > 0;
        if !scheduler.enqueue_keyframe(kind, payload, reverse, skip_transitions) {
            break;
        }
        queued += 1;
    }
    queued
}

// ── Tests ─────────────────────────────────────────────────────────────────────
