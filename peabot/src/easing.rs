/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Easing curves used to shape servo motion inside a keyframe.
//!
//! [`ease`] maps normalised progress `t ∈ [0, 1]` onto a motion modifier.
//! Most curves stay inside `[0, 1]`; the `Back*` and `ElasticOut` curves
//! deliberately overshoot so a leg can "settle" into its end pose.

use std::f64::consts::PI;

use serde::Deserialize;

/// Motion curve applied to one servo channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingKind {
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    SineIn,
    SineOut,
    SineInOut,
    BackIn,
    BackOut,
    BackInOut,
    ElasticOut,
    BounceOut,
}

impl EasingKind {
    /// Returns `true` for curves whose output can leave `[0, 1]`.
    pub fn overshoots(self) -> bool {
        matches!(
            self,
            EasingKind::BackIn | EasingKind::BackOut | EasingKind::BackInOut | EasingKind::ElasticOut
        )
    }
}

// ── Curve constants ───────────────────────────────────────────────────────────

const BACK_C1: f64 = 1.70158;
const BACK_C2: f64 = BACK_C1 * 1.525;
const BACK_C3: f64 = BACK_C1 + 1.0;

/// Evaluate `kind` at progress `t`.
///
/// `t` is clamped to `[0, 1]` first; a NaN `t` is treated as `0.0`.
pub fn ease(kind: EasingKind, t: f64) -> f64 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

    match kind {
        EasingKind::Linear => t,
        EasingKind::QuadIn => t * t,
        EasingKind::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
        EasingKind::QuadInOut => {
            if t < 0.5 {
                2.0 * t * t
            } else {
                1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
            }
        }
        EasingKind::CubicIn => t * t * t,
        EasingKind::CubicOut => 1.0 - (1.0 - t).powi(3),
        EasingKind::CubicInOut => {
            if t < 0.5 {
                4.0 * t * t * t
            } else {
                1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
            }
        }
        EasingKind::SineIn => 1.0 - (t * PI / 2.0).cos(),
        EasingKind::SineOut => (t * PI / 2.0).sin(),
        EasingKind::SineInOut => -((PI * t).cos() - 1.0) / 2.0,
        EasingKind::BackIn => BACK_C3 * t * t * t - BACK_C1 * t * t,
        EasingKind::BackOut => 1.0 + BACK_C3 * (t - 1.0).powi(3) + BACK_C1 * (t - 1.0).powi(2),
        EasingKind::BackInOut => {
            if t < 0.5 {
                ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
            } else {
                ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2) + 2.0)
                    / 2.0
            }
        }
        EasingKind::ElasticOut => ease_out_elastic(t),
        EasingKind::BounceOut => ease_out_bounce(t),
    }
}

fn ease_out_elastic(t: f64) -> f64 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else {
        let c4 = (2.0 * PI) / 3.0;
        2.0_f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
    }
}

fn ease_out_bounce(t: f64) -> f64 {
    let n1 = 7.5625;
    let d1 = 2.75;

    if t < 1.0 / d1 {
        n1 * t * t
    } else if t < 2.0 / d1 {
        let t = t - 1.5 / d1;
        n1 * t * t + 0.75
    } else if t < 2.5 / d1 {
        let t = t - 2.25 / d1;
        n1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / d1;
        n1 * t * t + 0.984375
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [EasingKind; 15] = [
        EasingKind::Linear,
        EasingKind::QuadIn,
        EasingKind::QuadOut,
        EasingKind::QuadInOut,
        EasingKind::CubicIn,
        EasingKind::CubicOut,
        EasingKind::CubicInOut,
        EasingKind::SineIn,
        EasingKind::SineOut,
        EasingKind::SineInOut,
        EasingKind::BackIn,
        EasingKind::BackOut,
        EasingKind::BackInOut,
        EasingKind::ElasticOut,
        EasingKind::BounceOut,
    ];

    #[test]
    fn every_curve_starts_at_zero_and_ends_at_one() {
        for kind in ALL {
            assert!(ease(kind, 0.0).abs() < 1e-9, "{kind:?} at 0");
            assert!((ease(kind, 1.0) - 1.0).abs() < 1e-9, "{kind:?} at 1");
        }
    }

    #[test]
    fn bounded_curves_stay_in_unit_interval() {
        for kind in ALL.into_iter().filter(|k| !k.overshoots()) {
            for i in 0..=100 {
                let v = ease(kind, i as f64 / 100.0);
                assert!((-1e-9..=1.0 + 1e-9).contains(&v), "{kind:?} gave {v}");
            }
        }
    }

    #[test]
    fn back_out_overshoots_past_one() {
        let peak = (0..=100)
            .map(|i| ease(EasingKind::BackOut, i as f64 / 100.0))
            .fold(f64::MIN, f64::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn input_is_clamped() {
        assert_eq!(ease(EasingKind::Linear, -3.0), 0.0);
        assert_eq!(ease(EasingKind::Linear, 7.0), 1.0);
        assert_eq!(ease(EasingKind::QuadIn, f64::NAN), 0.0);
    }

    #[test]
    fn linear_midpoint() {
        assert_eq!(ease(EasingKind::Linear, 0.5), 0.5);
        assert_eq!(ease(EasingKind::QuadInOut, 0.5), 0.5);
    }

    #[test]
    fn deserializes_from_snake_case() {
        let kind: EasingKind = serde_yaml::from_str("quad_in_out").unwrap();
        assert_eq!(kind, EasingKind::QuadInOut);
    }
}
