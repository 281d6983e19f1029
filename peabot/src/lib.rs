/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Peabot: event dispatcher and keyframe scheduler for a quadruped servo robot.
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── config/       – YAML robot configuration
//! ├── keyframe      – Keyframe, ServoPos, KeyframeKind, Payload
//! ├── easing        – easing curves
//! ├── robot/        – leg/joint channel layout, ActuatorDriver, ServoBank
//! ├── factory/      – KeyframeFactory trait and the quadruped GaitFactory
//! ├── scheduler/    – KeyframeScheduler, position mapper, transitions
//! └── dispatcher/   – EventDispatcher, events and their handlers
//! ```

pub mod config;
pub mod dispatcher;
pub mod easing;
pub mod factory;
pub mod keyframe;
pub mod robot;
pub mod scheduler;
