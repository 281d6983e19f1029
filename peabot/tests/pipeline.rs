/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! End-to-end tests: dispatcher thread → scheduler thread → actuator driver.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use peabot::config::Config;
use peabot::dispatcher::{EventDispatcher, EventKind};
use peabot::factory::{GaitFactory, KeyframeFactory, NEUTRAL};
use peabot::keyframe::{KeyframeKind, Payload};
use peabot::robot::{channel, ActuatorDriver, Joint, Leg, ServoBank};
use peabot::scheduler::KeyframeScheduler;

// ── Helpers ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingDriver {
    writes: Mutex<Vec<(usize, f64)>>,
}

impl RecordingDriver {
    fn count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    fn last(&self, index: usize) -> Option<f64> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(i, _)| *i == index)
            .map(|&(_, p)| p)
    }

    fn all_finite(&self) -> bool {
        self.writes.lock().unwrap().iter().all(|(_, p)| p.is_finite())
    }
}

impl ActuatorDriver for RecordingDriver {
    fn set_actuator(&self, index: usize, position: f64) {
        self.writes.lock().unwrap().push((index, position));
    }
}

fn fast_config(transitions: bool) -> Config {
    let mut config = Config::default();
    config.robot.tick_ms = 1;
    config.transitions.enabled = transitions;
    config.transitions.time = 0.02;
    config.gait.pose_time = 0.03;
    config.gait.step_time = 0.03;
    config.logging.keyframes = true;
    config
}

struct Pipeline {
    scheduler: Arc<KeyframeScheduler>,
    dispatcher: EventDispatcher,
}

impl Pipeline {
    fn start(config: Config, driver: Arc<dyn ActuatorDriver>) -> Self {
        let config = Arc::new(config);
        let factory: Arc<dyn KeyframeFactory> = Arc::new(GaitFactory::new(config.gait.clone()));
        let scheduler = Arc::new(KeyframeScheduler::new(Arc::clone(&config), factory, driver));
        let dispatcher = EventDispatcher::new(Arc::clone(&scheduler), config.logging, config.tick());

        scheduler.start().unwrap();
        dispatcher.start().unwrap();
        Self {
            scheduler,
            dispatcher,
        }
    }

    fn stop(&self) {
        self.dispatcher.stop();
        self.scheduler.stop();
    }
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn reset_lands_every_servo_on_neutral() {
    let driver = Arc::new(RecordingDriver::default());
    let pipeline = Pipeline::start(fast_config(true), driver.clone());

    assert!(pipeline.dispatcher.enqueue_command("reset"));
    assert!(wait_for(|| driver.count() > 0 && pipeline.scheduler.pending() == 0));
    // joining the scheduler guarantees the final pose write has happened
    pipeline.stop();

    for index in 0..8 {
        assert_eq!(driver.last(index), Some(NEUTRAL), "channel {index}");
    }
}

#[test]
fn commands_play_in_order_and_finish_on_the_last_pose() {
    let driver = Arc::new(RecordingDriver::default());
    let pipeline = Pipeline::start(fast_config(true), driver.clone());

    for command in ["reset", "walk:1", "elevate:0.8"] {
        assert!(pipeline.dispatcher.enqueue_command(command));
    }
    // each command is bridged from the pose before it
    let knees_raised = || {
        Leg::ALL.iter().all(|&leg| {
            driver
                .last(channel(leg, Joint::Knee))
                .is_some_and(|knee| close(knee, 80.0))
        })
    };
    assert!(wait_for(|| knees_raised() && pipeline.scheduler.pending() == 0));
    pipeline.stop();

    for leg in Leg::ALL {
        let hip = driver.last(channel(leg, Joint::Hip)).unwrap();
        let knee = driver.last(channel(leg, Joint::Knee)).unwrap();
        assert!(close(hip, NEUTRAL), "{leg} hip at {hip}");
        assert!(close(knee, 80.0), "{leg} knee at {knee}");
    }
    assert!(driver.all_finite());
}

#[test]
fn clear_all_drops_queued_keyframes_without_output() {
    let driver = Arc::new(RecordingDriver::default());
    let pipeline = Pipeline::start(fast_config(true), driver.clone());

    // A long delay at the head keeps everything behind it waiting.
    pipeline
        .scheduler
        .enqueue_keyframe(KeyframeKind::Delay, Payload::Seconds(60.0), false, false);
    pipeline.dispatcher.enqueue_event(EventKind::Reset, Payload::None);
    pipeline.dispatcher.enqueue_event(EventKind::Elevate, Payload::Level(0.5));
    // delay, then reset and elevate each behind a transition
    assert!(wait_for(|| pipeline.scheduler.pending() == 5));

    pipeline.scheduler.clear_all();
    assert!(wait_for(|| pipeline.scheduler.pending() == 0));
    pipeline.stop();

    assert_eq!(driver.count(), 0);
}

#[test]
fn invalid_commands_are_ignored_and_the_pipeline_keeps_running() {
    let driver = Arc::new(RecordingDriver::default());
    let pipeline = Pipeline::start(fast_config(false), driver.clone());

    assert!(!pipeline.dispatcher.enqueue_command("backflip"));
    pipeline.dispatcher.enqueue_event(EventKind::Elevate, Payload::Level(7.0));
    pipeline.dispatcher.enqueue_event(EventKind::Delay, Payload::Seconds(f64::NAN));
    pipeline.dispatcher.enqueue_event(EventKind::Extend, Payload::Level(1.0));

    assert!(wait_for(|| driver.count() > 0 && pipeline.scheduler.pending() == 0));
    assert!(pipeline.dispatcher.is_running());
    assert!(pipeline.scheduler.is_running());
    pipeline.stop();

    let left = driver.last(channel(Leg::FrontLeft, Joint::Hip)).unwrap();
    let right = driver.last(channel(Leg::FrontRight, Joint::Hip)).unwrap();
    assert!(close(left, 0.0), "left hip at {left}");
    assert!(close(right, 100.0), "right hip at {right}");
}

#[test]
fn servo_bank_holds_neutral_ticks_after_reset() {
    let config = fast_config(false);
    let bank = Arc::new(ServoBank::new(&config));
    let pipeline = Pipeline::start(config, bank.clone());

    pipeline.dispatcher.enqueue_command("reset");
    assert!(wait_for(|| {
        pipeline.scheduler.pending() == 0 && bank.ticks().iter().all(Option::is_some)
    }));
    pipeline.stop();

    // default limits 205..410, 50 % → 307.5 rounded
    assert!(bank.ticks().iter().all(|t| *t == Some(308)));
}
