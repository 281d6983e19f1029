/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Keyframe scheduler for Peabot.
//!
//! [`KeyframeScheduler`] owns the animation queue and LastPose, and runs a
//! dedicated timing thread that plays queued [`Keyframe`]s against an
//! [`ActuatorDriver`] once per tick.
//!
//! ```text
//! enqueue_keyframe ──► factory ──► (transition) ──► queue ──► Playback::step ──► mapper ──► driver
//!                                                      ▲
//! clear_all ──► clear flag ────────────────────────────┘ (drained on the scheduler's own tick)
//! ```
//!
//! # Design decisions
//!
//! | Topic | Decision |
//! |---|---|
//! | Queue order | FIFO (`VecDeque::push_back` / `pop_front`) |
//! | Queue + LastPose | one `Mutex<Animation>` so enqueue is serialized across producer threads |
//! | Clear-all | `AtomicBool` request consumed only by [`Playback::step`] |
//! | Completion boundary | `elapsed >= duration` completes on the same tick |
//! | Completion output | the final pose is written before the keyframe is dropped |
//! | Tick rate | `robot.tick_ms` sleep between iterations |
//! | Initial LastPose | every channel holding `NEUTRAL`, so the first pose is bridged too |
//! | Transition failure | logged, destination keyframe still queued |
//! | Thread exit | run flag cleared on any exit, panics included |
//!
//! # Example
//! ```rust,ignore
//! let scheduler = KeyframeScheduler::new(config, Arc::new(GaitFactory::new(gait)), driver);
//! scheduler.start()?;
//! scheduler.enqueue_keyframe(KeyframeKind::Walk, Payload::Steps(1), false, false);
//! scheduler.stop();
//! ```

pub mod error;
pub mod mapper;
pub mod transition;

pub use error::{FactoryError, SchedulerError, TransitionError};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::factory::{KeyframeFactory, NEUTRAL};
use crate::keyframe::{Keyframe, KeyframeKind, Payload, ServoPos};
use crate::robot::ActuatorDriver;

use mapper::map_position;

// ── Shared state ──────────────────────────────────────────────────────────────

/// Queue and LastPose, always locked together.
#[derive(Debug)]
struct Animation {
    queue: VecDeque<Keyframe>,
    /// Most recently *scheduled* keyframe; source of the next transition.
    last_pose: Keyframe,
}

impl Animation {
    /// Empty queue, LastPose assumed at rest on `NEUTRAL`.
    fn at_rest(servos: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            last_pose: Keyframe::new(0.0, vec![ServoPos::hold(NEUTRAL); servos]),
        }
    }
}

/// State shared between the scheduler handle, producers and the timing thread.
struct Shared {
    config: Arc<Config>,
    factory: Arc<dyn KeyframeFactory>,
    driver: Arc<dyn ActuatorDriver>,
    animation: Mutex<Animation>,
    clear_requested: AtomicBool,
    running: AtomicBool,
}

impl Shared {
    /// Locks the animation state, recovering from a poisoned lock: a panic in
    /// a producer must not stop the robot from being driven.
    fn animation(&self) -> MutexGuard<'_, Animation> {
        self.animation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, keyframe: &Keyframe, elapsed: f64) {
        for (index, servo) in keyframe.channels.iter().enumerate() {
            let position = map_position(elapsed, keyframe.duration, servo);
            self.driver.set_actuator(index, position);
        }
    }
}

// ── KeyframeScheduler ─────────────────────────────────────────────────────────

/// Owner of the animation queue and the keyframe timing thread.
pub struct KeyframeScheduler {
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl KeyframeScheduler {
    /// Creates a stopped scheduler.  LastPose starts as every servo holding
    /// `NEUTRAL`, so even the first keyframe is bridged from a known pose.
    pub fn new(
        config: Arc<Config>,
        factory: Arc<dyn KeyframeFactory>,
        driver: Arc<dyn ActuatorDriver>,
    ) -> Self {
        let animation = Animation::at_rest(config.robot.servos_num);
        Self {
            shared: Arc::new(Shared {
                config,
                factory,
                driver,
                animation: Mutex::new(animation),
                clear_requested: AtomicBool::new(false),
                running: AtomicBool::new(false),
            }),
            handle: Mutex::new(None),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Spawns the timing thread.
    ///
    /// # Errors
    /// [`SchedulerError::AlreadyRunning`] if started twice,
    /// [`SchedulerError::Spawn`] if the OS refuses the thread.
    pub fn start(&self) -> Result<(), SchedulerError> {
        let mut handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if handle.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.shared.running.store(true, Ordering::Release);
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("peabot-keyframes".to_string())
            .spawn(move || run(shared));

        match spawned {
            Ok(h) => {
                *handle = Some(h);
                info!(
                    tick_ms = self.shared.config.robot.tick_ms,
                    servos = self.shared.config.robot.servos_num,
                    "keyframe scheduler started"
                );
                Ok(())
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                Err(SchedulerError::Spawn(e))
            }
        }
    }

    /// Clears the run flag and blocks until the timing thread has finished
    /// its current tick.  A no-op when not running.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::Release);
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(h) = handle {
            if h.join().is_err() {
                error!("keyframe scheduler thread panicked");
            } else {
                info!("keyframe scheduler stopped");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    // ── Producer API ──────────────────────────────────────────────────────────

    /// Builds a `kind` keyframe from `payload` and queues it, preceded by a
    /// transition from LastPose unless `kind` is a delay, transitions are
    /// disabled, or `skip_transitions` is set.
    ///
    /// Returns `false` when the factory rejected the command; callers treat
    /// commands as fire-and-forget and may ignore the result.
    pub fn enqueue_keyframe(
        &self,
        kind: KeyframeKind,
        payload: Payload,
        reverse: bool,
        skip_transitions: bool,
    ) -> bool {
        let config = &self.shared.config;
        let channels = config.robot.servos_num;

        let keyframe = match self.shared.factory.build(kind, channels, payload, reverse) {
            Ok(k) => k,
            Err(e) => {
                debug!(kind = %kind, payload = %payload, error = %e, "command dropped");
                return false;
            }
        };
        if !keyframe.is_delay && keyframe.channels.len() != channels {
            warn!(
                kind = %kind,
                expected = channels,
                got = keyframe.channels.len(),
                "factory returned wrong channel count, command dropped"
            );
            return false;
        }

        let transitions = &config.transitions;
        let mut animation = self.shared.animation();

        if kind != KeyframeKind::Delay && transitions.enabled && !skip_transitions {
            match transition::synthesize(&animation.last_pose, &keyframe, transitions.time) {
                Ok(bridge) => animation.queue.push_back(bridge),
                Err(e) => debug!(kind = %kind, reason = %e, "transition skipped"),
            }
        }

        animation.last_pose.record(&keyframe);
        animation.queue.push_back(keyframe);

        debug!(
            kind = %kind,
            reverse,
            queued = animation.queue.len(),
            "keyframe queued"
        );
        true
    }

    /// Requests that every queued keyframe be dropped.  The queue is drained
    /// by the timing thread on its next tick, never by the caller.
    pub fn clear_all(&self) {
        self.shared.clear_requested.store(true, Ordering::Release);
    }

    /// Number of keyframes currently queued, including the one playing.
    pub fn pending(&self) -> usize {
        self.shared.animation().queue.len()
    }

    /// Snapshot of the most recently scheduled pose.
    pub fn last_pose(&self) -> Keyframe {
        self.shared.animation().last_pose.clone()
    }

    /// Snapshot of the queued keyframes, head first.
    pub fn queued(&self) -> Vec<Keyframe> {
        self.shared.animation().queue.iter().cloned().collect()
    }

    /// A playback cursor over this scheduler's queue, for driving ticks by
    /// hand.  The timing thread must not be started while it is in use.
    ///
    /// # Errors
    /// [`SchedulerError::AlreadyRunning`] while the timing thread owns the
    /// clock.
    pub fn playback(&self) -> Result<Playback, SchedulerError> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }
        Ok(Playback::new(Arc::clone(&self.shared)))
    }
}

impl Drop for KeyframeScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Playback ──────────────────────────────────────────────────────────────────

/// What one scheduler tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    /// A clear-all request was honoured; `dropped` keyframes were discarded.
    Cleared { dropped: usize },
    /// Nothing queued; servos keep their last commanded position.
    Idle,
    /// The head is a delay still running; no output.
    Holding,
    /// Every channel of the head keyframe was written.
    Applied,
    /// The head keyframe reached its duration and was removed.
    Completed(Keyframe),
}

/// The scheduler's clock and per-tick logic, separate from the thread so it
/// can be stepped deterministically.
pub struct Playback {
    shared: Arc<Shared>,
    /// Seconds spent in the current head keyframe.
    elapsed: f64,
}

impl Playback {
    fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            elapsed: 0.0,
        }
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Advances the clock by `delta` seconds and runs one tick.
    pub fn step(&mut self, delta: f64) -> Tick {
        self.elapsed += delta;
        let shared = &self.shared;

        if shared.clear_requested.swap(false, Ordering::AcqRel) {
            let dropped = {
                let mut animation = shared.animation();
                let n = animation.queue.len();
                animation.queue.clear();
                n
            };
            self.elapsed = 0.0;
            info!(dropped, "all keyframes cleared");
            return Tick::Cleared { dropped };
        }

        let mut animation = shared.animation();
        let Some(head) = animation.queue.front() else {
            self.elapsed = 0.0;
            return Tick::Idle;
        };

        if self.elapsed >= head.duration || !head.duration.is_finite() {
            let Some(done) = animation.queue.pop_front() else {
                return Tick::Idle;
            };
            drop(animation);

            // Land exactly on the end pose before moving on.
            if done.drives_servos() {
                shared.apply(&done, done.duration);
            }
            if shared.config.logging.keyframes {
                info!(
                    duration = done.duration,
                    is_delay = done.is_delay,
                    "[KYFR] completed keyframe"
                );
            }
            self.elapsed = 0.0;
            return Tick::Completed(done);
        }

        if !head.drives_servos() {
            return Tick::Holding;
        }

        // Positions are computed under the lock, written after releasing it.
        let positions: Vec<f64> = head
            .channels
            .iter()
            .map(|servo| map_position(self.elapsed, head.duration, servo))
            .collect();
        drop(animation);

        for (index, position) in positions.into_iter().enumerate() {
            shared.driver.set_actuator(index, position);
        }
        Tick::Applied
    }
}

/// Clears a run flag when dropped, so a thread that unwinds out of its loop
/// is never reported as running.
pub(crate) struct ClearOnExit<'a>(pub(crate) &'a AtomicBool);

impl Drop for ClearOnExit<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Body of the timing thread.
fn run(shared: Arc<Shared>) {
    let _running = ClearOnExit(&shared.running);
    let tick = shared.config.tick();
    let mut playback = Playback::new(Arc::clone(&shared));
    let mut last = Instant::now();

    debug!(tick_ms = tick.as_millis() as u64, "keyframe loop entered");
    while shared.running.load(Ordering::Acquire) {
        let now = Instant::now();
        let delta = now.duration_since(last).as_secs_f64();
        last = now;

        playback.step(delta);
        thread::sleep(tick);
    }
    debug!("keyframe loop exited");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
