/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Event dispatcher: turns high-level robot commands into keyframes.
//!
//! Producers push [`Event`]s with [`EventDispatcher::enqueue_event`] (or as
//! text through [`EventDispatcher::enqueue_command`]).  A dedicated
//! `peabot-events` thread receives them one at a time and runs the matching
//! handler from [`handlers`], which in turn calls
//! [`KeyframeScheduler::enqueue_keyframe`].
//!
//! The event queue is an `mpsc` channel.  The receiver lives in the worker
//! thread while it runs and is handed back on [`stop`](EventDispatcher::stop),
//! so events queued before `start` or after `stop` are kept, not lost.

pub mod handlers;

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::LoggingConfig;
use crate::keyframe::Payload;
use crate::scheduler::{ClearOnExit, KeyframeScheduler};

// ── Events ────────────────────────────────────────────────────────────────────

/// High-level command categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Reset,
    Delay,
    Elevate,
    Walk,
    Turn,
    Strafe,
    Extend,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::Reset,
        EventKind::Delay,
        EventKind::Elevate,
        EventKind::Walk,
        EventKind::Turn,
        EventKind::Strafe,
        EventKind::Extend,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EventKind::Reset => "reset",
            EventKind::Delay => "delay",
            EventKind::Elevate => "elevate",
            EventKind::Walk => "walk",
            EventKind::Turn => "turn",
            EventKind::Strafe => "strafe",
            EventKind::Extend => "extend",
        }
    }

    /// Case-insensitive lookup; `None` for anything unrecognised.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One queued command.  Dropped, payload included, once its handler returns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub payload: Payload,
}

impl Event {
    pub fn new(kind: EventKind, payload: Payload) -> Self {
        Self { kind, payload }
    }
}

/// Why a `name[:arg]` command string could not be turned into an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    UnknownName(String),

    #[error("{kind} needs an argument")]
    MissingArgument { kind: EventKind },

    #[error("{kind} takes no argument")]
    UnexpectedArgument { kind: EventKind },

    #[error("invalid {kind} argument '{arg}'")]
    InvalidArgument { kind: EventKind, arg: String },
}

impl FromStr for Event {
    type Err = CommandError;

    /// Parses `reset`, `delay:<seconds>`, `elevate:<level>`,
    /// `extend:<level>`, and `walk|turn|strafe[:<steps>]` (one step when the
    /// count is omitted).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name, Some(arg.trim())),
            None => (s, None),
        };
        let kind =
            EventKind::from_name(name).ok_or_else(|| CommandError::UnknownName(name.trim().to_string()))?;

        let invalid = |arg: &str| CommandError::InvalidArgument {
            kind,
            arg: arg.to_string(),
        };

        let payload = match (kind, arg) {
            (EventKind::Reset, None) => Payload::None,
            (EventKind::Reset, Some(_)) => return Err(CommandError::UnexpectedArgument { kind }),

            (EventKind::Delay | EventKind::Elevate | EventKind::Extend, None) => {
                return Err(CommandError::MissingArgument { kind })
            }
            (EventKind::Delay, Some(arg)) => {
                Payload::Seconds(arg.parse().map_err(|_| invalid(arg))?)
            }
            (EventKind::Elevate | EventKind::Extend, Some(arg)) => {
                Payload::Level(arg.parse().map_err(|_| invalid(arg))?)
            }

            (EventKind::Walk | EventKind::Turn | EventKind::Strafe, None) => Payload::Steps(1),
            (EventKind::Walk | EventKind::Turn | EventKind::Strafe, Some(arg)) => {
                Payload::Steps(arg.parse().map_err(|_| invalid(arg))?)
            }
        };

        Ok(Event::new(kind, payload))
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors returned by [`EventDispatcher::start()`].
#[derive(Debug, Error)]
pub enum DispatcherError {
    #[error("event dispatcher is already running")]
    AlreadyRunning,

    /// The OS refused to create the dispatcher thread.
    #[error("could not spawn event dispatcher thread: {0}")]
    Spawn(#[source] std::io::Error),
}

// ── EventDispatcher ───────────────────────────────────────────────────────────

pub struct EventDispatcher {
    scheduler: Arc<KeyframeScheduler>,
    logging: LoggingConfig,
    /// Longest the worker blocks waiting for an event before re-checking its
    /// run flag.
    tick: Duration,
    sender: Sender<Event>,
    /// `Some` while stopped; the worker owns it while running.
    receiver: Mutex<Option<Receiver<Event>>>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<Receiver<Event>>>>,
}

impl EventDispatcher {
    pub fn new(scheduler: Arc<KeyframeScheduler>, logging: LoggingConfig, tick: Duration) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            scheduler,
            logging,
            tick,
            sender,
            receiver: Mutex::new(Some(receiver)),
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    /// Spawns the `peabot-events` worker thread.
    ///
    /// # Errors
    /// [`DispatcherError::AlreadyRunning`] if started twice,
    /// [`DispatcherError::Spawn`] if the OS refuses the thread.
    pub fn start(&self) -> Result<(), DispatcherError> {
        let mut handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if handle.is_some() {
            return Err(DispatcherError::AlreadyRunning);
        }
        let mut slot = self.receiver.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(receiver) = slot.take() else {
            return Err(DispatcherError::AlreadyRunning);
        };

        self.running.store(true, Ordering::Release);
        let worker = Worker {
            scheduler: Arc::clone(&self.scheduler),
            logging: self.logging,
            tick: self.tick,
            running: Arc::clone(&self.running),
        };

        // A spawn failure drops the receiver with the closure; the process
        // is expected to exit on it.
        let spawned = thread::Builder::new()
            .name("peabot-events".to_string())
            .spawn(move || worker.run(receiver));

        match spawned {
            Ok(h) => {
                *handle = Some(h);
                info!(tick_ms = self.tick.as_millis() as u64, "event dispatcher started");
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::Release);
                Err(DispatcherError::Spawn(e))
            }
        }
    }

    /// Clears the run flag and joins the worker.  The in-flight handler is
    /// allowed to finish; events still queued stay queued for a later start.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(h) = handle {
            match h.join() {
                Ok(receiver) => {
                    *self.receiver.lock().unwrap_or_else(PoisonError::into_inner) = Some(receiver);
                    info!("event dispatcher stopped");
                }
                Err(_) => error!("event dispatcher thread panicked; queued events lost"),
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Queues one event for the worker thread.  Never blocks.
    pub fn enqueue_event(&self, kind: EventKind, payload: Payload) {
        if self.logging.event_add {
            info!(event = %kind, payload = %payload, "[EVNT] added event");
        }
        if self.sender.send(Event::new(kind, payload)).is_err() {
            warn!(event = %kind, "event queue closed, event dropped");
        }
    }

    /// Parses a `name[:arg]` command and queues it.  Unrecognised or
    /// malformed commands are ignored; returns whether anything was queued.
    pub fn enqueue_command(&self, command: &str) -> bool {
        match command.parse::<Event>() {
            Ok(event) => {
                self.enqueue_event(event.kind, event.payload);
                true
            }
            Err(e) => {
                debug!(command, error = %e, "command ignored");
                false
            }
        }
    }
}

impl Drop for EventDispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Worker ────────────────────────────────────────────────────────────────────

/// Everything the worker thread needs, moved into it at start.
struct Worker {
    scheduler: Arc<KeyframeScheduler>,
    logging: LoggingConfig,
    tick: Duration,
    running: Arc<AtomicBool>,
}

impl Worker {
    fn run(self, receiver: Receiver<Event>) -> Receiver<Event> {
        let _running = ClearOnExit(self.running.as_ref());
        debug!("event loop entered");
        while self.running.load(Ordering::Acquire) {
            let event = match receiver.recv_timeout(self.tick) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };

            if self.logging.event_callbacks {
                info!(event = %event.kind, payload = %event.payload, "[EVNT] running handler");
            }
            let queued = handlers::handle(&self.scheduler, event);
            debug!(event = %event.kind, queued, "event handled");
        }
        debug!("event loop exited");
        receiver
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
