//! Robot configuration loading.
//!
//! Every value is fixed after startup; the loaded [`Config`] is shared as an
//! `Arc<Config>` between the binary, the scheduler and the dispatcher.
//!
//! The expected YAML structure is (every section and key is optional):
//! ```yaml
//! robot:
//!   servos_num: 8
//!   tick_ms: 5
//! transitions:
//!   enabled: true
//!   time: 0.5
//! logging:
//!   event_add: true
//!   event_callbacks: false
//!   keyframes: false
//! gait:
//!   step_time: 0.6
//!   pose_time: 0.4
//!   hip_delta: 15.0
//!   knee_delta: 20.0
//!   knee_pad_a: 0.1
//!   knee_pad_b: 0.5
//!   hip_easing: quad_in_out
//!   knee_easing: sine_in_out
//!   max_steps: 100
//! pca9685:
//!   pin_base: 300
//!   max_pwm: 4096
//!   hertz: 50
//! servos:
//!   front_left_hip:
//!     pin: 0
//!     limits: [205, 410]
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, ensure, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::easing::EasingKind;
use crate::robot::channel_index;

/// PWM limits used for a channel without an explicit `limits` entry.
///
/// 1 ms – 2 ms pulses at 50 Hz on a 12-bit PCA9685.
pub const DEFAULT_SERVO_LIMITS: (u16, u16) = (205, 410);

/// Upper bound on `robot.servos_num`.
pub const MAX_SERVOS: usize = 1024;

/// Upper bound on `gait.max_steps`.
pub const MAX_STEPS_LIMIT: u32 = 10_000;

/// Output frequencies the PCA9685 prescaler can produce.
const PCA9685_HERTZ: std::ops::RangeInclusive<u16> = 24..=1526;

// ── Sections ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RobotConfig {
    /// Number of servo channels every keyframe carries.
    pub servos_num: usize,
    /// Scheduler tick interval in milliseconds.
    pub tick_ms: u64,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            servos_num: 8,
            tick_ms: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransitionConfig {
    pub enabled: bool,
    /// Duration of every synthesized transition, in seconds.
    pub time: f64,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            time: 0.5,
        }
    }
}

/// Per-category log gates.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub event_add: bool,
    pub event_callbacks: bool,
    pub keyframes: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            event_add: true,
            event_callbacks: false,
            keyframes: false,
        }
    }
}

/// Parameters of the built-in gait patterns.  Positions are percentages of
/// each servo's travel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GaitConfig {
    /// Duration of one walk / turn / strafe half-cycle, in seconds.
    pub step_time: f64,
    /// Duration of static poses (reset, elevate, extend), in seconds.
    pub pose_time: f64,
    pub hip_delta: f64,
    pub knee_delta: f64,
    /// Hand-over fraction at the end of a half-cycle, while the stance knees
    /// lift.
    pub knee_pad_a: f64,
    /// Fraction at the start of a half-cycle during which swing knees stay
    /// lifted.
    pub knee_pad_b: f64,
    /// Curve of hip sweeps and strafe knee shifts.
    pub hip_easing: EasingKind,
    /// Curve of knee lifts and drops.
    pub knee_easing: EasingKind,
    /// Largest step count a single walk / turn / strafe command may ask for.
    pub max_steps: u32,
}

impl Default for GaitConfig {
    fn default() -> Self {
        Self {
            step_time: 0.6,
            pose_time: 0.4,
            hip_delta: 15.0,
            knee_delta: 20.0,
            knee_pad_a: 0.1,
            knee_pad_b: 0.5,
            hip_easing: EasingKind::QuadInOut,
            knee_easing: EasingKind::SineInOut,
            max_steps: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Pca9685Config {
    /// First virtual pin of the PWM expander.
    pub pin_base: u16,
    /// Upper bound on any PWM tick value written.
    pub max_pwm: u16,
    /// PWM frequency; together with `max_pwm` it fixes the tick length.
    pub hertz: u16,
}

impl Default for Pca9685Config {
    fn default() -> Self {
        Self {
            pin_base: 300,
            max_pwm: 4096,
            hertz: 50,
        }
    }
}

/// One `servos:` entry as it appears in the YAML file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServoEntry {
    pub pin: Option<u16>,
    pub limits: Option<(u16, u16)>,
}

/// Resolved output settings for one servo channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoChannel {
    pub pin: u16,
    pub min: u16,
    pub max: u16,
}

// ── Config ────────────────────────────────────────────────────────────────────

/// Complete, validated robot configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub robot: RobotConfig,
    pub transitions: TransitionConfig,
    pub logging: LoggingConfig,
    pub gait: GaitConfig,
    pub pca9685: Pca9685Config,
    /// Channel name → pin / limit overrides.
    pub servos: BTreeMap<String, ServoEntry>,
}

impl Config {
    /// Parses and validates `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid YAML, or
    /// fails [`validate`](Self::validate).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading robot configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        let config = Self::from_yaml(&content)
            .with_context(|| format!("Invalid configuration file: {}", path.display()))?;

        info!(
            servos_num = config.robot.servos_num,
            tick_ms = config.robot.tick_ms,
            transitions = config.transitions.enabled,
            transition_time = config.transitions.time,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file is a valid "all defaults" configuration.
        let config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(content).context("Failed to parse YAML")?
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.robot.servos_num > 0, "robot.servos_num must be > 0");
        ensure!(
            self.robot.servos_num <= MAX_SERVOS,
            "robot.servos_num must be <= {MAX_SERVOS}, got {}",
            self.robot.servos_num
        );
        ensure!(self.robot.tick_ms > 0, "robot.tick_ms must be > 0");
        ensure!(
            self.transitions.time.is_finite() && self.transitions.time >= 0.0,
            "transitions.time must be a non-negative number, got {}",
            self.transitions.time
        );

        let gait = &self.gait;
        for (name, value) in [("gait.step_time", gait.step_time), ("gait.pose_time", gait.pose_time)] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "{name} must be a non-negative number, got {value}"
            );
        }
        for (name, value) in [("gait.knee_pad_a", gait.knee_pad_a), ("gait.knee_pad_b", gait.knee_pad_b)] {
            ensure!(
                (0.0..=1.0).contains(&value),
                "{name} must be within [0, 1], got {value}"
            );
        }
        ensure!(
            gait.hip_delta.is_finite() && gait.knee_delta.is_finite(),
            "gait deltas must be finite"
        );
        ensure!(
            (1..=MAX_STEPS_LIMIT).contains(&gait.max_steps),
            "gait.max_steps must be within [1, {MAX_STEPS_LIMIT}], got {}",
            gait.max_steps
        );
        ensure!(
            PCA9685_HERTZ.contains(&self.pca9685.hertz),
            "pca9685.hertz must be within [{}, {}], got {}",
            PCA9685_HERTZ.start(),
            PCA9685_HERTZ.end(),
            self.pca9685.hertz
        );
        ensure!(self.pca9685.max_pwm > 0, "pca9685.max_pwm must be > 0");

        for (name, entry) in &self.servos {
            let Some(index) = channel_index(name) else {
                bail!("unknown servo channel '{name}'");
            };
            ensure!(
                index < self.robot.servos_num,
                "servo channel '{name}' (index {index}) exceeds robot.servos_num = {}",
                self.robot.servos_num
            );
            if let Some((min, max)) = entry.limits {
                ensure!(min <= max, "servo '{name}' limits are inverted: {min}-{max}");
                ensure!(
                    max <= self.pca9685.max_pwm,
                    "servo '{name}' limit {max} exceeds pca9685.max_pwm = {}",
                    self.pca9685.max_pwm
                );
            }
        }

        Ok(())
    }

    /// Scheduler / dispatcher tick interval.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.robot.tick_ms)
    }

    /// Resolves pins and limits for every configured channel.
    ///
    /// Channels without an entry use pin = channel index and
    /// [`DEFAULT_SERVO_LIMITS`].
    pub fn servo_channels(&self) -> Vec<ServoChannel> {
        let mut channels: Vec<ServoChannel> = (0..self.robot.servos_num)
            .map(|i| ServoChannel {
                pin: u16::try_from(i).unwrap_or(u16::MAX),
                min: DEFAULT_SERVO_LIMITS.0,
                max: DEFAULT_SERVO_LIMITS.1,
            })
            .collect();

        for (name, entry) in &self.servos {
            let Some(channel) = channel_index(name).and_then(|i| channels.get_mut(i)) else {
                continue;
            };
            if let Some(pin) = entry.pin {
                channel.pin = pin;
            }
            if let Some((min, max)) = entry.limits {
                channel.min = min;
                channel.max = max;
            }
            debug!(
                servo = %name,
                pin = channel.pin,
                min = channel.min,
                max = channel.max,
                "servo channel override"
            );
        }

        channels
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn load_full_yaml() {
        let yaml = r#"
robot:
  servos_num: 8
  tick_ms: 10
transitions:
  enabled: false
  time: 0.25
logging:
  event_add: false
  keyframes: true
gait:
  step_time: 1.0
  knee_pad_a: 0.2
  knee_easing: back_out
pca9685:
  pin_base: 100
servos:
  front_left_hip:
    pin: 7
    limits: [150, 450]
  back_right_knee:
    limits: [210, 400]
"#;
        let f = yaml_tempfile(yaml);
        let cfg = Config::load_from_file(f.path()).unwrap();

        assert_eq!(cfg.robot.tick_ms, 10);
        assert_eq!(cfg.tick(), Duration::from_millis(10));
        assert!(!cfg.transitions.enabled);
        assert_eq!(cfg.transitions.time, 0.25);
        assert!(!cfg.logging.event_add);
        assert!(!cfg.logging.event_callbacks);
        assert!(cfg.logging.keyframes);
        assert_eq!(cfg.gait.step_time, 1.0);
        assert_eq!(cfg.gait.knee_pad_a, 0.2);
        assert_eq!(cfg.gait.knee_pad_b, 0.5); // default
        assert_eq!(cfg.gait.knee_easing, EasingKind::BackOut);
        assert_eq!(cfg.gait.hip_easing, EasingKind::QuadInOut); // default
        assert_eq!(cfg.pca9685.pin_base, 100);
        assert_eq!(cfg.pca9685.hertz, 50); // default

        let channels = cfg.servo_channels();
        assert_eq!(channels.len(), 8);
        assert_eq!(channels[0], ServoChannel { pin: 7, min: 150, max: 450 });
        assert_eq!(channels[7], ServoChannel { pin: 7, min: 210, max: 400 });
        assert_eq!(
            channels[3],
            ServoChannel { pin: 3, min: DEFAULT_SERVO_LIMITS.0, max: DEFAULT_SERVO_LIMITS.1 }
        );
    }

    #[test]
    fn empty_file_yields_defaults() {
        let f = yaml_tempfile("");
        let cfg = Config::load_from_file(f.path()).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.robot.servos_num, 8);
        assert!(cfg.transitions.enabled);
    }

    #[test]
    fn missing_file_returns_error() {
        let result = Config::load_from_file(Path::new("/nonexistent/path/peabot.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        assert!(Config::load_from_file(f.path()).is_err());
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(Config::from_yaml("robot:\n  servo_count: 8\n").is_err());
    }

    #[test]
    fn zero_servos_is_rejected() {
        let err = Config::from_yaml("robot:\n  servos_num: 0\n").unwrap_err();
        assert!(err.to_string().contains("servos_num"));
    }

    #[test]
    fn negative_transition_time_is_rejected() {
        assert!(Config::from_yaml("transitions:\n  time: -1.0\n").is_err());
    }

    #[test]
    fn pad_out_of_range_is_rejected() {
        assert!(Config::from_yaml("gait:\n  knee_pad_b: 1.5\n").is_err());
    }

    #[test]
    fn unknown_servo_name_is_rejected() {
        let err = Config::from_yaml("servos:\n  tail:\n    pin: 1\n").unwrap_err();
        assert!(err.to_string().contains("tail"));
    }

    #[test]
    fn inverted_limits_are_rejected() {
        let yaml = "servos:\n  front_left_knee:\n    limits: [400, 200]\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn servo_beyond_servos_num_is_rejected() {
        let yaml = "robot:\n  servos_num: 4\nservos:\n  back_right_knee:\n    pin: 1\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn sample_configuration_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../demos/peabot.yaml");
        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.servos.len(), 8);
        assert_eq!(config.servo_channels()[7].pin, 7);
        assert!(config.logging.keyframes);
    }

    #[test]
    fn servos_num_above_cap_is_rejected() {
        let yaml = format!("robot:\n  servos_num: {}\n", MAX_SERVOS + 1);
        let err = Config::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("servos_num"));
        assert!(Config::from_yaml(&format!("robot:\n  servos_num: {MAX_SERVOS}\n")).is_ok());
    }

    #[test]
    fn max_steps_must_be_bounded() {
        assert_eq!(Config::default().gait.max_steps, 100);
        assert!(Config::from_yaml("gait:\n  max_steps: 0\n").is_err());
        assert!(Config::from_yaml("gait:\n  max_steps: 4000000000\n").is_err());
        let cfg = Config::from_yaml("gait:\n  max_steps: 8\n").unwrap();
        assert_eq!(cfg.gait.max_steps, 8);
    }

    #[test]
    fn hertz_outside_prescaler_range_is_rejected() {
        assert!(Config::from_yaml("pca9685:\n  hertz: 0\n").is_err());
        assert!(Config::from_yaml("pca9685:\n  hertz: 2000\n").is_err());
        assert!(Config::from_yaml("pca9685:\n  hertz: 60\n").is_ok());
    }
}
