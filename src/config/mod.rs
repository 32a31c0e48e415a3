//! Machine and axis configuration.
//!
//! Provides serde-deserializable descriptions of the machine's axes and
//! motion limits, eager validation, and the conversion from a requested
//! move into the speed constraints the planner consumes. TOML parsing is
//! available with the `std` feature.

use heapless::{String, Vec};
use libm::sqrtf;
use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::ticker::TickerConfig;

/// Maximum number of axes a machine description can carry.
pub const MAX_AXES: usize = 8;

/// Mechanical description of one axis.
#[derive(Debug, Clone, Deserialize)]
pub struct AxisConfig {
    /// Human-readable name (max 16 chars).
    pub name: String<16>,

    /// Step events per millimeter of axis travel.
    pub steps_per_mm: f32,

    /// Maximum axis velocity in mm per second.
    #[serde(rename = "max_velocity_mm_per_sec")]
    pub max_velocity: f32,

    /// Maximum axis acceleration in mm per second squared.
    #[serde(rename = "max_acceleration_mm_per_sec2")]
    pub max_acceleration: f32,
}

/// Root machine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineConfig {
    /// Axis descriptions, in ticker axis order.
    pub axes: Vec<AxisConfig, MAX_AXES>,

    /// Cornering tolerance in mm; larger values carry more speed through
    /// direction changes.
    #[serde(default = "default_junction_deviation")]
    pub junction_deviation: f32,

    /// Default move acceleration in mm per second squared, before
    /// per-axis limiting.
    pub acceleration: f32,

    /// Minimum step pulse width in microseconds.
    #[serde(default = "default_pulse_width_us")]
    pub pulse_width_us: u32,
}

fn default_junction_deviation() -> f32 {
    0.05
}

fn default_pulse_width_us() -> u32 {
    2
}

/// Speed constraints for one move, in the dominant-axis step-event
/// domain expected by [`Planner::plan_move`](crate::planner::Planner::plan_move).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveConstraints {
    /// Largest achievable squared speed change across the move.
    pub max_change_speed_sqr: f32,
    /// Squared cruise speed after per-axis velocity limiting.
    pub nominal_speed_sqr: f32,
    /// Squared junction speed cap at the entry of the move.
    pub max_entry_speed_sqr: f32,
}

impl MoveConstraints {
    /// Constraints of a move that covers no distance.
    pub const ZERO: Self = Self {
        max_change_speed_sqr: 0.0,
        nominal_speed_sqr: 0.0,
        max_entry_speed_sqr: 0.0,
    };
}

impl MachineConfig {
    /// Check the configuration against mechanical sanity limits.
    pub fn validate(&self) -> Result<()> {
        if self.axes.is_empty() {
            return Err(ConfigError::NoAxes);
        }
        for (index, axis) in self.axes.iter().enumerate() {
            if self.axes[..index].iter().any(|a| a.name == axis.name) {
                return Err(ConfigError::DuplicateAxisName(axis.name.clone()));
            }
            if !(axis.steps_per_mm > 0.0) {
                return Err(ConfigError::InvalidStepsPerMm(axis.steps_per_mm));
            }
            if !(axis.max_velocity > 0.0) {
                return Err(ConfigError::InvalidMaxVelocity(axis.max_velocity));
            }
            if !(axis.max_acceleration > 0.0) {
                return Err(ConfigError::InvalidMaxAcceleration(axis.max_acceleration));
            }
        }
        if !(self.junction_deviation >= 0.0) {
            return Err(ConfigError::InvalidJunctionDeviation(
                self.junction_deviation,
            ));
        }
        if !(self.acceleration > 0.0) {
            return Err(ConfigError::InvalidAcceleration(self.acceleration));
        }
        if self.pulse_width_us == 0 {
            return Err(ConfigError::InvalidPulseWidth(self.pulse_width_us));
        }
        Ok(())
    }

    /// Parse and validate a machine configuration from TOML.
    #[cfg(feature = "std")]
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            let msg = heapless::String::try_from(e.message()).unwrap_or_default();
            ConfigError::ParseError(msg)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Ticker settings matching this machine for a timer running at
    /// `timer_freq` Hz.
    ///
    /// Planner speeds produced by [`constrain_move`](Self::constrain_move)
    /// are already in step events per second, so no further unit
    /// conversion happens in the ticker. The ticker acceleration is the
    /// machine acceleration scaled by the finest axis resolution, which
    /// bounds the per-move acceleration caps from above so every planned
    /// exit speed stays reachable.
    pub fn ticker_config(&self, timer_freq: f32) -> TickerConfig {
        let max_steps_per_mm = self
            .axes
            .iter()
            .map(|a| a.steps_per_mm)
            .fold(1.0f32, f32::max);
        let pulse_ticks = (self.pulse_width_us as f32 * timer_freq / 1e6) as u32;
        TickerConfig {
            events_per_unit: 1.0,
            acceleration: self.acceleration * max_steps_per_mm,
            pulse_ticks: pulse_ticks.max(1),
        }
    }

    /// Reduce a requested move to planner speed constraints.
    ///
    /// `steps` are per-axis signed step deltas (ticker axis order) and
    /// `speed` is the requested rate of the dominant axis in mm/s.
    /// `previous` is the step vector of the move queued immediately
    /// before, used for the junction speed cap; `None` means the machine
    /// starts this move from rest.
    ///
    /// The nominal speed is lowered until no axis exceeds its maximum
    /// velocity, and the usable acceleration is lowered the same way
    /// before being folded into the achievable speed change.
    pub fn constrain_move(
        &self,
        steps: &[i32],
        speed: f32,
        previous: Option<&[i32]>,
    ) -> MoveConstraints {
        let events = steps.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
        if events == 0 || !(speed > 0.0) {
            return MoveConstraints::ZERO;
        }

        let dominant = steps
            .iter()
            .position(|s| s.unsigned_abs() == events)
            .unwrap_or(0);
        let dominant_steps_per_mm = self
            .axes
            .get(dominant)
            .map(|a| a.steps_per_mm)
            .unwrap_or(1.0);

        // Dominant-axis step rate and acceleration, lowered until every
        // axis stays inside its own limits.
        let mut nominal = speed * dominant_steps_per_mm;
        let mut acc = self.acceleration * dominant_steps_per_mm;
        for (axis, &axis_steps) in self.axes.iter().zip(steps) {
            let share = axis_steps.unsigned_abs() as f32 / events as f32;
            if share > 0.0 {
                nominal = nominal.min(axis.max_velocity * axis.steps_per_mm / share);
                acc = acc.min(axis.max_acceleration * axis.steps_per_mm / share);
            }
        }

        let nominal_speed_sqr = nominal * nominal;
        let max_change_speed_sqr = 2.0 * acc * events as f32;
        let max_entry_speed_sqr = previous
            .map(|prev| {
                let acc_mm = acc / dominant_steps_per_mm;
                let junction_sqr = self.junction_speed_sqr(prev, steps, acc_mm);
                junction_sqr * dominant_steps_per_mm * dominant_steps_per_mm
            })
            .unwrap_or(0.0)
            .min(nominal_speed_sqr);

        MoveConstraints {
            max_change_speed_sqr,
            nominal_speed_sqr,
            max_entry_speed_sqr,
        }
    }

    /// Squared junction speed in mm²/s² allowed between two step vectors
    /// under the configured junction deviation.
    ///
    /// Classic centripetal approximation: the corner is rounded by a
    /// circle that stays within `junction_deviation` of the programmed
    /// path, and the junction speed is the speed of traversing that
    /// circle at acceleration `acc_mm`.
    fn junction_speed_sqr(&self, previous: &[i32], current: &[i32], acc_mm: f32) -> f32 {
        let mut dot = 0.0f32;
        let mut prev_norm_sqr = 0.0f32;
        let mut cur_norm_sqr = 0.0f32;
        for ((axis, &p), &c) in self.axes.iter().zip(previous).zip(current) {
            let p_mm = p as f32 / axis.steps_per_mm;
            let c_mm = c as f32 / axis.steps_per_mm;
            dot += p_mm * c_mm;
            prev_norm_sqr += p_mm * p_mm;
            cur_norm_sqr += c_mm * c_mm;
        }
        if prev_norm_sqr <= 0.0 || cur_norm_sqr <= 0.0 {
            return 0.0;
        }

        let cos_theta = -dot / sqrtf(prev_norm_sqr * cur_norm_sqr);
        if cos_theta > 0.999 {
            // Full reversal; stop at the junction.
            return 0.0;
        }
        if cos_theta < -0.999 {
            // Straight line; the nominal speed cap takes over.
            return f32::MAX;
        }

        let sin_theta_half = sqrtf((1.0 - cos_theta) / 2.0);
        acc_mm * self.junction_deviation * sin_theta_half / (1.0 - sin_theta_half)
    }
}
