//! Step/dir pin driver over embedded-hal 1.0.

use embedded_hal::digital::{InputPin, OutputPin};

use super::Stepper;

/// Power and stepping state of one motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepperState {
    /// Motor power is off.
    Disabled,
    /// Motor power is on, reacting to steps.
    Active,
    /// Between `step()` and `unstep()`.
    Stepping,
    /// Motor power is on, not reacting to steps (endstop hit).
    Stopped,
}

/// Stepper motor driver tracking absolute position in steps.
///
/// Generic over embedded-hal `OutputPin` types for the STEP, DIR and
/// ENABLE lines plus an `InputPin` endstop. An endstop triggering during
/// a step is surfaced as the [`StepperState::Stopped`] state transition,
/// never as an error; the ticker keeps running and higher layers decide
/// what to do about the stalled axis.
pub struct StepDirStepper<STEP, DIR, EN, STOP>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    STOP: InputPin,
{
    step_pin: STEP,
    dir_pin: DIR,
    enable_pin: EN,
    endstop_pin: STOP,

    position: i32,
    state: StepperState,
    direction_positive: bool,
    invert_direction: bool,
    stop_on_endstop: bool,
}

impl<STEP, DIR, EN, STOP> StepDirStepper<STEP, DIR, EN, STOP>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    STOP: InputPin,
{
    /// Create a driver in the `Disabled` state.
    pub fn new(step_pin: STEP, dir_pin: DIR, enable_pin: EN, endstop_pin: STOP) -> Self {
        Self {
            step_pin,
            dir_pin,
            enable_pin,
            endstop_pin,
            position: 0,
            state: StepperState::Disabled,
            direction_positive: true,
            invert_direction: false,
            stop_on_endstop: false,
        }
    }

    /// Invert the DIR pin polarity.
    pub fn with_inverted_direction(mut self) -> Self {
        self.invert_direction = true;
        self
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> StepperState {
        self.state
    }

    /// Current absolute position in steps.
    #[inline]
    pub fn position(&self) -> i32 {
        self.position
    }

    /// Overwrite the absolute position (after homing).
    #[inline]
    pub fn set_position(&mut self, position: i32) {
        self.position = position;
    }

    /// Power the motor on. A `Stopped` motor returns to `Active`.
    pub fn enable(&mut self) {
        let _ = self.enable_pin.set_high();
        self.state = StepperState::Active;
    }

    /// Power the motor off.
    pub fn disable(&mut self) {
        let _ = self.enable_pin.set_low();
        self.state = StepperState::Disabled;
    }

    /// Select behavior on a triggered endstop.
    ///
    /// When enabled, a step taken while the endstop reads active moves
    /// the motor to `Stopped` and further steps are ignored until
    /// [`enable`](Self::enable) is called again.
    pub fn stop_on_endstop(&mut self, stop: bool) {
        self.stop_on_endstop = stop;
    }

    /// Check whether the endstop currently reads active.
    pub fn is_endstop_active(&mut self) -> bool {
        self.endstop_pin.is_high().unwrap_or(false)
    }

    /// Consume the driver and hand back the underlying pins.
    pub fn release(self) -> (STEP, DIR, EN, STOP) {
        (self.step_pin, self.dir_pin, self.enable_pin, self.endstop_pin)
    }
}

impl<STEP, DIR, EN, STOP> Stepper for StepDirStepper<STEP, DIR, EN, STOP>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    STOP: InputPin,
{
    fn set_direction(&mut self, positive: bool) {
        self.direction_positive = positive;
        if positive != self.invert_direction {
            let _ = self.dir_pin.set_high();
        } else {
            let _ = self.dir_pin.set_low();
        }
    }

    fn step(&mut self) {
        if self.state != StepperState::Active {
            return;
        }
        if self.stop_on_endstop && self.is_endstop_active() {
            self.state = StepperState::Stopped;
            return;
        }
        let _ = self.step_pin.set_high();
        self.position += if self.direction_positive { 1 } else { -1 };
        self.state = StepperState::Stepping;
    }

    fn unstep(&mut self) {
        if self.state != StepperState::Stepping {
            return;
        }
        let _ = self.step_pin.set_low();
        self.state = StepperState::Active;
    }
}
