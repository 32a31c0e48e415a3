//! Stepper motor control.
//!
//! [`Stepper`] is the contract the ticker drives; [`StepDirStepper`] is a
//! ready-made implementation over embedded-hal 1.0 output pins.

mod driver;

pub use driver::{StepDirStepper, StepperState};

/// Light-weight step/direction control of one stepper motor.
///
/// All three operations run in interrupt context and must not fail or
/// block. A step pulse must be held for at least the configured minimum
/// pulse width before [`unstep`](Self::unstep); the ticker schedules the
/// two halves accordingly.
pub trait Stepper {
    /// Set travel direction. If `positive`, a step increases position by
    /// one, otherwise decreases by one.
    fn set_direction(&mut self, positive: bool);

    /// Begin a step pulse.
    fn step(&mut self);

    /// Release the step pulse.
    fn unstep(&mut self);
}
