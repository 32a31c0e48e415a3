//! Interrupt-context trapezoid execution.
//!
//! [`TrapezoidTicker`] pulls blocks from a [`Planner`], turns each one
//! into a [`TrapezoidGenerator`] schedule plus one [`Bresenham`] per axis,
//! and drives the steppers from a self-rescheduling timer callback. All
//! of its state is mutated from the single timer-interrupt context, so it
//! needs no locking of its own.

use libm::sqrtf;

use crate::bresenham::Bresenham;
use crate::planner::Planner;
use crate::stepper::Stepper;
use crate::timer::Timer;
use crate::trapezoid::{TrapezoidGenerator, TrapezoidParameters};

/// Where the ticker is in its step/unstep cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum TickPhase {
    /// No trapezoid in flight; waiting for the planner to hold a block.
    AwaitingMove,
    /// Next callback issues step pulses.
    Stepping,
    /// Next callback releases step pulses and advances the trapezoid.
    Unstepping,
}

/// Rate conversion and pulse timing for a [`TrapezoidTicker`].
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickerConfig {
    /// Step events per machine distance unit, used to convert the
    /// planner's squared speeds into step-domain rates.
    pub events_per_unit: f32,
    /// Acceleration in machine units/s² applied to every move.
    pub acceleration: f32,
    /// Minimum step pulse width in timer ticks.
    pub pulse_ticks: u32,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            events_per_unit: 1.0,
            acceleration: 1000.0,
            pulse_ticks: 2,
        }
    }
}

/// Executes planned moves as synchronized step pulses.
///
/// Cycle per move: pull the current planner block, set per-axis
/// directions, build the trapezoid schedule and Bresenham distributors,
/// then alternate step/unstep callback halves until the trapezoid
/// completes, at which point the next block is pulled immediately so
/// consecutive moves join without a dead interval.
///
/// The platform interrupt handler owns this object (and the planner) and
/// forwards the delay returned by [`on_timer`](Self::on_timer) to the
/// hardware timer; 0 means the queue has drained and the timer stops.
#[derive(Debug)]
pub struct TrapezoidTicker<S, T, const AXES: usize>
where
    S: Stepper,
    T: Timer,
{
    timer: T,
    steppers: [S; AXES],
    bresenhams: [Bresenham; AXES],
    /// Which axes fired on the current step half, so the unstep half
    /// releases exactly those pulses.
    stepped: [bool; AXES],
    trapezoid: TrapezoidGenerator,
    phase: TickPhase,
    config: TickerConfig,
}

impl<S, T, const AXES: usize> TrapezoidTicker<S, T, AXES>
where
    S: Stepper,
    T: Timer,
{
    /// Create a ticker driving `steppers` from `timer` callbacks.
    pub fn new(steppers: [S; AXES], timer: T, config: TickerConfig) -> Self {
        Self {
            timer,
            steppers,
            bresenhams: [Bresenham::default(); AXES],
            stepped: [false; AXES],
            trapezoid: TrapezoidGenerator::default(),
            phase: TickPhase::AwaitingMove,
            config,
        }
    }

    /// Arm the ticker and start the hardware timer.
    ///
    /// The platform must wire the timer callback to
    /// [`on_timer`](Self::on_timer) with the planner this ticker is
    /// meant to consume.
    pub fn start(&mut self) {
        self.phase = TickPhase::AwaitingMove;
        self.trapezoid = TrapezoidGenerator::default();
        self.stepped = [false; AXES];
        self.timer.start();
    }

    /// Access the steppers, e.g. to read positions between moves.
    pub fn steppers(&self) -> &[S; AXES] {
        &self.steppers
    }

    /// Tear the ticker down and hand the steppers back.
    pub fn into_steppers(self) -> [S; AXES] {
        self.steppers
    }

    /// Timer callback; runs in interrupt context.
    ///
    /// Returns the delay in timer ticks until the next invocation, or 0
    /// when no trapezoid is active and the planner has no further block.
    /// An empty planner is a normal terminal state, not a fault.
    pub fn on_timer<const CAP: usize>(&mut self, planner: &mut Planner<CAP, AXES>) -> u32 {
        if self.phase == TickPhase::Unstepping {
            for (stepper, stepped) in self.steppers.iter_mut().zip(self.stepped.iter_mut()) {
                if core::mem::take(stepped) {
                    stepper.unstep();
                }
            }

            let delay = self.trapezoid.next_delay();
            if !self.trapezoid.is_done() {
                self.phase = TickPhase::Stepping;
                return self.after_pulse(delay);
            }

            // Move finished; join the next one without a dead interval.
            self.phase = TickPhase::AwaitingMove;
            if self.load_next(planner) {
                self.phase = TickPhase::Stepping;
                return self.after_pulse(delay);
            }
            return 0;
        }

        if self.phase == TickPhase::AwaitingMove {
            if !self.load_next(planner) {
                return 0;
            }
            self.phase = TickPhase::Stepping;
        }

        // Step half: fire every axis due on this event, then hold the
        // pulses for the minimum width before the unstep half.
        for (axis, stepper) in self.steppers.iter_mut().enumerate() {
            self.stepped[axis] = self.bresenhams[axis].tick();
            if self.stepped[axis] {
                stepper.step();
            }
        }
        self.phase = TickPhase::Unstepping;
        self.config.pulse_ticks
    }

    /// Remaining delay after the pulse width has been spent, floored to
    /// one tick so the timer always makes forward progress.
    #[inline]
    fn after_pulse(&self, delay: u32) -> u32 {
        delay.saturating_sub(self.config.pulse_ticks).max(1)
    }

    /// Pull the next usable block from the planner and arm trapezoid and
    /// Bresenham state for it. Zero-event blocks are discarded on the
    /// spot (a zero-length move completes immediately).
    fn load_next<const CAP: usize>(&mut self, planner: &mut Planner<CAP, AXES>) -> bool {
        loop {
            let Some(&steps) = planner.current_steps() else {
                return false;
            };

            let events = steps.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
            let entry_speed_sqr = planner.current_entry_speed_sqr().unwrap_or(0.0);
            let nominal_speed_sqr = planner.current_speed_sqr().unwrap_or(0.0);
            let exit_speed_sqr = planner.current_exit_speed_sqr().unwrap_or(0.0);

            // The block is now in flight and cannot be revisited.
            planner.next_move();

            if events == 0 {
                continue;
            }

            let events_per_unit = self.config.events_per_unit;
            let params = TrapezoidParameters::new(
                events,
                sqrtf(entry_speed_sqr) * events_per_unit,
                sqrtf(exit_speed_sqr) * events_per_unit,
                sqrtf(nominal_speed_sqr) * events_per_unit,
                self.timer.frequency(),
                self.config.acceleration * events_per_unit,
            );
            let trapezoid = TrapezoidGenerator::new(params);
            if trapezoid.is_done() {
                // Zero requested speed; the move completes immediately
                // without emitting any pulses.
                continue;
            }

            for (axis, stepper) in self.steppers.iter_mut().enumerate() {
                stepper.set_direction(steps[axis] >= 0);
                self.bresenhams[axis] = Bresenham::new(steps[axis].unsigned_abs(), events);
            }
            self.trapezoid = trapezoid;
            return true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct RecordingStepper {
        position: i32,
        direction_positive: bool,
        stepping: bool,
        unbalanced_pulses: u32,
    }

    impl Stepper for RecordingStepper {
        fn set_direction(&mut self, positive: bool) {
            self.direction_positive = positive;
        }

        fn step(&mut self) {
            self.stepping = true;
            self.position += if self.direction_positive { 1 } else { -1 };
        }

        fn unstep(&mut self) {
            if self.stepping {
                self.stepping = false;
            } else {
                self.unbalanced_pulses += 1;
            }
        }
    }

    #[derive(Debug, Default)]
    struct FakeTimer {
        started: bool,
    }

    impl Timer for FakeTimer {
        fn start(&mut self) {
            self.started = true;
        }

        fn stop(&mut self) {
            self.started = false;
        }

        fn frequency(&self) -> f32 {
            1e6
        }
    }

    fn drain<const CAP: usize, const AXES: usize>(
        ticker: &mut TrapezoidTicker<RecordingStepper, FakeTimer, AXES>,
        planner: &mut Planner<CAP, AXES>,
    ) -> u32 {
        let mut callbacks = 0;
        loop {
            let delay = ticker.on_timer(planner);
            callbacks += 1;
            assert!(callbacks < 10_000, "ticker never drained");
            if delay == 0 {
                return callbacks;
            }
        }
    }

    #[test]
    fn two_moves_leave_summed_positions() {
        let steps_a = [1, 2, -3, 10];
        let steps_b = [-2, -3, 2, -9];

        let mut planner: Planner<16, 4> = Planner::new();
        planner.plan_move(steps_a, 1.0, 10.0, 100.0);
        planner.plan_move(steps_b, 1.0, 20.0, 100.0);

        let mut ticker = TrapezoidTicker::new(
            [(); 4].map(|_| RecordingStepper::default()),
            FakeTimer::default(),
            TickerConfig {
                events_per_unit: 1.0,
                acceleration: 2.0,
                pulse_ticks: 2,
            },
        );
        ticker.start();

        drain(&mut ticker, &mut planner);

        for (axis, stepper) in ticker.steppers().iter().enumerate() {
            assert_eq!(
                steps_a[axis] + steps_b[axis],
                stepper.position,
                "axis {}",
                axis
            );
            assert_eq!(0, stepper.unbalanced_pulses);
        }
        assert!(planner.current_steps().is_none());
    }

    #[test]
    fn empty_planner_stops_immediately() {
        let mut planner: Planner<4, 2> = Planner::new();
        let mut ticker = TrapezoidTicker::new(
            [(); 2].map(|_| RecordingStepper::default()),
            FakeTimer::default(),
            TickerConfig::default(),
        );
        ticker.start();

        assert_eq!(0, ticker.on_timer(&mut planner));
        assert_eq!(0, ticker.on_timer(&mut planner));
    }

    #[test]
    fn zero_length_move_is_skipped() {
        let mut planner: Planner<8, 2> = Planner::new();
        planner.plan_move([0, 0], 1.0, 10.0, 0.0);
        planner.plan_move([4, 2], 1.0, 10.0, 100.0);

        let mut ticker = TrapezoidTicker::new(
            [(); 2].map(|_| RecordingStepper::default()),
            FakeTimer::default(),
            TickerConfig {
                events_per_unit: 1.0,
                acceleration: 2.0,
                pulse_ticks: 2,
            },
        );
        ticker.start();
        drain(&mut ticker, &mut planner);

        assert_eq!(4, ticker.steppers()[0].position);
        assert_eq!(2, ticker.steppers()[1].position);
    }

    #[test]
    fn zero_speed_move_emits_no_steps() {
        let mut planner: Planner<8, 2> = Planner::new();
        planner.plan_move([5, 3], 1.0, 0.0, 0.0);

        let mut ticker = TrapezoidTicker::new(
            [(); 2].map(|_| RecordingStepper::default()),
            FakeTimer::default(),
            TickerConfig {
                events_per_unit: 1.0,
                acceleration: 2.0,
                pulse_ticks: 2,
            },
        );
        ticker.start();

        assert_eq!(0, ticker.on_timer(&mut planner));
        assert_eq!(0, ticker.steppers()[0].position);
        assert_eq!(0, ticker.steppers()[1].position);
        assert!(planner.current_steps().is_none());
    }

    #[test]
    fn zero_speed_move_does_not_stall_the_queue() {
        let mut planner: Planner<8, 2> = Planner::new();
        planner.plan_move([5, 3], 1.0, 0.0, 0.0);
        planner.plan_move([4, 2], 1.0, 10.0, 100.0);

        let mut ticker = TrapezoidTicker::new(
            [(); 2].map(|_| RecordingStepper::default()),
            FakeTimer::default(),
            TickerConfig {
                events_per_unit: 1.0,
                acceleration: 2.0,
                pulse_ticks: 2,
            },
        );
        ticker.start();
        drain(&mut ticker, &mut planner);

        assert_eq!(4, ticker.steppers()[0].position);
        assert_eq!(2, ticker.steppers()[1].position);
    }

    #[test]
    fn single_axis_step_count_matches_events() {
        let mut planner: Planner<8, 1> = Planner::new();
        planner.plan_move([25], 4.0, 16.0, 0.0);

        let mut ticker = TrapezoidTicker::new(
            [RecordingStepper::default()],
            FakeTimer::default(),
            TickerConfig {
                events_per_unit: 1.0,
                acceleration: 2.0,
                pulse_ticks: 2,
            },
        );
        ticker.start();
        let callbacks = drain(&mut ticker, &mut planner);

        assert_eq!(25, ticker.steppers()[0].position);
        // One step half and one unstep half per event.
        assert_eq!(2 * 25, callbacks);
    }

    #[test]
    fn negative_dominant_axis_moves_backwards() {
        let mut planner: Planner<8, 2> = Planner::new();
        planner.plan_move([-10, 5], 1.0, 10.0, 0.0);

        let mut ticker = TrapezoidTicker::new(
            [(); 2].map(|_| RecordingStepper::default()),
            FakeTimer::default(),
            TickerConfig {
                events_per_unit: 1.0,
                acceleration: 2.0,
                pulse_ticks: 2,
            },
        );
        ticker.start();
        drain(&mut ticker, &mut planner);

        assert_eq!(-10, ticker.steppers()[0].position);
        assert_eq!(5, ticker.steppers()[1].position);
    }
}
