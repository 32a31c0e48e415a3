//! Trapezoid-shaped pulse frequency generation.
//!
//! Given a step count and entry/exit/nominal rates, precomputes the
//! accelerate/cruise/decelerate phase split and then produces the per-step
//! timer delay sequence using the integer [`Ramp`] recurrence.

mod ramp;

pub use ramp::Ramp;

use libm::{floorf, roundf, sqrtf};

/// Steps needed to reach rate `v` from rest under acceleration `acc`.
#[inline]
fn acc_steps(v: f32, acc: f32) -> f32 {
    (v * v) / (2.0 * acc)
}

/// Initial ramp delay for timer frequency `f` and acceleration `acc`.
///
/// The 0.676 factor compensates the integer recurrence's error on the
/// first step, per the Austin article.
#[inline]
fn initial_c(f: f32, acc: f32) -> f32 {
    0.676 * f * sqrtf(2.0 / acc)
}

/// Precalculated phase boundaries and ramp seed for one trapezoid.
///
/// All rates are in step events per second; `timer_freq` converts them to
/// timer-tick delays. Degenerate inputs (zero steps, non-positive nominal
/// rate or acceleration) produce an empty profile that completes
/// immediately instead of dividing by zero.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrapezoidParameters {
    /// Total step events in the move.
    pub steps: u32,
    /// Initial timer delay seeding the ramp.
    pub c0: i32,
    /// Ramp step index corresponding to the entry rate.
    pub n0: i32,
    /// Accelerate while `step <= accelerate_until`.
    pub accelerate_until: u32,
    /// Decelerate once `step > decelerate_after`.
    pub decelerate_after: u32,
}

impl TrapezoidParameters {
    /// Compute the phase split for a move of `steps` events.
    ///
    /// `entry_rate`, `exit_rate` and `nominal_rate` are in events/s. It
    /// must be possible to reach the exit rate from the entry rate within
    /// `steps` under `acc`; the look-ahead planner guarantees this for
    /// blocks it hands out.
    pub fn new(
        steps: u32,
        entry_rate: f32,
        exit_rate: f32,
        nominal_rate: f32,
        timer_freq: f32,
        acc: f32,
    ) -> Self {
        if steps == 0 || nominal_rate <= 0.0 || acc <= 0.0 {
            return Self::default();
        }

        // Steps to accelerate from rest to the respective rates.
        let steps_to_nominal = floorf(acc_steps(nominal_rate, acc)) as u32;
        let steps_to_entry = floorf(acc_steps(entry_rate, acc)) as u32;
        let steps_to_exit = floorf(acc_steps(exit_rate, acc)) as u32;

        // Actual steps spent accelerating and decelerating in this move.
        let mut acc_steps = steps_to_nominal.saturating_sub(steps_to_entry);
        let dec_steps = steps_to_nominal.saturating_sub(steps_to_exit);

        let mut plateau_steps = steps as i32 - acc_steps as i32 - dec_steps as i32;
        if plateau_steps < 0 {
            // No cruising; shrink both ramps to span exactly the available
            // steps. The acceleration side takes the floored half, the
            // deceleration side absorbs the rounding remainder.
            let full_ramp_steps = steps_to_entry + steps + steps_to_exit;
            acc_steps = (full_ramp_steps / 2).saturating_sub(steps_to_entry);
            plateau_steps = 0;
        }

        let c0 = if steps_to_entry == 0 {
            roundf(initial_c(timer_freq, acc)) as i32
        } else {
            roundf(timer_freq / entry_rate) as i32
        };

        Self {
            steps,
            c0,
            n0: steps_to_entry as i32,
            accelerate_until: acc_steps,
            decelerate_after: acc_steps + plateau_steps as u32,
        }
    }
}

/// Produces delays for a trapezoid-shaped pulse frequency profile.
///
/// Each [`next_delay`](Self::next_delay) call advances one step event and
/// returns the timer delay to apply before the next event, or 0 once all
/// steps have been consumed (the stop sentinel).
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrapezoidGenerator {
    accelerate_until: u32,
    decelerate_after: u32,
    steps: u32,
    step: u32,
    ramp: Ramp,
}

impl TrapezoidGenerator {
    /// Create a generator for the given precomputed parameters.
    pub fn new(params: TrapezoidParameters) -> Self {
        Self {
            accelerate_until: params.accelerate_until,
            decelerate_after: params.decelerate_after,
            steps: params.steps,
            step: 0,
            ramp: Ramp::new(params.c0 as u32, params.n0),
        }
    }

    /// Advance one step event and return the delay before the next one.
    ///
    /// Returns 0 once the trapezoid is completed.
    pub fn next_delay(&mut self) -> u32 {
        if self.step == self.steps {
            return 0;
        }

        self.step += 1;
        let current = self.ramp.delay();

        if self.step > self.accelerate_until && self.step <= self.decelerate_after {
            // Cruising
            return current;
        } else if self.step == self.decelerate_after + 1 {
            // First deceleration step
            self.ramp.reverse_acc();
        }
        self.ramp.next_delay();
        current
    }

    /// True once the last delay has been produced by `next_delay`.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.step == self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: [u32; 11] = [1000, 600, 467, 395, 349, 316, 291, 271, 254, 241, 229];

    // Acceleration chosen so the ramp seed works out to exactly 1000
    // ticks at 10 kHz, lining the profiles up with REFERENCE.
    fn reference_acc(timer_freq: f32) -> f32 {
        2.0 / libm::powf(1000.0 / timer_freq / 0.676, 2.0)
    }

    fn assert_profile(params: TrapezoidParameters, expected: &[u32]) {
        let mut generator = TrapezoidGenerator::new(params);
        assert_eq!(params.steps as usize, expected.len());

        let mut count = 0;
        loop {
            assert!(count < expected.len());
            assert_eq!(expected[count], generator.next_delay(), "step {}", count);
            count += 1;
            if generator.is_done() {
                break;
            }
        }

        assert_eq!(expected.len(), count);
        assert_eq!(0, generator.next_delay());
    }

    #[test]
    fn constant_speed() {
        let v = 100.0;
        let f = 1e4;
        let params = TrapezoidParameters::new(10, v, v, v, f, 1000.0);

        assert_profile(params, &[(f / v) as u32; 10]);
    }

    #[test]
    fn start_stop_no_cruising() {
        let f = 1e4;
        let acc = reference_acc(f);
        let v = 100.0;
        let params = TrapezoidParameters::new(10, 0.0, 0.0, v, f, acc);

        // Sanity: these inputs must not leave room to cruise.
        assert!(((10 / 2) as f32) < v * v / (2.0 * acc));

        let expected = [
            REFERENCE[0],
            REFERENCE[1],
            REFERENCE[2],
            REFERENCE[3],
            REFERENCE[4],
            REFERENCE[5],
            REFERENCE[4],
            REFERENCE[3],
            REFERENCE[2],
            REFERENCE[1],
        ];
        assert_profile(params, &expected);
    }

    #[test]
    fn start_stop_with_cruising() {
        let f = 1e4;
        let acc = reference_acc(f);
        // Velocity corresponding to REFERENCE[3]
        let v = 25.3;
        let params = TrapezoidParameters::new(10, 0.0, 0.0, v, f, acc);

        let expected = [
            REFERENCE[0],
            REFERENCE[1],
            REFERENCE[2],
            REFERENCE[3],
            REFERENCE[3],
            REFERENCE[3],
            REFERENCE[3],
            REFERENCE[3],
            REFERENCE[2],
            REFERENCE[1],
        ];
        assert_profile(params, &expected);
    }

    #[test]
    fn running_to_stop_with_cruising() {
        let f = 1e4;
        let acc = reference_acc(f);
        let v = 25.3;
        let params = TrapezoidParameters::new(10, v, 0.0, v, f, acc);

        let expected = [
            REFERENCE[3],
            REFERENCE[3],
            REFERENCE[3],
            REFERENCE[3],
            REFERENCE[3],
            REFERENCE[3],
            REFERENCE[3],
            REFERENCE[3],
            REFERENCE[2],
            // Rounding differs by one due to remainder carry
            REFERENCE[1] + 1,
        ];
        assert_profile(params, &expected);
    }

    #[test]
    fn decel_only() {
        let f = 1e4;
        let acc = reference_acc(f);
        let v = 25.3;
        let params = TrapezoidParameters::new(3, v, 0.0, v, f, acc);

        assert_profile(params, &[REFERENCE[3], REFERENCE[2], REFERENCE[1] + 1]);
    }

    #[test]
    fn acc_only() {
        let f = 1e4;
        let acc = reference_acc(f);
        let v = 100.0;
        let params = TrapezoidParameters::new(3, 0.0, v, v, f, acc);

        assert_profile(params, &[REFERENCE[0], REFERENCE[1], REFERENCE[2]]);
    }

    #[test]
    fn start_to_running_with_cruising() {
        let f = 1e4;
        let acc = reference_acc(f);
        let v = 25.3;
        let params = TrapezoidParameters::new(10, 0.0, v, v, f, acc);

        let expected = [
            REFERENCE[0],
            REFERENCE[1],
            REFERENCE[2],
            REFERENCE[3],
            REFERENCE[3],
            REFERENCE[3],
            REFERENCE[3],
            REFERENCE[3],
            REFERENCE[3],
            REFERENCE[3],
        ];
        assert_profile(params, &expected);
    }

    #[test]
    fn zero_steps_completes_immediately() {
        let params = TrapezoidParameters::new(0, 0.0, 0.0, 100.0, 1e4, 1000.0);
        let mut generator = TrapezoidGenerator::new(params);

        assert!(generator.is_done());
        assert_eq!(0, generator.next_delay());
    }

    #[test]
    fn zero_rate_completes_immediately() {
        let params = TrapezoidParameters::new(10, 0.0, 0.0, 0.0, 1e4, 1000.0);
        let mut generator = TrapezoidGenerator::new(params);

        assert!(generator.is_done());
        assert_eq!(0, generator.next_delay());
    }

    #[test]
    fn zero_acceleration_completes_immediately() {
        let params = TrapezoidParameters::new(10, 100.0, 100.0, 100.0, 1e4, 0.0);
        let mut generator = TrapezoidGenerator::new(params);

        assert!(generator.is_done());
        assert_eq!(0, generator.next_delay());
    }

    #[test]
    fn default_generator_is_done() {
        let mut generator = TrapezoidGenerator::default();
        assert!(generator.is_done());
        assert_eq!(0, generator.next_delay());
    }
}
