//! Integer acceleration ramp.
//!
//! Implementation based on "Generate stepper-motor speed profiles in real
//! time" by D. Austin, Embedded Systems Programming, January 2005. The
//! per-step delay is advanced with an exact integer recurrence so no
//! square roots are taken in interrupt context and no rounding error
//! accumulates over the ramp.

/// Delay-sequence engine for one constant-acceleration ramp.
///
/// Holds the current timer delay `c`, the step index `n` and the carried
/// division `remainder`. The recurrence `c -= (2c + remainder) / (4n + 1)`
/// approximates the exact square-root delay curve while staying in
/// integer arithmetic.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ramp {
    c: i32,
    n: i32,
    remainder: i32,
}

impl Ramp {
    /// Create a ramp starting at delay `c0`, as if `n` steps into the
    /// acceleration curve.
    pub fn new(c0: u32, n: i32) -> Self {
        Self {
            c: c0 as i32,
            n,
            remainder: 0,
        }
    }

    /// Current delay without advancing.
    #[inline]
    pub fn delay(&self) -> u32 {
        self.c as u32
    }

    /// Advance one step and return the new delay.
    pub fn next_delay(&mut self) -> u32 {
        self.n += 1;
        let nom = 2 * self.c + self.remainder;
        let den = 4 * self.n + 1;
        self.remainder = nom % den;
        self.c -= nom / den;

        // Correction to ensure acc and dec ramps are identical
        if den < 0 && self.remainder > 0 {
            self.c += 1;
            self.remainder += den;
        }

        self.c as u32
    }

    /// Flip the ramp into its mirrored deceleration curve.
    ///
    /// Uses the symmetry `(n1 + 0.5) * a1 = (n2 + 0.5) * a2` with
    /// `a2 = -a1`, which reduces to negating `n` and the remainder.
    pub fn reverse_acc(&mut self) {
        self.n = -self.n - 1;
        self.remainder = -self.remainder;
    }
}
