//! Bresenham step synchronization.
//!
//! Distributes a dependent axis's steps as evenly as possible across the
//! dominant axis's step events (classic digital differential analyzer).

/// Per-axis step distributor for one move.
///
/// For a move whose dominant axis fires `dx` step events, decides on each
/// event whether this axis (requesting `dy <= dx` steps) should also step.
/// The update is a pure integer error-accumulator adjustment: O(1) and
/// allocation free, safe to run from interrupt context.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Bresenham {
    error: i32,
    dxy: i32,
    dy: i32,
}

impl Bresenham {
    /// Create a distributor emitting `dy` steps over `dx` events.
    ///
    /// Requires `dy <= dx`. The first step arrives on the first event.
    #[inline]
    pub fn new(dy: u32, dx: u32) -> Self {
        Self::with_offset(dy, dx, 0)
    }

    /// Create a distributor with a phase-shifted first step.
    ///
    /// `offset` controls when the first step arrives: 0 on the first
    /// event, 1 in between, 2 on the last event. Needed so axes joining a
    /// move mid-profile stay synchronized with the dominant axis.
    #[inline]
    pub fn with_offset(dy: u32, dx: u32, offset: u32) -> Self {
        Self {
            error: (dx * offset) as i32 - (dy * 2) as i32,
            dxy: ((dx - dy) * 2) as i32,
            dy: (dy * 2) as i32,
        }
    }

    /// Advance one dominant-axis event.
    ///
    /// Returns true if this axis should step on this event.
    #[inline]
    pub fn tick(&mut self) -> bool {
        if self.error < 0 {
            self.error += self.dxy;
            true
        } else {
            self.error -= self.dy;
            false
        }
    }

    /// True if this axis requests no steps and will never fire.
    #[inline]
    pub fn is_zero_slope(&self) -> bool {
        self.dy == 0
    }
}
