//! Look-ahead velocity planner.
//!
//! Plans a sequence of moves for maximum speed given constraints. Built
//! around the formula `v² = v0² + 2as` for final speed `v`, initial speed
//! `v0`, acceleration `a` and distance `s`. Each move carries three
//! constraints: a requested cruise speed, a max entry speed, and the
//! maximum `2as` term achievable over the move. For every added move the
//! planner re-optimizes entry and exit speeds across the whole queue so
//! all constraints are met.
//!
//! The planning algorithm is heavily based on Grbl's.

mod block;

pub use block::PlanBlock;

/// Bounded producer/consumer of kinematic blocks with online speed
/// optimization.
///
/// `CAP` is the ring capacity (one slot stays reserved to distinguish a
/// full buffer from an empty one, so at most `CAP - 1` moves queue up);
/// `AXES` is the number of coordinated step channels. Storage is a fixed
/// array plus ring indices: interrupt-context reads are O(1) and never
/// allocate.
#[derive(Debug)]
pub struct Planner<const CAP: usize, const AXES: usize> {
    blocks: [PlanBlock<AXES>; CAP],
    /// Index of the block to process now.
    tail: usize,
    /// Index of the next block to be pushed.
    head: usize,
    /// Index one past `head`; `tail == next_head` means full.
    next_head: usize,
    /// Index of the last optimally planned block. Recalculation never
    /// scans earlier than this.
    planned: usize,
}

impl<const CAP: usize, const AXES: usize> Default for Planner<CAP, AXES> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAP: usize, const AXES: usize> Planner<CAP, AXES> {
    /// Create a planner capable of queueing `CAP - 1` moves ahead.
    pub fn new() -> Self {
        Self {
            blocks: [PlanBlock::EMPTY; CAP],
            tail: 0,
            head: 0,
            next_head: 1 % CAP,
            planned: 0,
        }
    }

    /// True if no slot is available for another move.
    #[inline]
    pub fn is_buffer_full(&self) -> bool {
        self.tail == self.next_head
    }

    /// True if no moves are queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Step counts of the current move, or `None` if the queue is empty.
    pub fn current_steps(&self) -> Option<&[i32; AXES]> {
        if self.is_empty() {
            return None;
        }
        Some(&self.blocks[self.tail].steps)
    }

    /// Planned entry speed (squared) for the current move.
    pub fn current_entry_speed_sqr(&self) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        Some(self.blocks[self.tail].entry_speed_sqr)
    }

    /// Requested cruise speed (squared) for the current move.
    pub fn current_speed_sqr(&self) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        Some(self.blocks[self.tail].nominal_speed_sqr)
    }

    /// Planned exit speed (squared) for the current move.
    ///
    /// Defined as the entry speed of the next queued move, or zero when
    /// nothing follows (end of queue).
    pub fn current_exit_speed_sqr(&self) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        let next = self.next_index(self.tail);
        if next == self.head {
            return Some(0.0);
        }
        Some(self.blocks[next].entry_speed_sqr)
    }

    /// Discard the current move. No-op when the queue is already empty.
    pub fn next_move(&mut self) {
        if self.is_empty() {
            return;
        }
        let next = self.next_index(self.tail);
        // A consumed block can no longer be a re-optimization boundary.
        if self.tail == self.planned {
            self.planned = next;
        }
        self.tail = next;
    }

    /// Append a move and re-optimize the queued plan.
    ///
    /// `max_change_speed_sqr` is the `2·a·s` term for this move,
    /// `nominal_speed_sqr` the requested cruise speed squared and
    /// `max_entry_speed_sqr` the junction cap squared.
    ///
    /// Callers must check [`is_buffer_full`](Self::is_buffer_full) first;
    /// inserting into a full buffer is a contract violation and the move
    /// is silently dropped.
    pub fn plan_move(
        &mut self,
        steps: [i32; AXES],
        max_change_speed_sqr: f32,
        nominal_speed_sqr: f32,
        max_entry_speed_sqr: f32,
    ) {
        debug_assert!(!self.is_buffer_full());
        if self.is_buffer_full() {
            return;
        }

        let first = self.is_empty();
        let prev_nominal_speed_sqr = if first {
            0.0
        } else {
            self.blocks[self.prev_index(self.head)].nominal_speed_sqr
        };

        let block = &mut self.blocks[self.head];
        block.steps = steps;
        block.entry_speed_sqr = 0.0;
        block.nominal_speed_sqr = nominal_speed_sqr;
        block.max_change_speed_sqr = max_change_speed_sqr;
        block.max_entry_speed_sqr = if first {
            // The first block starts from standstill.
            0.0
        } else {
            max_entry_speed_sqr
                .min(nominal_speed_sqr)
                .min(prev_nominal_speed_sqr)
        };

        self.head = self.next_head;
        self.next_head = self.next_index(self.head);

        self.recalculate();
    }

    #[inline]
    fn next_index(&self, index: usize) -> usize {
        if index + 1 == CAP {
            0
        } else {
            index + 1
        }
    }

    #[inline]
    fn prev_index(&self, index: usize) -> usize {
        if index == 0 {
            CAP - 1
        } else {
            index - 1
        }
    }

    /// Two-pass entry speed optimization over all not-yet-optimal blocks.
    ///
    /// The reverse pass maximizes deceleration curves back-planning from
    /// the newest block; the forward pass refines it with acceleration
    /// limits and advances the `planned` pointer past every block whose
    /// entry speed can no longer be improved by future insertions. Only
    /// `entry_speed_sqr` is ever rewritten; the `max_*` constraints stay
    /// as set at insertion.
    fn recalculate(&mut self) {
        let newest = self.prev_index(self.head);

        // Nothing to optimize with a single plannable block.
        if newest == self.planned {
            return;
        }

        // Reverse pass. The newest block must be able to stop at its end
        // (nothing is planned after it), so its entry is bounded by the
        // speed change achievable over the block alone.
        {
            let block = &mut self.blocks[newest];
            block.entry_speed_sqr = block.max_entry_speed_sqr.min(block.max_change_speed_sqr);
        }

        let mut next_index = newest;
        let mut index = self.prev_index(newest);
        while index != self.planned {
            let next_entry_sqr = self.blocks[next_index].entry_speed_sqr;
            let current = &mut self.blocks[index];

            // Fastest entry from which this block can still decelerate to
            // the already-fixed speed ahead of it. A block pinned at its
            // cap is left alone.
            if current.entry_speed_sqr != current.max_entry_speed_sqr {
                current.entry_speed_sqr = current
                    .max_entry_speed_sqr
                    .min(next_entry_sqr + current.max_change_speed_sqr);
            }

            next_index = index;
            index = self.prev_index(index);
        }

        // Forward pass, from the last optimally planned block onward.
        let mut current_index = self.planned;
        let mut index = self.next_index(self.planned);
        while index != self.head {
            let current_entry_sqr = self.blocks[current_index].entry_speed_sqr;
            let current_change_sqr = self.blocks[current_index].max_change_speed_sqr;
            let next = &mut self.blocks[index];

            // If the current block cannot accelerate up to the reverse
            // pass result, the next entry is acceleration-pinned and
            // everything before it is optimal.
            if current_entry_sqr < next.entry_speed_sqr {
                let reachable_sqr = current_entry_sqr + current_change_sqr;
                if reachable_sqr < next.entry_speed_sqr {
                    // Always <= max_entry_speed_sqr; the reverse pass
                    // already clamped to that.
                    next.entry_speed_sqr = reachable_sqr;
                    self.planned = index;
                }
            }

            // A block at its hard entry cap also brackets an optimal
            // plan; nothing between two caps can improve further.
            if next.entry_speed_sqr == next.max_entry_speed_sqr {
                self.planned = index;
            }

            current_index = index;
            index = self.next_index(index);
        }
    }
}
