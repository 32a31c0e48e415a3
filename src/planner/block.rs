//! Planner block storage.

/// Data the planner keeps for one linear block of motion.
///
/// All speeds are carried squared (machine units²) so the hot insertion
/// path never takes a square root; consumers convert to a physical rate
/// only when handing the block to the step generator.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlanBlock<const AXES: usize> {
    /// Planned number of steps per axis (sign encodes direction).
    pub steps: [i32; AXES],
    /// Planned entry speed (squared). Re-derived by every recalculation
    /// pass until the block becomes optimally planned.
    pub entry_speed_sqr: f32,
    /// Requested cruise speed (squared). Fixed at insertion.
    pub nominal_speed_sqr: f32,
    /// Max allowed entry speed (squared). Fixed at insertion.
    pub max_entry_speed_sqr: f32,
    /// Max possible speed change over this block, the `2·a·s` term
    /// (squared units). Fixed at insertion.
    pub max_change_speed_sqr: f32,
}

impl<const AXES: usize> PlanBlock<AXES> {
    /// An unused block slot.
    pub const EMPTY: Self = Self {
        steps: [0; AXES],
        entry_speed_sqr: 0.0,
        nominal_speed_sqr: 0.0,
        max_entry_speed_sqr: 0.0,
        max_change_speed_sqr: 0.0,
    };
}

impl<const AXES: usize> Default for PlanBlock<AXES> {
    fn default() -> Self {
        Self::EMPTY
    }
}
