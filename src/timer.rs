//! Self-rescheduling hardware timer contract.

/// Hardware timer driving a self-rescheduling callback.
///
/// After [`start`](Self::start) the platform invokes its callback (for
/// this crate, [`TrapezoidTicker::on_timer`](crate::ticker::TrapezoidTicker::on_timer))
/// once, then re-arms itself with the returned delay, counted in timer
/// ticks from the start of the call. A returned delay of 0 stops the
/// timer. The callback object is owned explicitly by the platform glue
/// and handed to the interrupt registration point at startup; it is
/// never an implicit global.
pub trait Timer {
    /// Begin periodic invocation of the callback.
    fn start(&mut self);

    /// Stop invoking the callback.
    fn stop(&mut self);

    /// Frequency of the delay counter in Hz, used to convert physical
    /// rates into tick-domain delays.
    fn frequency(&self) -> f32;
}
