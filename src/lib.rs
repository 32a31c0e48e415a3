//! # motion-core
//!
//! Look-ahead motion planning and interrupt-driven step generation for
//! multi-axis stepper machines (3D printers, CNC-style gantries).
//!
//! ## Features
//!
//! - **Look-ahead planner**: bounded ring buffer of moves with online
//!   junction-speed optimization (two-pass, squared-speed arithmetic)
//! - **Exact ramps**: integer-recurrence trapezoid delay generation with
//!   bit-exact acceleration/deceleration symmetry
//! - **Multi-axis sync**: Bresenham step distribution across axes
//! - **Interrupt driven**: the ticker state machine runs entirely from a
//!   self-rescheduling hardware timer callback
//! - **embedded-hal 1.0**: `OutputPin`/`InputPin` based step/dir driver
//! - **no_std compatible**: allocation free, fixed-capacity buffers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use motion_core::{Planner, TickerConfig, TrapezoidTicker};
//!
//! let mut planner: Planner<16, 4> = Planner::new();
//! if !planner.is_buffer_full() {
//!     planner.plan_move([100, 50, 0, 0], 800.0, 10_000.0, 2_500.0);
//! }
//!
//! let mut ticker = TrapezoidTicker::new(steppers, timer, TickerConfig::default());
//! ticker.start();
//! // From the timer interrupt:
//! let next_delay = ticker.on_timer(&mut planner);
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): enables TOML parsing of machine configuration
//! - `alloc`: enables heap allocation for no_std with allocator
//! - `defmt`: enables defmt formatting for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Core modules
pub mod bresenham;
pub mod config;
pub mod error;
pub mod planner;
pub mod sched;
pub mod stepper;
pub mod ticker;
pub mod timer;
pub mod trapezoid;

// Re-exports for ergonomic API
pub use bresenham::Bresenham;
pub use config::{AxisConfig, MachineConfig, MoveConstraints};
pub use error::{ConfigError, Result};
pub use planner::Planner;
pub use sched::{SchedulingTimer, TimerBase};
pub use stepper::{StepDirStepper, Stepper, StepperState};
pub use ticker::{TickerConfig, TrapezoidTicker};
pub use timer::Timer;
pub use trapezoid::{Ramp, TrapezoidGenerator, TrapezoidParameters};
