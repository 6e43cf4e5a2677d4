#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core dispensing logic (hardware-agnostic).
//!
//! This crate provides the hardware-independent drink-dispensing engine.
//! All hardware interactions go through the `refresher_traits::Pump` and
//! `refresher_traits::CommandSource` traits.
//!
//! ## Architecture
//!
//! - **Tables**: recipe and size lookups, immutable after startup
//!   (`recipe` module)
//! - **Planning**: pure volume-to-duration computation (`plan` module)
//! - **Control**: the five-mode state machine, one command byte per tick
//!   (`machine` module)
//! - **Actuation**: timed sequential and level-triggered batched pump
//!   drive (`actuate` module)
//! - **Input**: background command-channel reader with single-byte
//!   buffering semantics (`port` module)
//! - **Status**: advisory text output (`status` module)
//!
//! Timing is open-loop: durations come from a fixed flow-rate constant,
//! and nothing measures what actually left the pumps.

// Module declarations
pub mod actuate;
pub mod error;
pub mod machine;
pub mod mocks;
pub mod plan;
pub mod port;
pub mod recipe;
pub mod runner;
pub mod status;
pub mod util;

pub use actuate::PumpBank;
pub use error::{BuildError, DispenseError};
pub use machine::{
    CMD_DIAG, CMD_ORDER, CMD_PURGE, Dispenser, DispenserBuilder, DispenserCore, DispenserG,
    Missing, Mode, Set, TickOutcome, build_dispenser,
};
pub use plan::{DispensePlan, plan_dispense};
pub use port::CommandPort;
pub use recipe::{INGREDIENT_COUNT, PUMP_COUNT, Recipe, Size, WATER_INDEX, default_tables};
pub use status::{ConsoleStatus, NullStatus, StatusSink};
