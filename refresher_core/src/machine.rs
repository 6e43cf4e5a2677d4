//! The dispensing state machine.
//!
//! One pending command byte is consumed per tick; no byte is a valid tick
//! and leaves the machine where it is. Every (mode, byte) pair has a
//! defined successor: unrecognized bytes self-loop silently, so nothing an
//! operator types can crash or wedge the controller.

use std::marker::PhantomData;
use std::sync::Arc;

use refresher_traits::{Clock, MonotonicClock, Pump};

use crate::actuate::PumpBank;
use crate::error::{BuildError, Result};
use crate::plan::plan_dispense;
use crate::recipe::{PUMP_COUNT, Recipe, Size, WATER_INDEX, default_tables};
use crate::status::{NullStatus, StatusSink};

/// Start or stop the purge cycle.
pub const CMD_PURGE: u8 = b'P';
/// Enter drink ordering.
pub const CMD_ORDER: u8 = b'O';
/// Diagnostic hook; not wired to any button, reachable from a keyboard.
pub const CMD_DIAG: u8 = b'V';

const FIRST_RECIPE_KEY: u8 = b'A';
const LAST_RECIPE_KEY: u8 = b'D';
const FIRST_SIZE_KEY: u8 = b'W';
const LAST_SIZE_KEY: u8 = b'Z';

/// Recipes addressable from the menu; one letter per table row.
pub const MENU_RECIPE_MAX: usize = (LAST_RECIPE_KEY - FIRST_RECIPE_KEY + 1) as usize;
/// Size selectors are a fixed four-letter band.
pub const SIZE_SELECTOR_COUNT: usize = (LAST_SIZE_KEY - FIRST_SIZE_KEY + 1) as usize;

/// Operating mode. Exactly one is active; it is the only state carried
/// between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Standby,
    Test,
    Cleaning,
    RecipeSelect,
    /// Carries the pending recipe index, so a finished or abandoned order
    /// can never leak its selection into the next one.
    SizeSelect { recipe: usize },
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No input, or an unrecognized byte self-looped.
    Idle,
    /// The mode changed without a timed pump run.
    Transitioned,
    /// A full timed dispense ran to completion; the caller should discard
    /// any bytes that arrived while the pumps were running.
    Dispensed,
}

/// Unified core over any pump and status sink implementation.
pub struct DispenserCore<P: Pump, W: StatusSink> {
    mode: Mode,
    bank: PumpBank<P>,
    status: W,
    recipes: Vec<Recipe>,
    sizes: Vec<Size>,
    flow_rate: f32,
    // Unified clock for deterministic time in tests
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
}

impl<P: Pump, W: StatusSink> core::fmt::Debug for DispenserCore<P, W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DispenserCore")
            .field("mode", &self.mode)
            .field("recipes", &self.recipes.len())
            .field("flow_rate", &self.flow_rate)
            .finish()
    }
}

impl<P: Pump, W: StatusSink> DispenserCore<P, W> {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn sizes(&self) -> &[Size] {
        &self.sizes
    }

    pub fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        Arc::clone(&self.clock)
    }

    /// Reset for operation: every output driven off before the first tick
    /// (a restart must not inherit a running pump), then the standby menu.
    pub fn begin(&mut self) -> Result<()> {
        self.bank.all_off()?;
        self.mode = Mode::Standby;
        self.emit_standby_menu();
        Ok(())
    }

    /// Stop all pumps (best-effort shutdown path).
    pub fn stop_pumps(&mut self) -> Result<()> {
        self.bank.all_off()
    }

    /// Consume at most one pending command byte and dispatch to the active
    /// mode. A timed dispense blocks for its full duration before
    /// returning; there is no cancellation once a pour has started.
    pub fn tick(&mut self, input: Option<u8>) -> Result<TickOutcome> {
        match self.mode {
            Mode::Standby => match input {
                Some(CMD_PURGE) => {
                    self.mode = Mode::Cleaning;
                    Ok(TickOutcome::Transitioned)
                }
                Some(CMD_ORDER) => {
                    self.emit_recipe_menu();
                    self.mode = Mode::RecipeSelect;
                    Ok(TickOutcome::Transitioned)
                }
                Some(CMD_DIAG) => {
                    self.mode = Mode::Test;
                    Ok(TickOutcome::Transitioned)
                }
                _ => Ok(TickOutcome::Idle),
            },
            Mode::Test => {
                // Placeholder diagnostic mode: its only contract is that it
                // always falls straight back to standby.
                self.status
                    .line("placeholder diagnostic state, returning to standby");
                self.emit_standby_menu();
                self.mode = Mode::Standby;
                Ok(TickOutcome::Transitioned)
            }
            Mode::Cleaning => {
                if input == Some(CMD_PURGE) {
                    self.bank.all_off()?;
                    self.status.line("done");
                    self.mode = Mode::Standby;
                    Ok(TickOutcome::Transitioned)
                } else {
                    // Level-triggered: re-assert "all pumps on" every tick
                    // while no stop command has arrived. Idempotent, and a
                    // single missed actuation heals on the next tick.
                    self.bank.all_on()?;
                    Ok(TickOutcome::Idle)
                }
            }
            Mode::RecipeSelect => match input {
                Some(key @ FIRST_RECIPE_KEY..=LAST_RECIPE_KEY) => {
                    let idx = usize::from(key - FIRST_RECIPE_KEY);
                    if idx >= self.recipes.len() {
                        // Letter beyond the configured table: ignore like
                        // any other unrecognized byte.
                        return Ok(TickOutcome::Idle);
                    }
                    self.echo_selection(idx);
                    self.emit_size_menu();
                    self.mode = Mode::SizeSelect { recipe: idx };
                    Ok(TickOutcome::Transitioned)
                }
                _ => Ok(TickOutcome::Idle),
            },
            Mode::SizeSelect { recipe } => match input {
                Some(key @ FIRST_SIZE_KEY..=LAST_SIZE_KEY) => {
                    let idx = usize::from(key - FIRST_SIZE_KEY);
                    if idx >= self.sizes.len() {
                        return Ok(TickOutcome::Idle);
                    }
                    self.dispense(recipe, idx)?;
                    self.mode = Mode::Standby;
                    self.emit_standby_menu();
                    Ok(TickOutcome::Dispensed)
                }
                _ => Ok(TickOutcome::Idle),
            },
        }
    }

    /// Run one complete pour: compute the plan, report it, drive the pumps
    /// sequentially. Blocks for the sum of the run times.
    fn dispense(&mut self, recipe_idx: usize, size_idx: usize) -> Result<()> {
        let plan = {
            let recipe = &self.recipes[recipe_idx];
            let size = &self.sizes[size_idx];
            let plan = plan_dispense(recipe, size.ounces, self.flow_rate);
            self.status.line(&format!(
                "dispensing {} ({}, {} oz)",
                recipe.name, size.name, size.ounces
            ));
            let oz = &plan.ounces;
            self.status.line(&format!(
                "pump oz: {:.2} {:.2} {:.2} {:.2} (water {:.2})",
                oz[0], oz[1], oz[2], oz[3], oz[WATER_INDEX]
            ));
            let s = &plan.pump_seconds;
            self.status.line(&format!(
                "run times (s): {:.2} {:.2} {:.2} {:.2}",
                s[0], s[1], s[2], s[3]
            ));
            plan
        };
        tracing::info!(
            recipe = %self.recipes[recipe_idx].name,
            size = %self.sizes[size_idx].name,
            total_s = plan.total_seconds(),
            "dispense start"
        );
        let Self {
            bank,
            status,
            clock,
            ..
        } = self;
        if let Err(e) = bank.run_sequence(&plan.pump_seconds, &**clock, status) {
            if let Err(stop_err) = bank.all_off() {
                tracing::warn!(error = %stop_err, "pump shutdown failed after dispense error");
            }
            return Err(e);
        }
        self.status.line("finished");
        tracing::info!("dispense complete");
        Ok(())
    }

    fn emit_standby_menu(&mut self) {
        self.status
            .line("------------------ awaiting instructions ------------------");
        self.status
            .line("press P to run a purge cycle, or O to order a drink");
    }

    fn emit_recipe_menu(&mut self) {
        self.status
            .line("------------------ drink ordering ------------------");
        let menu = self
            .recipes
            .iter()
            .enumerate()
            .map(|(i, r)| format!("{} for {}", (FIRST_RECIPE_KEY + i as u8) as char, r.name))
            .collect::<Vec<_>>()
            .join(", ");
        self.status.line(&format!("press {menu}"));
    }

    fn emit_size_menu(&mut self) {
        let menu = self
            .sizes
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{} for {}", (FIRST_SIZE_KEY + i as u8) as char, s.name))
            .collect::<Vec<_>>()
            .join(", ");
        self.status.line(&format!("press {menu}"));
    }

    fn echo_selection(&mut self, idx: usize) {
        let name = self.recipes[idx].name.clone();
        self.status.line(&format!("{name} selected"));
        let r = &self.recipes[idx].ratios;
        self.status.line(&format!(
            "ratios: {:.2} {:.2} {:.2} {:.2} (water {:.2})",
            r[0], r[1], r[2], r[3], r[WATER_INDEX]
        ));
    }
}

fn validate_tables(recipes: &[Recipe], sizes: &[Size], flow_rate: f32, power: u8) -> Result<()> {
    if recipes.is_empty() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "at least one recipe is required",
        )));
    }
    if recipes.len() > MENU_RECIPE_MAX {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "more recipes than menu letters A-D",
        )));
    }
    for r in recipes {
        for ratio in &r.ratios {
            if !ratio.is_finite() || *ratio < 0.0 {
                return Err(eyre::Report::new(BuildError::InvalidConfig(
                    "recipe ratios must be finite and >= 0",
                )));
            }
        }
    }
    if sizes.len() != SIZE_SELECTOR_COUNT {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "exactly four sizes are required (selectors W-Z)",
        )));
    }
    for s in sizes {
        if !(s.ounces.is_finite() && s.ounces > 0.0) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "size ounces must be finite and > 0",
            )));
        }
    }
    if !(flow_rate.is_finite() && flow_rate > 0.0) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "flow rate must be finite and > 0",
        )));
    }
    if power == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "pump power must be > 0",
        )));
    }
    Ok(())
}

/// Public dynamic (boxed) dispenser that hides the hardware generics.
pub struct Dispenser {
    inner: DispenserCore<Box<dyn Pump>, Box<dyn StatusSink>>,
}

impl core::fmt::Debug for Dispenser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispenser")
            .field("mode", &self.inner.mode)
            .field("recipes", &self.inner.recipes.len())
            .finish()
    }
}

impl Dispenser {
    /// Start building a Dispenser.
    pub fn builder() -> DispenserBuilder<Missing> {
        DispenserBuilder::default()
    }

    pub fn mode(&self) -> Mode {
        self.inner.mode()
    }

    pub fn recipes(&self) -> &[Recipe] {
        self.inner.recipes()
    }

    pub fn sizes(&self) -> &[Size] {
        self.inner.sizes()
    }

    /// Reset for operation; see [`DispenserCore::begin`].
    pub fn begin(&mut self) -> Result<()> {
        self.inner.begin()
    }

    /// One iteration of the command loop.
    pub fn tick(&mut self, input: Option<u8>) -> Result<TickOutcome> {
        self.inner.tick(input)
    }

    /// Stop all pumps (best-effort).
    pub fn stop_pumps(&mut self) -> Result<()> {
        self.inner.stop_pumps()
    }

    /// Drive the full poll-and-dispatch loop; see [`crate::runner::run`].
    pub fn run(
        &mut self,
        port: &crate::port::CommandPort,
        poll_hz: u32,
        shutdown: &std::sync::atomic::AtomicBool,
    ) -> Result<()> {
        crate::runner::run(&mut self.inner, port, poll_hz, shutdown)
    }
}

// Type-state markers for the builder
pub struct Missing;
pub struct Set;

/// Builder for `Dispenser`. Tables and constants are validated on `build()`.
pub struct DispenserBuilder<S> {
    pumps: Option<[Box<dyn Pump>; PUMP_COUNT]>,
    status: Option<Box<dyn StatusSink>>,
    recipes: Option<Vec<Recipe>>,
    sizes: Option<Vec<Size>>,
    flow_rate: Option<f32>,
    pump_power: Option<u8>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    _s: PhantomData<S>,
}

impl Default for DispenserBuilder<Missing> {
    fn default() -> Self {
        Self {
            pumps: None,
            status: None,
            recipes: None,
            sizes: None,
            flow_rate: None,
            pump_power: None,
            clock: None,
            _s: PhantomData,
        }
    }
}

/// Chainable setters that do not affect type-state
impl<S> DispenserBuilder<S> {
    pub fn with_status(mut self, status: impl StatusSink + 'static) -> Self {
        self.status = Some(Box::new(status));
        self
    }
    pub fn with_recipes(mut self, recipes: Vec<Recipe>) -> Self {
        self.recipes = Some(recipes);
        self
    }
    pub fn with_sizes(mut self, sizes: Vec<Size>) -> Self {
        self.sizes = Some(sizes);
        self
    }
    pub fn with_flow_rate(mut self, oz_per_s: f32) -> Self {
        self.flow_rate = Some(oz_per_s);
        self
    }
    pub fn with_pump_power(mut self, duty: u8) -> Self {
        self.pump_power = Some(duty);
        self
    }
    /// Provide a custom clock implementation; defaults to MonotonicClock
    /// when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Fallible build available in any type-state; returns a detailed
    /// BuildError for missing pieces.
    pub fn try_build(self) -> Result<Dispenser> {
        let pumps = self
            .pumps
            .ok_or_else(|| eyre::Report::new(BuildError::MissingPumps))?;
        let status: Box<dyn StatusSink> = self.status.unwrap_or_else(|| Box::new(NullStatus));
        let (builtin_recipes, builtin_sizes) = default_tables();
        let recipes = self.recipes.unwrap_or(builtin_recipes);
        let sizes = self.sizes.unwrap_or(builtin_sizes);
        let defaults = refresher_config::Dispense::default();
        let flow_rate = self.flow_rate.unwrap_or(defaults.flow_rate_oz_per_s);
        let power = self.pump_power.unwrap_or(defaults.pump_power);
        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(b) => Arc::from(b),
            None => Arc::new(MonotonicClock::new()),
        };

        validate_tables(&recipes, &sizes, flow_rate, power)?;

        Ok(Dispenser {
            inner: DispenserCore {
                mode: Mode::Standby,
                bank: PumpBank::new(pumps, power),
                status,
                recipes,
                sizes,
                flow_rate,
                clock,
            },
        })
    }
}

// Setter that advances type-state when providing the mandatory pumps
impl DispenserBuilder<Missing> {
    pub fn with_pumps<P: Pump + 'static>(
        self,
        pumps: [P; PUMP_COUNT],
    ) -> DispenserBuilder<Set> {
        let DispenserBuilder {
            pumps: _,
            status,
            recipes,
            sizes,
            flow_rate,
            pump_power,
            clock,
            _s: _,
        } = self;
        DispenserBuilder {
            pumps: Some(pumps.map(|p| Box::new(p) as Box<dyn Pump>)),
            status,
            recipes,
            sizes,
            flow_rate,
            pump_power,
            clock,
            _s: PhantomData,
        }
    }
}

impl DispenserBuilder<Set> {
    /// Validate and build the Dispenser. Only available once pumps are set.
    pub fn build(self) -> Result<Dispenser> {
        self.try_build()
    }
}

/// Generic, statically-dispatched alias using the unified core.
pub type DispenserG<P, W> = DispenserCore<P, W>;

/// Build a generic, statically-dispatched dispenser from concrete pumps
/// and status sink.
pub fn build_dispenser<P, W>(
    pumps: [P; PUMP_COUNT],
    status: W,
    recipes: Vec<Recipe>,
    sizes: Vec<Size>,
    flow_rate_oz_per_s: f32,
    pump_power: u8,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<DispenserG<P, W>>
where
    P: Pump + 'static,
    W: StatusSink + 'static,
{
    validate_tables(&recipes, &sizes, flow_rate_oz_per_s, pump_power)?;
    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };
    Ok(DispenserG {
        mode: Mode::Standby,
        bank: PumpBank::new(pumps, pump_power),
        status,
        recipes,
        sizes,
        flow_rate: flow_rate_oz_per_s,
        clock,
    })
}
