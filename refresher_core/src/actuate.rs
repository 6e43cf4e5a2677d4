//! Pump actuation layer: the only code that commands the four outputs.
//!
//! Two modes, matching the two ways the machine uses its pumps:
//! - a timed sequential run for dispensing (one pump at a time, open-loop
//!   durations, each on/off transition reported to the status channel);
//! - a level-triggered batched on/off for the purge cycle, re-asserted
//!   every tick from the latched flag rather than timed.

use std::time::Duration;

use eyre::WrapErr;
use refresher_traits::{Clock, Pump};

use crate::error::{Result, map_hw_error_dyn};
use crate::recipe::PUMP_COUNT;
use crate::status::StatusSink;

pub struct PumpBank<P: Pump> {
    pumps: [P; PUMP_COUNT],
    power: u8,
}

impl<P: Pump> PumpBank<P> {
    pub fn new(pumps: [P; PUMP_COUNT], power: u8) -> Self {
        Self { pumps, power }
    }

    /// Batched command: all four outputs to the fixed duty level.
    pub fn all_on(&mut self) -> Result<()> {
        let power = self.power;
        for (i, pump) in self.pumps.iter_mut().enumerate() {
            pump.set_power(power)
                .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
                .wrap_err_with(|| format!("pump {} on", i + 1))?;
        }
        Ok(())
    }

    /// Batched command: all four outputs off.
    pub fn all_off(&mut self) -> Result<()> {
        for (i, pump) in self.pumps.iter_mut().enumerate() {
            pump.stop()
                .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
                .wrap_err_with(|| format!("pump {} off", i + 1))?;
        }
        Ok(())
    }

    /// Timed sequential run: pump 1 for `seconds[0]`, then 2, 3, 4. Pumps
    /// never overlap here; running one at a time keeps the delivered flow
    /// rate consistent with the calibrated constant.
    ///
    /// A non-positive (or non-finite) entry skips the activation with zero
    /// elapsed time, but the off-transition is still issued.
    pub fn run_sequence<W: StatusSink>(
        &mut self,
        seconds: &[f32; PUMP_COUNT],
        clock: &dyn Clock,
        status: &mut W,
    ) -> Result<()> {
        let power = self.power;
        for (i, (pump, &secs)) in self.pumps.iter_mut().zip(seconds.iter()).enumerate() {
            if secs.is_finite() && secs > 0.0 {
                status.line(&format!("pump {} on", i + 1));
                tracing::debug!(pump = i + 1, secs, "timed run start");
                pump.set_power(power)
                    .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
                    .wrap_err_with(|| format!("pump {} on", i + 1))?;
                clock.sleep(Duration::from_secs_f32(secs));
            }
            pump.stop()
                .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
                .wrap_err_with(|| format!("pump {} off", i + 1))?;
            status.line(&format!("pump {} off", i + 1));
        }
        Ok(())
    }
}
