//! The controller's outer loop: poll for one byte, dispatch, pace.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use refresher_traits::Pump;

use crate::error::Result;
use crate::machine::{DispenserCore, TickOutcome};
use crate::port::CommandPort;
use crate::status::StatusSink;

/// Run the controller until the command channel dies or `shutdown` is
/// raised (ctrl-c in the CLI). Every pass consumes at most one byte; a
/// timed dispense blocks the whole loop for its duration, and anything
/// received meanwhile is discarded afterwards, not replayed.
pub fn run<P: Pump, W: StatusSink>(
    dispenser: &mut DispenserCore<P, W>,
    port: &CommandPort,
    poll_hz: u32,
    shutdown: &AtomicBool,
) -> Result<()> {
    let period = Duration::from_micros(crate::util::period_us(poll_hz));
    dispenser.begin()?;
    tracing::info!(poll_hz, "controller started");

    loop {
        if shutdown.load(Ordering::Relaxed) {
            dispenser.stop_pumps()?;
            tracing::info!("shutdown requested; pumps stopped");
            return Ok(());
        }

        let input = match port.poll() {
            Ok(b) => b,
            Err(e) => {
                let _ = dispenser.stop_pumps();
                return Err(e);
            }
        };

        let outcome = match dispenser.tick(input) {
            Ok(o) => o,
            Err(e) => {
                let _ = dispenser.stop_pumps();
                return Err(e);
            }
        };

        if outcome == TickOutcome::Dispensed {
            let dropped = port.drain();
            if dropped > 0 {
                tracing::debug!(dropped, "discarded commands received during dispense");
            }
        }

        // Pace with wall-clock time regardless of the dispenser's injected
        // clock; only pour durations are simulated in tests.
        std::thread::sleep(period);
    }
}
