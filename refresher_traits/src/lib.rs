pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::time::Duration;

/// One of the four peristaltic pump outputs.
///
/// `set_power` drives the output at a PWM duty level (0 is equivalent to
/// off); `stop` is the explicit off-transition and must always be safe to
/// issue, including when the pump is already off.
pub trait Pump {
    fn set_power(&mut self, duty: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: Pump + ?Sized> Pump for Box<T> {
    fn set_power(&mut self, duty: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_power(duty)
    }
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).stop()
    }
}

/// Byte-oriented command input: a serial line from the button node, or a
/// keyboard. `read` returns `Ok(None)` when no byte arrived within
/// `timeout`; that is the normal outcome on an idle tick, not an error.
pub trait CommandSource {
    fn read(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<u8>, Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: CommandSource + ?Sized> CommandSource for Box<T> {
    fn read(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<u8>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read(timeout)
    }
}
