//! Raspberry Pi backends: software-PWM GPIO pumps and a UART command
//! source, both thin wrappers over rppal.

use crate::error::HwError;
use refresher_traits::{CommandSource, Pump};
use rppal::gpio::{Gpio, OutputPin};
use rppal::uart::{Parity, Uart};
use std::time::Duration;

/// Software PWM carrier for the motor driver inputs. The HW-039 driver
/// only needs a duty ratio, not a precise frequency.
const PWM_HZ: f64 = 100.0;

fn boxed(e: HwError) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(e)
}

pub struct GpioPump {
    pin: OutputPin,
}

impl GpioPump {
    pub fn new(bcm_pin: u8) -> Result<Self, HwError> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let mut pin = gpio
            .get(bcm_pin)
            .map_err(|e| HwError::Gpio(format!("pin {bcm_pin}: {e}")))?
            .into_output();
        // Drive low before anything else so a restart can't leave a pump running.
        pin.set_low();
        Ok(GpioPump { pin })
    }

    /// Open all four pump outputs, failing on the first bad pin.
    pub fn bank(pins: [u8; 4]) -> Result<[GpioPump; 4], HwError> {
        Ok([
            GpioPump::new(pins[0])?,
            GpioPump::new(pins[1])?,
            GpioPump::new(pins[2])?,
            GpioPump::new(pins[3])?,
        ])
    }
}

impl Pump for GpioPump {
    fn set_power(&mut self, duty: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if duty == 0 {
            return self.stop();
        }
        self.pin
            .set_pwm_frequency(PWM_HZ, f64::from(duty) / 255.0)
            .map_err(|e| boxed(HwError::Gpio(e.to_string())))
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.pin
            .clear_pwm()
            .map_err(|e| boxed(HwError::Gpio(e.to_string())))?;
        self.pin.set_low();
        Ok(())
    }
}

/// Serial line to the button node (8N1).
pub struct UartSource {
    uart: Uart,
}

impl UartSource {
    pub fn new(device: &str, baud: u32) -> Result<Self, HwError> {
        let uart = Uart::with_path(device, baud, Parity::None, 8, 1)
            .map_err(|e| HwError::Serial(format!("{device}: {e}")))?;
        tracing::info!(device, baud, "uart command source opened");
        Ok(UartSource { uart })
    }
}

impl CommandSource for UartSource {
    fn read(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<u8>, Box<dyn std::error::Error + Send + Sync>> {
        self.uart
            .set_read_mode(1, timeout)
            .map_err(|e| boxed(HwError::Serial(e.to_string())))?;
        let mut buf = [0u8; 1];
        let n = self
            .uart
            .read(&mut buf)
            .map_err(|e| boxed(HwError::Serial(e.to_string())))?;
        Ok((n > 0).then_some(buf[0]))
    }
}
