pub mod error;
#[cfg(feature = "hardware")]
pub mod pi;

use refresher_traits::{CommandSource, Pump};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

use crate::error::HwError;

/// Simulated pump implementation: tracks its commanded duty and prints
/// transitions so a desktop run shows what the hardware would do.
pub struct SimulatedPump {
    label: &'static str,
    duty: Rc<Cell<u8>>,
}

impl SimulatedPump {
    pub fn new(label: &'static str) -> Self {
        SimulatedPump {
            label,
            duty: Rc::new(Cell::new(0)),
        }
    }

    pub fn duty(&self) -> u8 {
        self.duty.get()
    }

    /// Four pumps labeled the way the tubing is labeled on the prototype.
    pub fn bank() -> [SimulatedPump; 4] {
        [
            SimulatedPump::new("pump 1"),
            SimulatedPump::new("pump 2"),
            SimulatedPump::new("pump 3"),
            SimulatedPump::new("pump 4"),
        ]
    }
}

impl Pump for SimulatedPump {
    fn set_power(&mut self, duty: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.duty.replace(duty) != duty {
            tracing::debug!(pump = self.label, duty, "simulated pump duty change");
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.set_power(0)
    }
}

/// Interactive command source: a detached thread reads stdin byte-by-byte
/// and hands bytes over a channel so `read` can honor its timeout. The
/// thread lives for the life of the process, which matches how long stdin
/// does.
pub struct StdinSource {
    rx: mpsc::Receiver<u8>,
}

impl StdinSource {
    pub fn spawn() -> Self {
        use std::io::Read;
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut stdin = std::io::stdin().lock();
            let mut buf = [0u8; 1];
            loop {
                match stdin.read(&mut buf) {
                    Ok(0) => break, // EOF: receiver sees a closed channel
                    Ok(_) => {
                        // Skip line endings so `echo O | refresher run` behaves
                        // like a single button press.
                        if buf[0] == b'\n' || buf[0] == b'\r' {
                            continue;
                        }
                        if tx.send(buf[0]).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "stdin read failed");
                        break;
                    }
                }
            }
        });
        Self { rx }
    }
}

impl CommandSource for StdinSource {
    fn read(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<u8>, Box<dyn std::error::Error + Send + Sync>> {
        match self.rx.recv_timeout(timeout) {
            Ok(b) => Ok(Some(b)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(Box::new(HwError::InputClosed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_pump_tracks_duty() {
        let mut pump = SimulatedPump::new("pump 1");
        assert_eq!(pump.duty(), 0);
        pump.set_power(255).unwrap();
        assert_eq!(pump.duty(), 255);
        pump.stop().unwrap();
        assert_eq!(pump.duty(), 0);
    }

    #[test]
    fn simulated_bank_starts_off() {
        let bank = SimulatedPump::bank();
        assert!(bank.iter().all(|p| p.duty() == 0));
    }
}
