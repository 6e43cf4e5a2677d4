//! Test and helper mocks for refresher_core

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use refresher_traits::{Clock, CommandSource, Pump};

use crate::recipe::PUMP_COUNT;
use crate::status::StatusSink;

/// One observed pump transition, in issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpCmd {
    On { pump: usize, duty: u8 },
    Off { pump: usize },
}

/// Recording pump; duty and transition log are shared with a [`BankProbe`].
pub struct MockPump {
    id: usize,
    duty: Rc<Cell<u8>>,
    log: Rc<RefCell<Vec<PumpCmd>>>,
}

impl Pump for MockPump {
    fn set_power(&mut self, duty: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.duty.set(duty);
        self.log.borrow_mut().push(PumpCmd::On {
            pump: self.id,
            duty,
        });
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.duty.set(0);
        self.log.borrow_mut().push(PumpCmd::Off { pump: self.id });
        Ok(())
    }
}

/// Shared view into a mock bank: current duties plus the transition log.
#[derive(Clone)]
pub struct BankProbe {
    duties: [Rc<Cell<u8>>; PUMP_COUNT],
    log: Rc<RefCell<Vec<PumpCmd>>>,
}

impl BankProbe {
    pub fn duties(&self) -> [u8; PUMP_COUNT] {
        [
            self.duties[0].get(),
            self.duties[1].get(),
            self.duties[2].get(),
            self.duties[3].get(),
        ]
    }

    pub fn all_running(&self) -> bool {
        self.duties.iter().all(|d| d.get() > 0)
    }

    pub fn all_stopped(&self) -> bool {
        self.duties.iter().all(|d| d.get() == 0)
    }

    pub fn commands(&self) -> Vec<PumpCmd> {
        self.log.borrow().clone()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

/// Build four recording pumps and the probe observing them.
pub fn mock_bank() -> ([MockPump; PUMP_COUNT], BankProbe) {
    let log: Rc<RefCell<Vec<PumpCmd>>> = Rc::new(RefCell::new(Vec::new()));
    let duties: [Rc<Cell<u8>>; PUMP_COUNT] = std::array::from_fn(|_| Rc::new(Cell::new(0)));
    let pumps = std::array::from_fn(|i| MockPump {
        id: i + 1,
        duty: duties[i].clone(),
        log: log.clone(),
    });
    (pumps, BankProbe { duties, log })
}

/// A pump whose every command fails; for error-path tests.
pub struct FailingPump;

impl Pump for FailingPump {
    fn set_power(&mut self, _duty: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("pump driver fault")))
    }
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("pump driver fault")))
    }
}

/// Deterministic clock: `sleep` advances simulated time without blocking
/// and records each requested duration.
#[derive(Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
            slept: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Advance simulated time by `d`.
    pub fn advance(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = off.saturating_add(d);
        }
    }

    /// Total simulated time elapsed since construction.
    pub fn elapsed(&self) -> Duration {
        self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO)
    }

    /// Every duration passed to `sleep`, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.slept.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let off = self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO);
        self.origin + off
    }

    fn sleep(&self, d: Duration) {
        if let Ok(mut slept) = self.slept.lock() {
            slept.push(d);
        }
        self.advance(d);
    }
}

/// Captures status lines for assertions.
#[derive(Default, Clone)]
pub struct MemoryStatus {
    lines: Rc<RefCell<Vec<String>>>,
}

impl MemoryStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|l| l.contains(needle))
    }

    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
    }
}

impl StatusSink for MemoryStatus {
    fn line(&mut self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

/// Replays a fixed byte script. The paced variants wait one read-timeout
/// between bytes, like a human pressing buttons; `burst` yields the whole
/// script back-to-back to exercise the single-byte buffer.
pub struct ScriptedSource {
    bytes: VecDeque<u8>,
    paced: bool,
    close_when_done: bool,
}

impl ScriptedSource {
    /// Paced script, then an idle line forever.
    pub fn new(script: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: script.into().into(),
            paced: true,
            close_when_done: false,
        }
    }

    /// Paced script, then the source fails as if unplugged.
    pub fn closing(script: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: script.into().into(),
            paced: true,
            close_when_done: true,
        }
    }

    /// Entire script as fast as the reader will take it.
    pub fn burst(script: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: script.into().into(),
            paced: false,
            close_when_done: false,
        }
    }
}

impl CommandSource for ScriptedSource {
    fn read(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<u8>, Box<dyn std::error::Error + Send + Sync>> {
        match self.bytes.pop_front() {
            Some(b) => {
                if self.paced {
                    std::thread::sleep(timeout);
                }
                Ok(Some(b))
            }
            None if self.close_when_done => {
                Err(Box::new(std::io::Error::other("script exhausted")))
            }
            None => {
                // Pretend the line stayed silent for the full window.
                std::thread::sleep(timeout);
                Ok(None)
            }
        }
    }
}

/// A source that fails immediately, as an unplugged serial adapter would.
pub struct ClosedSource;

impl CommandSource for ClosedSource {
    fn read(
        &mut self,
        _timeout: Duration,
    ) -> Result<Option<u8>, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("command line unplugged")))
    }
}
