//! Background command-channel reader.
//!
//! Spawns a thread that owns the `CommandSource` and pushes bytes into a
//! bounded(1) channel: like the single-byte receive register on the wire,
//! a byte arriving while the slot is already full is dropped, never
//! queued. `drain` throws away everything pending, which the run loop uses
//! to discard commands that arrived during a blocking pump sequence.
//!
//! Safety: each `CommandPort` spawns exactly one thread that is shut down
//! when the port is dropped, preventing thread leaks.

use crossbeam_channel as xch;
use refresher_traits::CommandSource;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::{DispenseError, Result};

pub struct CommandPort {
    rx: xch::Receiver<u8>,
    /// Shutdown flag for immediate response (atomic for lock-free check)
    shutdown: Arc<AtomicBool>,
    /// Join handle for graceful thread cleanup
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl CommandPort {
    /// Spawn the reader thread. `timeout` bounds each blocking read so the
    /// thread notices shutdown promptly even on a silent line.
    pub fn spawn<S: CommandSource + Send + 'static>(mut source: S, timeout: Duration) -> Self {
        let (tx, rx) = xch::bounded(1);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("command reader received shutdown signal");
                    break;
                }

                match source.read(timeout) {
                    Ok(Some(byte)) => match tx.try_send(byte) {
                        Ok(()) => {}
                        Err(xch::TrySendError::Full(_)) => {
                            // Slot already holds an unconsumed byte; the
                            // newcomer is lost, as on the wire.
                            tracing::trace!(byte, "command dropped, buffer full");
                        }
                        Err(xch::TrySendError::Disconnected(_)) => {
                            tracing::debug!("command consumer disconnected, exiting thread");
                            break;
                        }
                    },
                    // No byte within the timeout: the normal idle case.
                    Ok(None) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "command source failed");
                        break;
                    }
                }
            }
            tracing::trace!("command reader exiting cleanly");
        });

        Self {
            rx,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Non-blocking: at most one pending byte. `Ok(None)` on an idle tick;
    /// an error only once the source is gone for good, which is fatal (the
    /// controller is useless without its command channel).
    pub fn poll(&self) -> Result<Option<u8>> {
        match self.rx.try_recv() {
            Ok(byte) => Ok(Some(byte)),
            Err(xch::TryRecvError::Empty) => Ok(None),
            Err(xch::TryRecvError::Disconnected) => {
                Err(eyre::Report::new(DispenseError::ChannelClosed))
            }
        }
    }

    /// Discard everything pending; returns how many bytes were thrown away.
    pub fn drain(&self) -> usize {
        self.rx.try_iter().count()
    }
}

impl Drop for CommandPort {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // The thread exits after its current source.read() returns, which
        // the per-read timeout bounds.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("command reader joined successfully");
                }
                Err(e) => {
                    // Thread panicked; log but don't propagate (we're in Drop)
                    tracing::warn!(?e, "command reader panicked during shutdown");
                }
            }
        }
    }
}
