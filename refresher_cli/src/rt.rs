//! Real-time scheduling helpers (Linux SCHED_FIFO + mlockall).
//!
//! A timed pour is open-loop: if the process is paged out or preempted
//! mid-sequence, the drink is simply wrong. Locking memory and raising the
//! scheduling class keeps the sleep durations honest. Everything here is
//! best-effort; a failure logs a warning and the controller runs anyway.

use std::sync::OnceLock;

pub fn setup_rt_once(rt: bool, prio: Option<i32>) {
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !rt {
        return;
    }

    RT_ONCE.get_or_init(|| {
        // SAFETY: plain libc calls on the current process; no pointers
        // outlive the calls.
        unsafe {
            if libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) != 0 {
                tracing::warn!(
                    error = %std::io::Error::last_os_error(),
                    "mlockall failed; continuing with pageable memory"
                );
            }

            let min = libc::sched_get_priority_min(libc::SCHED_FIFO);
            let max = libc::sched_get_priority_max(libc::SCHED_FIFO);
            let prio = prio.unwrap_or(min.max(1)).clamp(min, max);
            let param = libc::sched_param {
                sched_priority: prio,
            };
            if libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) != 0 {
                tracing::warn!(
                    error = %std::io::Error::last_os_error(),
                    prio,
                    "SCHED_FIFO unavailable; running with the default scheduler"
                );
            } else {
                tracing::info!(prio, "real-time scheduling enabled");
            }
        }
    });
}
