use std::sync::atomic::AtomicBool;
use std::time::Duration;

use refresher_core::mocks::{ManualClock, MemoryStatus, ScriptedSource, mock_bank};
use refresher_core::port::CommandPort;
use refresher_core::{build_dispenser, default_tables, runner};

/// Full order driven end-to-end through the port and run loop: the script
/// places a grande lemonade, then the source dies, which is the only way
/// the loop exits without a shutdown signal.
#[test]
fn scripted_order_dispenses_then_channel_loss_is_fatal() {
    let (pumps, probe) = mock_bank();
    let status = MemoryStatus::new();
    let (recipes, sizes) = default_tables();
    let clock = ManualClock::new();
    let mut dispenser = build_dispenser(
        pumps,
        status.clone(),
        recipes,
        sizes,
        2.5,
        255,
        Some(Box::new(clock.clone())),
    )
    .expect("build dispenser");

    let port = CommandPort::spawn(
        ScriptedSource::closing([b'O', b'B', b'X']),
        Duration::from_millis(5),
    );
    let shutdown = AtomicBool::new(false);

    // Poll much faster than the 5ms key pacing so the single-byte slot is
    // always empty when the next press lands.
    let err = runner::run(&mut dispenser, &port, 1000, &shutdown)
        .expect_err("channel loss must be fatal");
    assert!(format!("{err}").contains("command channel closed"));

    // The order completed before the line died, and the loop parked the
    // pumps on its way out.
    assert!(status.contains("finished"));
    assert!(clock.sleeps().contains(&Duration::from_secs_f32(3.2)));
    assert!(probe.all_stopped());
}

#[test]
fn shutdown_flag_stops_the_loop_with_pumps_off() {
    let (pumps, probe) = mock_bank();
    let status = MemoryStatus::new();
    let (recipes, sizes) = default_tables();
    let mut dispenser = build_dispenser(
        pumps,
        status.clone(),
        recipes,
        sizes,
        2.5,
        255,
        Some(Box::new(ManualClock::new())),
    )
    .expect("build dispenser");

    let port = CommandPort::spawn(ScriptedSource::new([]), Duration::from_millis(5));
    let shutdown = AtomicBool::new(true); // raised before the first pass

    runner::run(&mut dispenser, &port, 20, &shutdown).expect("clean shutdown");
    assert!(probe.all_stopped());
}
