//! The machine must define a successor for every (mode, byte) pair and
//! survive arbitrary command streams without erroring or wedging.

use proptest::prelude::*;
use refresher_core::mocks::{ManualClock, MemoryStatus, MockPump, mock_bank};
use refresher_core::{DispenserG, Mode, build_dispenser, default_tables};

fn dispenser() -> DispenserG<MockPump, MemoryStatus> {
    let (pumps, _probe) = mock_bank();
    let (recipes, sizes) = default_tables();
    build_dispenser(
        pumps,
        MemoryStatus::new(),
        recipes,
        sizes,
        2.5,
        255,
        Some(Box::new(ManualClock::new())),
    )
    .expect("build dispenser")
}

/// Drive a fresh machine into the requested mode.
fn steer(d: &mut DispenserG<MockPump, MemoryStatus>, mode: &str) {
    d.begin().expect("begin");
    match mode {
        "standby" => {}
        "test" => {
            d.tick(Some(b'V')).expect("steer");
        }
        "cleaning" => {
            d.tick(Some(b'P')).expect("steer");
        }
        "recipe_select" => {
            d.tick(Some(b'O')).expect("steer");
        }
        "size_select" => {
            d.tick(Some(b'O')).expect("steer");
            d.tick(Some(b'B')).expect("steer");
        }
        other => panic!("unknown mode {other}"),
    }
}

#[test]
fn every_mode_byte_pair_has_a_defined_successor() {
    for mode in ["standby", "test", "cleaning", "recipe_select", "size_select"] {
        for byte in 0..=u8::MAX {
            let mut d = dispenser();
            steer(&mut d, mode);
            d.tick(Some(byte))
                .unwrap_or_else(|e| panic!("tick failed in {mode} on {byte:#04x}: {e}"));
        }
        // the empty tick is part of the input alphabet too
        let mut d = dispenser();
        steer(&mut d, mode);
        d.tick(None).expect("empty tick");
    }
}

proptest! {
    #[test]
    fn arbitrary_command_streams_never_error(stream in prop::collection::vec(any::<Option<u8>>(), 0..60)) {
        let mut d = dispenser();
        d.begin().expect("begin");
        for input in stream {
            let outcome = d.tick(input);
            prop_assert!(outcome.is_ok());
        }
        // whatever happened, the machine can still be parked safely
        prop_assert!(d.stop_pumps().is_ok());
        let mode_is_valid = matches!(
            d.mode(),
            Mode::Standby | Mode::Test | Mode::Cleaning | Mode::RecipeSelect | Mode::SizeSelect { .. }
        );
        prop_assert!(mode_is_valid);
    }

    /// A pending recipe index always addresses the configured table.
    #[test]
    fn pending_selection_is_always_in_range(stream in prop::collection::vec(any::<u8>(), 0..40)) {
        let mut d = dispenser();
        d.begin().expect("begin");
        for byte in stream {
            d.tick(Some(byte)).expect("tick");
            if let Mode::SizeSelect { recipe } = d.mode() {
                prop_assert!(recipe < d.recipes().len());
            }
        }
    }
}
