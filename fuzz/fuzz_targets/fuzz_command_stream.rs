#![no_main]
use libfuzzer_sys::fuzz_target;

use refresher_core::mocks::{ManualClock, MemoryStatus, mock_bank};
use refresher_core::{build_dispenser, default_tables};

fuzz_target!(|data: &[u8]| {
    // Arbitrary command streams must never panic or error the machine; a
    // 0x00 byte stands in for an empty tick. The manual clock makes any
    // dispense the stream triggers instantaneous.
    let (pumps, _probe) = mock_bank();
    let (recipes, sizes) = default_tables();
    let Ok(mut dispenser) = build_dispenser(
        pumps,
        MemoryStatus::new(),
        recipes,
        sizes,
        2.5,
        255,
        Some(Box::new(ManualClock::new())),
    ) else {
        return;
    };
    if dispenser.begin().is_err() {
        return;
    }
    for &byte in data {
        let input = (byte != 0).then_some(byte);
        assert!(dispenser.tick(input).is_ok());
    }
});
