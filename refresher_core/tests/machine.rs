use refresher_core::mocks::{BankProbe, ManualClock, MemoryStatus, MockPump, mock_bank};
use refresher_core::{DispenserG, Mode, TickOutcome, build_dispenser, default_tables};

fn dispenser() -> (DispenserG<MockPump, MemoryStatus>, BankProbe, MemoryStatus) {
    let (pumps, probe) = mock_bank();
    let status = MemoryStatus::new();
    let (recipes, sizes) = default_tables();
    let d = build_dispenser(
        pumps,
        status.clone(),
        recipes,
        sizes,
        2.5,
        255,
        Some(Box::new(ManualClock::new())),
    )
    .expect("build dispenser");
    (d, probe, status)
}

#[test]
fn begin_parks_pumps_and_prints_standby_menu() {
    let (mut d, probe, status) = dispenser();
    d.begin().expect("begin");
    assert_eq!(d.mode(), Mode::Standby);
    assert!(probe.all_stopped());
    assert!(status.contains("awaiting instructions"));
}

#[test]
fn ordering_command_opens_menu_with_all_recipe_names() {
    let (mut d, _probe, status) = dispenser();
    d.begin().expect("begin");
    status.clear();

    let out = d.tick(Some(b'O')).expect("tick");
    assert_eq!(out, TickOutcome::Transitioned);
    assert_eq!(d.mode(), Mode::RecipeSelect);
    for name in [
        "test drink",
        "lemonade",
        "passionfruit lemonade",
        "mango dragonfruit",
    ] {
        assert!(status.contains(name), "menu missing {name}");
    }
}

#[test]
fn recipe_letter_records_pending_selection() {
    let (mut d, _probe, status) = dispenser();
    d.begin().expect("begin");
    d.tick(Some(b'O')).expect("enter ordering");
    status.clear();

    let out = d.tick(Some(b'B')).expect("select");
    assert_eq!(out, TickOutcome::Transitioned);
    assert_eq!(d.mode(), Mode::SizeSelect { recipe: 1 });
    assert!(status.contains("lemonade selected"));
    // size menu follows the echo
    assert!(status.contains("W for tall"));
}

#[test]
fn unrecognized_byte_in_standby_is_a_silent_self_loop() {
    let (mut d, probe, status) = dispenser();
    d.begin().expect("begin");
    probe.clear();
    status.clear();

    let out = d.tick(Some(b'Q')).expect("tick");
    assert_eq!(out, TickOutcome::Idle);
    assert_eq!(d.mode(), Mode::Standby);
    assert!(probe.commands().is_empty());
    assert!(status.lines().is_empty());
}

#[test]
fn empty_tick_keeps_current_mode() {
    let (mut d, _probe, _status) = dispenser();
    d.begin().expect("begin");
    d.tick(Some(b'O')).expect("enter ordering");
    for _ in 0..5 {
        assert_eq!(d.tick(None).expect("idle tick"), TickOutcome::Idle);
        assert_eq!(d.mode(), Mode::RecipeSelect);
    }
}

#[test]
fn diagnostic_mode_always_falls_back_to_standby() {
    let (mut d, _probe, status) = dispenser();
    d.begin().expect("begin");
    assert_eq!(
        d.tick(Some(b'V')).expect("enter diag"),
        TickOutcome::Transitioned
    );
    assert_eq!(d.mode(), Mode::Test);
    status.clear();

    // Any tick, input or not, returns to standby and reprints the menu.
    assert_eq!(
        d.tick(None).expect("diag tick"),
        TickOutcome::Transitioned
    );
    assert_eq!(d.mode(), Mode::Standby);
    assert!(status.contains("awaiting instructions"));
}

#[test]
fn selection_letters_do_nothing_outside_their_mode() {
    let (mut d, probe, _status) = dispenser();
    d.begin().expect("begin");
    probe.clear();
    for b in [b'A', b'D', b'W', b'Z'] {
        assert_eq!(d.tick(Some(b)).expect("tick"), TickOutcome::Idle);
        assert_eq!(d.mode(), Mode::Standby);
    }
    assert!(probe.commands().is_empty());
}

#[test]
fn recipe_letter_beyond_configured_table_is_ignored() {
    let (pumps, _probe) = mock_bank();
    let status = MemoryStatus::new();
    let (mut recipes, sizes) = default_tables();
    recipes.truncate(2);
    let mut d = build_dispenser(
        pumps,
        status.clone(),
        recipes,
        sizes,
        2.5,
        255,
        Some(Box::new(ManualClock::new())),
    )
    .expect("build dispenser");
    d.begin().expect("begin");
    d.tick(Some(b'O')).expect("enter ordering");

    assert_eq!(d.tick(Some(b'C')).expect("tick"), TickOutcome::Idle);
    assert_eq!(d.mode(), Mode::RecipeSelect);
    assert_eq!(
        d.tick(Some(b'B')).expect("tick"),
        TickOutcome::Transitioned
    );
    assert_eq!(d.mode(), Mode::SizeSelect { recipe: 1 });
}
