use refresher_hardware::SimulatedPump;
use refresher_traits::Pump;
use rstest::rstest;

#[rstest]
#[case(255)]
#[case(128)]
#[case(1)]
fn duty_round_trips_through_the_trait(#[case] duty: u8) {
    let mut pump = SimulatedPump::new("pump 1");
    pump.set_power(duty).unwrap();
    assert_eq!(pump.duty(), duty);
    pump.stop().unwrap();
    assert_eq!(pump.duty(), 0);
}

#[test]
fn stop_is_idempotent() {
    let mut pump = SimulatedPump::new("pump 2");
    pump.set_power(200).unwrap();
    pump.stop().unwrap();
    pump.stop().unwrap();
    assert_eq!(pump.duty(), 0);
}

#[test]
fn bank_pumps_are_independent() {
    let mut bank = SimulatedPump::bank();
    bank[2].set_power(255).unwrap();
    let duties: Vec<u8> = bank.iter().map(|p| p.duty()).collect();
    assert_eq!(duties, vec![0, 0, 255, 0]);
}
