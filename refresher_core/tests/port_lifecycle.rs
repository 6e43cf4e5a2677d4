use std::time::{Duration, Instant};

use refresher_core::mocks::{ClosedSource, ScriptedSource};
use refresher_core::port::CommandPort;

const READ_TIMEOUT: Duration = Duration::from_millis(5);

/// Poll until a byte shows up or the deadline passes.
fn poll_deadline(port: &CommandPort, deadline: Duration) -> Option<u8> {
    let start = Instant::now();
    while start.elapsed() < deadline {
        match port.poll() {
            Ok(Some(b)) => return Some(b),
            Ok(None) => std::thread::sleep(Duration::from_millis(1)),
            Err(_) => return None,
        }
    }
    None
}

#[test]
fn delivers_bytes_in_order() {
    let port = CommandPort::spawn(ScriptedSource::new([b'O', b'B']), READ_TIMEOUT);
    assert_eq!(poll_deadline(&port, Duration::from_secs(2)), Some(b'O'));
    assert_eq!(poll_deadline(&port, Duration::from_secs(2)), Some(b'B'));
    assert!(matches!(port.poll(), Ok(None)));
}

#[test]
fn single_byte_buffer_drops_a_burst_down_to_one() {
    // Three bytes arrive back-to-back with nobody polling: the first fills
    // the slot and the rest are lost, exactly like the wire-level register.
    let port = CommandPort::spawn(ScriptedSource::burst([b'A', b'B', b'C']), READ_TIMEOUT);
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(port.poll().expect("poll"), Some(b'A'));
    std::thread::sleep(Duration::from_millis(50));
    assert!(matches!(port.poll(), Ok(None)));
}

#[test]
fn drain_discards_pending_input() {
    let port = CommandPort::spawn(ScriptedSource::new([b'Q']), READ_TIMEOUT);
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(port.drain(), 1);
    assert!(matches!(port.poll(), Ok(None)));
}

#[test]
fn dead_source_becomes_a_fatal_poll_error() {
    let port = CommandPort::spawn(ClosedSource, READ_TIMEOUT);
    let start = Instant::now();
    loop {
        match port.poll() {
            Err(e) => {
                assert!(format!("{e}").contains("command channel closed"));
                break;
            }
            Ok(Some(_)) => panic!("no bytes expected from a dead source"),
            Ok(None) => {
                assert!(
                    start.elapsed() < Duration::from_secs(5),
                    "poll never reported the dead source"
                );
                std::thread::sleep(Duration::from_millis(1));
            }
        }
    }
}

#[test]
fn drop_joins_the_reader_thread() {
    // Must return promptly even though the source is pacing idle reads.
    let port = CommandPort::spawn(ScriptedSource::new([]), READ_TIMEOUT);
    std::thread::sleep(Duration::from_millis(20));
    drop(port);
}
