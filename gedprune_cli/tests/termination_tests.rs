#![cfg(unix)]
#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use std::sync::mpsc;
use std::time::Duration;

use gedprune_cli::TerminationListener;
use gedprune_driver::{CancelToken, PoolEvent};
use rstest::rstest;

// Each case raises a real signal at this test process; the handlers stay
// installed for the rest of the binary, so the cases run one at a time.
#[rstest]
#[case::sigterm(libc::SIGTERM, "SIGTERM")]
#[case::sighup(libc::SIGHUP, "SIGHUP")]
fn signal_becomes_an_interrupt_event(#[case] signal: libc::c_int, #[case] name: &str) {
    static SERIAL: std::sync::Mutex<()> = std::sync::Mutex::new(());
    let _guard = SERIAL.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

    let (tx, rx) = mpsc::channel();
    let cancel = CancelToken::new();
    let _listener = TerminationListener::install(tx, cancel.clone()).unwrap();

    // SAFETY: the listener has registered a handler for `signal`.
    assert_eq!(unsafe { libc::kill(libc::getpid(), signal) }, 0);

    let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(
        event,
        PoolEvent::Interrupted {
            signal: name.to_string()
        }
    );
    let deadline = std::time::Instant::now() + Duration::from_secs(1);
    while !cancel.is_cancelled() {
        assert!(std::time::Instant::now() < deadline);
        std::thread::yield_now();
    }
}
