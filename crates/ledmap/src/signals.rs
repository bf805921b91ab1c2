//! Process signals
//!
//! `SIGINT` and `SIGTERM` request shutdown, `SIGHUP` requests a configuration
//! reload. The handlers only set flags; the main thread turns them into a
//! [`ShutdownToken`](ledmap_core::ShutdownToken) and config updates.

use std::sync::atomic::{AtomicBool, Ordering};

use nix::libc::c_int;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);
static RELOAD: AtomicBool = AtomicBool::new(false);

extern "C" fn on_signal(signal: c_int) {
    if signal == Signal::SIGHUP as c_int {
        RELOAD.store(true, Ordering::Release);
    } else {
        SHUTDOWN.store(true, Ordering::Release);
    }
}

/// Install handlers for `SIGINT`, `SIGTERM` and `SIGHUP`
pub fn install() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_signal),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    for signal in [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP] {
        // SAFETY: the handler only stores to atomics
        unsafe { sigaction(signal, &action) }?;
    }
    tracing::debug!("Signal handlers installed");
    Ok(())
}

/// Check if a termination signal arrived
pub fn shutdown_requested() -> bool {
    SHUTDOWN.load(Ordering::Acquire)
}

/// Consume a pending reload request
pub fn take_reload() -> bool {
    RELOAD.swap(false, Ordering::AcqRel)
}
