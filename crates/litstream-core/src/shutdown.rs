//! Graceful shutdown support via atomic flag
//!
//! The first SIGINT/SIGTERM sets the flag; the collect loop checks it
//! between queries. A second signal exits immediately.

use std::sync::atomic::{AtomicBool, Ordering};

/// Exit status used when a second signal forces termination
const FORCED_EXIT_CODE: i32 = 130;

/// Global shutdown flag, set by SIGTERM/SIGINT handler
fn shutdown_flag() -> &'static AtomicBool {
    static FLAG: AtomicBool = AtomicBool::new(false);
    &FLAG
}

/// Check if shutdown was requested
pub fn is_shutdown_requested() -> bool {
    shutdown_flag().load(Ordering::Relaxed)
}

fn on_signal() {
    if shutdown_flag().swap(true, Ordering::Relaxed) {
        std::process::exit(FORCED_EXIT_CODE);
    }
}

/// Register SIGINT/SIGTERM handlers on the global flag.
pub fn install_signal_handlers() -> std::io::Result<()> {
    // SAFETY: AtomicBool::swap and process::exit are async-signal-safe
    unsafe {
        signal_hook::low_level::register(signal_hook::consts::SIGTERM, on_signal)?;
        signal_hook::low_level::register(signal_hook::consts::SIGINT, on_signal)?;
    }
    Ok(())
}
