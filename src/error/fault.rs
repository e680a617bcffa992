//! Engine faults

use super::types::EngineFault;

/// Abort on a broken compiler or linker invariant.
///
/// Faults are logged and then panic; nothing inside the engine catches
/// them, so they can never be confused with a script error.
#[cold]
#[track_caller]
pub fn fault(fault: EngineFault) -> ! {
    tracing::error!(%fault, "engine fault");
    panic!("engine fault: {}", fault)
}
