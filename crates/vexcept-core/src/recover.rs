//! # Vector Recoverer
//!
//! Rebuilds the fetched vector from post-step core state.
//!
//! On exception entry the core writes the vector into PC with bit 0 cleared
//! and moves that bit into EPSR.T. Putting the two back together gives the
//! exact 32-bit word stored at the vector address.

use tracing::debug;

use crate::error::VexceptResult;
use crate::session::ProbeSession;
use crate::types::{Register, Xpsr};

/// Combine PC and PSR into the original vector value
///
/// ```rust
/// use vexcept_core::recover::thumb_vector;
///
/// assert_eq!(thumb_vector(0x0800_01c4, 0x0100_0003), 0x0800_01c5);
/// assert_eq!(thumb_vector(0x0800_01c4, 0x0000_0003), 0x0800_01c4);
/// ```
pub const fn thumb_vector(pc: u32, psr: u32) -> u32
{
    (pc & !1) | (Xpsr(psr).thumb() as u32)
}

/// Read PC and PSR from the halted target and reconstruct the vector
///
/// Returns `Ok(None)` when either register is unavailable.
///
/// ## Errors
///
/// Propagates session failures.
pub fn recover<S: ProbeSession + ?Sized>(session: &mut S) -> VexceptResult<Option<u32>>
{
    let Some(values) = session.read_registers(&[Register::Pc, Register::Psr])? else {
        debug!("pc/xpsr unavailable after step");
        return Ok(None);
    };

    let &[pc, psr] = values.as_slice() else {
        return Ok(None);
    };
    Ok(Some(thumb_vector(pc, psr)))
}
