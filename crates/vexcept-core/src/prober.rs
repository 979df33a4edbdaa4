//! # Interrupt Capability Prober
//!
//! Counts the external interrupt lines the attached part really implements.
//!
//! The architecture allows up to 496 lines but vendors wire up far fewer, and
//! the mapper must never pick an exception number the silicon does not have.
//! Each line is tested the hard way: reset, enable and pend it, step over a
//! `nop`, and check that IPSR now reports the matching exception.

use tracing::{debug, info};

use crate::error::VexceptResult;
use crate::exciter::nvic_pend_writes;
use crate::scratch::ScratchLayout;
use crate::session::ProbeSession;
use crate::types::{ExceptionNumber, Register, Xpsr};

/// Test whether external interrupt line `line` is implemented
///
/// Leaves the target halted inside the interrupt's handler (or on the
/// instruction after the `nop` if the line does not exist).
///
/// ## Errors
///
/// Propagates session failures. An unreadable PSR counts as "not
/// implemented", not as an error.
pub fn probe_line<S: ProbeSession + ?Sized>(session: &mut S, line: u16, layout: &ScratchLayout) -> VexceptResult<bool>
{
    let expected = ExceptionNumber::external(line)?;

    session.reset(true)?;
    for (address, value) in nvic_pend_writes(line) {
        session.write_word(address, value)?;
    }
    session.write_register(Register::Pc, layout.nop().value())?;
    session.write_register(Register::Psr, Xpsr::THUMB.0)?;
    session.write_register(Register::Sp, layout.stack_pointer())?;
    session.single_step()?;

    let Some(psr) = session.read_register(Register::Psr)? else {
        debug!(line, "xpsr unavailable while probing");
        return Ok(false);
    };
    let active = Xpsr(psr).exception_number();
    debug!(line, active, expected = expected.value(), "probed interrupt line");
    Ok(active == expected.value())
}

/// Count consecutive implemented external interrupt lines from line 0
///
/// Stops at the first line that does not respond; lines beyond a gap are
/// never counted.
///
/// ## Errors
///
/// Propagates session failures.
pub fn probe_interrupt_lines<S: ProbeSession + ?Sized>(session: &mut S, layout: &ScratchLayout) -> VexceptResult<u16>
{
    let mut count = 0;
    while count < ExceptionNumber::MAX_EXTERNAL_INTERRUPTS {
        if !probe_line(session, count, layout)? {
            break;
        }
        count += 1;
    }
    info!(lines = count, exceptions = count + ExceptionNumber::ARCHITECTURAL, "probed external interrupts");
    Ok(count)
}
