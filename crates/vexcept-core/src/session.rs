//! # Probe Session
//!
//! The interface to the debug probe that drives the target.
//!
//! Everything the extraction technique does to the target goes through this
//! trait: resets, single steps, core register access and memory access. The
//! concrete implementation in this workspace talks to OpenOCD's Tcl server
//! (`vexcept-protocol`); tests plug in a simulated Cortex-M core instead.
//!
//! ## Contract
//!
//! - Every method is a blocking request/response. Implementations must consume
//!   the reply to one command before sending the next.
//! - Transport failures are errors and end the run.
//! - A register the probe cannot read is **not** an error: `read_register`
//!   returns `Ok(None)` and the caller treats the word as unavailable.

use tracing::{debug, warn};

use crate::error::VexceptResult;
use crate::types::{Address, Register, WordWidth};

/// Synchronous command channel to a halted-capable Cortex-M target
pub trait ProbeSession
{
    /// Reset the target, optionally halting it at the reset vector
    ///
    /// After `reset(true)` the core sits on the first instruction of the
    /// reset handler with SP loaded from vector 0 and PC/EPSR.T from vector 1.
    fn reset(&mut self, halt: bool) -> VexceptResult<()>;

    /// Halt the target wherever it currently is
    fn halt(&mut self) -> VexceptResult<()>;

    /// Control whether interrupts are masked while single stepping
    ///
    /// Debuggers usually mask interrupts during a step so that stepping does
    /// not wander into handlers. Extraction needs the opposite: the pended
    /// exception must be taken on the step.
    fn set_interrupt_masking(&mut self, enabled: bool) -> VexceptResult<()>;

    /// Execute exactly one instruction (or take exactly one pending exception)
    fn single_step(&mut self) -> VexceptResult<()>;

    /// Read a core register
    ///
    /// Returns `Ok(None)` when the probe answered but had no value for the
    /// register.
    fn read_register(&mut self, register: Register) -> VexceptResult<Option<u32>>;

    /// Write a core register
    fn write_register(&mut self, register: Register, value: u32) -> VexceptResult<()>;

    /// Read `count` consecutive items of `width` starting at `address`
    ///
    /// The result is ordered by ascending address.
    fn read_memory(&mut self, address: Address, count: usize, width: WordWidth) -> VexceptResult<Vec<u32>>;

    /// Write `values` as consecutive items of `width` starting at `address`
    fn write_memory(&mut self, address: Address, values: &[u32], width: WordWidth) -> VexceptResult<()>;

    /// Tear the session down gracefully
    ///
    /// The default implementation does nothing.
    fn close(&mut self) -> VexceptResult<()>
    {
        Ok(())
    }

    /// Write a single 32-bit word
    fn write_word(&mut self, address: Address, value: u32) -> VexceptResult<()>
    {
        self.write_memory(address, &[value], WordWidth::Word)
    }

    /// Read several registers, in the order given
    ///
    /// Returns `Ok(None)` as soon as any of them is unavailable.
    fn read_registers(&mut self, registers: &[Register]) -> VexceptResult<Option<Vec<u32>>>
    {
        let mut values = Vec::with_capacity(registers.len());
        for register in registers {
            match self.read_register(*register)? {
                Some(value) => values.push(value),
                None => return Ok(None),
            }
        }
        Ok(Some(values))
    }
}

impl<S: ProbeSession + ?Sized> ProbeSession for &mut S
{
    fn reset(&mut self, halt: bool) -> VexceptResult<()>
    {
        (**self).reset(halt)
    }

    fn halt(&mut self) -> VexceptResult<()>
    {
        (**self).halt()
    }

    fn set_interrupt_masking(&mut self, enabled: bool) -> VexceptResult<()>
    {
        (**self).set_interrupt_masking(enabled)
    }

    fn single_step(&mut self) -> VexceptResult<()>
    {
        (**self).single_step()
    }

    fn read_register(&mut self, register: Register) -> VexceptResult<Option<u32>>
    {
        (**self).read_register(register)
    }

    fn write_register(&mut self, register: Register, value: u32) -> VexceptResult<()>
    {
        (**self).write_register(register, value)
    }

    fn read_memory(&mut self, address: Address, count: usize, width: WordWidth) -> VexceptResult<Vec<u32>>
    {
        (**self).read_memory(address, count, width)
    }

    fn write_memory(&mut self, address: Address, values: &[u32], width: WordWidth) -> VexceptResult<()>
    {
        (**self).write_memory(address, values, width)
    }

    fn close(&mut self) -> VexceptResult<()>
    {
        (**self).close()
    }
}

/// RAII guard that closes a probe session when dropped
///
/// The guard owns the session for the duration of a run. Whether the run
/// finishes, bails out with `?`, or panics, the probe server gets its `exit`
/// so it does not keep a stale client around.
///
/// ## Example
///
/// ```rust,no_run
/// use vexcept_core::session::{ProbeSession, SessionGuard};
///
/// fn run<S: ProbeSession>(session: S) -> vexcept_core::VexceptResult<()>
/// {
///     let mut guard = SessionGuard::new(session);
///     guard.halt()?;
///     // ... session is closed here, even on the early return above
///     guard.close()
/// }
/// ```
pub struct SessionGuard<S: ProbeSession>
{
    session: S,
    active: bool,
}

impl<S: ProbeSession> SessionGuard<S>
{
    /// Take ownership of an open session
    pub fn new(session: S) -> Self
    {
        Self { session, active: true }
    }

    /// Close the session now and report the outcome
    ///
    /// After calling this, dropping the guard is a no-op.
    pub fn close(mut self) -> VexceptResult<()>
    {
        self.active = false;
        self.session.close()
    }
}

impl<S: ProbeSession> std::ops::Deref for SessionGuard<S>
{
    type Target = S;

    fn deref(&self) -> &Self::Target
    {
        &self.session
    }
}

impl<S: ProbeSession> std::ops::DerefMut for SessionGuard<S>
{
    fn deref_mut(&mut self) -> &mut Self::Target
    {
        &mut self.session
    }
}

impl<S: ProbeSession> Drop for SessionGuard<S>
{
    fn drop(&mut self)
    {
        if self.active {
            debug!("closing probe session from guard");
            if let Err(e) = self.session.close() {
                warn!("failed to close probe session: {e}");
            }
        }
    }
}
