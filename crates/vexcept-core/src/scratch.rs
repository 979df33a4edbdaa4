//! # Scratch Layout
//!
//! Instructions planted in target SRAM before extraction starts.
//!
//! Every exception recipe needs the core to execute something specific on its
//! single step: a `nop` so a pended interrupt gets taken, an `svc`, a load
//! from an invalid address, or an undefined encoding. Those four Thumb
//! halfwords are written once, next to each other, at the start of a scratch
//! area. A little further up the same area doubles as the stack used for
//! exception entry, so the hardware's eight-word stacking never lands on
//! something it can fault on.
//!
//! The whole layout is derived from a single base address so that parts with
//! SRAM somewhere other than `0x2000_0000` only need one setting.

use tracing::info;

use crate::error::VexceptResult;
use crate::session::ProbeSession;
use crate::types::{Address, Register, WordWidth};

/// `svc #0`
pub const SVC_ENCODING: u16 = 0xdf00;
/// `nop`
pub const NOP_ENCODING: u16 = 0xbf00;
/// `ldrb r5, [r6, #13]`, loads relative to [`LOAD_BASE_REGISTER`]
pub const LDR_ENCODING: u16 = 0x7b75;
/// Permanently undefined in Thumb (first half of a 32-bit encoding with no valid second half)
pub const UDF_ENCODING: u16 = 0xffff;

/// Register the scratch load uses as its base
pub const LOAD_BASE_REGISTER: Register = Register::R6;
/// Base address fed to the scratch load; the bus rejects it
pub const INVALID_LOAD_TARGET: u32 = 0xffff_ff00;

/// Default scratch base, the start of SRAM on most Cortex-M parts
pub const DEFAULT_SCRATCH_BASE: Address = Address::new(0x2000_0000);

/// Offset of the safe stack pointer from the scratch base
pub const STACK_OFFSET: u32 = 0x200;

/// One instruction slot of the scratch area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScratchSlot
{
    /// Name used in logs
    pub name: &'static str,
    /// Byte offset from the scratch base
    pub offset: u32,
    /// Thumb encoding stored at the slot
    pub encoding: u16,
}

/// The static table of scratch instructions, in address order
pub const SCRATCH_SLOTS: [ScratchSlot; 4] = [
    ScratchSlot {
        name: "svc",
        offset: 0,
        encoding: SVC_ENCODING,
    },
    ScratchSlot {
        name: "nop",
        offset: 2,
        encoding: NOP_ENCODING,
    },
    ScratchSlot {
        name: "ldr",
        offset: 4,
        encoding: LDR_ENCODING,
    },
    ScratchSlot {
        name: "udf",
        offset: 6,
        encoding: UDF_ENCODING,
    },
];

/// Concrete scratch addresses for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScratchLayout
{
    base: Address,
}

impl Default for ScratchLayout
{
    fn default() -> Self
    {
        Self::at(DEFAULT_SCRATCH_BASE)
    }
}

impl ScratchLayout
{
    /// Layout rooted at `base`
    ///
    /// `base` should be halfword aligned, writable and executable.
    pub const fn at(base: Address) -> Self
    {
        Self { base }
    }

    const fn slot(&self, index: usize) -> Address
    {
        Address::new(self.base.value().wrapping_add(SCRATCH_SLOTS[index].offset))
    }

    /// Address of the `svc #0` instruction
    pub const fn svc(&self) -> Address
    {
        self.slot(0)
    }

    /// Address of the `nop` instruction
    pub const fn nop(&self) -> Address
    {
        self.slot(1)
    }

    /// Address of the faulting load instruction
    pub const fn ldr(&self) -> Address
    {
        self.slot(2)
    }

    /// Address of the undefined instruction
    pub const fn udf(&self) -> Address
    {
        self.slot(3)
    }

    /// Stack pointer value used for every excitation
    pub const fn stack_pointer(&self) -> u32
    {
        self.base.value().wrapping_add(STACK_OFFSET)
    }

    /// Write the scratch instructions into target memory
    ///
    /// The target must be halted. Each slot is written with a 16-bit access.
    ///
    /// ## Errors
    ///
    /// Propagates any session failure.
    pub fn install<S: ProbeSession + ?Sized>(&self, session: &mut S) -> VexceptResult<()>
    {
        for (index, slot) in SCRATCH_SLOTS.iter().enumerate() {
            session.write_memory(self.slot(index), &[u32::from(slot.encoding)], WordWidth::Half)?;
        }
        info!(
            base = %self.base,
            stack_pointer = format_args!("0x{:08x}", self.stack_pointer()),
            "installed scratch instructions"
        );
        Ok(())
    }
}
