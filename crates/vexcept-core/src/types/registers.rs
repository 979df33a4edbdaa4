//! Cortex-M core register identifiers and program status helpers.

use std::fmt;

/// Identifier for one of the Cortex-M core registers
///
/// The discriminants are the register indices the debug probe uses, so a
/// `Register` converts straight into the number sent on the wire. Keeping this
/// a closed enum means an out-of-range register index can never reach the
/// probe session.
///
/// ## Register Layout
///
/// - **R0-R12**: General-purpose registers
/// - **SP (R13)**: Stack pointer (the currently selected one, MSP after reset)
/// - **LR (R14)**: Link register
/// - **PC (R15)**: Program counter
/// - **PSR**: Combined program status register (APSR | IPSR | EPSR)
///
/// ## Example
///
/// ```rust
/// use vexcept_core::types::Register;
///
/// assert_eq!(Register::Pc.index(), 15);
/// assert_eq!(Register::try_from(16), Ok(Register::Psr));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Register
{
    /// General-purpose register R0
    R0 = 0,
    /// General-purpose register R1
    R1 = 1,
    /// General-purpose register R2
    R2 = 2,
    /// General-purpose register R3
    R3 = 3,
    /// General-purpose register R4
    R4 = 4,
    /// General-purpose register R5
    R5 = 5,
    /// General-purpose register R6
    R6 = 6,
    /// General-purpose register R7
    R7 = 7,
    /// General-purpose register R8
    R8 = 8,
    /// General-purpose register R9
    R9 = 9,
    /// General-purpose register R10
    R10 = 10,
    /// General-purpose register R11
    R11 = 11,
    /// General-purpose register R12
    R12 = 12,
    /// Stack pointer
    Sp = 13,
    /// Link register
    Lr = 14,
    /// Program counter
    Pc = 15,
    /// Combined program status register (xPSR)
    Psr = 16,
}

impl Register
{
    /// Every register, in index order
    pub const ALL: [Register; 17] = [
        Register::R0,
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::R5,
        Register::R6,
        Register::R7,
        Register::R8,
        Register::R9,
        Register::R10,
        Register::R11,
        Register::R12,
        Register::Sp,
        Register::Lr,
        Register::Pc,
        Register::Psr,
    ];

    /// Register index as understood by the debug probe
    pub const fn index(self) -> u8
    {
        self as u8
    }

    /// Conventional lower-case register name
    pub const fn name(self) -> &'static str
    {
        match self {
            Register::R0 => "r0",
            Register::R1 => "r1",
            Register::R2 => "r2",
            Register::R3 => "r3",
            Register::R4 => "r4",
            Register::R5 => "r5",
            Register::R6 => "r6",
            Register::R7 => "r7",
            Register::R8 => "r8",
            Register::R9 => "r9",
            Register::R10 => "r10",
            Register::R11 => "r11",
            Register::R12 => "r12",
            Register::Sp => "sp",
            Register::Lr => "lr",
            Register::Pc => "pc",
            Register::Psr => "xpsr",
        }
    }
}

impl TryFrom<u8> for Register
{
    type Error = u8;

    fn try_from(index: u8) -> Result<Self, Self::Error>
    {
        Register::ALL.get(usize::from(index)).copied().ok_or(index)
    }
}

impl fmt::Display for Register
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.name())
    }
}

/// Bit-level view of the combined program status register
///
/// Only the two fields the extraction technique relies on are decoded:
/// the Thumb bit (EPSR.T, bit 24) and the active exception number
/// (IPSR, bits 8:0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Xpsr(pub u32);

impl Xpsr
{
    /// EPSR.T, the execution state (Thumb) bit
    pub const THUMB_BIT: u32 = 1 << 24;

    /// IPSR exception number field mask
    pub const EXCEPTION_MASK: u32 = 0x1ff;

    /// PSR value with only the Thumb bit set
    ///
    /// Cortex-M only executes Thumb code; writing a PSR without T set makes
    /// the very next instruction fault with an INVSTATE UsageFault.
    pub const THUMB: Xpsr = Xpsr(Self::THUMB_BIT);

    /// Whether EPSR.T is set
    pub const fn thumb(self) -> bool
    {
        self.0 & Self::THUMB_BIT != 0
    }

    /// Active exception number (0 in thread mode)
    #[allow(clippy::cast_possible_truncation)]
    pub const fn exception_number(self) -> u16
    {
        (self.0 & Self::EXCEPTION_MASK) as u16
    }
}

impl From<u32> for Xpsr
{
    fn from(value: u32) -> Self
    {
        Xpsr(value)
    }
}
