//! # System Control Space
//!
//! Memory-mapped ARMv7-M registers touched while pending exceptions.
//!
//! See the ARMv7-M Architecture Reference Manual, chapter B3 ("System Address
//! Map"), for the full register descriptions.

use crate::types::{Address, WORD_SIZE};

/// Interrupt Control and State Register
pub const ICSR: Address = Address::new(0xe000_ed04);
/// Vector Table Offset Register
pub const VTOR: Address = Address::new(0xe000_ed08);
/// System Handler Control and State Register
pub const SHCSR: Address = Address::new(0xe000_ed24);
/// Debug Exception and Monitor Control Register
pub const DEMCR: Address = Address::new(0xe000_edfc);
/// First NVIC Interrupt Set-Enable Register
pub const NVIC_ISER0: Address = Address::new(0xe000_e100);
/// First NVIC Interrupt Set-Pending Register
pub const NVIC_ISPR0: Address = Address::new(0xe000_e200);

/// Start of the vendor system region, which is always execute-never
pub const XN_REGION: Address = Address::new(0xe000_0000);

/// ICSR.NMIPENDSET
pub const ICSR_NMIPENDSET: u32 = 1 << 31;
/// ICSR.PENDSVSET
pub const ICSR_PENDSVSET: u32 = 1 << 28;
/// ICSR.PENDSTSET
pub const ICSR_PENDSTSET: u32 = 1 << 26;

/// SHCSR.MEMFAULTENA
pub const SHCSR_MEMFAULTENA: u32 = 1 << 16;
/// SHCSR.BUSFAULTENA
pub const SHCSR_BUSFAULTENA: u32 = 1 << 17;
/// SHCSR.USGFAULTENA
pub const SHCSR_USGFAULTENA: u32 = 1 << 18;

/// DEMCR.MON_PEND
pub const DEMCR_MON_PEND: u32 = 1 << 17;

/// Location of an external interrupt line inside the NVIC register banks
///
/// ISER/ISPR are arrays of 32-bit registers with one bit per line, so line
/// `n` lives in word `n / 32` at bit `n % 32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NvicLine
{
    /// Byte offset of the bank from ISER0/ISPR0
    pub bank_offset: u32,
    /// Single-bit mask within the bank
    pub mask: u32,
}

impl NvicLine
{
    /// Bank and bit for interrupt line `line`
    pub const fn new(line: u16) -> Self
    {
        let line = line as u32;
        Self {
            bank_offset: (line / 32) * WORD_SIZE,
            mask: 1 << (line % 32),
        }
    }

    /// Address of the Interrupt Set-Enable register holding this line
    pub const fn iser(self) -> Address
    {
        Address::new(NVIC_ISER0.value() + self.bank_offset)
    }

    /// Address of the Interrupt Set-Pending register holding this line
    pub const fn ispr(self) -> Address
    {
        Address::new(NVIC_ISPR0.value() + self.bank_offset)
    }
}
