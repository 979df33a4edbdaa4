//! Exception numbers and vector table slots.

use std::fmt;

use crate::error::{VexceptError, VexceptResult};

/// Index of a vector table slot
///
/// ARMv7-M numbers its exceptions 0-511: sixteen architectural slots followed
/// by up to 496 external interrupts. The exception number is also the word
/// index of the handler address inside the vector table, which is exactly why
/// relocating VTOR lets us make any word a "vector".
///
/// | Number | Slot |
/// |---|---|
/// | 0 | Initial stack pointer |
/// | 1 | Reset |
/// | 2 | NMI |
/// | 3 | HardFault |
/// | 4 | MemManage |
/// | 5 | BusFault |
/// | 6 | UsageFault |
/// | 7-10 | Reserved |
/// | 11 | SVCall |
/// | 12 | DebugMonitor |
/// | 13 | Reserved |
/// | 14 | PendSV |
/// | 15 | SysTick |
/// | 16+ | External interrupt `n - 16` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExceptionNumber(u16);

impl ExceptionNumber
{
    /// Largest exception number the architecture can encode
    pub const MAX: u16 = 511;

    /// Number of architectural (non-interrupt) slots
    pub const ARCHITECTURAL: u16 = 16;

    /// Architectural ceiling on external interrupt lines
    pub const MAX_EXTERNAL_INTERRUPTS: u16 = 496;

    /// Initial stack pointer slot
    pub const INITIAL_SP: Self = ExceptionNumber(0);
    /// Reset vector
    pub const RESET: Self = ExceptionNumber(1);
    /// Non-maskable interrupt
    pub const NMI: Self = ExceptionNumber(2);
    /// HardFault
    pub const HARD_FAULT: Self = ExceptionNumber(3);
    /// Memory management fault
    pub const MEM_MANAGE: Self = ExceptionNumber(4);
    /// BusFault
    pub const BUS_FAULT: Self = ExceptionNumber(5);
    /// UsageFault
    pub const USAGE_FAULT: Self = ExceptionNumber(6);
    /// Supervisor call
    pub const SV_CALL: Self = ExceptionNumber(11);
    /// Debug monitor
    pub const DEBUG_MONITOR: Self = ExceptionNumber(12);
    /// Pendable service request
    pub const PEND_SV: Self = ExceptionNumber(14);
    /// System tick timer
    pub const SYS_TICK: Self = ExceptionNumber(15);

    /// Slots the exception trick cannot produce: 0 and 1 are only used at
    /// reset, 7-10 and 13 are reserved.
    pub const INACCESSIBLE: [ExceptionNumber; 7] = [
        ExceptionNumber(0),
        ExceptionNumber(1),
        ExceptionNumber(7),
        ExceptionNumber(8),
        ExceptionNumber(9),
        ExceptionNumber(10),
        ExceptionNumber(13),
    ];

    /// Create an exception number, rejecting values above 511
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument`: `value` exceeds [`ExceptionNumber::MAX`]
    ///
    /// ```rust
    /// use vexcept_core::types::ExceptionNumber;
    ///
    /// assert!(ExceptionNumber::new(42).is_ok());
    /// assert!(ExceptionNumber::new(512).is_err());
    /// ```
    pub fn new(value: u16) -> VexceptResult<Self>
    {
        if value > Self::MAX {
            return Err(VexceptError::InvalidArgument(format!(
                "exception number {value} exceeds {}",
                Self::MAX
            )));
        }
        Ok(ExceptionNumber(value))
    }

    /// Exception number of external interrupt line `line`
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument`: `line` is 496 or above
    pub fn external(line: u16) -> VexceptResult<Self>
    {
        match line.checked_add(Self::ARCHITECTURAL) {
            Some(value) => Self::new(value),
            None => Err(VexceptError::InvalidArgument(format!("interrupt line {line} out of range"))),
        }
    }

    /// Raw exception number
    pub const fn value(self) -> u16
    {
        self.0
    }

    /// Whether the slot is in the inaccessible set {0, 1, 7, 8, 9, 10, 13}
    pub const fn is_inaccessible(self) -> bool
    {
        matches!(self.0, 0 | 1 | 7..=10 | 13)
    }

    /// External interrupt line, if this is an interrupt slot
    pub const fn external_line(self) -> Option<u16>
    {
        if self.0 >= Self::ARCHITECTURAL {
            Some(self.0 - Self::ARCHITECTURAL)
        } else {
            None
        }
    }

    /// Short human readable slot name
    pub fn name(self) -> String
    {
        match self.0 {
            0 => "InitialSP".to_string(),
            1 => "Reset".to_string(),
            2 => "NMI".to_string(),
            3 => "HardFault".to_string(),
            4 => "MemManage".to_string(),
            5 => "BusFault".to_string(),
            6 => "UsageFault".to_string(),
            7..=10 | 13 => "Reserved".to_string(),
            11 => "SVCall".to_string(),
            12 => "DebugMonitor".to_string(),
            14 => "PendSV".to_string(),
            15 => "SysTick".to_string(),
            n => format!("IRQ{}", n - Self::ARCHITECTURAL),
        }
    }
}

impl TryFrom<u16> for ExceptionNumber
{
    type Error = VexceptError;

    fn try_from(value: u16) -> Result<Self, Self::Error>
    {
        Self::new(value)
    }
}

impl From<ExceptionNumber> for u16
{
    fn from(number: ExceptionNumber) -> Self
    {
        number.0
    }
}

impl fmt::Display for ExceptionNumber
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{} ({})", self.0, self.name())
    }
}
