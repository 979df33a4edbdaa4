//! Extracted words and access widths.

use std::fmt;

use super::Address;

/// Size of a vector table entry (and of every extracted word) in bytes
pub const WORD_SIZE: u32 = 4;

/// Access width for probe memory transfers
///
/// The scratch instructions are Thumb halfwords and must be written with
/// 16-bit accesses; everything else in the System Control Space is accessed
/// as full words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WordWidth
{
    /// 8-bit access
    Byte,
    /// 16-bit access
    Half,
    /// 32-bit access
    #[default]
    Word,
}

impl WordWidth
{
    /// Width in bits, as the probe expects it
    pub const fn bits(self) -> u32
    {
        match self {
            WordWidth::Byte => 8,
            WordWidth::Half => 16,
            WordWidth::Word => 32,
        }
    }

    /// Width in bytes
    pub const fn bytes(self) -> u32
    {
        self.bits() / 8
    }
}

/// What to do with a word the technique cannot recover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnavailablePolicy
{
    /// Emit the given literal in place of the missing word
    Substitute(u32),
    /// Leave the word out of the output entirely
    Omit,
}

impl Default for UnavailablePolicy
{
    fn default() -> Self
    {
        UnavailablePolicy::Substitute(0xffff_ffff)
    }
}

/// Outcome for a single extracted word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Word
{
    /// Value read back through a vector fetch (or the halted reset state)
    Recovered(u32),
    /// Placeholder written under [`UnavailablePolicy::Substitute`]
    Placeholder(u32),
    /// Nothing could be recovered and no placeholder was configured
    Unavailable,
}

impl Word
{
    /// Value to emit, if any
    pub const fn value(self) -> Option<u32>
    {
        match self {
            Word::Recovered(value) | Word::Placeholder(value) => Some(value),
            Word::Unavailable => None,
        }
    }

    /// Whether the value actually came from the target
    pub const fn is_recovered(self) -> bool
    {
        matches!(self, Word::Recovered(_))
    }
}

/// One entry of the extraction output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecoveredWord
{
    /// Address of the word in target memory
    pub address: Address,
    /// What was found there
    pub word: Word,
}

impl RecoveredWord
{
    /// Create a new entry
    pub const fn new(address: Address, word: Word) -> Self
    {
        Self { address, word }
    }
}

impl fmt::Display for RecoveredWord
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self.word.value() {
            Some(value) => write!(f, "{:08x}: {value:08x}", self.address.value()),
            None => write!(f, "{:08x}: unavailable", self.address.value()),
        }
    }
}
