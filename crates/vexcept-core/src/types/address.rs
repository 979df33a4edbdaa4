//! Target address type.

use std::fmt;
use std::ops::{Add, Sub};

/// Strongly typed 32-bit target address
///
/// ARMv7-M has a flat 32-bit address space, so this wraps a `u32`. Using a
/// newtype keeps addresses from being mixed up with word counts, exception
/// numbers and raw register values, which all share the same primitive type
/// in this crate.
///
/// ## Example
///
/// ```rust
/// use vexcept_core::types::Address;
///
/// let addr = Address::from(0x0800_0000);
/// let next = addr + 4;
/// assert_eq!(next.value(), 0x0800_0004);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u32);

impl Address
{
    /// The zero address, home of the initial stack pointer slot
    pub const ZERO: Self = Address(0);

    /// Create a new address from a `u32` value
    ///
    /// This is equivalent to `Address::from(value)` but can be used in const contexts.
    ///
    /// ```rust
    /// use vexcept_core::types::Address;
    ///
    /// const VTOR: Address = Address::new(0xe000_ed08);
    /// ```
    pub const fn new(value: u32) -> Self
    {
        Address(value)
    }

    /// Get the raw `u32` value of this address
    pub const fn value(self) -> u32
    {
        self.0
    }

    /// Add an offset to this address, checking for overflow
    ///
    /// ```rust
    /// use vexcept_core::types::Address;
    ///
    /// let addr = Address::from(0x1000);
    /// assert_eq!(addr.checked_add(0x100), Some(Address::from(0x1100)));
    /// assert_eq!(Address::from(u32::MAX).checked_add(1), None);
    /// ```
    pub fn checked_add(self, offset: u32) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Round down to a multiple of `alignment`
    ///
    /// `alignment` must be non-zero. It does not have to be a power of two,
    /// although every caller in this crate passes one.
    ///
    /// ```rust
    /// use vexcept_core::types::Address;
    ///
    /// assert_eq!(Address::from(0x1234).align_down(0x100), Address::from(0x1200));
    /// ```
    #[must_use]
    pub const fn align_down(self, alignment: u32) -> Self
    {
        Address(self.0 - (self.0 % alignment))
    }

    /// Check whether this address is a multiple of `alignment`
    pub const fn is_aligned(self, alignment: u32) -> bool
    {
        self.0 % alignment == 0
    }
}

impl From<u32> for Address
{
    fn from(value: u32) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u32
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:08x}", self.0)
    }
}

impl fmt::LowerHex for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl Add<u32> for Address
{
    type Output = Address;

    fn add(self, rhs: u32) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}

impl Sub<u32> for Address
{
    type Output = Address;

    fn sub(self, rhs: u32) -> Self::Output
    {
        Address(self.0.wrapping_sub(rhs))
    }
}

impl Sub<Address> for Address
{
    type Output = u32;

    fn sub(self, rhs: Address) -> Self::Output
    {
        self.0.wrapping_sub(rhs.0)
    }
}
