//! # Vector Table Mapper
//!
//! Turns a target address into a VTOR value and an exception number such that
//! taking that exception fetches its vector from the address.
//!
//! ## How it works
//!
//! VTOR has to be aligned to the size of the vector table, rounded up to a
//! power of two. With `N` implemented exceptions the usable table size is the
//! largest power of two `T <= N`, so the table base is the address rounded
//! down to `T * 4` bytes and the exception number is the word offset from
//! there.
//!
//! Offsets landing on a slot we cannot pend (see
//! [`ExceptionNumber::is_inaccessible`]) get one more chance. The core builds
//! the vector address by combining VTOR with the scaled exception number, so
//! when VTOR is aligned to `T * 4` but *not* to `2T * 4`, exception `raw + T`
//! fetches from the same word as `raw` would. That only helps if exception
//! `raw + T` actually exists on the part.

use crate::error::{VexceptError, VexceptResult};
use crate::types::{Address, ExceptionNumber, WORD_SIZE};

/// Where to point VTOR and which exception to take for one address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorMapping
{
    /// Value to write into VTOR
    pub table_base: Address,
    /// Exception whose vector fetch reads the target address
    pub exception: ExceptionNumber,
    /// Whether the wrap-around adjustment was applied
    pub wrapped: bool,
}

impl VectorMapping
{
    /// Whether the mapped exception can actually be excited
    pub const fn is_reachable(&self) -> bool
    {
        !self.exception.is_inaccessible()
    }
}

/// Largest power of two not above `exception_count`
///
/// ## Errors
///
/// - `InvalidArgument`: `exception_count` is zero
pub fn table_size(exception_count: u16) -> VexceptResult<u16>
{
    if exception_count == 0 {
        return Err(VexceptError::InvalidArgument("exception count must be non-zero".to_string()));
    }
    Ok(1 << (15 - exception_count.leading_zeros()))
}

/// Map `address` onto a vector table slot
///
/// `exception_count` is the total number of exceptions the part implements
/// (16 architectural plus the probed external interrupt lines).
///
/// ## Errors
///
/// - `InvalidArgument`: `exception_count` is zero or above 512
///
/// ## Example
///
/// ```rust
/// use vexcept_core::mapper::map;
/// use vexcept_core::types::{Address, ExceptionNumber};
///
/// let mapping = map(Address::new(0x10), 16)?;
/// assert_eq!(mapping.table_base, Address::new(0));
/// assert_eq!(mapping.exception, ExceptionNumber::MEM_MANAGE);
/// # Ok::<(), vexcept_core::VexceptError>(())
/// ```
pub fn map(address: Address, exception_count: u16) -> VexceptResult<VectorMapping>
{
    if exception_count > ExceptionNumber::MAX + 1 {
        return Err(VexceptError::InvalidArgument(format!(
            "exception count {exception_count} exceeds the architectural limit of {}",
            ExceptionNumber::MAX + 1
        )));
    }

    let table_size = table_size(exception_count)?;
    let table_bytes = u32::from(table_size) * WORD_SIZE;
    let table_base = address.align_down(table_bytes);

    // Offset is below table_size, which fits a u16 and stays below 512.
    let raw = u16::try_from((address - table_base) / WORD_SIZE)
        .map_err(|_| VexceptError::InvalidArgument(format!("address {address} not mappable")))?;
    let mut exception = ExceptionNumber::new(raw)?;
    let mut wrapped = false;

    if exception.is_inaccessible()
        && !table_base.is_aligned(table_bytes * 2)
        && raw + table_size < exception_count
    {
        exception = ExceptionNumber::new(raw + table_size)?;
        wrapped = true;
    }

    Ok(VectorMapping {
        table_base,
        exception,
        wrapped,
    })
}
