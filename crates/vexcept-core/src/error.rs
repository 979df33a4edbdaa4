//! # Error Types
//!
//! General error handling for extraction runs.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! Note that an *unavailable word* is not an error. A vector slot that cannot
//! be reached, or a register read the probe could not answer, is resolved by
//! the driver's placeholder/omission policy and never surfaces here.

use thiserror::Error;

/// Main error type for extraction operations
///
/// Every variant is fatal for the current run. There are no retries: each
/// excitation is a one-shot hardware interaction, so a failed run has to be
/// restarted from the first requested address.
///
/// ## Error Categories
///
/// 1. **Session errors**: ConnectFailed, SessionFailed, Protocol, Io
/// 2. **Configuration errors**: UnhandledException
/// 3. **Argument errors**: InvalidArgument
#[derive(Error, Debug)]
pub enum VexceptError
{
    /// Could not establish a connection to the debug probe server
    ///
    /// This happens when:
    /// - OpenOCD is not running or its Tcl server is disabled
    /// - The host/port pair is wrong
    /// - A firewall drops the connection
    #[error("Failed to connect to debug probe at {endpoint}: {details}")]
    ConnectFailed
    {
        /// `host:port` that was dialled
        endpoint: String,
        /// Underlying socket error
        details: String,
    },

    /// The probe session broke down after it was established
    ///
    /// A half-configured debug session cannot be trusted, so the run stops.
    #[error("Debug session failed: {0}")]
    SessionFailed(String),

    /// The probe answered with something we could not interpret
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// An exception number reached the exciter without a known recipe
    ///
    /// Reserved slots (7-10, 13) and the two reset-time slots (0, 1) have no
    /// architectural way to be pended. The mapper reports those as
    /// unreachable, so seeing this error means the mapping step is broken.
    #[error("Exception number {0} has no excitation recipe")]
    UnhandledException(u16),

    /// Invalid argument passed to an extraction function
    ///
    /// Examples:
    /// - A zero exception count
    /// - An address range running past the end of the 32-bit address space
    /// - An exception number above 511
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error on the probe socket
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, VexceptError>`
///
/// ```rust
/// use vexcept_core::error::VexceptResult;
/// fn foo() -> VexceptResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type VexceptResult<T> = std::result::Result<T, VexceptError>;
