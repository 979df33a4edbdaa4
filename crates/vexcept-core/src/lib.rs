//! # vexcept-core
//!
//! Recover read-protected ARMv7-M memory through relocated exception vectors.
//!
//! When a Cortex-M core takes an exception it fetches the handler address
//! from the vector table and loads it into PC. VTOR can point the table almost
//! anywhere, so any word, including one in execute-only or read-protected
//! flash, can be made into the vector of *some* exception. Forcing that
//! exception and single stepping once leaves the word in PC, where a debugger
//! can read it even though it could not read the memory.
//!
//! This crate provides:
//! - [`mapper`]: address → (VTOR, exception number), with the wrap-around trick
//! - [`exciter`]: the per-exception recipes that pend and take an exception
//! - [`recover`]: PC/EPSR.T → original vector value
//! - [`prober`]: counting the implemented external interrupt lines
//! - [`extract`]: the driver tying it together over an address range
//!
//! The probe itself sits behind the [`ProbeSession`] trait.
//!
//! ## Example
//!
//! ```rust,no_run
//! use vexcept_core::prelude::*;
//!
//! fn dump<S: ProbeSession>(session: S) -> VexceptResult<()>
//! {
//!     let mut extractor = Extractor::prepare(session, ScratchLayout::default())?;
//!     let request = ExtractionRequest::new(Address::new(0x0800_0000), 64, UnavailablePolicy::Omit)?;
//!     for word in extractor.extract(&request) {
//!         println!("{}", word?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod exciter;
pub mod extract;
pub mod mapper;
pub mod prelude;
pub mod prober;
pub mod recover;
pub mod scratch;
pub mod scs;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use error::{VexceptError, VexceptResult};
pub use extract::{ExtractionRequest, Extractor};
pub use session::{ProbeSession, SessionGuard};
pub use types::{Address, ExceptionNumber, Register};
