//! # Types
//!
//! Value types shared by every stage of an extraction run.
//!
//! None of these outlive a run; the only long-lived resource is the probe
//! session itself (see [`crate::session`]).

pub mod address;
pub mod exception;
pub mod registers;
pub mod word;

// Re-export all public types
pub use address::Address;
pub use exception::ExceptionNumber;
pub use registers::{Register, Xpsr};
pub use word::{RecoveredWord, UnavailablePolicy, Word, WordWidth, WORD_SIZE};
