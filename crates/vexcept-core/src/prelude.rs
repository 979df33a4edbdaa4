//! Common module for library exports

pub use crate::error::{VexceptError, VexceptResult};
pub use crate::extract::{Extraction, ExtractionRequest, Extractor};
pub use crate::mapper::{map, VectorMapping};
pub use crate::scratch::ScratchLayout;
pub use crate::session::{ProbeSession, SessionGuard};
pub use crate::types::{Address, ExceptionNumber, RecoveredWord, Register, UnavailablePolicy, Word, WordWidth};
