//! # vexcept-protocol
//!
//! Debug probe transport for vexcept.
//!
//! The extraction core only knows the [`ProbeSession`] trait. This crate
//! implements it on top of OpenOCD's Tcl RPC server, which every OpenOCD
//! instance exposes on port 6666 unless told otherwise. One TCP connection
//! carries the whole run; commands are strictly request/response.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use vexcept_core::session::ProbeSession;
//! use vexcept_protocol::OpenOcd;
//!
//! let mut openocd = OpenOcd::connect("localhost", 6666, Some(Duration::from_secs(10)))?;
//! openocd.halt()?;
//! openocd.close()?;
//! # Ok::<(), vexcept_core::VexceptError>(())
//! ```
//!
//! [`ProbeSession`]: vexcept_core::session::ProbeSession

pub mod openocd;
pub mod reply;

pub use openocd::{OpenOcd, COMMAND_TOKEN, DEFAULT_PORT};
