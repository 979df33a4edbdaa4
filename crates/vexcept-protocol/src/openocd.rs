//! # OpenOCD Tcl RPC Session
//!
//! Client for OpenOCD's Tcl server.
//!
//! ## Wire format
//!
//! Each command is UTF-8 text followed by the `0x1a` token. OpenOCD evaluates
//! it and answers with the command's result followed by the same token. There
//! is no framing beyond that and no pipelining: we always consume one reply
//! before sending the next command.
//!
//! Memory access goes through a Tcl array variable. `array2mem` and
//! `mem2array` copy between target memory and the array, and `return $var`
//! dumps it as `index value` pairs.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info, trace};
use vexcept_core::error::{VexceptError, VexceptResult};
use vexcept_core::session::ProbeSession;
use vexcept_core::types::{Address, Register, WordWidth};

use crate::reply::{format_array, parse_array, parse_register};

/// Terminator of every command and every reply
pub const COMMAND_TOKEN: u8 = 0x1a;

/// OpenOCD's default Tcl server port
pub const DEFAULT_PORT: u16 = 6666;

/// Tcl variable used as the memory transfer buffer
const TCL_VARIABLE: &str = "vexcept_tcl";

const BUFFER_SIZE: usize = 4096;

/// An open connection to OpenOCD's Tcl server
#[derive(Debug)]
pub struct OpenOcd
{
    stream: TcpStream,
    endpoint: String,
    /// Bytes received past the last reply's terminator
    pending: Vec<u8>,
    closed: bool,
}

impl OpenOcd
{
    /// Connect to the Tcl server at `host:port`
    ///
    /// `timeout` bounds the connect itself and every later read and write.
    /// `None` blocks indefinitely.
    ///
    /// ## Errors
    ///
    /// - `ConnectFailed`: name resolution or every connection attempt failed
    pub fn connect(host: &str, port: u16, timeout: Option<Duration>) -> VexceptResult<Self>
    {
        let endpoint = format!("{host}:{port}");
        let connect_failed = |details: String| VexceptError::ConnectFailed {
            endpoint: endpoint.clone(),
            details,
        };

        let addresses: Vec<_> = (host, port)
            .to_socket_addrs()
            .map_err(|e| connect_failed(e.to_string()))?
            .collect();

        let mut last_error = format!("{host} did not resolve to any address");
        let mut stream = None;
        for address in &addresses {
            let attempt = match timeout {
                Some(timeout) => TcpStream::connect_timeout(address, timeout),
                None => TcpStream::connect(address),
            };
            match attempt {
                Ok(connected) => {
                    stream = Some(connected);
                    break;
                }
                Err(e) => {
                    debug!(address = %address, "connection attempt failed: {e}");
                    last_error = e.to_string();
                }
            }
        }
        let stream = stream.ok_or_else(|| connect_failed(last_error))?;

        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;
        stream.set_nodelay(true)?;

        info!(endpoint = %endpoint, "connected to OpenOCD");
        Ok(Self {
            stream,
            endpoint,
            pending: Vec::new(),
            closed: false,
        })
    }

    /// Send one Tcl command and return its trimmed reply
    ///
    /// ## Errors
    ///
    /// - `SessionFailed`: the session was closed, or OpenOCD hung up mid-reply
    /// - `Protocol`: the reply is not valid UTF-8
    /// - `Io`: socket failure or timeout
    pub fn send(&mut self, command: &str) -> VexceptResult<String>
    {
        if self.closed {
            return Err(VexceptError::SessionFailed("session already closed".to_string()));
        }

        trace!(command, "tcl >");
        let mut data = Vec::with_capacity(command.len() + 1);
        data.extend_from_slice(command.as_bytes());
        data.push(COMMAND_TOKEN);
        self.stream.write_all(&data)?;

        let reply = self.receive()?;
        trace!(reply = %reply, "tcl <");
        Ok(reply)
    }

    fn receive(&mut self) -> VexceptResult<String>
    {
        let mut chunk = [0_u8; BUFFER_SIZE];
        let end = loop {
            if let Some(end) = self.pending.iter().position(|byte| *byte == COMMAND_TOKEN) {
                break end;
            }
            let read = self.stream.read(&mut chunk)?;
            if read == 0 {
                return Err(VexceptError::SessionFailed(format!(
                    "{} closed the connection",
                    self.endpoint
                )));
            }
            self.pending.extend_from_slice(&chunk[..read]);
        };

        let reply: Vec<u8> = self.pending.drain(..=end).take(end).collect();
        let reply = String::from_utf8(reply)
            .map_err(|e| VexceptError::Protocol(format!("reply is not UTF-8: {e}")))?;
        Ok(reply.trim().to_string())
    }

    /// Fill the transfer variable with `values` and copy it to the target
    fn write_array(&mut self, address: Address, values: &[u32], width: WordWidth) -> VexceptResult<()>
    {
        self.send(&format!("array unset {TCL_VARIABLE}"))?;
        self.send(&format!("array set {TCL_VARIABLE} {{ {} }}", format_array(values)))?;
        self.send(&format!(
            "array2mem {TCL_VARIABLE} {} 0x{:x} {}",
            width.bits(),
            address.value(),
            values.len()
        ))?;
        Ok(())
    }
}

impl ProbeSession for OpenOcd
{
    fn reset(&mut self, halt: bool) -> VexceptResult<()>
    {
        self.send(if halt { "reset halt" } else { "reset run" })?;
        Ok(())
    }

    fn halt(&mut self) -> VexceptResult<()>
    {
        self.send("halt")?;
        Ok(())
    }

    fn set_interrupt_masking(&mut self, enabled: bool) -> VexceptResult<()>
    {
        self.send(if enabled { "cortex_m maskisr on" } else { "cortex_m maskisr off" })?;
        Ok(())
    }

    fn single_step(&mut self) -> VexceptResult<()>
    {
        self.send("step")?;
        Ok(())
    }

    fn read_register(&mut self, register: Register) -> VexceptResult<Option<u32>>
    {
        let reply = self.send(&format!("reg {}", register.index()))?;
        let value = parse_register(&reply);
        if value.is_none() {
            debug!(register = %register, reply = %reply, "register unavailable");
        }
        Ok(value)
    }

    fn write_register(&mut self, register: Register, value: u32) -> VexceptResult<()>
    {
        self.send(&format!("reg {} 0x{value:x}", register.index()))?;
        Ok(())
    }

    fn read_memory(&mut self, address: Address, count: usize, width: WordWidth) -> VexceptResult<Vec<u32>>
    {
        if count == 0 {
            return Ok(Vec::new());
        }
        self.send(&format!("array unset {TCL_VARIABLE}"))?;
        self.send(&format!(
            "mem2array {TCL_VARIABLE} {} 0x{:x} {count}",
            width.bits(),
            address.value()
        ))?;
        let reply = self.send(&format!("return ${TCL_VARIABLE}"))?;
        parse_array(&reply, count)
    }

    fn write_memory(&mut self, address: Address, values: &[u32], width: WordWidth) -> VexceptResult<()>
    {
        if values.is_empty() {
            return Ok(());
        }
        self.write_array(address, values, width)
    }

    /// Send `exit` and shut the socket down
    ///
    /// OpenOCD drops the connection on `exit` without a reply, so none is
    /// awaited. Closing twice is a no-op.
    fn close(&mut self) -> VexceptResult<()>
    {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        trace!(command = "exit", "tcl >");
        self.stream.write_all(b"exit\x1a")?;
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => {}
            // The server may already have hung up.
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => {}
            Err(e) => return Err(e.into()),
        }
        info!(endpoint = %self.endpoint, "disconnected from OpenOCD");
        Ok(())
    }
}
