//! Output sinks for extracted words

use std::io::{self, Write};

use vexcept_core::types::RecoveredWord;

/// How words are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat
{
    /// One `aaaaaaaa: vvvvvvvv` line per word
    Text,
    /// Raw little-endian 32-bit values, suitable for a firmware image
    Binary,
}

/// Writes words as they arrive and flushes after each one
///
/// A run can take minutes; flushing per word means an interrupted run still
/// leaves everything recovered so far in the output.
pub struct WordWriter<W: Write>
{
    inner: W,
    format: OutputFormat,
    written: u64,
}

impl<W: Write> WordWriter<W>
{
    pub fn new(inner: W, format: OutputFormat) -> Self
    {
        Self {
            inner,
            format,
            written: 0,
        }
    }

    /// Emit one entry; entries without a value are skipped
    pub fn write(&mut self, entry: &RecoveredWord) -> io::Result<()>
    {
        let Some(value) = entry.word.value() else {
            return Ok(());
        };

        match self.format {
            OutputFormat::Text => writeln!(self.inner, "{:08x}: {value:08x}", entry.address.value())?,
            OutputFormat::Binary => self.inner.write_all(&value.to_le_bytes())?,
        }
        self.inner.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Number of words written so far
    pub fn written(&self) -> u64
    {
        self.written
    }

    #[cfg(test)]
    fn into_inner(self) -> W
    {
        self.inner
    }
}
