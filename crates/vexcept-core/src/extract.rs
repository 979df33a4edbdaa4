//! # Extraction Driver
//!
//! Walks an address range and recovers one word per address.
//!
//! Every word costs a full reset → configure → step → read cycle, because an
//! excitation leaves faults, pending bits and a stacked frame behind. Results
//! are produced lazily through [`Extraction`], an iterator, so callers can
//! write each word out as soon as the target gives it up.
//!
//! The two slots the exception trick cannot reach at address 0 and 4 are read
//! from the halted post-reset state instead: the core has just loaded SP from
//! word 0 and PC (plus EPSR.T) from word 1.

use tracing::{debug, debug_span, info, warn};

use crate::error::{VexceptError, VexceptResult};
use crate::exciter::excite;
use crate::mapper::map;
use crate::prober::probe_interrupt_lines;
use crate::recover::recover;
use crate::scratch::ScratchLayout;
use crate::session::ProbeSession;
use crate::types::{Address, ExceptionNumber, RecoveredWord, Register, UnavailablePolicy, Word, WORD_SIZE};

/// Address of the reset-time stack pointer word
const INITIAL_SP_ADDRESS: Address = Address::new(0);
/// Address of the reset vector word
const RESET_VECTOR_ADDRESS: Address = Address::new(WORD_SIZE);

/// A range of words to extract and what to do with the ones that resist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionRequest
{
    start: Address,
    count: u32,
    policy: UnavailablePolicy,
}

impl ExtractionRequest
{
    /// Build a request for `count` words starting at `start`
    ///
    /// An unaligned `start` is rounded down to its containing word.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument`: the range runs past `0xffff_ffff`
    pub fn new(start: Address, count: u32, policy: UnavailablePolicy) -> VexceptResult<Self>
    {
        let aligned = start.align_down(WORD_SIZE);
        if aligned != start {
            warn!(requested = %start, aligned = %aligned, "start address not word aligned, rounding down");
        }

        if count > 0 {
            let span = (count - 1)
                .checked_mul(WORD_SIZE)
                .and_then(|offset| aligned.checked_add(offset));
            if span.is_none() {
                return Err(VexceptError::InvalidArgument(format!(
                    "{count} words from {aligned} run past the end of the address space"
                )));
            }
        }

        Ok(Self {
            start: aligned,
            count,
            policy,
        })
    }

    /// First address
    pub const fn start(&self) -> Address
    {
        self.start
    }

    /// Number of words requested
    pub const fn count(&self) -> u32
    {
        self.count
    }

    /// Unavailable-word policy
    pub const fn policy(&self) -> UnavailablePolicy
    {
        self.policy
    }
}

/// Owns the probe session for a run and resolves addresses into words
#[derive(Debug)]
pub struct Extractor<S: ProbeSession>
{
    session: S,
    layout: ScratchLayout,
    exception_count: u16,
}

impl<S: ProbeSession> Extractor<S>
{
    /// Wrap a session whose target is already prepared
    ///
    /// `exception_count` is the total number of implemented exceptions
    /// (16 + external lines) as measured by the prober.
    pub fn new(session: S, layout: ScratchLayout, exception_count: u16) -> Self
    {
        Self {
            session,
            layout,
            exception_count,
        }
    }

    /// Prepare a fresh session for extraction
    ///
    /// Halts the target, lets interrupts through while stepping, plants the
    /// scratch instructions and probes the interrupt lines.
    ///
    /// ## Errors
    ///
    /// Propagates session failures.
    pub fn prepare(mut session: S, layout: ScratchLayout) -> VexceptResult<Self>
    {
        // Interrupt masking can only be changed on a halted core.
        session.halt()?;
        session.set_interrupt_masking(false)?;
        layout.install(&mut session)?;

        let lines = probe_interrupt_lines(&mut session, &layout)?;
        let exception_count = ExceptionNumber::ARCHITECTURAL + lines;
        info!(exception_count, "target prepared");

        Ok(Self::new(session, layout, exception_count))
    }

    /// Total number of exceptions the target implements
    pub const fn exception_count(&self) -> u16
    {
        self.exception_count
    }

    /// Recover the word at `address`
    ///
    /// Returns [`Word::Recovered`] or [`Word::Unavailable`]; placeholders are
    /// applied by [`Extraction`].
    ///
    /// ## Errors
    ///
    /// Session failures and `UnhandledException` (which means the mapper let
    /// an inaccessible slot through).
    pub fn read_word(&mut self, address: Address) -> VexceptResult<Word>
    {
        let _span = debug_span!("word", address = %address).entered();

        let value = if address == INITIAL_SP_ADDRESS {
            self.session.reset(true)?;
            self.session.read_register(Register::Sp)?
        } else if address == RESET_VECTOR_ADDRESS {
            self.session.reset(true)?;
            recover(&mut self.session)?
        } else {
            let mapping = map(address, self.exception_count)?;
            if !mapping.is_reachable() {
                debug!(exception = %mapping.exception, "slot unreachable");
                return Ok(Word::Unavailable);
            }
            debug!(
                vtor = %mapping.table_base,
                exception = %mapping.exception,
                wrapped = mapping.wrapped,
                "mapped address"
            );
            self.session.reset(true)?;
            excite(&mut self.session, mapping.table_base, mapping.exception, &self.layout)?;
            recover(&mut self.session)?
        };

        Ok(value.map_or(Word::Unavailable, Word::Recovered))
    }

    /// Stream the words of `request` in ascending address order
    pub fn extract(&mut self, request: &ExtractionRequest) -> Extraction<'_, S>
    {
        Extraction {
            extractor: self,
            request: *request,
            index: 0,
            failed: false,
        }
    }
}

/// Lazy stream of extracted words
///
/// Yields one item per requested address, except for unavailable words under
/// [`UnavailablePolicy::Omit`]. After the first error the stream ends.
pub struct Extraction<'a, S: ProbeSession>
{
    extractor: &'a mut Extractor<S>,
    request: ExtractionRequest,
    index: u32,
    failed: bool,
}

impl<S: ProbeSession> Iterator for Extraction<'_, S>
{
    type Item = VexceptResult<RecoveredWord>;

    fn next(&mut self) -> Option<Self::Item>
    {
        if self.failed {
            return None;
        }

        while self.index < self.request.count {
            let address = self.request.start + self.index * WORD_SIZE;
            self.index += 1;

            let word = match self.extractor.read_word(address) {
                Ok(word) => word,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            };

            let word = match (word, self.request.policy) {
                (Word::Unavailable, UnavailablePolicy::Omit) => {
                    warn!(address = %address, "word unavailable, omitting");
                    continue;
                }
                (Word::Unavailable, UnavailablePolicy::Substitute(value)) => {
                    warn!(address = %address, "word unavailable, substituting placeholder");
                    Word::Placeholder(value)
                }
                (word, _) => word,
            };
            return Some(Ok(RecoveredWord::new(address, word)));
        }

        None
    }
}
