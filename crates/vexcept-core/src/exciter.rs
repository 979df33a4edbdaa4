//! # Exception Exciter
//!
//! Puts a halted core into a state where its next single step takes one
//! specific exception.
//!
//! Each exception number has a recipe: where PC should point, which System
//! Control Space bits to set, and which extra core registers to seed. The
//! sixteen architectural slots come from a static table; external interrupts
//! are computed from the NVIC bank layout. A step then makes the core stack a
//! frame, fetch the vector through the relocated VTOR and stop on the first
//! handler instruction without executing it.
//!
//! | Number | Mechanism |
//! |---|---|
//! | 2 NMI | ICSR.NMIPENDSET, PC on `nop` |
//! | 3 HardFault | PC on undefined instruction, UsageFault disabled so it escalates |
//! | 4 MemManage | PC in the execute-never region, SHCSR.MEMFAULTENA |
//! | 5 BusFault | PC on load, SHCSR.BUSFAULTENA, load base register invalid |
//! | 6 UsageFault | PC on undefined instruction, SHCSR.USGFAULTENA |
//! | 11 SVCall | PC on `svc #0` |
//! | 12 DebugMonitor | PC on `nop`, DEMCR.MON_PEND |
//! | 14 PendSV | ICSR.PENDSVSET, PC on `nop` |
//! | 15 SysTick | ICSR.PENDSTSET, PC on `nop` |
//! | 16+ IRQ n | NVIC ISER/ISPR bit for line n, PC on `nop` |

use tracing::{debug, trace};

use crate::error::{VexceptError, VexceptResult};
use crate::scratch::{ScratchLayout, INVALID_LOAD_TARGET, LOAD_BASE_REGISTER};
use crate::scs::{self, NvicLine};
use crate::session::ProbeSession;
use crate::types::{Address, ExceptionNumber, Register, Xpsr};

/// What the core executes on its single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stimulus
{
    /// Scratch `nop`; lets an already pending exception be taken
    Nop,
    /// Scratch `svc #0`
    SupervisorCall,
    /// Scratch load through the invalid base register
    InvalidLoad,
    /// Scratch undefined instruction
    Undefined,
    /// Instruction fetch from the execute-never region
    ExecuteNever,
}

impl Stimulus
{
    /// PC value that produces this stimulus
    pub const fn program_counter(self, layout: &ScratchLayout) -> Address
    {
        match self {
            Stimulus::Nop => layout.nop(),
            Stimulus::SupervisorCall => layout.svc(),
            Stimulus::InvalidLoad => layout.ldr(),
            Stimulus::Undefined => layout.udf(),
            Stimulus::ExecuteNever => scs::XN_REGION,
        }
    }
}

/// Static recipe for an architectural exception
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recipe
{
    /// What PC points at
    pub stimulus: Stimulus,
    /// System Control Space words to write before stepping
    pub peripheral_writes: &'static [(Address, u32)],
    /// Extra core registers to seed
    pub register_writes: &'static [(Register, u32)],
}

const fn recipe(stimulus: Stimulus, peripheral_writes: &'static [(Address, u32)]) -> Option<Recipe>
{
    Some(Recipe {
        stimulus,
        peripheral_writes,
        register_writes: &[],
    })
}

/// Recipes for exception numbers 0-15, `None` where no recipe exists
pub const ARCHITECTURAL_RECIPES: [Option<Recipe>; 16] = [
    None,
    None,
    recipe(Stimulus::Nop, &[(scs::ICSR, scs::ICSR_NMIPENDSET)]),
    recipe(Stimulus::Undefined, &[]),
    recipe(Stimulus::ExecuteNever, &[(scs::SHCSR, scs::SHCSR_MEMFAULTENA)]),
    Some(Recipe {
        stimulus: Stimulus::InvalidLoad,
        peripheral_writes: &[(scs::SHCSR, scs::SHCSR_BUSFAULTENA)],
        register_writes: &[(LOAD_BASE_REGISTER, INVALID_LOAD_TARGET)],
    }),
    recipe(Stimulus::Undefined, &[(scs::SHCSR, scs::SHCSR_USGFAULTENA)]),
    None,
    None,
    None,
    None,
    recipe(Stimulus::SupervisorCall, &[]),
    recipe(Stimulus::Nop, &[(scs::DEMCR, scs::DEMCR_MON_PEND)]),
    None,
    recipe(Stimulus::Nop, &[(scs::ICSR, scs::ICSR_PENDSVSET)]),
    recipe(Stimulus::Nop, &[(scs::ICSR, scs::ICSR_PENDSTSET)]),
];

/// Fully resolved register/peripheral writes for one excitation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcitationPlan
{
    /// Exception being excited
    pub exception: ExceptionNumber,
    /// VTOR value
    pub table_base: Address,
    /// Memory-mapped writes, in order, after VTOR
    pub peripheral_writes: Vec<(Address, u32)>,
    /// Core register writes, in order
    pub register_writes: Vec<(Register, u32)>,
}

/// Memory writes that enable and pend external interrupt line `line`
pub fn nvic_pend_writes(line: u16) -> [(Address, u32); 2]
{
    let line = NvicLine::new(line);
    [(line.iser(), line.mask), (line.ispr(), line.mask)]
}

/// Resolve the writes needed to take `exception` with VTOR at `table_base`
///
/// ## Errors
///
/// - `UnhandledException`: `exception` is one of 0, 1, 7-10 or 13
pub fn plan(table_base: Address, exception: ExceptionNumber, layout: &ScratchLayout) -> VexceptResult<ExcitationPlan>
{
    let (stimulus, peripheral_writes, mut register_writes) = match exception.external_line() {
        Some(line) => (Stimulus::Nop, nvic_pend_writes(line).to_vec(), Vec::new()),
        None => {
            let recipe = ARCHITECTURAL_RECIPES
                .get(usize::from(exception.value()))
                .copied()
                .flatten()
                .ok_or(VexceptError::UnhandledException(exception.value()))?;
            (recipe.stimulus, recipe.peripheral_writes.to_vec(), recipe.register_writes.to_vec())
        }
    };

    register_writes.insert(0, (Register::Pc, stimulus.program_counter(layout).value()));
    register_writes.push((Register::Psr, Xpsr::THUMB.0));
    register_writes.push((Register::Sp, layout.stack_pointer()));

    Ok(ExcitationPlan {
        exception,
        table_base,
        peripheral_writes,
        register_writes,
    })
}

/// Configure the halted target for `exception` and step into it
///
/// Relocates VTOR to `table_base`, applies the exception's recipe, forces
/// Thumb state and the safe stack pointer, then issues exactly one single
/// step. The target must be freshly reset and halted.
///
/// ## Errors
///
/// - `UnhandledException`: no recipe for `exception` (nothing is written)
/// - Any session failure
pub fn excite<S: ProbeSession + ?Sized>(
    session: &mut S,
    table_base: Address,
    exception: ExceptionNumber,
    layout: &ScratchLayout,
) -> VexceptResult<()>
{
    let plan = plan(table_base, exception, layout)?;
    debug!(exception = %exception, vtor = %table_base, "exciting exception");

    session.write_word(scs::VTOR, table_base.value())?;
    for (address, value) in &plan.peripheral_writes {
        trace!(address = %address, value = format_args!("0x{value:08x}"), "peripheral write");
        session.write_word(*address, *value)?;
    }
    for (register, value) in &plan.register_writes {
        trace!(register = %register, value = format_args!("0x{value:08x}"), "register write");
        session.write_register(*register, *value)?;
    }

    session.single_step()
}
