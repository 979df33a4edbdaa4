//! Simulated Cortex-M target for integration tests
//!
//! Models just enough of an ARMv7-M core for the extraction technique:
//! reset-time SP/PC loading, VTOR with OR-combined vector fetch, ICSR/SHCSR/
//! DEMCR pend and enable bits, an NVIC with a configurable set of implemented
//! lines, and the four scratch instructions. Debug memory reads of the
//! protected region fail, so every recovered word has to come through a
//! vector fetch.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use vexcept_core::error::{VexceptError, VexceptResult};
use vexcept_core::scs;
use vexcept_core::session::ProbeSession;
use vexcept_core::types::{Address, Register, WordWidth};

/// Initial stack pointer stored in word 0 of flash
pub const FLASH_INITIAL_SP: u32 = 0x2000_5000;
/// Reset vector stored in word 1 of flash (Thumb bit set)
pub const FLASH_RESET_VECTOR: u32 = 0x0000_0401;

/// Deterministic flash contents for every word other than 0 and 1
pub fn flash_pattern(address: u32) -> u32
{
    match address {
        0 => FLASH_INITIAL_SP,
        4 => FLASH_RESET_VECTOR,
        _ => address.rotate_left(7) ^ (address >> 2) ^ 0xa5a5_1234,
    }
}

/// Number of NVIC register banks (496 lines / 32)
const NVIC_BANKS: u32 = 16;

pub struct SimulatedTarget
{
    memory: HashMap<u32, u8>,
    protected: std::ops::Range<u32>,
    registers: [u32; 17],
    implemented: Vec<bool>,
    nvic_enabled: Vec<bool>,
    nvic_pending: Vec<bool>,
    vtor: u32,
    shcsr: u32,
    demcr: u32,
    nmi_pending: bool,
    pendsv_pending: bool,
    systick_pending: bool,
    interrupts_masked: bool,
    halted: bool,
    /// Every value written to VTOR
    pub vtor_writes: Vec<u32>,
    /// Number of single steps
    pub steps: usize,
    /// Number of resets
    pub resets: usize,
    /// Answer every register read with "unavailable"
    pub fail_register_reads: bool,
    /// Set once the session has been closed
    pub closed: Rc<Cell<bool>>,
}

impl SimulatedTarget
{
    /// Target with `lines` consecutive implemented interrupt lines and flash
    /// filled with [`flash_pattern`] over `flash_words` words from address 0
    pub fn new(lines: u16, flash_words: u32) -> Self
    {
        let mut implemented = vec![false; 496];
        for line in implemented.iter_mut().take(usize::from(lines)) {
            *line = true;
        }

        let mut target = Self {
            memory: HashMap::new(),
            protected: 0..flash_words * 4,
            registers: [0; 17],
            implemented,
            nvic_enabled: vec![false; 496],
            nvic_pending: vec![false; 496],
            vtor: 0,
            shcsr: 0,
            demcr: 0,
            nmi_pending: false,
            pendsv_pending: false,
            systick_pending: false,
            interrupts_masked: true,
            halted: false,
            vtor_writes: Vec::new(),
            steps: 0,
            resets: 0,
            fail_register_reads: false,
            closed: Rc::new(Cell::new(false)),
        };
        for word in 0..flash_words {
            target.store(word * 4, flash_pattern(word * 4), 4);
        }
        target
    }

    /// Mark interrupt line `line` as not implemented
    pub fn remove_line(&mut self, line: u16)
    {
        self.implemented[usize::from(line)] = false;
    }

    /// Mark interrupt line `line` as implemented
    pub fn add_line(&mut self, line: u16)
    {
        self.implemented[usize::from(line)] = true;
    }

    pub fn is_halted(&self) -> bool
    {
        self.halted
    }

    pub fn interrupts_masked(&self) -> bool
    {
        self.interrupts_masked
    }

    /// Raw backdoor read, bypassing read protection
    pub fn peek(&self, address: u32, bytes: u32) -> u32
    {
        (0..bytes).fold(0, |acc, i| {
            let byte = self.memory.get(&address.wrapping_add(i)).copied().unwrap_or(0);
            acc | (u32::from(byte) << (8 * i))
        })
    }

    fn store(&mut self, address: u32, value: u32, bytes: u32)
    {
        for i in 0..bytes {
            self.memory.insert(address.wrapping_add(i), (value >> (8 * i)) as u8);
        }
    }

    fn reg(&self, register: Register) -> u32
    {
        self.registers[usize::from(register.index())]
    }

    fn set_reg(&mut self, register: Register, value: u32)
    {
        self.registers[usize::from(register.index())] = value;
    }

    fn nvic_write(&mut self, bank: u32, value: u32, pending: bool)
    {
        for bit in 0..32 {
            if value & (1 << bit) == 0 {
                continue;
            }
            let line = (bank * 32 + bit) as usize;
            if !self.implemented[line] {
                continue;
            }
            if pending {
                self.nvic_pending[line] = true;
            } else {
                self.nvic_enabled[line] = true;
            }
        }
    }

    fn write_item(&mut self, address: u32, value: u32, bytes: u32)
    {
        let iser0 = scs::NVIC_ISER0.value();
        let ispr0 = scs::NVIC_ISPR0.value();

        match address {
            a if a == scs::ICSR.value() => {
                self.nmi_pending |= value & scs::ICSR_NMIPENDSET != 0;
                self.pendsv_pending |= value & scs::ICSR_PENDSVSET != 0;
                self.systick_pending |= value & scs::ICSR_PENDSTSET != 0;
            }
            a if a == scs::VTOR.value() => {
                self.vtor = value & !0x3f;
                self.vtor_writes.push(value);
            }
            a if a == scs::SHCSR.value() => self.shcsr = value,
            a if a == scs::DEMCR.value() => self.demcr = value,
            a if (iser0..iser0 + NVIC_BANKS * 4).contains(&a) => self.nvic_write((a - iser0) / 4, value, false),
            a if (ispr0..ispr0 + NVIC_BANKS * 4).contains(&a) => self.nvic_write((a - ispr0) / 4, value, true),
            a => self.store(a, value, bytes),
        }
    }

    fn take_exception(&mut self, number: u32)
    {
        let vector = self.peek(self.vtor | (number * 4), 4);

        let sp = self.reg(Register::Sp).wrapping_sub(32);
        self.set_reg(Register::Sp, sp);
        self.set_reg(Register::Lr, 0xffff_fff9);
        self.set_reg(Register::Pc, vector & !1);
        let psr = (self.reg(Register::Psr) & !(0x1ff | (1 << 24))) | number | ((vector & 1) << 24);
        self.set_reg(Register::Psr, psr);

        match number {
            2 => self.nmi_pending = false,
            12 => self.demcr &= !scs::DEMCR_MON_PEND,
            14 => self.pendsv_pending = false,
            15 => self.systick_pending = false,
            n if n >= 16 => self.nvic_pending[(n - 16) as usize] = false,
            _ => {}
        }
    }

    fn pending_exception(&self) -> Option<u32>
    {
        if self.nmi_pending {
            return Some(2);
        }
        if self.demcr & scs::DEMCR_MON_PEND != 0 {
            return Some(12);
        }
        if self.interrupts_masked {
            return None;
        }
        if self.pendsv_pending {
            return Some(14);
        }
        if self.systick_pending {
            return Some(15);
        }
        (0..496)
            .find(|line| self.nvic_enabled[*line] && self.nvic_pending[*line])
            .map(|line| line as u32 + 16)
    }

    fn fault(&self, enable_bit: u32, number: u32) -> u32
    {
        if self.shcsr & enable_bit != 0 {
            number
        } else {
            3
        }
    }

    fn execute(&mut self) -> Option<u32>
    {
        let pc = self.reg(Register::Pc);
        if pc >= scs::XN_REGION.value() {
            return Some(self.fault(scs::SHCSR_MEMFAULTENA, 4));
        }

        match self.peek(pc, 2) {
            0xdf00 => Some(11),
            0xbf00 => {
                self.set_reg(Register::Pc, pc + 2);
                None
            }
            0x7b75 => {
                let target = self.reg(Register::R6).wrapping_add(13);
                if target >= 0xffff_0000 {
                    return Some(self.fault(scs::SHCSR_BUSFAULTENA, 5));
                }
                let byte = self.peek(target, 1);
                self.set_reg(Register::R5, byte);
                self.set_reg(Register::Pc, pc + 2);
                None
            }
            _ => Some(self.fault(scs::SHCSR_USGFAULTENA, 6)),
        }
    }
}

impl ProbeSession for SimulatedTarget
{
    fn reset(&mut self, halt: bool) -> VexceptResult<()>
    {
        self.resets += 1;
        self.registers = [0; 17];
        self.nvic_enabled.fill(false);
        self.nvic_pending.fill(false);
        self.vtor = 0;
        self.shcsr = 0;
        self.demcr = 0;
        self.nmi_pending = false;
        self.pendsv_pending = false;
        self.systick_pending = false;

        let reset_vector = self.peek(4, 4);
        self.set_reg(Register::Sp, self.peek(0, 4) & !3);
        self.set_reg(Register::Pc, reset_vector & !1);
        self.set_reg(Register::Psr, (reset_vector & 1) << 24);
        self.halted = halt;
        Ok(())
    }

    fn halt(&mut self) -> VexceptResult<()>
    {
        self.halted = true;
        Ok(())
    }

    fn set_interrupt_masking(&mut self, enabled: bool) -> VexceptResult<()>
    {
        if !self.halted {
            return Err(VexceptError::SessionFailed("target not halted".to_string()));
        }
        self.interrupts_masked = enabled;
        Ok(())
    }

    fn single_step(&mut self) -> VexceptResult<()>
    {
        if !self.halted {
            return Err(VexceptError::SessionFailed("target not halted".to_string()));
        }
        self.steps += 1;
        let exception = self.pending_exception().or_else(|| self.execute());
        if let Some(number) = exception {
            self.take_exception(number);
        }
        Ok(())
    }

    fn read_register(&mut self, register: Register) -> VexceptResult<Option<u32>>
    {
        if self.fail_register_reads {
            return Ok(None);
        }
        Ok(Some(self.reg(register)))
    }

    fn write_register(&mut self, register: Register, value: u32) -> VexceptResult<()>
    {
        self.set_reg(register, value);
        Ok(())
    }

    fn read_memory(&mut self, address: Address, count: usize, width: WordWidth) -> VexceptResult<Vec<u32>>
    {
        let bytes = width.bytes();
        (0..count as u32)
            .map(|i| {
                let item = address.value() + i * bytes;
                if self.protected.contains(&item) {
                    Err(VexceptError::SessionFailed(format!("read of protected address 0x{item:08x}")))
                } else {
                    Ok(self.peek(item, bytes))
                }
            })
            .collect()
    }

    fn write_memory(&mut self, address: Address, values: &[u32], width: WordWidth) -> VexceptResult<()>
    {
        let bytes = width.bytes();
        for (i, value) in values.iter().enumerate() {
            self.write_item(address.value() + i as u32 * bytes, *value, bytes);
        }
        Ok(())
    }

    fn close(&mut self) -> VexceptResult<()>
    {
        self.closed.set(true);
        Ok(())
    }
}
