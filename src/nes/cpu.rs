use bitflags::bitflags;

use crate::nes::tracer::Traceable;

mod instruction_handlers;
pub mod interrupts;
pub mod opcodes;
pub mod processor;
pub mod trace;

pub use crate::nes::bus::CpuBusInterface;

pub const CPU_STACK_RESET: u8 = 0xFD;
pub const CPU_STACK_BASE: u16 = 0x0100;
pub const CPU_STATUS_RESET: u8 = 0b0010_0100;
pub const CPU_RESET_CYCLES: u64 = 7;
/// Cycles burnt per `step` once a JAM opcode has locked the CPU
pub const CPU_JAM_CYCLES: u8 = 2;

bitflags! {
    /* https://www.nesdev.org/wiki/Status_flags
            7  bit  0
        ---- ----
        NV1B DIZC
        |||| ||||
        |||| |||+- Carry
        |||| ||+-- Zero
        |||| |+--- Interrupt Disable
        |||| +---- Decimal
        |||+------ (No CPU effect; see: the B flag)
        ||+------- (No CPU effect; always pushed as 1)
        |+-------- Overflow
        +--------- Negative
     */
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u8 {
        const CARRY             = 1<<0;
        const ZERO              = 1<<1;
        const INTERRUPT_DISABLE = 1<<2;
        const DECIMAL_MODE      = 1<<3;
        const BREAK             = 1<<4;
        const BREAK2            = 1<<5;
        const OVERFLOW          = 1<<6;
        const NEGATIVE          = 1<<7;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect, // Only JMP supports this mode
    IndirectX,
    IndirectY,
    Relative, // The branch instructions exclusively use this mode
}

impl AddressingMode {
    /// Operand bytes following the opcode
    pub const fn operand_len(&self) -> u8 {
        match self {
            AddressingMode::Implied | AddressingMode::Accumulator => 0,
            AddressingMode::Immediate
            | AddressingMode::ZeroPage
            | AddressingMode::ZeroPageX
            | AddressingMode::ZeroPageY
            | AddressingMode::IndirectX
            | AddressingMode::IndirectY
            | AddressingMode::Relative => 1,
            AddressingMode::Absolute
            | AddressingMode::AbsoluteX
            | AddressingMode::AbsoluteY
            | AddressingMode::Indirect => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    Read,
    Write,
    ReadModifyWrite,
    Register,
    None,
}

/// Effective address of the current instruction, resolved before it executes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Operand {
    pub addr: u16,
    /// Address before indexing (equal to `addr` for non-indexed modes)
    pub base: u16,
    pub page_crossed: bool,
}

pub struct CPU {
    pub register_a: u8,
    pub register_x: u8,
    pub register_y: u8,
    pub stack_pointer: u8,
    pub status: Flags,
    pub program_counter: u16,

    /// Total cycles since power-on
    pub cycles: u64,

    /// Set by a JAM opcode; only `reset` recovers
    pub jammed: bool,

    nmi_previous_line: bool,
    nmi_pending: bool,
    extra_cycles: u8,

    pub last_opcode_desc: &'static str,
}

impl Default for CPU {
    fn default() -> Self {
        Self::new()
    }
}

impl Traceable for CPU {
    fn trace_name(&self) -> &'static str {
        "CPU"
    }
    fn trace_state(&self) -> Option<String> {
        Some(format!(
            "PC={:04X} A={:02X} X={:02X} Y={:02X} P={:02X} SP={:02X} CYC={} [{}]{}",
            self.program_counter,
            self.register_a,
            self.register_x,
            self.register_y,
            self.status.bits(),
            self.stack_pointer,
            self.cycles,
            self.last_opcode_desc,
            if self.jammed { " JAMMED" } else { "" },
        ))
    }
}
